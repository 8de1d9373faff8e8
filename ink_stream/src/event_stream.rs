//! Head of the pipeline
//!
//! [`TouchEventStream`] forwards each incoming batch unchanged and keeps a
//! copy, so a session can be exported and replayed later.

use std::path::Path;

use log::trace;

use crate::error::Result;
use crate::event::DrawEvent;
use crate::stream::{Consumers, Stream};

#[derive(Debug, Default)]
pub struct TouchEventStream {
    events: Vec<DrawEvent>,
    consumers: Consumers<Vec<DrawEvent>>,
}

impl TouchEventStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event processed since the last reset, in arrival order.
    pub fn events(&self) -> &[DrawEvent] {
        &self.events
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.events)?)
    }

    /// Write the recorded events as a JSON array.
    pub fn export(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Stream for TouchEventStream {
    type Consumes = [DrawEvent];
    type Produces = Vec<DrawEvent>;

    fn produce(&mut self, input: &[DrawEvent]) -> Vec<DrawEvent> {
        trace!("processing {} events", input.len());
        self.events.extend_from_slice(input);
        let output = input.to_vec();
        self.consumers.notify(&output);
        output
    }

    fn reset(&mut self) {
        self.events.clear();
        self.consumers.reset();
    }

    fn consumers_mut(&mut self) -> &mut Consumers<Vec<DrawEvent>> {
        &mut self.consumers
    }
}
