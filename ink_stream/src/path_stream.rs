//! Fanning input events out to one [`TouchPath`] per touch

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::event::{DrawEvent, TouchEvent};
use crate::stream::{Consumers, Delta, Output, Stream};
use crate::touch_path::TouchPath;

pub type PathOutput = Output<TouchPath>;

/// Owns the path of every touch seen since the last reset.
///
/// Paths are indexed in order of first appearance and keep their index until
/// [`Stream::reset`]. Completed paths stay addressable.
#[derive(Debug, Default)]
pub struct TouchPathStream {
    paths: Vec<Rc<TouchPath>>,
    index_of: HashMap<String, usize>,
    consumers: Consumers<PathOutput>,
}

impl TouchPathStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> &[Rc<TouchPath>] {
        &self.paths
    }
}

impl Stream for TouchPathStream {
    type Consumes = Vec<DrawEvent>;
    type Produces = PathOutput;

    fn produce(&mut self, input: &Vec<DrawEvent>) -> PathOutput {
        let mut per_touch: HashMap<&str, Vec<TouchEvent>> = HashMap::new();
        for event in input.iter().filter_map(DrawEvent::as_touch) {
            per_touch
                .entry(event.touch_identifier.as_str())
                .or_default()
                .push(event.clone());
        }

        let mut deltas = Vec::new();
        for event in input {
            let Some(touch) = event.as_touch() else {
                deltas.push(Delta::Unhandled(event.clone()));
                continue;
            };
            // the first sample of a touch processes all of its samples in this batch
            let Some(events) = per_touch.remove(touch.touch_identifier.as_str()) else {
                continue;
            };

            if let Some(&index) = self.index_of.get(&touch.touch_identifier) {
                let path = Rc::make_mut(&mut self.paths[index]);
                let changed = path.add(&events);
                deltas.push(Delta::Updated(index, changed));
                if path.is_complete() {
                    deltas.push(Delta::Completed(index));
                }
            } else if let Some(path) = TouchPath::new(&events) {
                let index = self.paths.len();
                debug!("touch {} added as path {index}", touch.touch_identifier);
                self.index_of.insert(touch.touch_identifier.clone(), index);
                let complete = path.is_complete();
                self.paths.push(Rc::new(path));
                deltas.push(Delta::Added(index));
                if complete {
                    deltas.push(Delta::Completed(index));
                }
            }
        }

        trace!("{} events produced {} path deltas", input.len(), deltas.len());
        let output = Output::new(self.paths.clone(), deltas);
        self.consumers.notify(&output);
        output
    }

    fn reset(&mut self) {
        self.paths.clear();
        self.index_of.clear();
        self.consumers.reset();
    }

    fn consumers_mut(&mut self) -> &mut Consumers<PathOutput> {
        &mut self.consumers
    }
}
