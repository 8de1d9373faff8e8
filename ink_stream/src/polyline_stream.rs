//! Projecting touch paths into polylines, one per path

use std::collections::HashMap;
use std::rc::Rc;

use log::warn;

use crate::path_stream::PathOutput;
use crate::polyline::Polyline;
use crate::stream::{Consumers, Delta, Output, Stream};

pub type PolylineOutput = Output<Polyline>;

#[derive(Debug, Default)]
pub struct PolylineStream {
    lines: Vec<Rc<Polyline>>,
    /// Path index to line index
    index_of: HashMap<usize, usize>,
    consumers: Consumers<PolylineOutput>,
}

impl PolylineStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[Rc<Polyline>] {
        &self.lines
    }
}

impl Stream for PolylineStream {
    type Consumes = PathOutput;
    type Produces = PolylineOutput;

    fn produce(&mut self, input: &PathOutput) -> PolylineOutput {
        let mut deltas = Vec::with_capacity(input.deltas.len());
        for delta in &input.deltas {
            match delta {
                Delta::Added(path_index) => {
                    if self.index_of.contains_key(path_index) {
                        warn!("path {path_index} was already added");
                        continue;
                    }
                    let line = Polyline::from_path(&input.items[*path_index]);
                    let index = self.lines.len();
                    self.index_of.insert(*path_index, index);
                    self.lines.push(Rc::new(line));
                    deltas.push(Delta::Added(index));
                }
                Delta::Updated(path_index, changed) => {
                    let Some(&index) = self.index_of.get(path_index) else {
                        warn!("update for unknown path {path_index}");
                        continue;
                    };
                    let line = Rc::make_mut(&mut self.lines[index]);
                    let updated = line.update(&input.items[*path_index], changed);
                    deltas.push(Delta::Updated(index, updated));
                }
                Delta::Completed(path_index) => {
                    if let Some(&index) = self.index_of.get(path_index) {
                        if !self.lines[index].is_complete {
                            Rc::make_mut(&mut self.lines[index]).is_complete = true;
                        }
                        deltas.push(Delta::Completed(index));
                    }
                }
                Delta::Unhandled(event) => deltas.push(Delta::Unhandled(event.clone())),
            }
        }

        let output = Output::new(self.lines.clone(), deltas);
        self.consumers.notify(&output);
        output
    }

    fn reset(&mut self) {
        self.lines.clear();
        self.index_of.clear();
        self.consumers.reset();
    }

    fn consumers_mut(&mut self) -> &mut Consumers<PolylineOutput> {
        &mut self.consumers
    }
}
