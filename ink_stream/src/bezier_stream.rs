//! Building curves from polylines
//!
//! Each polyline gets one [`Curve`], kept element for element in step with
//! what the configured [`Smoother`] would build from scratch. Only the tail
//! starting at the first affected element is rebuilt on an update.

use std::collections::HashMap;
use std::rc::Rc;

use kurbo::{BezPath, Rect, Shape};
use log::{debug, warn};

use crate::index_range::IndexRange;
use crate::polyline::Polyline;
use crate::polyline_stream::PolylineOutput;
use crate::smoothers::{AntigrainSmoother, CurveElement, Smoother};
use crate::stream::{Consumers, Delta, Output, Stream};

pub type CurveOutput = Output<Curve>;

/// A drawable curve, both as smoother elements and as a kurbo path.
#[derive(Debug, Clone, Default)]
pub struct Curve {
    pub touch_identifier: String,
    pub is_complete: bool,
    elements: Vec<CurveElement>,
    path: BezPath,
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.touch_identifier == other.touch_identifier
            && self.is_complete == other.is_complete
            && self.elements == other.elements
    }
}

impl Curve {
    pub fn new(touch_identifier: impl Into<String>) -> Self {
        Self {
            touch_identifier: touch_identifier.into(),
            ..Self::default()
        }
    }

    /// Build every element of `line` at once.
    pub fn from_polyline(smoother: &dyn Smoother, line: &Polyline) -> Self {
        let mut curve = Self::new(line.touch_identifier.clone());
        if let Some(max) = smoother.max_element_index(line) {
            for index in 0..=max {
                curve.push(smoother.element(line, index));
            }
        }
        curve.is_complete = line.is_complete;
        curve
    }

    pub fn elements(&self) -> &[CurveElement] {
        &self.elements
    }

    pub fn path(&self) -> &BezPath {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn bounds(&self) -> Option<Rect> {
        if self.elements.is_empty() {
            return None;
        }
        Some(self.path.bounding_box())
    }

    fn push(&mut self, element: CurveElement) {
        self.path.push(element.to_path_el());
        self.elements.push(element);
    }

    fn truncate(&mut self, len: usize) {
        self.elements.truncate(len);
        self.path.truncate(len);
    }

    /// Rebuild the elements that depend on the points in `changed`, and
    /// extend or shorten the curve to what `line` now supports.
    ///
    /// Returns every element index that was rebuilt or removed.
    pub fn update(&mut self, smoother: &dyn Smoother, line: &Polyline, changed: &IndexRange) -> IndexRange {
        let affected = smoother.element_indexes(line, changed, &self.elements);
        let end = smoother.max_element_index(line).map_or(0, |max| max + 1);
        let old_len = self.elements.len();
        let start = affected.first().unwrap_or(old_len).min(old_len).min(end);

        self.truncate(start);
        for index in start..end {
            self.push(smoother.element(line, index));
        }

        let touched_end = end.max(old_len);
        if start < touched_end {
            affected.union(&IndexRange::from(start..touched_end))
        } else {
            affected
        }
    }
}

/// The curve-building stage.
///
/// While disabled, incoming batches are held back and nothing is produced.
/// Enabling the stage again replays them in order.
#[derive(Debug)]
pub struct BezierStream {
    smoother: Box<dyn Smoother>,
    enabled: bool,
    curves: Vec<Rc<Curve>>,
    /// Line index to curve index
    index_of: HashMap<usize, usize>,
    waiting: Vec<PolylineOutput>,
    produced: CurveOutput,
    consumers: Consumers<CurveOutput>,
}

impl Default for BezierStream {
    fn default() -> Self {
        Self::new(Box::new(AntigrainSmoother::default()))
    }
}

impl BezierStream {
    pub fn new(smoother: Box<dyn Smoother>) -> Self {
        Self {
            smoother,
            enabled: true,
            curves: Vec::new(),
            index_of: HashMap::new(),
            waiting: Vec::new(),
            produced: CurveOutput::default(),
            consumers: Consumers::new(),
        }
    }

    pub fn curves(&self) -> &[Rc<Curve>] {
        &self.curves
    }

    /// The most recent output handed to consumers.
    pub fn produced(&self) -> &CurveOutput {
        &self.produced
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            return;
        }
        let waiting = std::mem::take(&mut self.waiting);
        if !waiting.is_empty() {
            debug!("replaying {} held batches", waiting.len());
        }
        for batch in &waiting {
            self.produce(batch);
        }
    }

    fn build(&mut self, input: &PolylineOutput) -> Vec<Delta> {
        let mut deltas = Vec::with_capacity(input.deltas.len());
        for delta in &input.deltas {
            match delta {
                Delta::Added(line_index) => {
                    if self.index_of.contains_key(line_index) {
                        warn!("line {line_index} was already added");
                        continue;
                    }
                    let Some(line) = input.items.get(*line_index) else {
                        warn!("added line {line_index} is missing from the batch");
                        continue;
                    };
                    let mut curve = Curve::new(line.touch_identifier.clone());
                    curve.update(self.smoother.as_ref(), line, &IndexRange::from(0..line.len()));
                    let index = self.curves.len();
                    self.index_of.insert(*line_index, index);
                    self.curves.push(Rc::new(curve));
                    deltas.push(Delta::Added(index));
                }
                Delta::Updated(line_index, changed) => {
                    let (Some(&index), Some(line)) =
                        (self.index_of.get(line_index), input.items.get(*line_index))
                    else {
                        warn!("update for unknown line {line_index}");
                        continue;
                    };
                    let curve = Rc::make_mut(&mut self.curves[index]);
                    let updated = curve.update(self.smoother.as_ref(), line, changed);
                    if !updated.is_empty() {
                        deltas.push(Delta::Updated(index, updated));
                    }
                }
                Delta::Completed(line_index) => {
                    let (Some(&index), Some(line)) =
                        (self.index_of.get(line_index), input.items.get(*line_index))
                    else {
                        warn!("completion for unknown line {line_index}");
                        continue;
                    };
                    let curve = Rc::make_mut(&mut self.curves[index]);
                    let extended = curve.update(self.smoother.as_ref(), line, &IndexRange::new());
                    curve.is_complete = true;
                    if !extended.is_empty() {
                        deltas.push(Delta::Updated(index, extended));
                    }
                    deltas.push(Delta::Completed(index));
                }
                Delta::Unhandled(event) => deltas.push(Delta::Unhandled(event.clone())),
            }
        }
        deltas
    }
}

impl Stream for BezierStream {
    type Consumes = PolylineOutput;
    type Produces = CurveOutput;

    fn produce(&mut self, input: &PolylineOutput) -> CurveOutput {
        if !self.enabled {
            self.waiting.push(input.clone());
            return Output::new(self.curves.clone(), Vec::new());
        }
        let deltas = self.build(input);
        let output = Output::new(self.curves.clone(), deltas);
        self.consumers.notify(&output);
        self.produced = output.clone();
        output
    }

    fn reset(&mut self) {
        self.curves.clear();
        self.index_of.clear();
        self.waiting.clear();
        self.produced = CurveOutput::default();
        self.consumers.reset();
    }

    fn consumers_mut(&mut self) -> &mut Consumers<CurveOutput> {
        &mut self.consumers
    }
}
