//! The full stroke pipeline, wired from a [`PipelineConfig`]
//!
//! Events go in at the top; every stage pushes its output to the next one
//! synchronously, so by the time [`Pipeline::process`] returns every stage
//! holds its final state for the batch. Stages switched off in the config
//! are still wired in, but pass their input through until enabled.

use std::cell::{Ref, RefCell};
use std::path::Path;
use std::rc::Rc;

use crate::attributes::{AttributesStream, StyledOutput};
use crate::bezier_stream::{BezierStream, Curve};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::event::DrawEvent;
use crate::event_stream::TouchEventStream;
use crate::filters::{DouglasPeucker, SavitzkyGolay};
use crate::path_stream::TouchPathStream;
use crate::polyline::Polyline;
use crate::polyline_stream::PolylineStream;
use crate::stream::{Delta, Stream};
use crate::touch_path::TouchPath;

#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    events: TouchEventStream,
    paths: Rc<RefCell<TouchPathStream>>,
    lines: Rc<RefCell<PolylineStream>>,
    simplifier: Rc<RefCell<DouglasPeucker>>,
    smoothing: Rc<RefCell<SavitzkyGolay>>,
    curves: Rc<RefCell<BezierStream>>,
    attributes: Rc<RefCell<AttributesStream>>,
    /// Deltas leaving the last stage during the current call
    collected: Rc<RefCell<Vec<Delta>>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let mut events = TouchEventStream::new();
        let paths = events.next_step(TouchPathStream::new());
        let lines = paths.borrow_mut().next_step(PolylineStream::new());

        let mut simplifier = DouglasPeucker::new(config.simplify.epsilon, config.simplify.method);
        simplifier.set_enabled(config.simplify.enabled);
        let simplifier = lines.borrow_mut().next_step(simplifier);

        let mut smoothing = SavitzkyGolay::new(config.smoothing.window, config.smoothing.strength);
        smoothing.set_enabled(config.smoothing.enabled);
        let smoothing = simplifier.borrow_mut().next_step(smoothing);

        let curves = smoothing
            .borrow_mut()
            .next_step(BezierStream::new(config.smoother.build()));
        let attributes = curves
            .borrow_mut()
            .next_step(AttributesStream::new(config.style.clone()));

        let collected = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&collected);
        attributes
            .borrow_mut()
            .add_handler(move |output: &StyledOutput| {
                sink.borrow_mut().extend(output.deltas.iter().cloned())
            });

        Self {
            config,
            events,
            paths,
            lines,
            simplifier,
            smoothing,
            curves,
            attributes,
            collected,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one batch through every stage and return the deltas that came out
    /// of the last one.
    pub fn process(&mut self, events: &[DrawEvent]) -> Vec<Delta> {
        self.collected.borrow_mut().clear();
        self.events.produce(events);
        std::mem::take(&mut *self.collected.borrow_mut())
    }

    /// Forget every touch, point and curve. The configuration is kept.
    pub fn reset(&mut self) {
        self.events.reset();
        self.collected.borrow_mut().clear();
    }

    pub fn set_simplify_enabled(&mut self, enabled: bool) {
        self.config.simplify.enabled = enabled;
        self.simplifier.borrow_mut().set_enabled(enabled);
    }

    pub fn set_smoothing_enabled(&mut self, enabled: bool) {
        self.config.smoothing.enabled = enabled;
        self.smoothing.borrow_mut().set_enabled(enabled);
    }

    /// Hold back curve building. Re-enabling replays everything held back,
    /// and the deltas it produces are returned.
    pub fn set_curves_enabled(&mut self, enabled: bool) -> Vec<Delta> {
        self.collected.borrow_mut().clear();
        self.curves.borrow_mut().set_enabled(enabled);
        std::mem::take(&mut *self.collected.borrow_mut())
    }

    /// Every event processed since the last reset.
    pub fn events(&self) -> &[DrawEvent] {
        self.events.events()
    }

    pub fn export_events(&self, path: &Path) -> Result<()> {
        self.events.export(path)
    }

    pub fn events_json(&self) -> Result<String> {
        self.events.to_json()
    }

    pub fn paths(&self) -> Ref<'_, [Rc<TouchPath>]> {
        Ref::map(self.paths.borrow(), |stage| stage.paths())
    }

    pub fn lines(&self) -> Ref<'_, [Rc<Polyline>]> {
        Ref::map(self.lines.borrow(), |stage| stage.lines())
    }

    pub fn simplified(&self) -> Ref<'_, [Rc<Polyline>]> {
        Ref::map(self.simplifier.borrow(), |stage| stage.lines())
    }

    pub fn smoothed(&self) -> Ref<'_, [Rc<Polyline>]> {
        Ref::map(self.smoothing.borrow(), |stage| stage.lines())
    }

    pub fn curves(&self) -> Ref<'_, [Rc<Curve>]> {
        Ref::map(self.curves.borrow(), |stage| stage.curves())
    }

    pub fn styled(&self) -> Ref<'_, StyledOutput> {
        Ref::map(self.attributes.borrow(), |stage| stage.produced())
    }

    pub fn attributes(&self) -> &Rc<RefCell<AttributesStream>> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ToolEvent, ToolStyle};
    use crate::simple_event::{to_touch_events, SimpleEvent};
    use kurbo::Point;

    fn draw_events(script: &[SimpleEvent]) -> Vec<DrawEvent> {
        to_touch_events(script)
            .into_iter()
            .map(DrawEvent::from)
            .collect()
    }

    fn unsmoothed() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.smoothing.enabled = false;
        config
    }

    #[test]
    fn test_three_samples_simplify_to_chord() {
        let mut pipeline = Pipeline::new(unsmoothed());
        let deltas = pipeline.process(&draw_events(&[
            SimpleEvent::new("t", 0.0, 0.0),
            SimpleEvent::new("t", 50.0, 1.0),
            SimpleEvent::new("t", 100.0, 0.0),
        ]));

        assert_eq!(deltas, vec![Delta::Added(0), Delta::Completed(0)]);
        let simplified: Vec<Point> = pipeline.simplified()[0]
            .points
            .iter()
            .map(|p| p.location)
            .collect();
        assert_eq!(simplified, vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert_eq!(pipeline.lines()[0].len(), 3);
        assert_eq!(pipeline.curves()[0].len(), 2);
        assert!(pipeline.curves()[0].is_complete);
    }

    #[test]
    fn test_tool_event_styles_next_stroke() {
        let mut pipeline = Pipeline::default();
        let mut events = draw_events(&[SimpleEvent::new("a", 0.0, 0.0), SimpleEvent::new("a", 10.0, 0.0)]);
        events.push(DrawEvent::from(ToolEvent::new(ToolStyle::new(6.0, None))));
        events.extend(draw_events(&[SimpleEvent::new("b", 0.0, 5.0), SimpleEvent::new("b", 10.0, 5.0)]));
        pipeline.process(&events);

        let styled = pipeline.styled();
        let styles: Vec<&ToolStyle> = styled.styled().map(|(_, style)| style).collect();
        assert_eq!(styles, vec![&ToolStyle::default(), &ToolStyle::new(6.0, None)]);
    }

    #[test]
    fn test_reset_reproduces_output() {
        let events = draw_events(&SimpleEvent::line(Point::new(0.0, 0.0), Point::new(120.0, 40.0), 7.0));
        let mut pipeline = Pipeline::default();
        let first = pipeline.process(&events);
        let curves: Vec<Curve> = pipeline.curves().iter().map(|c| (**c).clone()).collect();

        pipeline.reset();
        assert!(pipeline.paths().is_empty());
        assert!(pipeline.events().is_empty());

        assert_eq!(pipeline.process(&events), first);
        let again: Vec<Curve> = pipeline.curves().iter().map(|c| (**c).clone()).collect();
        assert_eq!(again, curves);
    }

    #[test]
    fn test_pipelines_are_independent() {
        let mut left = Pipeline::default();
        let mut right = Pipeline::default();
        left.process(&draw_events(&[SimpleEvent::new("t", 0.0, 0.0)]));
        assert_eq!(left.paths().len(), 1);
        assert!(right.paths().is_empty());
        assert!(right.process(&[]).is_empty());
    }

    #[test]
    fn test_held_back_curves_catch_up() {
        let events = draw_events(&SimpleEvent::line(Point::new(0.0, 0.0), Point::new(80.0, 80.0), 5.0));
        let mut reference = Pipeline::default();
        reference.process(&events);

        let mut pipeline = Pipeline::default();
        pipeline.set_curves_enabled(false);
        let (head, tail) = events.split_at(events.len() / 2);
        assert!(pipeline.process(head).is_empty());
        assert!(pipeline.process(tail).is_empty());
        assert!(pipeline.curves().is_empty());

        let replayed = pipeline.set_curves_enabled(true);
        assert!(replayed.contains(&Delta::Completed(0)));
        assert_eq!(*pipeline.curves(), *reference.curves());
    }
}
