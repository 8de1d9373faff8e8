//! Coalescing the samples of one touch into stable points
//!
//! Samples arrive out of order and speculatively: a digitizer reports a
//! sample, predicts a few more, then later corrects the first one. A
//! [`TouchPath`] folds that stream into an ordered list of points where each
//! point collects every sample that refined it.
//!
//! Points live in an arena and are addressed by handle. When predictions are
//! superseded their points go to a consumable pool, and the next prediction
//! or confirmed sample reuses one of them instead of allocating, so the
//! indices seen downstream stay stable while predictions churn.

use std::collections::{HashMap, VecDeque};

use kurbo::{Point, Rect};
use log::{debug, warn};

use crate::event::{PointKey, TouchEvent};
use crate::index_range::IndexRange;

/// Stable address of a point in a [`TouchPath`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointHandle(usize);

/// Every sample that refined one logical point, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPoint {
    events: Vec<TouchEvent>,
}

impl PathPoint {
    fn new(event: TouchEvent) -> Self {
        Self {
            events: vec![event],
        }
    }

    fn add(&mut self, event: TouchEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TouchEvent] {
        &self.events
    }

    /// The most recent sample, which is the point's current value.
    pub fn event(&self) -> &TouchEvent {
        // a point is created with one event and only ever grows
        &self.events[self.events.len() - 1]
    }

    pub fn location(&self) -> Point {
        self.event().location
    }

    /// True while no confirmed sample has reached this point.
    pub fn is_prediction(&self) -> bool {
        self.events.iter().all(|event| event.is_prediction)
    }

    pub fn expects_update(&self) -> bool {
        let event = self.event();
        event.is_prediction || event.expects_update()
    }
}

/// The coalesced points of one touch.
#[derive(Debug, Clone)]
pub struct TouchPath {
    touch_identifier: String,
    arena: Vec<PathPoint>,
    confirmed: Vec<PointHandle>,
    predicted: Vec<PointHandle>,
    /// Previously predicted points waiting to be reused
    consumable: VecDeque<PointHandle>,
    known: HashMap<PointKey, (PointHandle, usize)>,
}

impl TouchPath {
    /// Build a path from the first batch of samples of a touch. Returns
    /// `None` for an empty batch.
    pub fn new(events: &[TouchEvent]) -> Option<Self> {
        let first = events.first()?;
        let mut path = Self {
            touch_identifier: first.touch_identifier.clone(),
            arena: Vec::new(),
            confirmed: Vec::new(),
            predicted: Vec::new(),
            consumable: VecDeque::new(),
            known: HashMap::new(),
        };
        path.add(events);
        Some(path)
    }

    pub fn touch_identifier(&self) -> &str {
        &self.touch_identifier
    }

    /// Number of visible points: confirmed followed by predicted.
    pub fn len(&self) -> usize {
        self.confirmed.len() + self.predicted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn confirmed_len(&self) -> usize {
        self.confirmed.len()
    }

    pub fn predicted_len(&self) -> usize {
        self.predicted.len()
    }

    pub fn consumable_len(&self) -> usize {
        self.consumable.len()
    }

    pub fn point(&self, index: usize) -> Option<&PathPoint> {
        let handle = if index < self.confirmed.len() {
            self.confirmed[index]
        } else {
            *self.predicted.get(index - self.confirmed.len())?
        };
        Some(&self.arena[handle.0])
    }

    pub fn points(&self) -> impl Iterator<Item = &PathPoint> + '_ {
        self.confirmed
            .iter()
            .chain(&self.predicted)
            .map(move |handle| &self.arena[handle.0])
    }

    /// Smallest rectangle holding every point, predictions included.
    pub fn bounds(&self) -> Option<Rect> {
        let mut locations = self.points().map(PathPoint::location);
        let first = locations.next()?;
        Some(locations.fold(Rect::from_points(first, first), |rect, p| rect.union_pt(p)))
    }

    /// A path is complete once its last confirmed sample ended or cancelled
    /// the touch and no predictions are left.
    pub fn is_complete(&self) -> bool {
        let ended = self
            .confirmed
            .last()
            .is_some_and(|handle| self.arena[handle.0].event().phase.is_terminal());
        ended && self.predicted.is_empty()
    }

    /// Fold a batch of samples into the path and return the indices that
    /// changed, including indices that disappeared because predictions were
    /// dropped.
    pub fn add(&mut self, events: &[TouchEvent]) -> IndexRange {
        let mut changed = IndexRange::new();
        let starting_count = self.len();

        for event in events {
            if event.touch_identifier != self.touch_identifier {
                self.reject(event, "sample belongs to another touch");
                continue;
            }

            let key = event.point_key();
            if event.is_prediction {
                if self.is_complete() {
                    self.reject(event, "prediction for a complete path");
                    continue;
                }
                let handle = self.reuse_or_allocate(event);
                self.predicted.push(handle);
                changed.insert(self.len() - 1);
            } else if let Some(&(handle, index)) = self.known.get(&key) {
                self.arena[handle.0].add(event.clone());
                changed.insert(index);
                if event.phase.is_terminal() {
                    // the stroke ends here, whatever was predicted past it is stale
                    self.consumable.extend(self.predicted.drain(..));
                }
            } else if self.is_complete() {
                self.reject(event, "new point for a complete path");
            } else {
                self.consumable.extend(self.predicted.drain(..));
                let handle = self.reuse_or_allocate(event);
                self.confirmed.push(handle);
                let index = self.confirmed.len() - 1;
                self.known.insert(key, (handle, index));
                changed.insert(index);
            }
        }

        // Leftover consumable points sit just past the visible ones. Those that
        // were visible before this call were deleted and must be reported;
        // those that only existed during this call are dropped from the range.
        // Going from the highest index down keeps the range shrinking from its
        // end.
        let visible = self.len();
        for offset in (0..self.consumable.len()).rev() {
            let index = visible + offset;
            if index < starting_count {
                changed.insert(index);
            } else {
                changed.remove(index);
            }
        }

        if self.is_complete() {
            debug!("touch {} completed with {} points", self.touch_identifier, visible);
        }
        changed
    }

    fn reuse_or_allocate(&mut self, event: &TouchEvent) -> PointHandle {
        match self.consumable.pop_front() {
            Some(handle) => {
                self.arena[handle.0].add(event.clone());
                handle
            }
            None => {
                self.arena.push(PathPoint::new(event.clone()));
                PointHandle(self.arena.len() - 1)
            }
        }
    }

    fn reject(&self, event: &TouchEvent, reason: &str) {
        debug_assert!(
            false,
            "{reason}: event {} on touch {}",
            event.identifier, self.touch_identifier
        );
        warn!(
            "dropping event {} on touch {}: {reason}",
            event.identifier, self.touch_identifier
        );
    }
}

impl PartialEq for TouchPath {
    fn eq(&self, other: &Self) -> bool {
        self.touch_identifier == other.touch_identifier
            && self.len() == other.len()
            && self.points().eq(other.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Phase, TouchProperties};
    use crate::simple_event::{to_touch_events, SimpleEvent};

    fn locations(path: &TouchPath) -> Vec<Point> {
        path.points().map(PathPoint::location).collect()
    }

    #[test]
    fn test_empty_batch_builds_nothing() {
        assert!(TouchPath::new(&[]).is_none());
    }

    #[test]
    fn test_correction_keeps_prediction() {
        let first = TouchEvent::new("t", Phase::Began, Point::new(0.0, 0.0))
            .estimated(1, TouchProperties::LOCATION);
        let prediction = TouchEvent::new("t", Phase::Moved, Point::new(10.0, 0.0)).predicted();
        let mut correction = TouchEvent::new("t", Phase::Moved, Point::new(1.0, 1.0))
            .estimated(1, TouchProperties::empty());
        correction.is_update = true;

        let mut path = TouchPath::new(&[first]).unwrap();
        path.add(&[prediction]);
        let changed = path.add(&[correction]);

        assert_eq!(changed, IndexRange::single(0));
        assert_eq!(path.len(), 2);
        assert!(!path.is_complete());
        assert!(path.point(1).unwrap().is_prediction());
        assert_eq!(path.point(0).unwrap().location(), Point::new(1.0, 1.0));
        assert_eq!(path.point(0).unwrap().events().len(), 2);
        assert!(!path.point(0).unwrap().expects_update());
    }

    #[test]
    fn test_new_sample_recycles_predictions() {
        let events = [
            TouchEvent::new("t", Phase::Began, Point::new(0.0, 0.0)),
            TouchEvent::new("t", Phase::Moved, Point::new(10.0, 0.0)),
            TouchEvent::new("t", Phase::Moved, Point::new(20.0, 0.0)).predicted(),
            TouchEvent::new("t", Phase::Moved, Point::new(30.0, 0.0)).predicted(),
        ];
        let mut path = TouchPath::new(&events).unwrap();
        assert_eq!(path.confirmed_len(), 2);
        assert_eq!(path.predicted_len(), 2);

        let next = TouchEvent::new("t", Phase::Moved, Point::new(15.0, 1.0));
        let changed = path.add(&[next]);

        assert_eq!(path.confirmed_len(), 3);
        assert_eq!(path.predicted_len(), 0);
        assert_eq!(path.consumable_len(), 1);
        // index 2 was reused, index 3 disappeared
        assert_eq!(changed, IndexRange::from(2..=3));
        assert_eq!(path.point(2).unwrap().events().len(), 2);
        assert!(!path.point(2).unwrap().is_prediction());
        assert_eq!(path.bounds(), Some(kurbo::Rect::new(0.0, 0.0, 15.0, 1.0)));
    }

    #[test]
    fn test_end_drops_predictions() {
        let events = to_touch_events(&[
            SimpleEvent::new("t", 100.0, 100.0).update(1),
            SimpleEvent::new("t", 200.0, 100.0).predicted(),
            SimpleEvent::new("t", 300.0, 100.0).predicted(),
            SimpleEvent::new("t", 110.0, 120.0).update(1),
        ]);

        let whole = TouchPath::new(&events).unwrap();
        assert!(whole.is_complete());
        assert_eq!(locations(&whole), vec![Point::new(110.0, 120.0)]);

        let mut split = TouchPath::new(&events[..3]).unwrap();
        assert_eq!(split.len(), 3);
        let changed = split.add(&events[3..]);
        assert_eq!(changed, IndexRange::from(0..=2));
        assert_eq!(whole, split);
    }

    #[test]
    fn test_predictions_only_seen_in_one_call_are_not_reported() {
        let events = to_touch_events(&[
            SimpleEvent::new("t", 0.0, 0.0),
            SimpleEvent::new("t", 5.0, 0.0).predicted(),
            SimpleEvent::new("t", 6.0, 0.0).predicted(),
            SimpleEvent::new("t", 4.0, 0.0),
        ]);
        let mut path = TouchPath::new(&events[..1]).unwrap();
        let changed = path.add(&events[1..]);
        assert_eq!(path.len(), 2);
        assert_eq!(changed, IndexRange::from(1..=1));
    }

    #[test]
    fn test_every_split_matches() {
        let script = [
            SimpleEvent::new("t", 100.0, 100.0).update(1),
            SimpleEvent::new("t", 200.0, 100.0).predicted(),
            SimpleEvent::new("t", 300.0, 100.0).predicted(),
            SimpleEvent::new("t", 110.0, 120.0).update(1),
            SimpleEvent::new("t", 200.0, 100.0).update(2),
            SimpleEvent::new("t", 220.0, 120.0).update(2),
            SimpleEvent::new("t", 320.0, 120.0),
        ];
        let events = to_touch_events(&script);
        let whole = TouchPath::new(&events).unwrap();

        for split in 1..events.len() {
            let mut path = TouchPath::new(&events[..split]).unwrap();
            path.add(&events[split..]);
            assert_eq!(whole, path, "split at {split}");
        }
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "another touch"))]
    fn test_foreign_touch_is_rejected() {
        let mut path = TouchPath::new(&[TouchEvent::new("a", Phase::Began, Point::ZERO)]).unwrap();
        let changed = path.add(&[TouchEvent::new("b", Phase::Moved, Point::ZERO)]);
        assert!(changed.is_empty());
        assert_eq!(path.len(), 1);
    }
}
