//! Compact event scripts
//!
//! Writing out full [`TouchEvent`]s by hand is tedious. A script of
//! [`SimpleEvent`]s only names the touch, the location, whether the sample is
//! a prediction and which estimation index it refines; [`to_touch_events`]
//! fills in phases and update flags the way a digitizer would report them.

use std::collections::HashMap;

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{Phase, TouchEvent, TouchProperties, TouchType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleEvent {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub pred: bool,
    #[serde(default)]
    pub update: Option<u64>,
}

impl SimpleEvent {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            pred: false,
            update: None,
        }
    }

    /// A sample on a touch of its own.
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(Uuid::new_v4().to_string(), x, y)
    }

    pub fn predicted(mut self) -> Self {
        self.pred = true;
        self
    }

    pub fn update(mut self, index: u64) -> Self {
        self.update = Some(index);
        self
    }

    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Samples spaced `step` apart along the segment from `start` to `end`,
    /// all on one new touch.
    pub fn line(start: Point, end: Point, step: f64) -> Vec<SimpleEvent> {
        let touch = Uuid::new_v4().to_string();
        let mut events = vec![SimpleEvent::new(&touch, start.x, start.y)];
        if step <= 0.0 {
            events.push(SimpleEvent::new(&touch, end.x, end.y));
            return events;
        }

        let delta = end - start;
        let count = (delta.hypot() / step) as usize;
        let stride = delta.normalize() * step;
        let mut previous = start;
        for _ in 0..count {
            previous += stride;
            events.push(SimpleEvent::new(&touch, previous.x, previous.y));
        }
        if previous != end {
            events.push(SimpleEvent::new(&touch, end.x, end.y));
        }
        events
    }
}

/// Expand a script into full touch events.
///
/// The first confirmed sample of each touch begins it and the last confirmed
/// `moved` sample ends it. Samples sharing an estimation index expect a
/// location update, except the last one of the group, which settles it.
pub fn to_touch_events(script: &[SimpleEvent]) -> Vec<TouchEvent> {
    let mut phases = vec![Phase::Moved; script.len()];

    let mut open: Vec<&str> = Vec::new();
    for (index, event) in script.iter().enumerate() {
        if !event.pred && !open.contains(&event.id.as_str()) {
            open.push(&event.id);
            phases[index] = Phase::Began;
        }
    }
    for (index, event) in script.iter().enumerate().rev() {
        if event.pred || phases[index] != Phase::Moved {
            continue;
        }
        if let Some(pos) = open.iter().position(|id| *id == event.id) {
            open.remove(pos);
            phases[index] = Phase::Ended;
        }
    }

    let mut groups: HashMap<u64, Vec<usize>> = HashMap::new();
    for (index, event) in script.iter().enumerate() {
        if let Some(update) = event.update {
            groups.entry(update).or_default().push(index);
        }
    }
    let mut update_phases: Vec<Option<Phase>> = vec![None; script.len()];
    for indexes in groups.values() {
        for &index in indexes {
            update_phases[index] = Some(Phase::Moved);
        }
        if let (Some(&first), Some(&last)) = (indexes.first(), indexes.last()) {
            update_phases[first] = Some(Phase::Began);
            update_phases[last] = Some(Phase::Ended);
        }
    }

    script
        .iter()
        .zip(phases)
        .zip(update_phases)
        .map(|((event, phase), update_phase)| {
            let estimated = if update_phase.is_some() {
                TouchProperties::LOCATION
            } else {
                TouchProperties::empty()
            };
            let expecting = match update_phase {
                Some(phase) if phase != Phase::Ended => TouchProperties::LOCATION,
                _ => TouchProperties::empty(),
            };
            TouchEvent {
                touch_identifier: event.id.clone(),
                touch_type: TouchType::Direct,
                phase,
                location: event.location(),
                estimation_update_index: event.update,
                estimated_properties: estimated,
                estimated_properties_expecting_updates: expecting,
                is_update: update_phase.is_some_and(|phase| phase != Phase::Began),
                is_prediction: event.pred,
                ..Default::default()
            }
        })
        .collect()
}
