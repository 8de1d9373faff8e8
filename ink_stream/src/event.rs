//! Input events
//!
//! A [`DrawEvent`] is what callers feed into the pipeline: a pointer sample
//! ([`TouchEvent`]), a tool change ([`ToolEvent`]), or anything else, which is
//! passed downstream untouched. All of them round-trip through JSON so that a
//! recorded session can be replayed deterministically.

use bitflags::bitflags;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Began,
    Moved,
    Stationary,
    Ended,
    Cancelled,
}

impl Phase {
    /// True for the phases that finish a stroke.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Ended | Phase::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchType {
    #[default]
    Direct,
    Indirect,
    Stylus,
    IndirectPointer,
}

bitflags! {
    /// Sample properties that a digitizer may refine after the fact.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TouchProperties: u8 {
        const FORCE = 1 << 0;
        const AZIMUTH = 1 << 1;
        const ALTITUDE = 1 << 2;
        const LOCATION = 1 << 3;
    }
}

/// Identity of the logical point a sample refines, scoped to one touch.
///
/// Corrections carry the estimation index of the sample they correct, so
/// every sample sharing an index lands on the same point. Samples without an
/// index are their own point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PointKey {
    Estimation(u64),
    Event(String),
}

/// One raw pointer sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchEvent {
    /// Unique per event, even for events built from the same touch
    pub identifier: String,
    /// Shared by every event of one continuous touch
    pub touch_identifier: String,
    pub timestamp: f64,
    pub touch_type: TouchType,
    pub phase: Phase,
    pub force: f64,
    pub maximum_possible_force: f64,
    pub altitude_angle: f64,
    pub azimuth_unit_vector: Vec2,
    pub azimuth: f64,
    pub major_radius: f64,
    pub major_radius_tolerance: f64,
    pub location: Point,
    pub estimation_update_index: Option<u64>,
    pub estimated_properties: TouchProperties,
    pub estimated_properties_expecting_updates: TouchProperties,
    pub is_update: bool,
    pub is_prediction: bool,
}

impl Default for TouchEvent {
    fn default() -> Self {
        Self {
            identifier: Uuid::new_v4().to_string(),
            touch_identifier: String::new(),
            timestamp: 0.0,
            touch_type: TouchType::Direct,
            phase: Phase::Moved,
            force: 1.0,
            maximum_possible_force: 1.0,
            altitude_angle: 0.0,
            azimuth_unit_vector: Vec2::ZERO,
            azimuth: 0.0,
            major_radius: 1.0,
            major_radius_tolerance: 1.0,
            location: Point::ZERO,
            estimation_update_index: None,
            estimated_properties: TouchProperties::empty(),
            estimated_properties_expecting_updates: TouchProperties::empty(),
            is_update: false,
            is_prediction: false,
        }
    }
}

impl TouchEvent {
    pub fn new(touch_identifier: impl Into<String>, phase: Phase, location: Point) -> Self {
        Self {
            touch_identifier: touch_identifier.into(),
            phase,
            location,
            ..Default::default()
        }
    }

    /// Mark this sample as a speculative prediction.
    pub fn predicted(mut self) -> Self {
        self.is_prediction = true;
        self
    }

    /// Tie this sample to an estimation index, with the properties that are
    /// still expected to change in a later sample.
    pub fn estimated(mut self, index: u64, expecting: TouchProperties) -> Self {
        self.estimation_update_index = Some(index);
        self.estimated_properties |= TouchProperties::LOCATION | expecting;
        self.estimated_properties_expecting_updates = expecting;
        self
    }

    pub fn with_force(mut self, force: f64) -> Self {
        self.force = force;
        self
    }

    pub fn point_key(&self) -> PointKey {
        match self.estimation_update_index {
            Some(index) => PointKey::Estimation(index),
            None => PointKey::Event(self.identifier.clone()),
        }
    }

    /// True while the digitizer has promised a refinement of force, azimuth
    /// or location for this sample.
    pub fn expects_update(&self) -> bool {
        self.estimated_properties_expecting_updates.intersects(
            TouchProperties::FORCE | TouchProperties::AZIMUTH | TouchProperties::LOCATION,
        )
    }
}

/// Stroke appearance chosen by the active tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStyle {
    pub width: f64,
    /// CSS color string, or `None` for an eraser
    pub color: Option<String>,
}

impl Default for ToolStyle {
    fn default() -> Self {
        Self {
            width: 1.5,
            color: Some("#000000".to_string()),
        }
    }
}

impl ToolStyle {
    pub fn new(width: f64, color: Option<&str>) -> Self {
        Self {
            width,
            color: color.map(str::to_string),
        }
    }

    pub fn is_eraser(&self) -> bool {
        self.color.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEvent {
    pub identifier: String,
    pub style: ToolStyle,
}

impl ToolEvent {
    pub fn new(style: ToolStyle) -> Self {
        Self {
            identifier: Uuid::new_v4().to_string(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawEvent {
    Touch(TouchEvent),
    Tool(ToolEvent),
    Other { identifier: String },
}

impl DrawEvent {
    pub fn identifier(&self) -> &str {
        match self {
            DrawEvent::Touch(event) => &event.identifier,
            DrawEvent::Tool(event) => &event.identifier,
            DrawEvent::Other { identifier } => identifier,
        }
    }

    pub fn as_touch(&self) -> Option<&TouchEvent> {
        match self {
            DrawEvent::Touch(event) => Some(event),
            _ => None,
        }
    }
}

impl From<TouchEvent> for DrawEvent {
    fn from(event: TouchEvent) -> Self {
        DrawEvent::Touch(event)
    }
}

impl From<ToolEvent> for DrawEvent {
    fn from(event: ToolEvent) -> Self {
        DrawEvent::Tool(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_key_prefers_estimation_index() {
        let plain = TouchEvent::new("a", Phase::Began, Point::new(1.0, 2.0));
        assert_eq!(plain.point_key(), PointKey::Event(plain.identifier.clone()));

        let estimated = plain.clone().estimated(7, TouchProperties::LOCATION);
        assert_eq!(estimated.point_key(), PointKey::Estimation(7));
        assert!(estimated.expects_update());
    }

    #[test]
    fn test_altitude_alone_does_not_expect_update() {
        let event = TouchEvent::new("a", Phase::Moved, Point::ZERO)
            .estimated(1, TouchProperties::ALTITUDE);
        assert!(!event.expects_update());
    }

    #[test]
    fn test_json_round_trip() {
        let events = vec![
            DrawEvent::from(
                TouchEvent::new("touch", Phase::Began, Point::new(100.0, 100.0))
                    .estimated(1, TouchProperties::LOCATION | TouchProperties::FORCE),
            ),
            DrawEvent::from(TouchEvent::new("touch", Phase::Moved, Point::new(200.0, 100.0)).predicted()),
            DrawEvent::from(ToolEvent::new(ToolStyle::new(4.0, None))),
            DrawEvent::Other {
                identifier: "marker".to_string(),
            },
        ];

        let json = serde_json::to_string_pretty(&events).unwrap();
        let decoded: Vec<DrawEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(events, decoded);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let json = r#"{
            "kind": "touch",
            "identifier": "e1",
            "touch_identifier": "t1",
            "phase": "began",
            "location": {"x": 3.0, "y": 4.0}
        }"#;
        let event: DrawEvent = serde_json::from_str(json).unwrap();
        let touch = event.as_touch().unwrap();
        assert_eq!(touch.force, 1.0);
        assert_eq!(touch.location, Point::new(3.0, 4.0));
        assert!(!touch.is_prediction);
    }
}
