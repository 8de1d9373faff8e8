//! Editable point sequences derived from touch paths
//!
//! A [`Polyline`] mirrors one [`TouchPath`] as plain values that the filter
//! stages are free to move, drop or smooth. Indices always refer to the
//! points that exist now: updates patch in place, new points are appended
//! and removed points come off the end.

use std::fmt;

use kurbo::{Point, Rect};
use log::warn;

use crate::index_range::IndexRange;
use crate::touch_path::{PathPoint, TouchPath};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylinePoint {
    pub location: Point,
    pub force: f64,
    pub altitude_angle: f64,
    pub azimuth: f64,
    pub expects_update: bool,
    pub is_prediction: bool,
}

impl PolylinePoint {
    pub fn new(location: Point) -> Self {
        Self {
            location,
            force: 1.0,
            altitude_angle: 0.0,
            azimuth: 0.0,
            expects_update: false,
            is_prediction: false,
        }
    }

    pub fn x(&self) -> f64 {
        self.location.x
    }

    pub fn y(&self) -> f64 {
        self.location.y
    }
}

impl From<&PathPoint> for PolylinePoint {
    fn from(point: &PathPoint) -> Self {
        let event = point.event();
        Self {
            location: event.location,
            force: event.force,
            altitude_angle: event.altitude_angle,
            azimuth: event.azimuth,
            expects_update: point.expects_update(),
            is_prediction: point.is_prediction(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub touch_identifier: String,
    pub is_complete: bool,
    pub points: Vec<PolylinePoint>,
}

impl Polyline {
    pub fn from_path(path: &TouchPath) -> Self {
        Self {
            touch_identifier: path.touch_identifier().to_string(),
            is_complete: path.is_complete(),
            points: path.points().map(PolylinePoint::from).collect(),
        }
    }

    pub fn from_points(points: Vec<PolylinePoint>, is_complete: bool) -> Self {
        Self {
            touch_identifier: String::new(),
            is_complete,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?.location;
        Some(self.points.iter().fold(
            Rect::from_points(first, first),
            |rect, point| rect.union_pt(point.location),
        ))
    }

    /// Bring the points named by `indexes` in line with `path`.
    ///
    /// Indices inside the path are overwritten, or appended when they are the
    /// next index. Indices past the end of the path are removed, highest
    /// first. An index that does not exist on either side is logged and
    /// skipped.
    pub fn update(&mut self, path: &TouchPath, indexes: &IndexRange) -> IndexRange {
        let mut removed = IndexRange::new();
        for index in indexes {
            let Some(point) = path.point(index) else {
                removed.insert(index);
                continue;
            };
            let point = PolylinePoint::from(point);
            if index < self.points.len() {
                self.points[index] = point;
            } else if index == self.points.len() {
                self.points.push(point);
            } else {
                warn!(
                    "polyline {} has {} points, cannot place point {index}",
                    self.touch_identifier,
                    self.points.len()
                );
            }
        }

        for index in removed.iter().rev() {
            if index < self.points.len() {
                self.points.remove(index);
            } else {
                warn!(
                    "polyline {} has {} points, cannot remove point {index}",
                    self.touch_identifier,
                    self.points.len()
                );
            }
        }

        self.is_complete = path.is_complete();
        *indexes
    }
}

impl fmt::Display for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "({}, {})", point.x(), point.y())?;
        }
        write!(f, "]")
    }
}
