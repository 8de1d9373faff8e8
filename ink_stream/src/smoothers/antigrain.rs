//! Antigrain-style cubic interpolation
//!
//! Every segment `p1 -> p2` becomes a cubic whose control points are taken
//! from the midpoints of the neighboring chords, pulled towards the chord
//! midpoint by `smooth_factor`. The curve passes through every point.
//! Element `i` reads points `i - 2 ..= i + 1`, so the last point of an
//! unfinished line has no element yet.

use kurbo::Point;

use crate::index_range::IndexRange;
use crate::polyline::Polyline;

use super::{is_reachable, CurveElement, Smoother};

pub const DEFAULT_SMOOTH_FACTOR: f64 = 0.7;

#[derive(Debug, Clone, Copy)]
pub struct AntigrainSmoother {
    pub smooth_factor: f64,
}

impl Default for AntigrainSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTH_FACTOR)
    }
}

impl AntigrainSmoother {
    pub fn new(smooth_factor: f64) -> Self {
        Self { smooth_factor }
    }

    fn control_points(&self, p0: Point, p1: Point, p2: Point, p3: Point) -> (Point, Point) {
        let c1 = p0.midpoint(p1);
        let c2 = p1.midpoint(p2);
        let c3 = p2.midpoint(p3);

        let len1 = p0.distance(p1);
        let len2 = p1.distance(p2);
        let len3 = p2.distance(p3);

        let k1 = len1 / (len1 + len2);
        let k2 = len2 / (len2 + len3);

        let m1 = c1 + (c2 - c1) * k1;
        let m2 = c2 + (c3 - c2) * k2;

        let sf = self.smooth_factor;
        let ctrl1 = m1 + (c2 - m1) * sf + (p1 - m1);
        let ctrl2 = m2 + (c2 - m2) * sf + (p2 - m2);

        // coincident points give 0/0 above
        let ctrl1 = if ctrl1.is_nan() { p1 } else { ctrl1 };
        let ctrl2 = if ctrl2.is_nan() { p2 } else { ctrl2 };
        (ctrl1, ctrl2)
    }
}

impl Smoother for AntigrainSmoother {
    fn element(&self, line: &Polyline, index: usize) -> CurveElement {
        let points = &line.points;
        if index == 0 {
            return CurveElement::MoveTo(points[0]);
        }
        let p1 = points[index - 1].location;
        let p0 = if index >= 2 {
            points[index - 2].location
        } else {
            p1
        };
        let p2 = points[index].location;
        let is_last = line.is_complete && Some(index) == self.max_element_index(line);
        let p3 = if is_last {
            p2
        } else {
            points[index + 1].location
        };

        let (ctrl1, ctrl2) = self.control_points(p0, p1, p2, p3);
        CurveElement::CurveTo {
            point: points[index],
            ctrl1,
            ctrl2,
        }
    }

    fn max_element_index(&self, line: &Polyline) -> Option<usize> {
        let count = line.len();
        if count == 0 {
            None
        } else if !line.is_complete {
            Some(count.saturating_sub(2))
        } else if count == 1 {
            Some(0)
        } else {
            Some(count - 1)
        }
    }

    fn element_indexes(
        &self,
        line: &Polyline,
        changed: &IndexRange,
        current: &[CurveElement],
    ) -> IndexRange {
        let max = self.max_element_index(line);
        let mut affected = IndexRange::new();
        for point in changed {
            let first = if point > 1 { point - 1 } else { point };
            for index in first..=point + 2 {
                if is_reachable(max, current, index) {
                    affected.insert(index);
                }
            }
        }
        affected
    }
}
