//! Turning polylines into drawable curve elements
//!
//! A [`Smoother`] maps a polyline onto a sequence of [`CurveElement`]s, one
//! per point, where element `i` may look at a few neighboring points. The
//! bezier stage uses [`Smoother::element_indexes`] to rebuild only the
//! elements that a point change can reach.

use std::fmt;

use kurbo::{PathEl, Point};

use crate::index_range::IndexRange;
use crate::polyline::{Polyline, PolylinePoint};

pub mod antigrain;
pub mod line;

pub use antigrain::AntigrainSmoother;
pub use line::LineSmoother;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveElement {
    MoveTo(PolylinePoint),
    LineTo(PolylinePoint),
    CurveTo {
        point: PolylinePoint,
        ctrl1: Point,
        ctrl2: Point,
    },
}

impl CurveElement {
    /// The polyline point this element ends at.
    pub fn point(&self) -> &PolylinePoint {
        match self {
            CurveElement::MoveTo(point)
            | CurveElement::LineTo(point)
            | CurveElement::CurveTo { point, .. } => point,
        }
    }

    pub fn to_path_el(&self) -> PathEl {
        match self {
            CurveElement::MoveTo(point) => PathEl::MoveTo(point.location),
            CurveElement::LineTo(point) => PathEl::LineTo(point.location),
            CurveElement::CurveTo {
                point,
                ctrl1,
                ctrl2,
            } => PathEl::CurveTo(*ctrl1, *ctrl2, point.location),
        }
    }
}

pub trait Smoother: fmt::Debug {
    /// Element `index` of `line`. Only valid up to [`Smoother::max_element_index`].
    fn element(&self, line: &Polyline, index: usize) -> CurveElement;

    /// Highest element index that can be built from `line` right now, or
    /// `None` when nothing can be.
    fn max_element_index(&self, line: &Polyline) -> Option<usize>;

    /// Element indexes that depend on the points in `changed`.
    ///
    /// `current` is the element list as it was before the change, so
    /// elements that can no longer be built are still reported.
    fn element_indexes(
        &self,
        line: &Polyline,
        changed: &IndexRange,
        current: &[CurveElement],
    ) -> IndexRange;
}

/// Whether element `index` either exists now or can be built from `line`.
pub(crate) fn is_reachable(max: Option<usize>, current: &[CurveElement], index: usize) -> bool {
    max.is_some_and(|max| index <= max) || index < current.len()
}
