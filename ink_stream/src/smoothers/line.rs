//! Straight segments between consecutive points.

use crate::index_range::IndexRange;
use crate::polyline::Polyline;

use super::{is_reachable, CurveElement, Smoother};

#[derive(Debug, Clone, Copy, Default)]
pub struct LineSmoother;

impl Smoother for LineSmoother {
    fn element(&self, line: &Polyline, index: usize) -> CurveElement {
        let point = line.points[index];
        if index == 0 {
            CurveElement::MoveTo(point)
        } else {
            CurveElement::LineTo(point)
        }
    }

    fn max_element_index(&self, line: &Polyline) -> Option<usize> {
        line.len().checked_sub(1)
    }

    fn element_indexes(
        &self,
        line: &Polyline,
        changed: &IndexRange,
        current: &[CurveElement],
    ) -> IndexRange {
        let max = self.max_element_index(line);
        changed
            .iter()
            .filter(|&index| is_reachable(max, current, index))
            .collect()
    }
}
