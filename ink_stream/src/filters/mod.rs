//! Polyline filters: point reduction and smoothing.

use std::collections::HashSet;
use std::rc::Rc;

use crate::polyline::Polyline;
use crate::polyline_stream::PolylineOutput;
use crate::stream::Delta;

pub mod douglas_peucker;
pub mod savitzky_golay;

pub use douglas_peucker::{DouglasPeucker, SimplifyMethod};
pub use savitzky_golay::{NaiveSavitzkyGolay, SavitzkyGolay};

/// Mirror a batch that a disabled filter forwards untouched.
///
/// Only lines named by a delta, or new in this batch, take the raw input and
/// are marked stale. Every other line keeps its filtered points, which is
/// what the next stage still holds for it.
pub(crate) fn forward_unfiltered(
    lines: &mut Vec<Rc<Polyline>>,
    stale: &mut HashSet<usize>,
    input: &PolylineOutput,
) {
    for index in lines.len()..input.items.len() {
        lines.push(Rc::clone(&input.items[index]));
        stale.insert(index);
    }
    for index in input.deltas.iter().filter_map(Delta::index) {
        if let (Some(line), Some(item)) = (lines.get_mut(index), input.items.get(index)) {
            *line = Rc::clone(item);
            stale.insert(index);
        }
    }
}
