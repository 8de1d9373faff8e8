//! Savitzky–Golay smoothing
//!
//! Each point is replaced by a weighted average of up to `2W + 1` neighbors,
//! with weights from a least-squares cubic fit (Gram polynomial form). Near
//! either end of a line the window shrinks to the distance to that end, and
//! points one step from an end are not smoothed at all.
//!
//! Because a point only depends on the input within `W` of it, an update to
//! input range `R` only needs `[min(R) - W, max(R) + W]` recomputed.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use kurbo::Vec2;
use log::{trace, warn};

use crate::index_range::IndexRange;
use crate::polyline::Polyline;
use crate::polyline_stream::PolylineOutput;
use crate::stream::{Consumers, Delta, Output, Stream};

pub const MIN_WINDOW: usize = 2;
pub const MAX_WINDOW: usize = 12;
pub const DEFAULT_WINDOW: usize = 2;
pub const DEFAULT_STRENGTH: f64 = 1.0;

/// Cubic fit, smoothing rather than differentiating.
const ORDER: i64 = 3;
const DERIVATIVE: i64 = 0;

/// Convolution weights, computed once per window size.
#[derive(Debug, Default)]
pub struct Coefficients {
    cache: HashMap<usize, Vec<f64>>,
}

impl Coefficients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weights for offsets `0..=window`. The filter is symmetric, so offset
    /// `-k` uses the weight of `k`.
    pub fn weights(&mut self, window: usize) -> &[f64] {
        self.cache.entry(window).or_insert_with(|| {
            let m = window as i64;
            (0..=m)
                .map(|position| weight(0, position, m, ORDER, DERIVATIVE))
                .collect()
        })
    }

    pub fn weight(&mut self, position: isize, window: usize) -> f64 {
        let weights = self.weights(window);
        weights.get(position.unsigned_abs()).copied().unwrap_or(0.0)
    }
}

/// Generalized factorial `a (a - 1) ... (a - b + 1)`.
fn gen_fact(a: i64, b: i64) -> f64 {
    (a - b + 1..=a).map(|x| x as f64).product()
}

/// Gram polynomial of order `k` (or its `s`th derivative) evaluated at `i`
/// over `2m + 1` points.
fn gram_poly(i: i64, m: i64, k: i64, s: i64) -> f64 {
    if k > 0 {
        let g1 = gram_poly(i, m, k - 1, s);
        let g2 = gram_poly(i, m, k - 1, s - 1);
        let g3 = gram_poly(i, m, k - 2, s);
        let (i, m, k, s) = (i as f64, m as f64, k as f64, s as f64);
        (4.0 * k - 2.0) / (k * (2.0 * m - k + 1.0)) * (i * g1 + s * g2)
            - ((k - 1.0) * (2.0 * m + k)) / (k * (2.0 * m - k + 1.0)) * g3
    } else if k == 0 && s == 0 {
        1.0
    } else {
        0.0
    }
}

/// Weight of data point `t` for the least-squares point `i` of the `s`th
/// derivative, over `2m + 1` points with polynomial order `n`.
fn weight(i: i64, t: i64, m: i64, n: i64, s: i64) -> f64 {
    (0..=n)
        .map(|k| {
            (2 * k + 1) as f64 * (gen_fact(2 * m, k) / gen_fact(2 * m + k + 1, k + 1))
                * gram_poly(i, m, k, 0)
                * gram_poly(t, m, k, s)
        })
        .sum()
}

/// Smooth `line` from `input`, recomputing only what `changed` can affect,
/// or everything when `changed` is `None`. Returns the recomputed range.
fn smooth_line(
    coefficients: &mut Coefficients,
    window: usize,
    strength: f64,
    line: &mut Polyline,
    input: &Polyline,
    changed: Option<&IndexRange>,
) -> IndexRange {
    if input.len() > line.len() {
        line.points.extend_from_slice(&input.points[line.len()..]);
    } else {
        line.points.truncate(input.len());
    }
    line.is_complete = input.is_complete;

    let count = line.len();
    if count == 0 {
        return IndexRange::new();
    }
    let range = match changed {
        Some(changed) => match changed.as_range() {
            Some(range) => {
                let start = range.start().saturating_sub(window);
                let end = (range.end() + window).min(count - 1);
                if start > end {
                    return IndexRange::new();
                }
                start..=end
            }
            None => 0..=count - 1,
        },
        None => 0..=count - 1,
    };

    for index in range.clone() {
        let mut point = input.points[index];
        let span = window.min(index).min(count - 1 - index);
        if span > 1 {
            let weights = coefficients.weights(span);
            let smoothed = input.points[index - span..=index + span]
                .iter()
                .enumerate()
                .fold(Vec2::ZERO, |sum, (k, neighbor)| {
                    sum + neighbor.location.to_vec2() * weights[k.abs_diff(span)]
                });
            point.location =
                (point.location.to_vec2() * (1.0 - strength) + smoothed * strength).to_point();
        }
        line.points[index] = point;
    }
    range.into()
}

fn fresh(input: &Polyline) -> Polyline {
    Polyline {
        touch_identifier: input.touch_identifier.clone(),
        is_complete: input.is_complete,
        points: Vec::with_capacity(input.len()),
    }
}

/// The incremental smoothing stage.
#[derive(Debug)]
pub struct SavitzkyGolay {
    window: usize,
    strength: f64,
    enabled: bool,
    coefficients: Coefficients,
    lines: Vec<Rc<Polyline>>,
    /// Lines that changed while the stage was disabled
    stale: HashSet<usize>,
    consumers: Consumers<PolylineOutput>,
}

impl Default for SavitzkyGolay {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_STRENGTH)
    }
}

impl SavitzkyGolay {
    /// `window` is clamped to `2..=12` and `strength` to `0..=1`.
    pub fn new(window: usize, strength: f64) -> Self {
        Self {
            window: window.clamp(MIN_WINDOW, MAX_WINDOW),
            strength: strength.clamp(0.0, 1.0),
            enabled: true,
            coefficients: Coefficients::new(),
            lines: Vec::new(),
            stale: HashSet::new(),
            consumers: Consumers::new(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn lines(&self) -> &[Rc<Polyline>] {
        &self.lines
    }

    fn smooth(&mut self, index: usize, input: &Polyline, changed: Option<&IndexRange>) -> IndexRange {
        while self.lines.len() <= index {
            self.lines.push(Rc::new(fresh(input)));
        }
        let line = Rc::make_mut(&mut self.lines[index]);
        smooth_line(
            &mut self.coefficients,
            self.window,
            self.strength,
            line,
            input,
            changed,
        )
    }
}

impl Stream for SavitzkyGolay {
    type Consumes = PolylineOutput;
    type Produces = PolylineOutput;

    fn produce(&mut self, input: &PolylineOutput) -> PolylineOutput {
        if !self.enabled {
            super::forward_unfiltered(&mut self.lines, &mut self.stale, input);
            self.consumers.notify(input);
            return input.clone();
        }

        let mut deltas = Vec::with_capacity(input.deltas.len());
        for delta in &input.deltas {
            match delta {
                Delta::Added(index) => {
                    let Some(line) = input.items.get(*index) else {
                        warn!("added line {index} is missing from the batch");
                        continue;
                    };
                    self.stale.remove(index);
                    self.smooth(*index, line, None);
                    deltas.push(delta.clone());
                }
                Delta::Updated(index, changed) => {
                    let Some(line) = input.items.get(*index) else {
                        warn!("updated line {index} is missing from the batch");
                        continue;
                    };
                    let changed = if self.stale.remove(index) || *index >= self.lines.len() {
                        None
                    } else {
                        Some(changed)
                    };
                    let updated = self.smooth(*index, line, changed);
                    deltas.push(Delta::Updated(*index, updated));
                }
                Delta::Completed(index) => {
                    if let Some(line) = self.lines.get_mut(*index) {
                        Rc::make_mut(line).is_complete = true;
                    }
                    deltas.push(delta.clone());
                }
                Delta::Unhandled(_) => deltas.push(delta.clone()),
            }
        }

        let mut stale: Vec<usize> = self.stale.drain().collect();
        stale.sort_unstable();
        for index in stale {
            if let Some(line) = input.items.get(index) {
                let updated = self.smooth(index, line, None);
                deltas.push(Delta::Updated(index, updated));
            }
        }

        trace!("smoothing produced {} deltas", deltas.len());
        let output = Output::new(self.lines.clone(), deltas);
        self.consumers.notify(&output);
        output
    }

    fn reset(&mut self) {
        self.lines.clear();
        self.stale.clear();
        self.consumers.reset();
    }

    fn consumers_mut(&mut self) -> &mut Consumers<PolylineOutput> {
        &mut self.consumers
    }
}

/// Reference smoother that resmooths every line on every batch.
///
/// Much slower than [`SavitzkyGolay`] but trivially correct, which makes it
/// the yardstick for the incremental stage.
#[derive(Debug)]
pub struct NaiveSavitzkyGolay {
    window: usize,
    strength: f64,
    coefficients: Coefficients,
    consumers: Consumers<PolylineOutput>,
}

impl Default for NaiveSavitzkyGolay {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_STRENGTH)
    }
}

impl NaiveSavitzkyGolay {
    pub fn new(window: usize, strength: f64) -> Self {
        Self {
            window: window.clamp(MIN_WINDOW, MAX_WINDOW),
            strength: strength.clamp(0.0, 1.0),
            coefficients: Coefficients::new(),
            consumers: Consumers::new(),
        }
    }
}

impl Stream for NaiveSavitzkyGolay {
    type Consumes = PolylineOutput;
    type Produces = PolylineOutput;

    fn produce(&mut self, input: &PolylineOutput) -> PolylineOutput {
        let lines = input
            .items
            .iter()
            .map(|line| {
                let mut smoothed = fresh(line);
                smooth_line(
                    &mut self.coefficients,
                    self.window,
                    self.strength,
                    &mut smoothed,
                    line,
                    None,
                );
                Rc::new(smoothed)
            })
            .collect();
        let output = Output::new(lines, input.deltas.clone());
        self.consumers.notify(&output);
        output
    }

    fn reset(&mut self) {
        self.consumers.reset();
    }

    fn consumers_mut(&mut self) -> &mut Consumers<PolylineOutput> {
        &mut self.consumers
    }
}
