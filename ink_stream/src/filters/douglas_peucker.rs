//! Douglas–Peucker point reduction
//!
//! Keeps the smallest subset of points whose polyline stays within `epsilon`
//! of the original. Two implementations are provided: a plain recursive one
//! and an iterative one driven by an explicit span stack and a keep mask.
//! Both pick the farthest point with a strict comparison, so the first
//! maximum wins and their output is identical.

use std::collections::HashSet;
use std::rc::Rc;

use kurbo::Point;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::polyline::{Polyline, PolylinePoint};
use crate::polyline_stream::PolylineOutput;
use crate::stream::{Consumers, Delta, Output, Stream};

pub const DEFAULT_EPSILON: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimplifyMethod {
    Recursive,
    #[default]
    Iterative,
}

/// Distance from `point` to the infinite line through `start` and `end`, or
/// to `start` when the two coincide.
fn perpendicular_distance(point: Point, start: Point, end: Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return point.distance(start);
    }
    (dy * point.x - dx * point.y + end.x * start.y - end.y * start.x).abs() / length
}

/// Index and distance of the interior point farthest from the chord
/// `points[start]`–`points[end]`. Returns `(start, 0.0)` when no interior
/// point is strictly farther than zero.
fn farthest(points: &[PolylinePoint], start: usize, end: usize, keep: Option<&[bool]>) -> (usize, f64) {
    let (first, last) = (points[start].location, points[end].location);
    let mut index = start;
    let mut dmax = 0.0;
    for i in start + 1..end {
        if keep.is_some_and(|keep| !keep[i]) {
            continue;
        }
        let d = perpendicular_distance(points[i].location, first, last);
        if d > dmax {
            index = i;
            dmax = d;
        }
    }
    (index, dmax)
}

pub fn douglas_peucker_recursive(points: &[PolylinePoint], epsilon: f64) -> Vec<PolylinePoint> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let (index, dmax) = farthest(points, 0, last, None);
    if dmax > epsilon && index > 0 {
        let mut left = douglas_peucker_recursive(&points[..=index], epsilon);
        let right = douglas_peucker_recursive(&points[index..], epsilon);
        // both halves share the split point
        left.pop();
        left.extend(right);
        left
    } else {
        vec![points[0], points[last]]
    }
}

pub fn douglas_peucker_iterative(points: &[PolylinePoint], epsilon: f64) -> Vec<PolylinePoint> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut keep = vec![true; points.len()];
    let mut stack = vec![(0, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end - start < 2 {
            continue;
        }
        let (index, dmax) = farthest(points, start, end, Some(&keep));
        if dmax > epsilon && index > start {
            stack.push((start, index));
            stack.push((index, end));
        } else {
            keep[start + 1..end].fill(false);
        }
    }
    points
        .iter()
        .zip(keep)
        .filter_map(|(point, keep)| keep.then_some(*point))
        .collect()
}

/// The simplification stage.
///
/// Every line named by a delta is simplified again from scratch; updated
/// deltas are widened to cover the whole simplified line. While disabled the
/// stage forwards its input untouched and simplifies the lines it missed on
/// the next enabled batch.
#[derive(Debug)]
pub struct DouglasPeucker {
    epsilon: f64,
    method: SimplifyMethod,
    enabled: bool,
    lines: Vec<Rc<Polyline>>,
    stale: HashSet<usize>,
    consumers: Consumers<PolylineOutput>,
}

impl Default for DouglasPeucker {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON, SimplifyMethod::default())
    }
}

impl DouglasPeucker {
    pub fn new(epsilon: f64, method: SimplifyMethod) -> Self {
        Self {
            epsilon: epsilon.max(0.0),
            method,
            enabled: true,
            lines: Vec::new(),
            stale: HashSet::new(),
            consumers: Consumers::new(),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
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

    pub fn simplify(&self, points: &[PolylinePoint]) -> Vec<PolylinePoint> {
        match self.method {
            SimplifyMethod::Recursive => douglas_peucker_recursive(points, self.epsilon),
            SimplifyMethod::Iterative => douglas_peucker_iterative(points, self.epsilon),
        }
    }

    fn simplified(&self, line: &Polyline) -> Polyline {
        Polyline {
            touch_identifier: line.touch_identifier.clone(),
            is_complete: line.is_complete,
            points: self.simplify(&line.points),
        }
    }

    fn pass_through(&mut self, input: &PolylineOutput) -> PolylineOutput {
        super::forward_unfiltered(&mut self.lines, &mut self.stale, input);
        self.consumers.notify(input);
        input.clone()
    }
}

impl Stream for DouglasPeucker {
    type Consumes = PolylineOutput;
    type Produces = PolylineOutput;

    fn produce(&mut self, input: &PolylineOutput) -> PolylineOutput {
        if !self.enabled {
            return self.pass_through(input);
        }

        let mut touched: Vec<usize> = Vec::new();
        for index in input.deltas.iter().filter_map(Delta::index) {
            if !touched.contains(&index) {
                touched.push(index);
            }
        }
        let mut stale: Vec<usize> = self.stale.drain().filter(|i| !touched.contains(i)).collect();
        stale.sort_unstable();

        for index in self.lines.len()..input.items.len() {
            self.lines.push(Rc::clone(&input.items[index]));
        }
        for &index in touched.iter().chain(&stale) {
            if let Some(line) = input.items.get(index) {
                let simplified = self.simplified(line);
                self.lines[index] = Rc::new(simplified);
            }
        }

        let whole_line = |lines: &[Rc<Polyline>], index: usize| {
            Delta::Updated(index, (0..lines.get(index).map_or(0, |line| line.len())).into())
        };
        let mut deltas: Vec<Delta> = Vec::with_capacity(input.deltas.len() + stale.len());
        for delta in &input.deltas {
            let delta = match delta {
                Delta::Updated(index, _) => whole_line(&self.lines, *index),
                other => other.clone(),
            };
            if !deltas.contains(&delta) {
                deltas.push(delta);
            }
        }
        for index in stale {
            deltas.push(whole_line(&self.lines, index));
        }

        trace!("simplified {} lines", touched.len());
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
