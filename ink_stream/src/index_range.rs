//! Contiguous index ranges
//!
//! Every delta in the pipeline describes the elements it touched with an
//! [`IndexRange`]: a single closed interval `[first, last]`, or nothing at
//! all. Inserting an index outside the interval widens it to the enclosing
//! span, so the range may over-report changes but never under-report them.

use std::fmt;
use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};

/// A closed interval of indices, or the empty range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    bounds: Option<(usize, usize)>,
}

impl IndexRange {
    pub fn new() -> Self {
        Self { bounds: None }
    }

    pub fn single(index: usize) -> Self {
        Self {
            bounds: Some((index, index)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Number of indices in the interval.
    pub fn len(&self) -> usize {
        self.bounds.map_or(0, |(first, last)| last - first + 1)
    }

    pub fn first(&self) -> Option<usize> {
        self.bounds.map(|(first, _)| first)
    }

    pub fn last(&self) -> Option<usize> {
        self.bounds.map(|(_, last)| last)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.bounds
            .is_some_and(|(first, last)| first <= index && index <= last)
    }

    /// Widen the range so that it covers `index`.
    pub fn insert(&mut self, index: usize) {
        self.bounds = Some(match self.bounds {
            Some((first, last)) => (first.min(index), last.max(index)),
            None => (index, index),
        });
    }

    pub fn insert_range(&mut self, range: RangeInclusive<usize>) {
        if range.is_empty() {
            return;
        }
        self.insert(*range.start());
        self.insert(*range.end());
    }

    /// Remove `index` if it sits on either end of the range.
    ///
    /// Interior indices cannot be removed without splitting the interval, so
    /// removing one is a no-op. Callers that need to drop a run of indices
    /// remove them from the outside in.
    pub fn remove(&mut self, index: usize) {
        let Some((first, last)) = self.bounds else {
            return;
        };
        if first == last {
            if index == first {
                self.bounds = None;
            }
        } else if index == first {
            self.bounds = Some((first + 1, last));
        } else if index == last {
            self.bounds = Some((first, last - 1));
        }
    }

    /// The smallest range covering both `self` and `other`.
    pub fn union(&self, other: &IndexRange) -> IndexRange {
        let mut ret = *self;
        if let Some((first, last)) = other.bounds {
            ret.insert(first);
            ret.insert(last);
        }
        ret
    }

    pub fn as_range(&self) -> Option<RangeInclusive<usize>> {
        self.bounds.map(|(first, last)| first..=last)
    }

    pub fn iter(&self) -> Iter {
        match self.bounds {
            Some((first, last)) => Iter {
                next: first,
                end: last + 1,
            },
            None => Iter { next: 0, end: 0 },
        }
    }
}

impl From<Range<usize>> for IndexRange {
    fn from(range: Range<usize>) -> Self {
        if range.is_empty() {
            Self::new()
        } else {
            Self {
                bounds: Some((range.start, range.end - 1)),
            }
        }
    }
}

impl From<RangeInclusive<usize>> for IndexRange {
    fn from(range: RangeInclusive<usize>) -> Self {
        let mut ret = Self::new();
        ret.insert_range(range);
        ret
    }
}

impl FromIterator<usize> for IndexRange {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut ret = Self::new();
        for index in iter {
            ret.insert(index);
        }
        ret
    }
}

impl Extend<usize> for IndexRange {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for index in iter {
            self.insert(index);
        }
    }
}

impl<'a> IntoIterator for &'a IndexRange {
    type Item = usize;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Some((first, last)) => write!(f, "[{first}..={last}]"),
            None => write!(f, "[]"),
        }
    }
}

/// Ascending iterator over an [`IndexRange`].
#[derive(Debug, Clone)]
pub struct Iter {
    next: usize,
    end: usize,
}

impl Iterator for Iter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next < self.end {
            self.next += 1;
            Some(self.next - 1)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Iter {
    fn next_back(&mut self) -> Option<usize> {
        if self.next < self.end {
            self.end -= 1;
            Some(self.end)
        } else {
            None
        }
    }
}

impl ExactSizeIterator for Iter {}
