//! Normalized integer ranges shared by the population and calculate-and-save phases.

use serde::{Deserialize, Serialize};

/// Half-open integer range `[start, end)` with `start <= end` guaranteed.
///
/// Construction swaps inverted bounds, so `WorkRange::new(500, 0)` and
/// `WorkRange::new(0, 500)` are the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkRange {
    start: i64,
    end: i64,
}

impl WorkRange {
    pub fn new(start: i64, end: i64) -> Self {
        if start > end {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of integers in the range.
    pub fn len(&self) -> u64 {
        self.end.abs_diff(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Iterate `start, start + 1, .., end - 1`.
    pub fn iter(&self) -> std::ops::Range<i64> {
        self.start..self.end
    }
}

impl IntoIterator for WorkRange {
    type Item = i64;
    type IntoIter = std::ops::Range<i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Display for WorkRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
