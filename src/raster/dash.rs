//! Dash patterns and the run-length cursor that carries their phase from one
//! segment to the next.

use crate::note::attrib::normalize_dash;

/// Non-empty on/off pattern; entries are at least one step long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashPattern {
    entries: Vec<u32>,
}

impl DashPattern {
    /// Builds a pattern, returning `None` for an empty (solid) pattern.
    pub fn new(entries: &[u32]) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self {
            entries: normalize_dash(entries),
        })
    }

    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Sum of all entries.
    pub fn period(&self) -> u64 {
        self.entries.iter().map(|&len| len as u64).sum()
    }

    /// Steps after which a cursor returns to the same state. An odd number
    /// of entries flips the phase once per period, so it takes two.
    pub fn cycle(&self) -> u64 {
        if self.entries.len() % 2 == 0 {
            self.period()
        } else {
            2 * self.period()
        }
    }
}

/// Position inside a dash pattern.
///
/// Passed into every dashed segment draw and handed back updated, so a
/// pattern flows across the segments of one path. Reset at `move_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashCursor {
    /// Next pattern entry to load
    pub index: usize,
    /// Steps left in the current entry; zero loads the next one
    pub remaining: u32,
    /// Whether the current entry is drawn or skipped
    pub drawing: bool,
}

impl Default for DashCursor {
    fn default() -> Self {
        Self {
            index: 0,
            remaining: 0,
            drawing: true,
        }
    }
}

impl DashCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cursor to the start of the pattern in the drawing phase.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Consumes `steps` samples of the pattern.
    ///
    /// `emit(from, to)` is called for every drawn slice, with sample indices
    /// in `0..=steps`. Returns the updated cursor and whether the walk ended
    /// exactly on an entry boundary.
    pub fn advance(
        mut self,
        pattern: &DashPattern,
        steps: usize,
        mut emit: impl FnMut(usize, usize),
    ) -> (Self, bool) {
        if steps == 0 {
            return (self, self.remaining == 0);
        }
        let entries = pattern.entries();
        let mut from = 0usize;

        loop {
            if self.remaining == 0 {
                self.remaining = entries[self.index % entries.len()];
                self.index = (self.index + 1) % entries.len();
            }

            let take = (steps - from).min(self.remaining as usize);
            let to = from + take;
            self.remaining -= take as u32;

            if self.drawing && to > from {
                emit(from, to);
            }

            if self.remaining != 0 {
                break;
            }
            self.drawing = !self.drawing;

            from = to;
            if from >= steps {
                break;
            }
        }

        (self, self.remaining == 0)
    }

    /// Consumes `steps` samples without drawing, skipping whole cycles.
    pub fn skip(self, pattern: &DashPattern, steps: usize) -> (Self, bool) {
        let steps = (steps as u64 % pattern.cycle()) as usize;
        self.advance(pattern, steps, |_, _| {})
    }

    /// Like [`advance`](Self::advance), but only samples in `visible`
    /// (inclusive, within `0..=steps`) are emitted; the rest are skipped
    /// with the phase kept continuous. `None` skips the whole walk.
    pub fn advance_within(
        self,
        pattern: &DashPattern,
        steps: usize,
        visible: Option<(usize, usize)>,
        mut emit: impl FnMut(usize, usize),
    ) -> (Self, bool) {
        let Some((lo, hi)) = visible else {
            return self.skip(pattern, steps);
        };
        let hi = hi.min(steps);
        let lo = lo.min(hi);
        let (cursor, _) = self.skip(pattern, lo);
        let (cursor, boundary) = cursor.advance(pattern, hi - lo, |i, j| emit(lo + i, lo + j));
        if hi == steps {
            return (cursor, boundary);
        }
        cursor.skip(pattern, steps - hi)
    }
}
