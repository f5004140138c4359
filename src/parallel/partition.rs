//! Contiguous work partitioning
//!
//! Splits the governing argument length into near-equal half-open slices, one
//! per worker. The last slice absorbs the remainder of the integer division and
//! empty slices are dropped, so fewer slices than workers come back whenever
//! `len < workers`.

use std::ops::Range;

/// Half-open index range `[start, end)` over the governing argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slice {
    pub start: usize,
    pub end: usize,
}

impl Slice {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of elements covered by the slice
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Range clamped to a sequence of length `len`
    pub fn clamped(&self, len: usize) -> Range<usize> {
        let end = self.end.min(len);
        self.start.min(end)..end
    }
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Partition `len` elements across `workers` slices
///
/// Uses `share = len / workers`; slice `i` starts at `i * share`, every slice but
/// the last ends at `min(start + share, len)` and the last one ends at `len`.
/// A worker count of zero is treated as one.
pub fn partition(len: usize, workers: usize) -> Vec<Slice> {
    let workers = workers.max(1);
    let share = len / workers;

    // Every slice but the last is empty; skip walking the worker range
    if share == 0 {
        tracing::trace!("Partitioned {} items across {} workers into one slice", len, workers);
        return if len == 0 {
            Vec::new()
        } else {
            vec![Slice::new(0, len)]
        };
    }

    let slices: Vec<Slice> = (0..workers)
        .map(|i| {
            let start = i * share;
            let end = if i + 1 == workers {
                len
            } else {
                (start + share).min(len)
            };
            Slice::new(start, end)
        })
        .filter(|slice| !slice.is_empty())
        .collect();

    tracing::trace!(
        "Partitioned {} items across {} workers into {} slices",
        len,
        workers,
        slices.len()
    );

    slices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let slices = partition(20, 4);
        assert_eq!(
            slices,
            vec![
                Slice::new(0, 5),
                Slice::new(5, 10),
                Slice::new(10, 15),
                Slice::new(15, 20)
            ]
        );
    }

    #[test]
    fn test_last_slice_absorbs_remainder() {
        let slices = partition(21, 4);
        assert_eq!(slices.len(), 4);
        assert_eq!(slices[3], Slice::new(15, 21));
        assert_eq!(slices.iter().map(Slice::len).sum::<usize>(), 21);
    }

    #[test]
    fn test_fewer_items_than_workers() {
        // share == 0, so only the last slice is non-empty
        let slices = partition(3, 8);
        assert_eq!(slices, vec![Slice::new(0, 3)]);
    }

    #[test]
    fn test_huge_worker_count_returns_immediately() {
        assert_eq!(partition(3, 1_000_000_000), vec![Slice::new(0, 3)]);
        assert_eq!(partition(3, usize::MAX), vec![Slice::new(0, 3)]);
        assert!(partition(0, usize::MAX).is_empty());
    }

    #[test]
    fn test_one_item_per_worker() {
        let slices = partition(10, 10);
        assert_eq!(slices.len(), 10);
        assert!(slices.iter().all(|s| s.len() == 1));
    }

    #[test]
    fn test_empty_input_dispatches_nothing() {
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn test_zero_workers_treated_as_one() {
        assert_eq!(partition(5, 0), vec![Slice::new(0, 5)]);
    }

    #[test]
    fn test_slices_are_contiguous() {
        let slices = partition(103, 7);
        for pair in slices.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(slices.first().map(|s| s.start), Some(0));
        assert_eq!(slices.last().map(|s| s.end), Some(103));
    }

    #[test]
    fn test_clamped_range() {
        let slice = Slice::new(4, 9);
        assert_eq!(slice.clamped(20), 4..9);
        assert_eq!(slice.clamped(6), 4..6);
        assert_eq!(slice.clamped(2), 2..2);
    }
}
