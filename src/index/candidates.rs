//! Candidate streams with a cardinality bound
//!
//! Every access path the graph offers (label bucket, property index, full
//! scan) is wrapped in a [`Candidates`] so the planner and the facade can
//! compare them by [`max_size`](Candidates::max_size) before pulling a single
//! item.

pub struct Candidates<'a, Id> {
    source: Box<dyn Iterator<Item = Id> + 'a>,
    /// Upper bound on what `source` yields; `None` for an unbounded scan
    max_size: Option<usize>,
}

impl<'a, Id: 'a> Candidates<'a, Id> {
    pub fn new(source: impl Iterator<Item = Id> + 'a, max_size: Option<usize>) -> Self {
        Self {
            source: Box::new(source),
            max_size,
        }
    }

    /// A stream that yields nothing and says so.
    pub fn empty() -> Self {
        Self::new(std::iter::empty(), Some(0))
    }

    /// Exact (or upper-bound) count when backed by a set, `None` when backed
    /// by a full scan.
    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// True when `self` is known to be no larger than `other`. An unknown
    /// size never wins.
    pub fn is_smaller_than(&self, other: &Self) -> bool {
        match (self.max_size, other.max_size) {
            (Some(a), Some(b)) => a < b,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

impl<Id> Iterator for Candidates<'_, Id> {
    type Item = Id;

    fn next(&mut self) -> Option<Id> {
        self.source.next()
    }
}

impl<Id> std::fmt::Debug for Candidates<'_, Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidates")
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sized_beats_unbounded() {
        let sized = Candidates::new(vec![1, 2, 3].into_iter(), Some(3));
        let scan = Candidates::new(0..100, None);
        let small = Candidates::new(vec![7].into_iter(), Some(1));

        assert!(sized.is_smaller_than(&scan));
        assert!(!scan.is_smaller_than(&sized));
        assert!(small.is_smaller_than(&sized));
        assert!(!sized.is_smaller_than(&sized));
    }

    #[test]
    fn test_empty() {
        let mut empty: Candidates<'_, u64> = Candidates::empty();
        assert_eq!(empty.max_size(), Some(0));
        assert_eq!(empty.next(), None);
    }
}
