//! Coverage: a set of disjoint address ranges.
//!
//! Ranges are `[start, start + length)` over 64-bit addresses, kept
//! sorted and coalesced — adjacent ranges merge, empty ranges are never
//! stored.

use std::fmt;

/// One contiguous address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CovRange {
    pub start: u64,
    pub length: u64,
}

impl CovRange {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end()
    }
}

/// Sorted set of disjoint, non-adjacent address ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coverage {
    ranges: Vec<CovRange>,
}

impl Coverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A coverage holding one range. Zero length gives the empty set.
    pub fn range(start: u64, length: u64) -> Self {
        let mut cov = Self::new();
        cov.add(start, length);
        cov
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of covered addresses.
    pub fn length(&self) -> u64 {
        self.ranges.iter().map(|r| r.length).sum()
    }

    pub fn ranges(&self) -> &[CovRange] {
        &self.ranges
    }

    /// Add a range, merging any ranges it overlaps or touches.
    pub fn add(&mut self, start: u64, length: u64) {
        if length == 0 {
            return;
        }
        let mut new_start = start;
        let mut new_end = start + length;

        // Index of the first range that could merge with the new one.
        let lo = self
            .ranges
            .partition_point(|r| r.end() < new_start);
        let mut hi = lo;
        while hi < self.ranges.len() && self.ranges[hi].start <= new_end {
            new_start = new_start.min(self.ranges[hi].start);
            new_end = new_end.max(self.ranges[hi].end());
            hi += 1;
        }
        self.ranges.splice(
            lo..hi,
            std::iter::once(CovRange::new(new_start, new_end - new_start)),
        );
    }

    /// Remove a range, splitting ranges that straddle its edges.
    pub fn remove(&mut self, start: u64, length: u64) {
        if length == 0 {
            return;
        }
        let end = start + length;
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        for r in &self.ranges {
            if r.end() <= start || r.start >= end {
                out.push(*r);
                continue;
            }
            if r.start < start {
                out.push(CovRange::new(r.start, start - r.start));
            }
            if r.end() > end {
                out.push(CovRange::new(end, r.end() - end));
            }
        }
        self.ranges = out;
    }

    pub fn union(&self, other: &Coverage) -> Coverage {
        let mut out = self.clone();
        for r in &other.ranges {
            out.add(r.start, r.length);
        }
        out
    }

    pub fn subtract(&self, other: &Coverage) -> Coverage {
        let mut out = self.clone();
        for r in &other.ranges {
            out.remove(r.start, r.length);
        }
        out
    }

    pub fn intersect(&self, other: &Coverage) -> Coverage {
        let mut out = Coverage::new();
        let mut i = 0;
        let mut j = 0;
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = self.ranges[i];
            let b = other.ranges[j];
            let start = a.start.max(b.start);
            let end = a.end().min(b.end());
            if start < end {
                out.add(start, end - start);
            }
            if a.end() <= b.end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        out
    }

    pub fn contains_point(&self, addr: u64) -> bool {
        let i = self.ranges.partition_point(|r| r.end() <= addr);
        self.ranges.get(i).is_some_and(|r| r.contains(addr))
    }

    /// Whether every address of `other` is covered by `self`.
    pub fn contains_range(&self, start: u64, length: u64) -> bool {
        if length == 0 {
            return true;
        }
        let i = self.ranges.partition_point(|r| r.end() <= start);
        self.ranges
            .get(i)
            .is_some_and(|r| r.start <= start && start + length <= r.end())
    }

    pub fn is_subset_of(&self, other: &Coverage) -> bool {
        self.ranges
            .iter()
            .all(|r| other.contains_range(r.start, r.length))
    }

    pub fn overlaps(&self, other: &Coverage) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Iterate over covered addresses in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = u64> + '_ {
        self.ranges.iter().flat_map(|r| r.start..r.end())
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = false;
        for r in &self.ranges {
            if sep {
                write!(f, ", ")?;
            }
            sep = true;
            write!(f, "[{:#x}, {:#x})", r.start, r.end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_merges_overlapping() {
        let mut cov = Coverage::new();
        cov.add(0, 10);
        cov.add(5, 10);
        assert_eq!(cov.ranges(), &[CovRange::new(0, 15)]);
    }

    #[test]
    fn add_merges_adjacent() {
        let mut cov = Coverage::new();
        cov.add(0, 10);
        cov.add(10, 5);
        assert_eq!(cov.ranges(), &[CovRange::new(0, 15)]);
    }

    #[test]
    fn add_keeps_disjoint_sorted() {
        let mut cov = Coverage::new();
        cov.add(20, 5);
        cov.add(0, 5);
        cov.add(10, 5);
        assert_eq!(
            cov.ranges(),
            &[
                CovRange::new(0, 5),
                CovRange::new(10, 5),
                CovRange::new(20, 5)
            ]
        );
    }

    #[test]
    fn add_spanning_many() {
        let mut cov = Coverage::new();
        cov.add(0, 5);
        cov.add(10, 5);
        cov.add(20, 5);
        cov.add(3, 20);
        assert_eq!(cov.ranges(), &[CovRange::new(0, 25)]);
    }

    #[test]
    fn zero_length_ignored() {
        let mut cov = Coverage::new();
        cov.add(5, 0);
        assert!(cov.is_empty());
    }

    #[test]
    fn remove_splits() {
        let mut cov = Coverage::range(0, 10);
        cov.remove(3, 4);
        assert_eq!(cov.ranges(), &[CovRange::new(0, 3), CovRange::new(7, 3)]);
    }

    #[test]
    fn add_then_remove_restores() {
        let mut cov = Coverage::range(0, 10);
        let orig = cov.clone();
        cov.add(100, 20);
        cov.remove(100, 20);
        assert_eq!(cov, orig);
    }

    #[test]
    fn union_commutative() {
        let a = Coverage::range(0, 10);
        let b = Coverage::range(5, 10);
        assert_eq!(a.union(&b), b.union(&a));
    }

    #[test]
    fn intersect_is_subset() {
        let mut a = Coverage::range(0, 10);
        a.add(20, 10);
        let b = Coverage::range(5, 20);
        let i = a.intersect(&b);
        assert!(i.is_subset_of(&a));
        assert!(i.is_subset_of(&b));
        assert_eq!(i.ranges(), &[CovRange::new(5, 5), CovRange::new(20, 5)]);
    }

    #[test]
    fn overlap_iff_nonempty_intersection() {
        let a = Coverage::range(0, 10);
        let b = Coverage::range(10, 5);
        let c = Coverage::range(9, 5);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(a.intersect(&b).is_empty());
        assert!(!a.intersect(&c).is_empty());
    }

    #[test]
    fn containment() {
        let cov = Coverage::range(0, 10);
        assert!(cov.contains_point(9));
        assert!(!cov.contains_point(10));
        assert!(cov.contains_range(2, 5));
        assert!(!cov.contains_range(8, 5));
    }

    #[test]
    fn length_counts_addresses() {
        let mut cov = Coverage::range(0, 0x10);
        cov.add(0x100, 0x10);
        assert_eq!(cov.length(), 32);
    }

    #[test]
    fn addresses_iterate_in_order() {
        let mut cov = Coverage::range(0, 2);
        cov.add(10, 2);
        let addrs: Vec<u64> = cov.addresses().collect();
        assert_eq!(addrs, vec![0, 1, 10, 11]);
    }
}
