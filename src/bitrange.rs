//! Disjoint-interval algebra over an N-bit value domain.
//!
//! Used to render the catch-all arm of a generated variant: start from the
//! full domain `[0, 2^N - 1]`, remove every value a declared case claims, and
//! whatever is left becomes an exhaustive `a..=b | c | ...` match pattern.

/// A closed interval `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub lo: u64,
    pub hi: u64,
}

impl Interval {
    fn new(lo: u64, hi: u64) -> Self {
        debug_assert!(lo <= hi);
        Interval { lo, hi }
    }

    fn contains(&self, v: u64) -> bool {
        v >= self.lo && v <= self.hi
    }

    fn pattern(&self) -> String {
        if self.lo == self.hi {
            format!("{}", self.lo)
        } else {
            format!("{}..={}", self.lo, self.hi)
        }
    }
}

/// Sorted, minimal set of disjoint closed intervals over an N-bit domain.
#[derive(Debug, Clone)]
pub struct BitRange {
    intervals: Vec<Interval>,
}

impl BitRange {
    /// Full domain of an `n_bits`-wide field; empty when `n_bits` is 0.
    /// Widths above 32 bits never occur (primitive derivation rejects them).
    pub fn full(n_bits: u32) -> Self {
        debug_assert!(n_bits <= 32);
        let intervals = if n_bits == 0 {
            Vec::new()
        } else {
            vec![Interval::new(0, (1u64 << n_bits) - 1)]
        };
        BitRange { intervals }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Remove one value: shrinks the containing interval at an endpoint,
    /// splits it when the value is interior, drops it when it was a
    /// singleton. Removing a value not in the set is a no-op.
    pub fn remove(&mut self, v: u64) {
        let Some(i) = self.intervals.iter().position(|iv| iv.contains(v)) else {
            return;
        };
        let iv = self.intervals[i];
        if iv.lo == iv.hi {
            self.intervals.remove(i);
        } else if v == iv.lo {
            self.intervals[i].lo = v + 1;
        } else if v == iv.hi {
            self.intervals[i].hi = v - 1;
        } else {
            self.intervals[i] = Interval::new(iv.lo, v - 1);
            self.intervals.insert(i + 1, Interval::new(v + 1, iv.hi));
        }
    }

    /// Match-pattern text for the remaining domain, e.g. `1..=2 | 4..=6`.
    pub fn pattern(&self) -> String {
        self.intervals
            .iter()
            .map(Interval::pattern)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_bit_walk() {
        let mut r = BitRange::full(3);
        assert_eq!(r.pattern(), "0..=7");
        r.remove(0);
        assert_eq!(r.pattern(), "1..=7");
        r.remove(7);
        assert_eq!(r.pattern(), "1..=6");
        r.remove(3);
        assert_eq!(r.pattern(), "1..=2 | 4..=6");
        r.remove(2);
        assert_eq!(r.pattern(), "1 | 4..=6");
        r.remove(5);
        assert_eq!(r.pattern(), "1 | 4 | 6");
        r.remove(1);
        r.remove(4);
        r.remove(6);
        assert!(r.is_empty());
    }

    #[test]
    fn zero_bits_is_empty() {
        let r = BitRange::full(0);
        assert!(r.is_empty());
        assert_eq!(r.pattern(), "");
    }

    #[test]
    fn exhaustive_removal_in_any_order() {
        let mut r = BitRange::full(4);
        for v in [7, 0, 15, 3, 8, 1, 2, 9, 10, 11, 4, 5, 6, 12, 14, 13] {
            r.remove(v);
        }
        assert!(r.is_empty());
    }

    #[test]
    fn interior_split_reconstructs_domain() {
        let mut r = BitRange::full(5);
        r.remove(13);
        let ivs = r.intervals();
        assert_eq!(ivs.len(), 2);
        assert_eq!(ivs[0], Interval { lo: 0, hi: 12 });
        assert_eq!(ivs[1], Interval { lo: 14, hi: 31 });
    }

    #[test]
    fn removing_absent_value_is_noop() {
        let mut r = BitRange::full(2);
        r.remove(3);
        r.remove(3);
        assert_eq!(r.pattern(), "0..=2");
    }
}
