//! Inclusive cardinality bounds for fields and generation statements.

use crate::error::GenError;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRange {
    min: i64,
    max: i64,
}

impl CountRange {
    /// Build a range, rejecting negative or inverted bounds.
    pub fn new(min: i64, max: i64) -> Result<Self, GenError> {
        if min < 0 || max < 0 {
            return Err(GenError::range("Count range bounds must not be negative"));
        }
        if max < min {
            return Err(GenError::range("Count range max cannot be less than min"));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    /// Draw how many values to produce.
    ///
    /// `[0, 0]` means one, `[k, k]` means exactly `k`, anything else is a
    /// uniform draw over the inclusive range.
    pub fn count<R: Rng>(&self, rng: &mut R) -> i64 {
        if self.min == 0 && self.max == 0 {
            return 1;
        }
        if self.min == self.max {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_zero_range_counts_one() {
        let mut rng = StdRng::seed_from_u64(42);
        let range = CountRange::new(0, 0).unwrap();
        for _ in 0..50 {
            assert_eq!(range.count(&mut rng), 1);
        }
    }

    #[test]
    fn test_fixed_range_counts_constant() {
        let mut rng = StdRng::seed_from_u64(42);
        let range = CountRange::new(4, 4).unwrap();
        for _ in 0..50 {
            assert_eq!(range.count(&mut rng), 4);
        }
    }

    #[test]
    fn test_open_range_covers_all_values() {
        let mut rng = StdRng::seed_from_u64(42);
        let range = CountRange::new(2, 6).unwrap();
        let mut seen = HashSet::new();

        for _ in 0..1000 {
            let n = range.count(&mut rng);
            assert!((2..=6).contains(&n));
            seen.insert(n);
        }

        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        assert!(matches!(
            CountRange::new(-1, 3),
            Err(GenError::RangeViolation { .. })
        ));
        assert!(matches!(
            CountRange::new(5, 2),
            Err(GenError::RangeViolation { .. })
        ));
    }
}
