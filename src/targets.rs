use rand::{Rng, RngCore};

/// Produces the ordered target list for one game.
pub trait TargetPolicy: Send {
    fn generate_targets(&self, count: usize, rng: &mut dyn RngCore) -> Vec<i64>;
}

/// Targets drawn uniformly from `min..=max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeTargets {
    pub min: i64,
    pub max: i64,
}

impl RangeTargets {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }
}

impl Default for RangeTargets {
    fn default() -> Self {
        Self::new(10, 999)
    }
}

impl TargetPolicy for RangeTargets {
    fn generate_targets(&self, count: usize, rng: &mut dyn RngCore) -> Vec<i64> {
        (0..count)
            .map(|_| rng.gen_range(self.min..=self.max))
            .collect()
    }
}

/// A predetermined list, truncated to the requested count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedTargets(pub Vec<i64>);

impl TargetPolicy for FixedTargets {
    fn generate_targets(&self, count: usize, _rng: &mut dyn RngCore) -> Vec<i64> {
        self.0.iter().copied().take(count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_range_targets_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let targets = RangeTargets::new(10, 20).generate_targets(200, &mut rng);
        assert_eq!(targets.len(), 200);
        assert!(targets.iter().all(|t| (10..=20).contains(t)));
    }

    #[test]
    fn test_range_targets_normalizes_reversed_bounds() {
        let policy = RangeTargets::new(50, 5);
        assert_eq!(policy, RangeTargets { min: 5, max: 50 });
    }

    #[test]
    fn test_range_targets_single_value() {
        let mut rng = StdRng::seed_from_u64(3);
        let targets = RangeTargets::new(24, 24).generate_targets(3, &mut rng);
        assert_eq!(targets, vec![24, 24, 24]);
    }

    #[test]
    fn test_fixed_targets_truncate() {
        let mut rng = StdRng::seed_from_u64(0);
        let policy = FixedTargets(vec![1, 2, 3]);
        assert_eq!(policy.generate_targets(2, &mut rng), vec![1, 2]);
        assert_eq!(policy.generate_targets(5, &mut rng), vec![1, 2, 3]);
    }
}
