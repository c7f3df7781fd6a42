//! Environment module - injected selection and timing behaviour.
//!
//! The allocator never draws random numbers or sleeps on its own. It asks a
//! [`SelectionPolicy`] where to try next and a [`SettleDelay`] how long to
//! hold validated units before committing them. Production implementations
//! live here; deterministic ones for tests live in `seatlock-testing`.
//!
//! # Examples
//!
//! ```
//! use rand::{rngs::StdRng, SeedableRng};
//! use seatlock_core::environment::{RandomSelection, SelectionPolicy};
//! use seatlock_core::types::{units, ActorId};
//!
//! let policy = RandomSelection::new(2, 2).unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let plan = policy.plan(ActorId::new(1), &mut rng, 3);
//! assert!(plan.pool < 3);
//! assert_eq!(plan.size, 2);
//!
//! let candidate = policy.candidate(ActorId::new(1), &mut rng, &units(&[1, 2, 3]), plan.size);
//! assert_eq!(candidate.len(), 2);
//! ```

use crate::error::{ConfigError, MAX_UNITS_PER_REQUEST};
use crate::types::{ActorId, UnitIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Where and how much the next attempt should try to reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPlan {
    /// 0-based position of the pool in the allocator's collection
    pub pool: usize,
    /// Number of units to claim
    pub size: usize,
}

/// Chooses pools, request sizes and candidate subsets.
///
/// Each call receives the requesting actor's own RNG, so implementations
/// need no interior synchronisation unless they keep state of their own.
pub trait SelectionPolicy: Send + Sync {
    /// Pick the pool and size for the next attempt.
    ///
    /// `pool_count` is at least 1.
    fn plan(&self, actor: ActorId, rng: &mut StdRng, pool_count: usize) -> AttemptPlan;

    /// Pick `size` distinct units out of the `available` snapshot.
    ///
    /// Called only when `available.len() >= size`.
    fn candidate(
        &self,
        actor: ActorId,
        rng: &mut StdRng,
        available: &[UnitIndex],
        size: usize,
    ) -> Vec<UnitIndex>;

    /// Smallest size `plan` can return.
    ///
    /// Once no pool has this many available units, no attempt can succeed.
    fn min_size(&self) -> usize {
        1
    }
}

impl<T: SelectionPolicy + ?Sized> SelectionPolicy for Arc<T> {
    fn plan(&self, actor: ActorId, rng: &mut StdRng, pool_count: usize) -> AttemptPlan {
        (**self).plan(actor, rng, pool_count)
    }

    fn candidate(
        &self,
        actor: ActorId,
        rng: &mut StdRng,
        available: &[UnitIndex],
        size: usize,
    ) -> Vec<UnitIndex> {
        (**self).candidate(actor, rng, available, size)
    }

    fn min_size(&self) -> usize {
        (**self).min_size()
    }
}

/// Uniform pool, uniform size within `min..=max`, uniform sample without
/// replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomSelection {
    min_size: usize,
    max_size: usize,
}

impl RandomSelection {
    /// Create a policy drawing request sizes from `min_size..=max_size`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSizeRange`] unless
    /// `1 <= min_size <= max_size <= 3`.
    pub const fn new(min_size: usize, max_size: usize) -> Result<Self, ConfigError> {
        if min_size == 0 || min_size > max_size || max_size > MAX_UNITS_PER_REQUEST {
            return Err(ConfigError::InvalidSizeRange {
                min: min_size,
                max: max_size,
            });
        }
        Ok(Self { min_size, max_size })
    }

    /// Smallest request size.
    #[must_use]
    pub const fn min_size(&self) -> usize {
        self.min_size
    }

    /// Largest request size.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for RandomSelection {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: MAX_UNITS_PER_REQUEST,
        }
    }
}

impl SelectionPolicy for RandomSelection {
    fn plan(&self, _actor: ActorId, rng: &mut StdRng, pool_count: usize) -> AttemptPlan {
        let pool = if pool_count <= 1 {
            0
        } else {
            rng.gen_range(0..pool_count)
        };
        AttemptPlan {
            pool,
            size: rng.gen_range(self.min_size..=self.max_size),
        }
    }

    fn candidate(
        &self,
        _actor: ActorId,
        rng: &mut StdRng,
        available: &[UnitIndex],
        size: usize,
    ) -> Vec<UnitIndex> {
        available.choose_multiple(rng, size).copied().collect()
    }

    fn min_size(&self) -> usize {
        self.min_size
    }
}

/// How long validated units stay held before they are committed.
///
/// The delay runs while every unit of the candidate is locked, which widens
/// the window in which competing attempts block on those units.
pub trait SettleDelay: Send + Sync {
    /// Duration for one attempt. `Duration::ZERO` skips the wait.
    fn settle_for(&self, rng: &mut StdRng) -> Duration;
}

impl<T: SettleDelay + ?Sized> SettleDelay for Arc<T> {
    fn settle_for(&self, rng: &mut StdRng) -> Duration {
        (**self).settle_for(rng)
    }
}

/// Uniform delay in `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomSettle {
    min: Duration,
    max: Duration,
}

impl RandomSettle {
    /// Create a delay drawn from `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvertedSettleRange`] if `min > max`.
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvertedSettleRange { min, max });
        }
        Ok(Self { min, max })
    }
}

impl Default for RandomSettle {
    /// 500ms to 1s, the confirmation latency of a box-office terminal.
    fn default() -> Self {
        Self {
            min: Duration::from_millis(500),
            max: Duration::from_millis(1000),
        }
    }
}

impl SettleDelay for RandomSettle {
    fn settle_for(&self, rng: &mut StdRng) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Commit immediately after validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoSettle;

impl SettleDelay for NoSettle {
    fn settle_for(&self, _rng: &mut StdRng) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::units;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    #[test]
    fn test_size_range_is_validated() {
        assert!(RandomSelection::new(1, 3).is_ok());
        assert!(RandomSelection::new(2, 2).is_ok());
        assert_eq!(
            RandomSelection::new(0, 2),
            Err(ConfigError::InvalidSizeRange { min: 0, max: 2 })
        );
        assert_eq!(
            RandomSelection::new(3, 2),
            Err(ConfigError::InvalidSizeRange { min: 3, max: 2 })
        );
        assert_eq!(
            RandomSelection::new(1, 4),
            Err(ConfigError::InvalidSizeRange { min: 1, max: 4 })
        );
    }

    #[test]
    fn test_plan_stays_in_bounds() {
        let policy = RandomSelection::default();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let plan = policy.plan(ActorId::new(1), &mut rng, 3);
            assert!(plan.pool < 3);
            assert!((1..=3).contains(&plan.size));
        }
    }

    #[test]
    fn test_single_pool_always_chosen() {
        let policy = RandomSelection::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.plan(ActorId::new(1), &mut rng, 1).pool, 0);
    }

    #[test]
    fn test_candidate_is_distinct_subset_of_snapshot() {
        let policy = RandomSelection::default();
        let mut rng = StdRng::seed_from_u64(3);
        let snapshot = units(&[2, 4, 6, 8, 10]);

        for _ in 0..200 {
            let candidate = policy.candidate(ActorId::new(1), &mut rng, &snapshot, 3);
            let distinct: BTreeSet<_> = candidate.iter().copied().collect();
            assert_eq!(distinct.len(), 3);
            assert!(candidate.iter().all(|unit| snapshot.contains(unit)));
        }
    }

    #[test]
    fn test_min_size_is_visible_through_trait_objects() {
        let policy: Arc<dyn SelectionPolicy> = Arc::new(RandomSelection::new(2, 3).unwrap());
        assert_eq!(policy.min_size(), 2);
        assert_eq!(SelectionPolicy::min_size(&RandomSelection::default()), 1);
    }

    #[test]
    fn test_random_settle_range() {
        let settle = RandomSettle::new(Duration::from_millis(5), Duration::from_millis(10)).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..100 {
            let delay = settle.settle_for(&mut rng);
            assert!(delay >= Duration::from_millis(5));
            assert!(delay <= Duration::from_millis(10));
        }

        assert!(RandomSettle::new(Duration::from_millis(2), Duration::from_millis(1)).is_err());
        assert_eq!(NoSettle.settle_for(&mut rng), Duration::ZERO);
    }
}
