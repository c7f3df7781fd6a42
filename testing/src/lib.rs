//! # Seatlock Testing
//!
//! Testing utilities for pools, allocators and coordinators.
//!
//! This crate provides:
//! - Deterministic implementations of the environment traits
//! - A Given-When-Then scenario runner for concurrent customers
//! - Invariant assertions over pools and the booking ledger
//!
//! ## Example
//!
//! ```
//! use seatlock_testing::{helpers, Scenario};
//!
//! # #[tokio::main]
//! # async fn main() {
//! Scenario::new(&[1])
//!     .when_customers(1..=2)
//!     .then(|coordinator, _| {
//!         assert_eq!(coordinator.total_booked(), 1);
//!         helpers::assert_ledger_matches_pools(coordinator);
//!     })
//!     .run()
//!     .await;
//! # }
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;

pub mod scenario;

pub use scenario::Scenario;

/// Deterministic rng for tests.
#[must_use]
pub fn test_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Install a `fmt` subscriber honouring `RUST_LOG`, once per process.
///
/// Later calls are no-ops, so every test may call it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Mock implementations of the environment traits.
pub mod mocks {
    use parking_lot::Mutex;
    use rand::rngs::StdRng;
    use seatlock_core::{
        ActorId, AttemptPlan, PoolId, RandomSelection, SelectionPolicy, SettleDelay, UnitIndex,
    };
    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;

    /// Replays scripted attempts per actor, then defers to a fallback policy.
    ///
    /// A scripted attempt names the pool and the exact candidate. The
    /// candidate is used verbatim, so it may include units that are already
    /// taken; that is how tests force a failed validation.
    ///
    /// # Example
    ///
    /// ```
    /// use seatlock_core::{types::units, ActorId, PoolId, SelectionPolicy};
    /// use seatlock_testing::{mocks::ScriptedSelection, test_rng};
    ///
    /// let policy = ScriptedSelection::new().script(ActorId::new(1), PoolId::new(2), units(&[5, 6]));
    /// let mut rng = test_rng(0);
    ///
    /// let plan = policy.plan(ActorId::new(1), &mut rng, 3);
    /// assert_eq!((plan.pool, plan.size), (1, 2));
    /// assert_eq!(policy.candidate(ActorId::new(1), &mut rng, &[], 2), units(&[5, 6]));
    /// ```
    #[derive(Debug, Default)]
    pub struct ScriptedSelection {
        scripts: Mutex<HashMap<ActorId, VecDeque<(usize, Vec<UnitIndex>)>>>,
        pending: Mutex<HashMap<ActorId, Vec<UnitIndex>>>,
        fallback: RandomSelection,
    }

    impl ScriptedSelection {
        /// Empty script with uniform random fallback.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Use `fallback` once an actor's script runs out.
        #[must_use]
        pub fn with_fallback(mut self, fallback: RandomSelection) -> Self {
            self.fallback = fallback;
            self
        }

        /// Append one attempt to `actor`'s script.
        ///
        /// # Panics
        ///
        /// Panics if `pool` is `PoolId::new(0)`; pool ids start at 1.
        #[must_use]
        #[allow(clippy::expect_used)] // Test code can use expect
        pub fn script(self, actor: ActorId, pool: PoolId, candidate: Vec<UnitIndex>) -> Self {
            let position = pool
                .position()
                .expect("scripted pool ids start at 1");
            self.scripts
                .lock()
                .entry(actor)
                .or_default()
                .push_back((position, candidate));
            self
        }

        /// Scripted attempts not yet replayed for `actor`.
        #[must_use]
        pub fn remaining(&self, actor: ActorId) -> usize {
            self.scripts.lock().get(&actor).map_or(0, VecDeque::len)
        }
    }

    impl SelectionPolicy for ScriptedSelection {
        fn plan(&self, actor: ActorId, rng: &mut StdRng, pool_count: usize) -> AttemptPlan {
            let mut pending = self.pending.lock();
            pending.remove(&actor);

            let next = self
                .scripts
                .lock()
                .get_mut(&actor)
                .and_then(VecDeque::pop_front);

            match next {
                Some((pool, candidate)) => {
                    let size = candidate.len();
                    pending.insert(actor, candidate);
                    AttemptPlan { pool, size }
                }
                None => self.fallback.plan(actor, rng, pool_count),
            }
        }

        fn candidate(
            &self,
            actor: ActorId,
            rng: &mut StdRng,
            available: &[UnitIndex],
            size: usize,
        ) -> Vec<UnitIndex> {
            match self.pending.lock().remove(&actor) {
                Some(candidate) => candidate,
                None => self.fallback.candidate(actor, rng, available, size),
            }
        }

        fn min_size(&self) -> usize {
            let scripted = self.scripts.lock().values().any(|script| !script.is_empty());
            if scripted {
                1
            } else {
                SelectionPolicy::min_size(&self.fallback)
            }
        }
    }

    /// Always the same settle delay.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct FixedSettle(pub Duration);

    impl FixedSettle {
        /// Fixed delay of `millis` milliseconds.
        #[must_use]
        pub const fn millis(millis: u64) -> Self {
            Self(Duration::from_millis(millis))
        }
    }

    impl SettleDelay for FixedSettle {
        fn settle_for(&self, _rng: &mut StdRng) -> Duration {
            self.0
        }
    }
}

/// Invariant assertions.
///
/// Every function panics with a descriptive message when the invariant does
/// not hold, which is what a test wants.
pub mod helpers {
    use seatlock_core::{ResourcePool, UnitIndex};
    use seatlock_runtime::Coordinator;
    use std::collections::BTreeSet;
    use std::ops::RangeInclusive;

    /// Available units and owned units partition the pool.
    ///
    /// # Panics
    ///
    /// Panics if a unit is both available and owned, neither, or if
    /// `booked_count` disagrees with the owner map.
    pub fn assert_pool_consistent(pool: &ResourcePool) {
        let available: BTreeSet<UnitIndex> = pool.available_units().into_iter().collect();
        let owners = pool.owner_snapshot();

        for unit in owners.keys() {
            assert!(
                !available.contains(unit),
                "unit {unit} is owned but reported available"
            );
        }
        assert_eq!(
            available.len() + owners.len(),
            pool.total_units(),
            "available and owned units must cover the pool exactly"
        );
        assert_eq!(pool.booked_count(), owners.len());
    }

    /// The ledger and the pools agree unit for unit.
    ///
    /// # Panics
    ///
    /// Panics if any ledger unit is not owned by its actor, if a pool owns a
    /// unit the ledger does not list, or if a pool's booked count differs
    /// from the sum over actors of their units in that pool.
    pub fn assert_ledger_matches_pools(coordinator: &Coordinator) {
        let units_by_actor = coordinator.units_by_actor();

        for (actor, unit_refs) in &units_by_actor {
            for unit_ref in unit_refs {
                let owner = coordinator
                    .pool(unit_ref.pool)
                    .and_then(|pool| pool.owner_of(unit_ref.unit));
                assert_eq!(
                    owner,
                    Some(*actor),
                    "ledger grants {unit_ref} to actor {actor} but the pool disagrees"
                );
            }
        }

        for (position, pool) in coordinator.pools().iter().enumerate() {
            assert_pool_consistent(pool);

            let pool_id = seatlock_core::PoolId::from_position(position);
            let from_ledger: usize = coordinator
                .ledger()
                .units_in_pool(pool_id)
                .values()
                .map(Vec::len)
                .sum();
            assert_eq!(
                pool.booked_count(),
                from_ledger,
                "pool {pool_id} booked count must equal the ledger's units in it"
            );
        }
    }

    /// Every recorded count lies in `range` and matches the unit list.
    ///
    /// # Panics
    ///
    /// Panics on the first actor outside `range` or whose count and unit
    /// list disagree.
    pub fn assert_counts_within(coordinator: &Coordinator, range: RangeInclusive<usize>) {
        let units_by_actor = coordinator.units_by_actor();

        for (actor, count) in coordinator.counts_by_actor() {
            assert!(
                range.contains(&count),
                "actor {actor} booked {count} units, outside {range:?}"
            );
            assert_eq!(
                units_by_actor.get(&actor).map(Vec::len),
                Some(count),
                "actor {actor} count and unit list differ"
            );
        }
    }
}

// Re-export commonly used items
pub use mocks::{FixedSettle, ScriptedSelection};
