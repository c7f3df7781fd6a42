//! Given-When-Then runner for concurrent customer scenarios.
//!
//! A scenario builds fresh pools, optionally pre-books some of their units,
//! spawns one task per customer against a [`Coordinator`] and then hands the
//! finished coordinator and every outcome to the registered assertions.

#![allow(clippy::module_name_repetitions)]

use seatlock_core::{
    ActorId, NoSettle, PoolId, RandomSelection, ResourcePool, SelectionPolicy, SettleDelay,
    UnitIndex,
};
use seatlock_runtime::{run_customers, Booking, Coordinator, RequestOutcome, SearchPolicy};
use std::sync::Arc;
use std::time::Duration;

/// Outcomes of a scenario, in completion order.
pub type Outcomes = [(ActorId, RequestOutcome)];

/// Type alias for coordinator assertion functions
type CoordinatorAssertion = Box<dyn FnOnce(&Coordinator, &Outcomes)>;

/// Fluent API for running actors against pools with Given-When-Then syntax.
///
/// Defaults: uniform random selection of 1..=3 units, no settle delay, an
/// unbounded search and a 30 second deadline for the whole run.
///
/// # Example
///
/// ```
/// use seatlock_core::{types::units, ActorId, PoolId};
/// use seatlock_runtime::RequestOutcome;
/// use seatlock_testing::Scenario;
///
/// # #[tokio::main]
/// # async fn main() {
/// Scenario::new(&[3])
///     .given_booked(ActorId::new(100), PoolId::new(1), units(&[1, 2]))
///     .when_customers(1..=4)
///     .then(|coordinator, outcomes| {
///         assert!(coordinator.is_exhausted());
///         let booked = outcomes
///             .iter()
///             .filter(|(_, outcome)| matches!(outcome, RequestOutcome::Booked(_)))
///             .count();
///         assert_eq!(booked, 1);
///     })
///     .run()
///     .await;
/// # }
/// ```
pub struct Scenario {
    pool_sizes: Vec<usize>,
    prebooked: Vec<Booking>,
    selection: Arc<dyn SelectionPolicy>,
    settle: Arc<dyn SettleDelay>,
    policy: SearchPolicy,
    deadline: Duration,
    actors: Vec<ActorId>,
    assertions: Vec<CoordinatorAssertion>,
}

impl Scenario {
    /// Scenario over fresh pools of the given sizes (Given).
    #[must_use]
    pub fn new(pool_sizes: &[usize]) -> Self {
        Self {
            pool_sizes: pool_sizes.to_vec(),
            prebooked: Vec::new(),
            selection: Arc::new(RandomSelection::default()),
            settle: Arc::new(NoSettle),
            policy: SearchPolicy::default(),
            deadline: Duration::from_secs(30),
            actors: Vec::new(),
            assertions: Vec::new(),
        }
    }

    /// Commit `units` of `pool` to `actor` before any customer runs (Given).
    ///
    /// The booking is recorded in the ledger as well, so the pools and the
    /// ledger agree from the start.
    #[must_use]
    pub fn given_booked(mut self, actor: ActorId, pool: PoolId, units: Vec<UnitIndex>) -> Self {
        self.prebooked.push(Booking { actor, pool, units });
        self
    }

    /// Set the selection policy.
    #[must_use]
    pub fn with_selection(mut self, selection: impl SelectionPolicy + 'static) -> Self {
        self.selection = Arc::new(selection);
        self
    }

    /// Set the settle delay.
    #[must_use]
    pub fn with_settle(mut self, settle: impl SettleDelay + 'static) -> Self {
        self.settle = Arc::new(settle);
        self
    }

    /// Set the search policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fail the scenario if the customers have not finished within `deadline`.
    #[must_use]
    pub const fn within(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Customers to run concurrently, one task each (When).
    #[must_use]
    pub fn when_customers(mut self, actors: impl IntoIterator<Item = u32>) -> Self {
        self.actors.extend(actors.into_iter().map(ActorId::new));
        self
    }

    /// Add an assertion about the finished coordinator and outcomes (Then)
    #[must_use]
    pub fn then<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Coordinator, &Outcomes) + 'static,
    {
        self.assertions.push(Box::new(assertion));
        self
    }

    /// Run the scenario and execute all assertions.
    ///
    /// Returns the coordinator for any further inspection.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is rejected, a pre-booking cannot be
    /// committed, a task panics, the deadline passes, or any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub async fn run(self) -> Arc<Coordinator> {
        let pools: Vec<ResourcePool> = self
            .pool_sizes
            .iter()
            .map(|&size| ResourcePool::new(size))
            .collect();

        for booking in &self.prebooked {
            let pool = booking
                .pool
                .position()
                .and_then(|position| pools.get(position))
                .unwrap_or_else(|| panic!("pre-booking names unknown pool {}", booking.pool));
            let hold = pool
                .try_hold(&booking.units)
                .await
                .unwrap_or_else(|err| panic!("pre-booking {booking:?} failed: {err}"));
            hold.confirm(booking.actor);
        }

        let coordinator = Arc::new(
            Coordinator::builder(pools)
                .selection(self.selection)
                .settle(self.settle)
                .search_policy(self.policy)
                .build()
                .expect("scenario configuration must be valid"),
        );

        for booking in &self.prebooked {
            coordinator.ledger().record(booking);
        }

        let outcomes = tokio::time::timeout(
            self.deadline,
            run_customers(&coordinator, self.actors),
        )
        .await
        .expect("customers did not finish before the deadline")
        .expect("customer task failed");

        for assertion in self.assertions {
            assertion(&coordinator, &outcomes);
        }

        coordinator
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("pool_sizes", &self.pool_sizes)
            .field("prebooked", &self.prebooked)
            .field("policy", &self.policy)
            .field("actors", &self.actors.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers;
    use crate::mocks::FixedSettle;
    use seatlock_core::types::units;

    #[tokio::test]
    async fn test_prebooked_units_are_owned_and_recorded() {
        Scenario::new(&[5, 5])
            .given_booked(ActorId::new(9), PoolId::new(2), units(&[1, 5]))
            .then(|coordinator, outcomes| {
                assert!(outcomes.is_empty());
                assert_eq!(coordinator.total_booked(), 2);
                assert_eq!(coordinator.counts_by_actor()[&ActorId::new(9)], 2);
                helpers::assert_ledger_matches_pools(coordinator);
            })
            .run()
            .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_customer_gets_an_outcome() {
        let coordinator = Scenario::new(&[10, 10])
            .with_settle(FixedSettle::millis(1))
            .with_policy(SearchPolicy::builder().seed(3).build())
            .when_customers(1..=8)
            .then(|_, outcomes| assert_eq!(outcomes.len(), 8))
            .run()
            .await;

        helpers::assert_ledger_matches_pools(&coordinator);
        helpers::assert_counts_within(&coordinator, 1..=3);
    }
}
