//! Coordinator - the harness-facing entry point.
//!
//! Owns the [`Allocator`] and the [`BookingLedger`]. Actors call
//! [`Coordinator::request`]; the harness reads the ledger views after every
//! actor has finished.

use crate::allocator::Allocator;
use crate::ledger::BookingLedger;
use crate::search::{RequestOutcome, SearchPolicy};
use seatlock_core::{
    ActorId, ConfigError, PoolId, RandomSelection, RandomSettle, ResourcePool, SelectionPolicy,
    SettleDelay, UnitRef,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Allocator plus aggregation views over one set of pools.
#[derive(Debug)]
pub struct Coordinator {
    allocator: Allocator,
    ledger: BookingLedger,
}

impl Coordinator {
    /// Coordinator with uniform random selection and the default settle delay.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `pools` is empty or contains an empty pool.
    pub fn new(pools: Vec<ResourcePool>) -> Result<Self, ConfigError> {
        Self::builder(pools).build()
    }

    /// Start configuring a coordinator over `pools`.
    #[must_use]
    pub fn builder(pools: Vec<ResourcePool>) -> CoordinatorBuilder {
        CoordinatorBuilder {
            pools,
            selection: Arc::new(RandomSelection::default()),
            settle: Arc::new(RandomSettle::default()),
            policy: SearchPolicy::default(),
        }
    }

    /// Run `actor`'s request to completion and record a successful booking.
    pub async fn request(&self, actor: ActorId) -> RequestOutcome {
        let outcome = self.allocator.request(actor).await;
        if let RequestOutcome::Booked(booking) = &outcome {
            self.ledger.record(booking);
        }
        outcome
    }

    /// Copy of actor → granted count.
    #[must_use]
    pub fn counts_by_actor(&self) -> BTreeMap<ActorId, usize> {
        self.ledger.counts_by_actor()
    }

    /// Copy of actor → granted `(pool, unit)` list.
    #[must_use]
    pub fn units_by_actor(&self) -> BTreeMap<ActorId, Vec<UnitRef>> {
        self.ledger.units_by_actor()
    }

    /// The aggregation views.
    #[must_use]
    pub const fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }

    /// Pools in collection order.
    #[must_use]
    pub fn pools(&self) -> &[ResourcePool] {
        self.allocator.pools()
    }

    /// Pool by id.
    #[must_use]
    pub fn pool(&self, id: PoolId) -> Option<&ResourcePool> {
        self.allocator.pool(id)
    }

    /// Committed units across all pools.
    #[must_use]
    pub fn total_booked(&self) -> usize {
        self.pools().iter().map(ResourcePool::booked_count).sum()
    }

    /// `true` when every pool is sold out.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.allocator.is_exhausted()
    }
}

/// Builder for [`Coordinator`].
pub struct CoordinatorBuilder {
    pools: Vec<ResourcePool>,
    selection: Arc<dyn SelectionPolicy>,
    settle: Arc<dyn SettleDelay>,
    policy: SearchPolicy,
}

impl CoordinatorBuilder {
    /// Replace the selection policy.
    #[must_use]
    pub fn selection(mut self, selection: impl SelectionPolicy + 'static) -> Self {
        self.selection = Arc::new(selection);
        self
    }

    /// Replace the settle delay.
    #[must_use]
    pub fn settle(mut self, settle: impl SettleDelay + 'static) -> Self {
        self.settle = Arc::new(settle);
        self
    }

    /// Replace the search policy.
    #[must_use]
    pub const fn search_policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the [`Coordinator`].
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoPools`] if no pool was given
    /// - [`ConfigError::EmptyPool`] if a pool has zero units
    pub fn build(self) -> Result<Coordinator, ConfigError> {
        if self.pools.is_empty() {
            return Err(ConfigError::NoPools);
        }
        if let Some(position) = self.pools.iter().position(|pool| pool.total_units() == 0) {
            return Err(ConfigError::EmptyPool(PoolId::from_position(position)));
        }

        tracing::debug!(
            pools = self.pools.len(),
            units = self.pools.iter().map(ResourcePool::total_units).sum::<usize>(),
            "Coordinator ready"
        );

        Ok(Coordinator {
            allocator: Allocator::new(self.pools, self.selection, self.settle, self.policy),
            ledger: BookingLedger::new(),
        })
    }
}

impl std::fmt::Debug for CoordinatorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorBuilder")
            .field("pools", &self.pools.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seatlock_core::NoSettle;

    #[test]
    fn test_build_rejects_missing_or_empty_pools() {
        assert_eq!(Coordinator::new(Vec::new()).err(), Some(ConfigError::NoPools));
        assert_eq!(
            Coordinator::new(vec![ResourcePool::new(3), ResourcePool::new(0)]).err(),
            Some(ConfigError::EmptyPool(PoolId::new(2)))
        );
    }

    #[tokio::test]
    async fn test_request_records_booking_in_ledger() {
        let coordinator = Coordinator::builder(vec![ResourcePool::new(4)])
            .settle(NoSettle)
            .search_policy(SearchPolicy::builder().seed(5).build())
            .build()
            .unwrap();

        let outcome = coordinator.request(ActorId::new(8)).await;

        let counts = coordinator.counts_by_actor();
        assert_eq!(counts.get(&ActorId::new(8)), Some(&outcome.granted()));
        assert_eq!(
            coordinator.units_by_actor()[&ActorId::new(8)].len(),
            outcome.granted()
        );
        assert_eq!(coordinator.total_booked(), outcome.granted());
    }
}
