//! Allocator - drives one actor's search across many pools.
//!
//! Each iteration picks a pool and a size, reads that pool's availability
//! without locking, and only if the snapshot is large enough samples a
//! candidate and runs the pool's hold/confirm protocol. Any failure sends
//! the actor straight back to a fresh pick.
//!
//! The settle delay runs while the candidate's locks are held, between
//! validation and commit.

use crate::metrics::AllocatorMetrics;
use crate::search::{Booking, RequestOutcome, SearchPolicy, SearchState};
use rand::SeedableRng;
use seatlock_core::{
    ActorId, CandidateFault, Contention, PoolId, ResourcePool, SelectionPolicy, SettleDelay,
    StdRng,
};
use std::sync::Arc;
use std::time::Instant;

/// Search engine over a fixed collection of pools.
pub struct Allocator {
    pools: Vec<ResourcePool>,
    selection: Arc<dyn SelectionPolicy>,
    settle: Arc<dyn SettleDelay>,
    policy: SearchPolicy,
}

impl Allocator {
    /// Create an allocator over `pools`.
    #[must_use]
    pub fn new(
        pools: Vec<ResourcePool>,
        selection: Arc<dyn SelectionPolicy>,
        settle: Arc<dyn SettleDelay>,
        policy: SearchPolicy,
    ) -> Self {
        Self {
            pools,
            selection,
            settle,
            policy,
        }
    }

    /// Pools in collection order; `PoolId` n is at position n - 1.
    #[must_use]
    pub fn pools(&self) -> &[ResourcePool] {
        &self.pools
    }

    /// Pool by id.
    #[must_use]
    pub fn pool(&self, id: PoolId) -> Option<&ResourcePool> {
        id.position().and_then(|position| self.pools.get(position))
    }

    /// Search policy in effect.
    #[must_use]
    pub const fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// `true` when every pool reports zero available units.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.pools.iter().all(ResourcePool::is_sold_out)
    }

    /// `true` while some pool has at least the selection policy's smallest
    /// request size available.
    #[must_use]
    pub fn has_room(&self) -> bool {
        let min_size = self.selection.min_size();
        self.pools
            .iter()
            .any(|pool| pool.available_count() >= min_size)
    }

    /// Run `actor`'s search to a terminal state.
    pub async fn request(&self, actor: ActorId) -> RequestOutcome {
        let started = Instant::now();
        let mut rng = self.rng_for(actor);
        let mut state = SearchState::START;

        let outcome = loop {
            state = match state {
                SearchState::Searching { attempt } => self.step(actor, attempt, &mut rng).await,
                SearchState::Booked(booking) => break RequestOutcome::Booked(booking),
                SearchState::Exhausted { attempts } => break RequestOutcome::Exhausted { attempts },
                SearchState::GaveUp { attempts } => break RequestOutcome::GaveUp { attempts },
            };
        };

        AllocatorMetrics::record_request(started.elapsed());
        outcome
    }

    /// One transition out of `Searching { attempt }`.
    async fn step(&self, actor: ActorId, attempt: usize, rng: &mut StdRng) -> SearchState {
        if !self.policy.allows(attempt) {
            tracing::warn!(actor = %actor, attempts = attempt, "Giving up after attempt limit");
            AllocatorMetrics::record_gave_up();
            return SearchState::GaveUp { attempts: attempt };
        }

        if !self.has_room() {
            tracing::warn!(
                actor = %actor,
                attempts = attempt,
                "Could not find any available seats in any theatre"
            );
            AllocatorMetrics::record_exhausted();
            return SearchState::Exhausted { attempts: attempt };
        }

        AllocatorMetrics::record_attempt();
        match self.attempt(actor, rng).await {
            Ok(booking) => {
                tracing::info!(
                    actor = %actor,
                    pool = %booking.pool,
                    units = ?booking.units,
                    attempt = attempt + 1,
                    "Reserved seats"
                );
                AllocatorMetrics::record_booking(booking.len());
                SearchState::Booked(booking)
            }
            Err(contention) => {
                AllocatorMetrics::record_contention(contention.reason());
                // A failed precheck never awaits; let other tasks commit.
                tokio::task::yield_now().await;
                SearchState::Searching {
                    attempt: attempt + 1,
                }
            }
        }
    }

    async fn attempt(&self, actor: ActorId, rng: &mut StdRng) -> Result<Booking, Contention> {
        let plan = self.selection.plan(actor, rng, self.pools.len());
        let pool_id = PoolId::from_position(plan.pool);
        let pool = self
            .pools
            .get(plan.pool)
            .ok_or(CandidateFault::UnknownPool(pool_id))?;

        let snapshot = pool.available_units();
        if snapshot.len() < plan.size {
            tracing::debug!(
                actor = %actor,
                pool = %pool_id,
                wanted = plan.size,
                available = snapshot.len(),
                "Not enough seats available"
            );
            return Err(Contention::Infeasible {
                wanted: plan.size,
                available: snapshot.len(),
            });
        }

        let candidate = self.selection.candidate(actor, rng, &snapshot, plan.size);
        tracing::debug!(
            actor = %actor,
            pool = %pool_id,
            units = ?candidate,
            "Attempting to book seats"
        );

        let hold = match pool.try_hold(&candidate).await {
            Ok(hold) => hold,
            Err(contention) => {
                tracing::debug!(
                    actor = %actor,
                    pool = %pool_id,
                    units = ?candidate,
                    error = %contention,
                    "Failed to reserve seats, looking for others"
                );
                return Err(contention);
            }
        };

        let delay = self.settle.settle_for(rng);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let units = hold.confirm(actor);
        Ok(Booking {
            actor,
            pool: pool_id,
            units,
        })
    }

    fn rng_for(&self, actor: ActorId) -> StdRng {
        match self.policy.seed_for(actor) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator")
            .field("pools", &self.pools.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
