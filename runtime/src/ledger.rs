//! Booking ledger - per-actor aggregation views.
//!
//! Many actors record concurrently, but each actor writes only its own key
//! and only once, so sharded maps are enough. Readers get owned copies.

use crate::search::Booking;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use seatlock_core::{ActorId, PoolId, UnitIndex, UnitRef};
use std::collections::BTreeMap;

/// Actor → granted count and actor → granted units.
#[derive(Debug, Default)]
pub struct BookingLedger {
    counts: DashMap<ActorId, usize>,
    units: DashMap<ActorId, Vec<UnitRef>>,
}

impl BookingLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `booking` under its actor.
    ///
    /// Returns `false` and leaves the ledger unchanged if the actor already
    /// has an entry.
    pub fn record(&self, booking: &Booking) -> bool {
        match self.units.entry(booking.actor) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    actor = %booking.actor,
                    "Actor already has a booking, ignoring second record"
                );
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(booking.unit_refs());
                self.counts.insert(booking.actor, booking.len());
                true
            }
        }
    }

    /// Units granted to `actor` (0 if none).
    #[must_use]
    pub fn count_for(&self, actor: ActorId) -> usize {
        self.counts.get(&actor).map_or(0, |count| *count)
    }

    /// Units granted to `actor`, in commit order.
    #[must_use]
    pub fn units_for(&self, actor: ActorId) -> Vec<UnitRef> {
        self.units
            .get(&actor)
            .map(|units| units.clone())
            .unwrap_or_default()
    }

    /// Copy of actor → granted count.
    #[must_use]
    pub fn counts_by_actor(&self) -> BTreeMap<ActorId, usize> {
        self.counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Copy of actor → granted units.
    #[must_use]
    pub fn units_by_actor(&self) -> BTreeMap<ActorId, Vec<UnitRef>> {
        self.units
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Actors holding units in `pool`, with those units ascending.
    #[must_use]
    pub fn units_in_pool(&self, pool: PoolId) -> BTreeMap<ActorId, Vec<UnitIndex>> {
        let mut by_actor = BTreeMap::new();
        for entry in &self.units {
            let mut held: Vec<UnitIndex> = entry
                .value()
                .iter()
                .filter(|unit_ref| unit_ref.pool == pool)
                .map(|unit_ref| unit_ref.unit)
                .collect();
            if !held.is_empty() {
                held.sort_unstable();
                by_actor.insert(*entry.key(), held);
            }
        }
        by_actor
    }

    /// Number of actors with a booking.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// `true` if nobody has booked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
