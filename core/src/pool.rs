//! Resource pool with one exclusive lock per unit.
//!
//! A reservation claims a whole candidate subset or nothing:
//!
//! ```text
//! normalise ──▶ lock units in ascending index order ──▶ validate
//!                                                          │
//!                            any unit taken? ── yes ──▶ drop guards, Err
//!                                                          │ no
//!                                                          ▼
//!                                                  SeatHold (all locks held)
//!                                                          │
//!                                   confirm(actor) ───▶ commit + unlock
//!                                   drop           ───▶ unlock, no change
//! ```
//!
//! Every caller takes unit locks in the same global order, so concurrent
//! holds can never wait on each other in a cycle.
//!
//! **Concurrency Strategy**: reads of availability are unlocked and advisory.
//! Each unit keeps an atomic mirror of its availability that is only written
//! inside the unit's critical section. Only the locked validation in
//! [`ResourcePool::try_hold`] decides whether a subset can be committed.

use crate::error::{CandidateFault, Contention};
use crate::types::{ActorId, UnitIndex};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// Authoritative state of one unit, guarded by the unit's lock.
///
/// `available == false` iff `owner.is_some()`.
#[derive(Debug)]
struct UnitState {
    available: bool,
    owner: Option<ActorId>,
}

#[derive(Debug)]
struct Unit {
    state: Mutex<UnitState>,
    /// Lock-free mirror of `state.available`
    available: AtomicBool,
}

impl Unit {
    fn new() -> Self {
        Self {
            state: Mutex::new(UnitState {
                available: true,
                owner: None,
            }),
            available: AtomicBool::new(true),
        }
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }
}

/// A fixed-size pool of independently lockable units.
#[derive(Debug)]
pub struct ResourcePool {
    units: Box<[Unit]>,
    /// Owner per committed unit, written only while the units' locks are held
    owners: RwLock<BTreeMap<UnitIndex, ActorId>>,
}

impl ResourcePool {
    /// Create a pool of `unit_count` available units numbered `1..=unit_count`.
    #[must_use]
    pub fn new(unit_count: usize) -> Self {
        Self {
            units: (0..unit_count).map(|_| Unit::new()).collect(),
            owners: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of units in the pool.
    #[must_use]
    pub fn total_units(&self) -> usize {
        self.units.len()
    }

    /// Number of committed units.
    #[must_use]
    pub fn booked_count(&self) -> usize {
        self.owners.read().len()
    }

    /// Units currently available, ascending.
    ///
    /// This is an unlocked snapshot and may already be stale when returned.
    #[must_use]
    pub fn available_units(&self) -> Vec<UnitIndex> {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.is_available())
            .map(|(slot, _)| UnitIndex::new(slot + 1))
            .collect()
    }

    /// Number of available units (unlocked read).
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.units.iter().filter(|unit| unit.is_available()).count()
    }

    /// `true` when the unlocked snapshot shows no available unit.
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        !self.units.iter().any(Unit::is_available)
    }

    /// Units of `subset` that are currently unavailable (unlocked read).
    ///
    /// Indices outside the pool are skipped.
    #[must_use]
    pub fn unavailable_among(&self, subset: &[UnitIndex]) -> Vec<UnitIndex> {
        subset
            .iter()
            .copied()
            .filter(|&index| self.unit(index).is_some_and(|unit| !unit.is_available()))
            .collect()
    }

    /// Copy of the unit → owner mapping.
    #[must_use]
    pub fn owner_snapshot(&self) -> BTreeMap<UnitIndex, ActorId> {
        self.owners.read().clone()
    }

    /// Owner of a single unit, if committed.
    #[must_use]
    pub fn owner_of(&self, index: UnitIndex) -> Option<ActorId> {
        self.owners.read().get(&index).copied()
    }

    /// Lock every unit of `subset` in ascending order and validate it.
    ///
    /// On success the returned [`SeatHold`] keeps all locks until it is
    /// confirmed or dropped. The subset is sorted internally, so callers may
    /// pass indices in any order.
    ///
    /// # Errors
    ///
    /// - [`Contention::InvalidCandidate`] if the subset is empty, repeats a
    ///   unit or names a unit outside the pool. No lock is taken.
    /// - [`Contention::AlreadyReserved`] if any unit is owned once all locks
    ///   are held. Every lock is released before returning.
    pub async fn try_hold(&self, subset: &[UnitIndex]) -> Result<SeatHold<'_>, Contention> {
        let sorted = self.normalise(subset)?;

        let mut guards = Vec::with_capacity(sorted.len());
        for &index in &sorted {
            let unit = self.unit(index).ok_or(CandidateFault::OutOfRange {
                unit: index,
                total: self.total_units(),
            })?;
            guards.push(unit.state.lock().await);
        }

        let taken: Vec<UnitIndex> = sorted
            .iter()
            .zip(&guards)
            .filter(|(_, state)| !state.available)
            .map(|(&index, _)| index)
            .collect();

        if !taken.is_empty() {
            tracing::trace!(units = ?taken, "Validation failed, releasing held units");
            return Err(Contention::AlreadyReserved { units: taken });
        }

        Ok(SeatHold {
            pool: self,
            units: sorted,
            guards,
        })
    }

    /// Reserve `subset` for `actor` in one step.
    ///
    /// Returns `false` on any [`Contention`]; the pool is then unchanged.
    pub async fn try_reserve(&self, subset: &[UnitIndex], actor: ActorId) -> bool {
        match self.try_hold(subset).await {
            Ok(hold) => {
                hold.confirm(actor);
                true
            }
            Err(_) => false,
        }
    }

    fn unit(&self, index: UnitIndex) -> Option<&Unit> {
        index.slot().and_then(|slot| self.units.get(slot))
    }

    fn normalise(&self, subset: &[UnitIndex]) -> Result<Vec<UnitIndex>, CandidateFault> {
        if subset.is_empty() {
            return Err(CandidateFault::Empty);
        }

        let mut sorted = subset.to_vec();
        sorted.sort_unstable();

        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(CandidateFault::Duplicate(pair[0]));
        }

        if let Some(&unit) = sorted.iter().find(|&&index| self.unit(index).is_none()) {
            return Err(CandidateFault::OutOfRange {
                unit,
                total: self.total_units(),
            });
        }

        Ok(sorted)
    }
}

/// Exclusive hold on a validated subset of one pool.
///
/// Dropping the hold releases every lock without changing the pool.
#[derive(Debug)]
#[must_use = "dropping a SeatHold releases the units without booking them"]
pub struct SeatHold<'a> {
    pool: &'a ResourcePool,
    units: Vec<UnitIndex>,
    guards: Vec<MutexGuard<'a, UnitState>>,
}

impl SeatHold<'_> {
    /// Held units, ascending.
    #[must_use]
    pub fn units(&self) -> &[UnitIndex] {
        &self.units
    }

    /// Number of held units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always `false`; an empty candidate is rejected before locking.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Commit the held units to `actor` and release their locks.
    ///
    /// The owner map is updated under a single write lock, so owner
    /// snapshots never see part of the subset.
    pub fn confirm(self, actor: ActorId) -> Vec<UnitIndex> {
        let Self {
            pool,
            units,
            mut guards,
        } = self;

        {
            let mut owners = pool.owners.write();
            for (state, &index) in guards.iter_mut().zip(&units) {
                state.available = false;
                state.owner = Some(actor);
                owners.insert(index, actor);
                if let Some(unit) = pool.unit(index) {
                    unit.available.store(false, Ordering::Release);
                }
            }
        }

        drop(guards);
        units
    }
}
