//! Identifiers shared by pools, the allocator and the booking views.
//!
//! Pools and units are numbered from 1, matching how seats and theatres are
//! presented to customers.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Identity of one concurrent requester (a customer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates an `ActorId` from its numeric value
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the numeric value
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a pool (a theatre), 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(usize);

impl PoolId {
    /// Creates a `PoolId` from its 1-based number
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// `PoolId` of the pool stored at `position` (0-based) in a collection
    #[must_use]
    pub const fn from_position(position: usize) -> Self {
        Self(position + 1)
    }

    /// 0-based position of this pool in its collection
    ///
    /// Returns `None` for the invalid id `0`.
    #[must_use]
    pub const fn position(self) -> Option<usize> {
        self.0.checked_sub(1)
    }

    /// Get the 1-based number
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a unit (a seat) within its pool, 1-based.
///
/// Ordering on `UnitIndex` is the global lock order used by
/// [`ResourcePool::try_hold`](crate::pool::ResourcePool::try_hold).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitIndex(usize);

impl UnitIndex {
    /// Creates a `UnitIndex` from its 1-based number
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the 1-based number
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// 0-based slot in the pool's unit array
    pub(crate) const fn slot(self) -> Option<usize> {
        self.0.checked_sub(1)
    }
}

impl fmt::Display for UnitIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build a list of unit indices from plain numbers.
#[must_use]
pub fn units(indices: &[usize]) -> Vec<UnitIndex> {
    indices.iter().copied().map(UnitIndex::new).collect()
}

/// Render unit indices as `[1, 4, 7]`.
#[must_use]
pub fn display_units(units: &[UnitIndex]) -> String {
    let joined = units
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}

// ============================================================================
// Value Objects
// ============================================================================

/// A granted unit tagged with the pool it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitRef {
    /// Pool holding the unit
    pub pool: PoolId,
    /// Unit within the pool
    pub unit: UnitIndex,
}

impl UnitRef {
    /// Creates a new `UnitRef`
    #[must_use]
    pub const fn new(pool: PoolId, unit: UnitIndex) -> Self {
        Self { pool, unit }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pool, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_id_position_round_trip() {
        let id = PoolId::from_position(2);
        assert_eq!(id.get(), 3);
        assert_eq!(id.position(), Some(2));
        assert_eq!(PoolId::new(0).position(), None);
    }

    #[test]
    fn test_unit_index_orders_by_number() {
        let mut list = units(&[7, 2, 5]);
        list.sort();
        assert_eq!(list, units(&[2, 5, 7]));
    }

    #[test]
    fn test_display_units() {
        assert_eq!(display_units(&units(&[1, 4, 7])), "[1, 4, 7]");
        assert_eq!(display_units(&[]), "[]");
    }
}
