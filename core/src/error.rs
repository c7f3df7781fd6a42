//! Attempt outcomes and configuration errors.
//!
//! Nothing in this module represents a fault. [`Contention`] describes why a
//! single reservation attempt did not commit; the allocator always recovers
//! from it by retrying. [`ConfigError`] is only produced while wiring pools and
//! policies together, before any actor runs.

use crate::types::{display_units, PoolId, UnitIndex};
use std::time::Duration;
use thiserror::Error;

/// Largest number of units one request may claim.
pub const MAX_UNITS_PER_REQUEST: usize = 3;

/// Why a reservation attempt did not commit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Contention {
    /// Validation under lock found units already owned by another actor.
    ///
    /// Covers both a lost lock race and a stale availability snapshot.
    #[error("units {} already reserved", display_units(.units))]
    AlreadyReserved {
        /// Units of the candidate that were unavailable
        units: Vec<UnitIndex>,
    },

    /// The availability snapshot was too small for the requested size.
    #[error("wanted {wanted} units but only {available} available")]
    Infeasible {
        /// Requested number of units
        wanted: usize,
        /// Units available in the snapshot
        available: usize,
    },

    /// The candidate could not be locked at all.
    #[error("invalid candidate: {0}")]
    InvalidCandidate(#[from] CandidateFault),
}

impl Contention {
    /// Short label used for metrics and structured logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::AlreadyReserved { .. } => "already_reserved",
            Self::Infeasible { .. } => "infeasible",
            Self::InvalidCandidate(_) => "invalid_candidate",
        }
    }
}

/// Malformed candidate subsets, rejected before any lock is taken.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateFault {
    /// No units were requested
    #[error("candidate is empty")]
    Empty,

    /// A unit appears twice; locking it twice would block forever
    #[error("unit {0} requested more than once")]
    Duplicate(UnitIndex),

    /// A unit outside `1..=total`
    #[error("unit {unit} outside pool of {total} units")]
    OutOfRange {
        /// Offending unit
        unit: UnitIndex,
        /// Pool size
        total: usize,
    },

    /// The selection policy picked a pool that does not exist
    #[error("pool {0} does not exist")]
    UnknownPool(PoolId),
}

/// Invalid pool or policy configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Request size range must be non-empty and inside `1..=MAX_UNITS_PER_REQUEST`
    #[error("request size range {min}..={max} must lie within 1..=3")]
    InvalidSizeRange {
        /// Smallest size
        min: usize,
        /// Largest size
        max: usize,
    },

    /// Settle delay range has `min > max`
    #[error("settle delay range is inverted: {min:?} > {max:?}")]
    InvertedSettleRange {
        /// Lower bound
        min: Duration,
        /// Upper bound
        max: Duration,
    },

    /// A coordinator needs at least one pool
    #[error("at least one pool is required")]
    NoPools,

    /// A pool was built with zero units
    #[error("pool {0} has no units")]
    EmptyPool(PoolId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::units;

    #[test]
    fn test_already_reserved_message_lists_units() {
        let err = Contention::AlreadyReserved {
            units: units(&[3, 9]),
        };
        assert_eq!(err.to_string(), "units [3, 9] already reserved");
        assert_eq!(err.reason(), "already_reserved");
    }

    #[test]
    fn test_candidate_fault_converts_into_contention() {
        let err: Contention = CandidateFault::Duplicate(UnitIndex::new(4)).into();
        assert_eq!(err.reason(), "invalid_candidate");
        assert!(err.to_string().contains("unit 4 requested more than once"));
    }
}
