//! Search policy and the per-request state machine.
//!
//! One request moves through:
//!
//! ```text
//!            ┌──────── attempt failed ────────┐
//!            ▼                                │
//!   Searching { attempt } ── attempt ─────────┘
//!      │        │        └─ commit ──▶ Booked(Booking)
//!      │        └─ nothing fits anywhere ──▶ Exhausted { attempts }
//!      └─ attempt == max_attempts ──▶ GaveUp { attempts }
//! ```
//!
//! Retries are immediate; there is no backoff between attempts.
//!
//! # Example
//!
//! ```rust
//! use seatlock_runtime::search::SearchPolicy;
//!
//! let policy = SearchPolicy::builder()
//!     .max_attempts(500)
//!     .seed(42)
//!     .build();
//!
//! assert_eq!(policy.max_attempts, Some(500));
//! assert!(!policy.allows(500));
//! ```

use seatlock_core::{ActorId, PoolId, UnitIndex, UnitRef};

/// Bounds and seeding for one actor's search.
///
/// # Default Values
///
/// - `max_attempts`: `None` (retry until booked or every pool is sold out)
/// - `seed`: `None` (each request seeds its RNG from the OS)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchPolicy {
    /// Cap on attempts before the request gives up
    pub max_attempts: Option<usize>,
    /// Base seed; each actor's RNG is seeded with `seed ^ actor`
    pub seed: Option<u64>,
}

impl SearchPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> SearchPolicyBuilder {
        SearchPolicyBuilder {
            max_attempts: None,
            seed: None,
        }
    }

    /// Whether another attempt may start after `attempts` have been made.
    #[must_use]
    pub const fn allows(&self, attempts: usize) -> bool {
        match self.max_attempts {
            Some(max) => attempts < max,
            None => true,
        }
    }

    /// RNG seed for `actor`, if the policy is deterministic.
    #[must_use]
    pub fn seed_for(&self, actor: ActorId) -> Option<u64> {
        self.seed.map(|seed| seed ^ u64::from(actor.get()))
    }
}

/// Builder for [`SearchPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct SearchPolicyBuilder {
    max_attempts: Option<usize>,
    seed: Option<u64>,
}

impl SearchPolicyBuilder {
    /// Cap the number of attempts per request.
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Make every request's randomness reproducible.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the [`SearchPolicy`].
    #[must_use]
    pub const fn build(self) -> SearchPolicy {
        SearchPolicy {
            max_attempts: self.max_attempts,
            seed: self.seed,
        }
    }
}

/// A committed reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// Actor owning the units
    pub actor: ActorId,
    /// Pool the units belong to
    pub pool: PoolId,
    /// Committed units, ascending
    pub units: Vec<UnitIndex>,
}

impl Booking {
    /// Number of committed units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// `true` if no unit was committed (never produced by the allocator).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units tagged with their pool.
    #[must_use]
    pub fn unit_refs(&self) -> Vec<UnitRef> {
        self.units
            .iter()
            .map(|&unit| UnitRef::new(self.pool, unit))
            .collect()
    }
}

/// State of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    /// Still looking; `attempt` attempts have failed so far
    Searching {
        /// Failed attempts so far
        attempt: usize,
    },
    /// Terminal: units committed
    Booked(Booking),
    /// Terminal: no pool had room for the smallest request size
    Exhausted {
        /// Attempts made before exhaustion was observed
        attempts: usize,
    },
    /// Terminal: the attempt cap was reached
    GaveUp {
        /// Attempts made
        attempts: usize,
    },
}

impl SearchState {
    /// Initial state of every request.
    pub const START: Self = Self::Searching { attempt: 0 };
}

/// How a request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Units committed
    Booked(Booking),
    /// No pool had room for the smallest request size
    Exhausted {
        /// Attempts made before exhaustion was observed
        attempts: usize,
    },
    /// The attempt cap was reached first
    GaveUp {
        /// Attempts made
        attempts: usize,
    },
}

impl RequestOutcome {
    /// The booking, if the request succeeded.
    #[must_use]
    pub const fn booking(&self) -> Option<&Booking> {
        match self {
            Self::Booked(booking) => Some(booking),
            Self::Exhausted { .. } | Self::GaveUp { .. } => None,
        }
    }

    /// Number of units granted (0 unless booked).
    #[must_use]
    pub fn granted(&self) -> usize {
        self.booking().map_or(0, Booking::len)
    }
}
