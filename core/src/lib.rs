//! # Seatlock Core
//!
//! Resource pools for all-or-nothing reservation of unit subsets under heavy
//! contention.
//!
//! ## Core Concepts
//!
//! - **Unit**: one lockable, bookable slot (a seat)
//! - **Pool**: a fixed-size collection of independently lockable units (a theatre)
//! - **Actor**: one concurrent requester (a customer)
//! - **Hold**: every unit of a candidate subset locked and validated, not yet committed
//! - **Commit**: irreversible transition of a held subset from available to owned
//!
//! ## Protocol
//!
//! Locks are always taken in ascending unit order, so holds never deadlock.
//! Availability can be read without locking to narrow the search; only the
//! locked validation inside [`ResourcePool::try_hold`] is authoritative.
//!
//! ## Example
//!
//! ```
//! use seatlock_core::{ResourcePool, types::{units, ActorId}};
//!
//! # tokio_test::block_on(async {
//! let pool = ResourcePool::new(5);
//!
//! assert!(pool.try_reserve(&units(&[3, 1]), ActorId::new(1)).await);
//! assert!(!pool.try_reserve(&units(&[1, 2]), ActorId::new(2)).await);
//!
//! assert_eq!(pool.booked_count(), 2);
//! assert_eq!(pool.available_units(), units(&[2, 4, 5]));
//! # });
//! ```

pub mod environment;
pub mod error;
pub mod pool;
pub mod types;

// Re-export commonly used types
pub use environment::{
    AttemptPlan, NoSettle, RandomSelection, RandomSettle, SelectionPolicy, SettleDelay,
};
pub use error::{CandidateFault, ConfigError, Contention, MAX_UNITS_PER_REQUEST};
pub use pool::{ResourcePool, SeatHold};
pub use rand::rngs::StdRng;
pub use types::{ActorId, PoolId, UnitIndex, UnitRef};
