//! # Seatlock Runtime
//!
//! Drives concurrent actors through the reservation protocol of
//! `seatlock-core`.
//!
//! ## Core Components
//!
//! - **Allocator**: one actor's retry loop across many pools
//! - **Coordinator**: allocator plus the per-actor booking views
//! - **`CustomerTask`**: the unit of concurrent work, one per actor
//!
//! ## Example
//!
//! ```
//! use seatlock_core::{NoSettle, ResourcePool};
//! use seatlock_runtime::{run_customers, Coordinator};
//! use seatlock_core::ActorId;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pools = (0..3).map(|_| ResourcePool::new(20)).collect();
//! let coordinator = Arc::new(Coordinator::builder(pools).settle(NoSettle).build()?);
//!
//! run_customers(&coordinator, (1..=100).map(ActorId::new)).await?;
//!
//! assert!(coordinator.total_booked() <= 60);
//! assert!(coordinator.counts_by_actor().values().all(|n| (1..=3).contains(n)));
//! # Ok(())
//! # }
//! ```

/// Per-actor search loop
pub mod allocator;

/// Harness-facing coordinator
pub mod coordinator;

/// Per-actor aggregation views
pub mod ledger;

/// Prometheus metrics for observability
pub mod metrics;

/// Search policy and request state machine
pub mod search;

/// Actor tasks
pub mod task;

pub use allocator::Allocator;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use ledger::BookingLedger;
pub use search::{Booking, RequestOutcome, SearchPolicy, SearchState};
pub use task::{run_customers, spawn_customers, CustomerTask};
