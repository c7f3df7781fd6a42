//! Wiring: configuration to coordinator to finished report.

use crate::config::Config;
use crate::report::Report;
use seatlock_core::{ActorId, ConfigError, ResourcePool};
use seatlock_runtime::metrics::MetricsError;
use seatlock_runtime::{run_customers, Coordinator, RequestOutcome, SearchPolicy};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinError;

/// Errors surfaced by the simulation binary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration was rejected
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A customer task panicked or was cancelled
    #[error("Customer task failed: {0}")]
    Join(#[from] JoinError),

    /// Metrics exporter could not be set up
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Build a coordinator over fresh theatres as described by `config`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the configuration is invalid.
pub fn build_coordinator(config: &Config) -> Result<Coordinator, ConfigError> {
    config.validate()?;

    let pools = (0..config.theatre_count)
        .map(|_| ResourcePool::new(config.seats_per_theatre))
        .collect();

    let mut policy = SearchPolicy::builder();
    if let Some(max_attempts) = config.max_attempts {
        policy = policy.max_attempts(max_attempts);
    }
    if let Some(seed) = config.seed {
        policy = policy.seed(seed);
    }

    Coordinator::builder(pools)
        .selection(config.selection()?)
        .settle(config.settle()?)
        .search_policy(policy.build())
        .build()
}

/// Run one simulation: every customer concurrently, then the report.
///
/// # Errors
///
/// - [`AppError::Config`] if the configuration is invalid
/// - [`AppError::Join`] if a customer task failed
pub async fn run_simulation(config: &Config) -> Result<Report, AppError> {
    let coordinator = Arc::new(build_coordinator(config)?);

    tracing::info!(
        theatres = config.theatre_count,
        seats_per_theatre = config.seats_per_theatre,
        customers = config.customer_count,
        "Starting simulation"
    );

    let started = Instant::now();
    let outcomes = run_customers(&coordinator, (1..=config.customer_count).map(ActorId::new)).await?;

    let exhausted = outcomes
        .iter()
        .filter(|(_, outcome)| matches!(outcome, RequestOutcome::Exhausted { .. }))
        .count();
    let gave_up = outcomes
        .iter()
        .filter(|(_, outcome)| matches!(outcome, RequestOutcome::GaveUp { .. }))
        .count();

    tracing::info!(
        booked = coordinator.ledger().len(),
        exhausted,
        gave_up,
        seats = coordinator.total_booked(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Simulation finished"
    );

    Ok(Report::from_coordinator(&coordinator))
}
