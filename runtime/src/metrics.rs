//! Prometheus metrics for reservation attempts.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. [`MetricsRecorder`] installs a Prometheus recorder
//! that keeps everything in-process; callers render the text exposition
//! themselves, no listener is opened.
//!
//! # Example
//!
//! ```rust,no_run
//! use seatlock_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//!
//! // ... run the simulation ...
//!
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// In-process Prometheus recorder.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that is not yet installed.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe all metrics and install the Prometheus recorder globally.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), this logs a
    /// warning and leaves the handle empty.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.01, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this instance did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "allocator_attempts_total",
        "Total number of reservation attempts"
    );
    describe_counter!(
        "allocator_contention_total",
        "Total number of attempts that did not commit, by reason"
    );
    describe_counter!(
        "allocator_bookings_total",
        "Total number of committed bookings"
    );
    describe_counter!(
        "allocator_seats_booked_total",
        "Total number of units committed"
    );
    describe_counter!(
        "allocator_exhausted_total",
        "Total number of requests that found every pool sold out"
    );
    describe_counter!(
        "allocator_gave_up_total",
        "Total number of requests that hit the attempt cap"
    );
    describe_histogram!(
        "allocator_request_duration_seconds",
        "Time from a request's first attempt to its terminal state"
    );
}

/// Allocator metrics recorder.
pub struct AllocatorMetrics;

impl AllocatorMetrics {
    /// Record an attempt starting.
    pub fn record_attempt() {
        counter!("allocator_attempts_total").increment(1);
    }

    /// Record an attempt that did not commit.
    pub fn record_contention(reason: &'static str) {
        counter!("allocator_contention_total", "reason" => reason).increment(1);
    }

    /// Record a committed booking of `units` units.
    pub fn record_booking(units: usize) {
        counter!("allocator_bookings_total").increment(1);
        counter!("allocator_seats_booked_total").increment(units as u64);
    }

    /// Record a request ending in exhaustion.
    pub fn record_exhausted() {
        counter!("allocator_exhausted_total").increment(1);
    }

    /// Record a request hitting the attempt cap.
    pub fn record_gave_up() {
        counter!("allocator_gave_up_total").increment(1);
    }

    /// Record how long a request took.
    pub fn record_request(duration: Duration) {
        histogram!("allocator_request_duration_seconds").record(duration.as_secs_f64());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_creation() {
        let recorder = MetricsRecorder::new();
        assert!(recorder.render().is_none());
    }

    #[test]
    fn test_recorder_install_and_render() {
        let mut recorder = MetricsRecorder::new();
        recorder.install().unwrap();

        AllocatorMetrics::record_attempt();
        AllocatorMetrics::record_contention("already_reserved");
        AllocatorMetrics::record_booking(2);

        // Handle is None if another test already installed the recorder.
        if let Some(rendered) = recorder.render() {
            assert!(rendered.contains("allocator_attempts_total"));
            assert!(rendered.contains("allocator_seats_booked_total"));
        }
    }
}
