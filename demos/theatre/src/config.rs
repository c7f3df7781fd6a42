//! Configuration management for the theatre simulation.
//!
//! Loads configuration from environment variables with sensible defaults.

use seatlock_core::{ConfigError, PoolId, RandomSelection, RandomSettle};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Simulation configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Number of theatres
    pub theatre_count: usize,
    /// Seats in each theatre
    pub seats_per_theatre: usize,
    /// Number of concurrent customers
    pub customer_count: u32,
    /// Smallest request size
    pub min_seats_per_request: usize,
    /// Largest request size (at most 3)
    pub max_seats_per_request: usize,
    /// Shortest settle delay in milliseconds
    pub settle_min_ms: u64,
    /// Longest settle delay in milliseconds
    pub settle_max_ms: u64,
    /// Attempt cap per customer (unset = retry until sold out)
    pub max_attempts: Option<usize>,
    /// RNG seed for reproducible runs
    pub seed: Option<u64>,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Install the Prometheus recorder and print its output at exit
    pub metrics_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theatre_count: 3,
            seats_per_theatre: 20,
            customer_count: 100,
            min_seats_per_request: 1,
            max_seats_per_request: 3,
            settle_min_ms: 500,
            settle_max_ms: 1000,
            max_attempts: None,
            seed: None,
            log_level: "info".to_string(),
            metrics_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, one call per variable name.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse().ok());

        Self {
            theatre_count: parsed("THEATRE_COUNT").unwrap_or(defaults.theatre_count),
            seats_per_theatre: parsed("SEATS_PER_THEATRE").unwrap_or(defaults.seats_per_theatre),
            customer_count: lookup("CUSTOMER_COUNT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.customer_count),
            min_seats_per_request: parsed("MIN_SEATS_PER_REQUEST")
                .unwrap_or(defaults.min_seats_per_request),
            max_seats_per_request: parsed("MAX_SEATS_PER_REQUEST")
                .unwrap_or(defaults.max_seats_per_request),
            settle_min_ms: lookup("SETTLE_MIN_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.settle_min_ms),
            settle_max_ms: lookup("SETTLE_MAX_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.settle_max_ms),
            max_attempts: parsed("MAX_ATTEMPTS"),
            seed: lookup("SEED").and_then(|s| s.trim().parse().ok()),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            metrics_enabled: lookup("METRICS_ENABLED")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check that the configuration describes a runnable simulation.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.theatre_count == 0 {
            return Err(ConfigError::NoPools);
        }
        if self.seats_per_theatre == 0 {
            return Err(ConfigError::EmptyPool(PoolId::new(1)));
        }
        self.selection()?;
        self.settle()?;
        Ok(())
    }

    /// Request size policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSizeRange`] for an invalid size range.
    pub const fn selection(&self) -> Result<RandomSelection, ConfigError> {
        RandomSelection::new(self.min_seats_per_request, self.max_seats_per_request)
    }

    /// Settle delay policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvertedSettleRange`] if min exceeds max.
    pub fn settle(&self) -> Result<RandomSettle, ConfigError> {
        RandomSettle::new(
            Duration::from_millis(self.settle_min_ms),
            Duration::from_millis(self.settle_max_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.theatre_count, 3);
        assert_eq!(config.seats_per_theatre, 20);
        assert_eq!(config.customer_count, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_variables_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("THEATRE_COUNT", "2"),
            ("SEATS_PER_THEATRE", " 7 "),
            ("CUSTOMER_COUNT", "12"),
            ("MAX_SEATS_PER_REQUEST", "2"),
            ("SETTLE_MIN_MS", "0"),
            ("SETTLE_MAX_MS", "5"),
            ("MAX_ATTEMPTS", "40"),
            ("SEED", "99"),
            ("LOG_LEVEL", "debug"),
            ("METRICS_ENABLED", "true"),
        ]));

        assert_eq!(config.theatre_count, 2);
        assert_eq!(config.seats_per_theatre, 7);
        assert_eq!(config.customer_count, 12);
        assert_eq!(config.max_seats_per_request, 2);
        assert_eq!(config.settle_max_ms, 5);
        assert_eq!(config.max_attempts, Some(40));
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.log_level, "debug");
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("THEATRE_COUNT", "three"),
            ("MAX_ATTEMPTS", "-1"),
        ]));
        assert_eq!(config.theatre_count, 3);
        assert_eq!(config.max_attempts, None);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let config = Config {
            theatre_count: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoPools));

        let config = Config {
            seats_per_theatre: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyPool(PoolId::new(1))));

        let config = Config {
            max_seats_per_request: 4,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSizeRange { min: 1, max: 4 })
        ));

        let config = Config {
            settle_min_ms: 10,
            settle_max_ms: 1,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedSettleRange { .. })
        ));
    }
}
