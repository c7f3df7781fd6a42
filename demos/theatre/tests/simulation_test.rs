//! End-to-end runs of the theatre simulation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use seatlock_core::ActorId;
use seatlock_runtime::run_customers;
use seatlock_testing::helpers;
use std::sync::Arc;
use theatre::{build_coordinator, run_simulation, Config, Report};

fn fast_config() -> Config {
    Config {
        settle_min_ms: 0,
        settle_max_ms: 3,
        seed: Some(2024),
        ..Config::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_default_sized_run_sells_out_every_theatre() {
    let report = run_simulation(&fast_config()).await.unwrap();

    assert_eq!(report.total_booked(), 60);
    assert!(report.all_within_limits());

    let rendered = report.to_string();
    for theatre in 1..=3 {
        assert!(rendered.contains(&format!("Total seats booked in Theatre {theatre}: 20/20")));
    }
    assert!(rendered.ends_with("All customers booked between 1 and 3 seats."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_report_agrees_with_pools_and_ledger() {
    let config = Config {
        theatre_count: 2,
        seats_per_theatre: 9,
        customer_count: 4,
        ..fast_config()
    };
    let coordinator = Arc::new(build_coordinator(&config).unwrap());

    let outcomes = run_customers(&coordinator, (1..=config.customer_count).map(ActorId::new))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 4);

    helpers::assert_ledger_matches_pools(&coordinator);
    helpers::assert_counts_within(&coordinator, 1..=3);

    let report = Report::from_coordinator(&coordinator);
    assert_eq!(report.total_booked(), coordinator.total_booked());
    for theatre in &report.theatres {
        let listed: usize = theatre.assignments.values().map(Vec::len).sum();
        assert_eq!(listed, theatre.booked);
        assert_eq!(theatre.total, 9);
    }
}

#[tokio::test]
async fn test_invalid_configuration_is_reported() {
    let config = Config {
        theatre_count: 0,
        ..fast_config()
    };
    let err = run_simulation(&config).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid configuration: at least one pool is required");
}
