//! Concurrency tests for the ordered-locking reservation protocol.
//!
//! These tests run many tasks on a multi-threaded runtime against
//! overlapping candidate subsets and verify that nothing deadlocks, no unit
//! is ever owned twice and a failed attempt leaves no trace.
//!
//! Run with: `cargo test -p seatlock-core --test pool_protocol_test`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use seatlock_core::types::units;
use seatlock_core::{ActorId, CandidateFault, Contention, ResourcePool, UnitIndex};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Subsets that would deadlock pairwise if locked in the order given.
fn adversarial_subsets() -> Vec<Vec<UnitIndex>> {
    vec![
        units(&[1, 2, 3]),
        units(&[3, 2, 1]),
        units(&[2, 3, 1]),
        units(&[3, 1]),
        units(&[2, 1]),
        units(&[4, 3, 2]),
        units(&[1, 4]),
        units(&[4, 1, 3]),
    ]
}

/// Test: tasks repeatedly hold reversed and rotated subsets, then release.
///
/// Every hold sleeps while its locks are held. Unordered acquisition would
/// hang here within a handful of iterations; the timeout turns a hang into
/// a failure.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reversed_lock_orders_do_not_deadlock() {
    let pool = Arc::new(ResourcePool::new(4));
    let subsets = adversarial_subsets();

    let mut handles = Vec::new();
    for task in 0..32 {
        let pool = Arc::clone(&pool);
        let subsets = subsets.clone();
        handles.push(tokio::spawn(async move {
            for round in 0..25 {
                let subset = &subsets[(task + round) % subsets.len()];
                let hold = pool.try_hold(subset).await.expect("nothing is committed yet");
                tokio::time::sleep(Duration::from_micros(200)).await;
                drop(hold);
            }
        }));
    }

    let all = futures::future::join_all(handles);
    let results = timeout(Duration::from_secs(30), all)
        .await
        .expect("ordered lock acquisition must not deadlock");

    for result in results {
        result.expect("task panicked");
    }
    assert_eq!(pool.booked_count(), 0);
    assert_eq!(pool.available_units(), units(&[1, 2, 3, 4]));
}

/// Test: 100 concurrent actors race for overlapping subsets of one pool.
///
/// Verifies that every unit ends with at most one owner and that each
/// winner's whole subset carries its identity.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_double_book() {
    let pool = Arc::new(ResourcePool::new(6));
    let subsets = adversarial_subsets();

    let mut handles = Vec::new();
    for id in 0..100_u32 {
        let pool = Arc::clone(&pool);
        let subset = subsets[id as usize % subsets.len()].clone();
        handles.push(tokio::spawn(async move {
            let actor = ActorId::new(id);
            let won = match pool.try_hold(&subset).await {
                Ok(hold) => {
                    tokio::task::yield_now().await;
                    hold.confirm(actor);
                    true
                }
                Err(_) => false,
            };
            (actor, subset, won)
        }));
    }

    let results = timeout(Duration::from_secs(30), futures::future::join_all(handles))
        .await
        .expect("reservations must terminate");

    let owners = pool.owner_snapshot();
    let mut claimed = BTreeSet::new();

    for result in results {
        let (actor, subset, won) = result.expect("task panicked");
        if won {
            for unit in &subset {
                assert_eq!(owners.get(unit), Some(&actor), "winner must own every unit");
                assert!(claimed.insert(*unit), "unit {unit} granted twice");
            }
        }
    }

    assert_eq!(claimed.len(), pool.booked_count());
    assert_eq!(owners.len(), pool.booked_count());
}

/// Test: a subset with one unit already owned commits nothing.
#[tokio::test]
async fn test_failed_validation_changes_no_unit() {
    let pool = ResourcePool::new(5);
    let first = ActorId::new(1);
    let second = ActorId::new(2);

    assert!(pool.try_reserve(&units(&[4]), first).await);
    let before_owners = pool.owner_snapshot();
    let before_available = pool.available_units();

    let result = pool.try_hold(&units(&[2, 3, 4])).await;
    assert_eq!(
        result.err(),
        Some(Contention::AlreadyReserved {
            units: units(&[4])
        })
    );
    assert!(!pool.try_reserve(&units(&[4, 3, 2]), second).await);

    assert_eq!(pool.owner_snapshot(), before_owners);
    assert_eq!(pool.available_units(), before_available);
    assert_eq!(pool.unavailable_among(&units(&[2, 3, 4])), units(&[4]));
}

/// Test: a waiting hold observes the commit made by the holder it waited on.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_waiter_sees_commit_of_previous_holder() {
    let pool = Arc::new(ResourcePool::new(3));

    let hold = pool.try_hold(&units(&[1, 2])).await.unwrap();

    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.try_hold(&units(&[2, 3])).await.map(|hold| hold.len()) })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished(), "waiter must block on unit 2");

    hold.confirm(ActorId::new(1));

    let outcome = timeout(Duration::from_secs(5), waiter)
        .await
        .expect("waiter must wake after release")
        .unwrap();
    assert_eq!(
        outcome,
        Err(Contention::AlreadyReserved {
            units: units(&[2])
        })
    );
    assert_eq!(pool.available_units(), units(&[3]));
}

#[tokio::test]
async fn test_duplicate_candidate_is_rejected_not_deadlocked() {
    let pool = ResourcePool::new(3);

    let result = timeout(Duration::from_secs(1), pool.try_hold(&units(&[1, 3, 1])))
        .await
        .expect("duplicate units must be rejected before locking");

    assert_eq!(
        result.err(),
        Some(Contention::InvalidCandidate(CandidateFault::Duplicate(
            UnitIndex::new(1)
        )))
    );
}

// ============================================================================
// Property: a sequence of attempts matches a simple model
// ============================================================================

const MODEL_POOL_SIZE: usize = 8;

fn attempt_strategy() -> impl Strategy<Value = (Vec<usize>, u32)> {
    (prop::collection::vec(0..=MODEL_POOL_SIZE + 1, 0..=3), 1..50_u32)
}

/// What the pool should answer, given the owners committed so far.
fn model_accepts(owners: &BTreeMap<UnitIndex, ActorId>, candidate: &[usize]) -> bool {
    let distinct: BTreeSet<_> = candidate.iter().collect();
    !candidate.is_empty()
        && distinct.len() == candidate.len()
        && candidate
            .iter()
            .all(|&n| (1..=MODEL_POOL_SIZE).contains(&n) && !owners.contains_key(&UnitIndex::new(n)))
}

proptest! {
    #[test]
    fn prop_reservations_follow_model(attempts in prop::collection::vec(attempt_strategy(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let pool = ResourcePool::new(MODEL_POOL_SIZE);
        let mut model: BTreeMap<UnitIndex, ActorId> = BTreeMap::new();

        for (candidate, actor) in attempts {
            let actor = ActorId::new(actor);
            let expected = model_accepts(&model, &candidate);
            let reserved = runtime.block_on(pool.try_reserve(&units(&candidate), actor));

            prop_assert_eq!(reserved, expected);
            if expected {
                for &n in &candidate {
                    model.insert(UnitIndex::new(n), actor);
                }
            }

            prop_assert_eq!(pool.owner_snapshot(), model.clone());
            prop_assert_eq!(pool.booked_count() + pool.available_units().len(), MODEL_POOL_SIZE);
        }
    }
}
