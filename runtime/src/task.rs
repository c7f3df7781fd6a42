//! Actor tasks - one unit of concurrent work per customer.

use crate::coordinator::Coordinator;
use crate::search::RequestOutcome;
use seatlock_core::ActorId;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};

/// Invokes [`Coordinator::request`] exactly once for one actor.
#[derive(Debug, Clone)]
pub struct CustomerTask {
    actor: ActorId,
    coordinator: Arc<Coordinator>,
}

impl CustomerTask {
    /// Create a task for `actor`.
    #[must_use]
    pub const fn new(actor: ActorId, coordinator: Arc<Coordinator>) -> Self {
        Self { actor, coordinator }
    }

    /// Actor this task requests for.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        self.actor
    }

    /// Run the request on the current task.
    pub async fn run(self) -> (ActorId, RequestOutcome) {
        let outcome = self.coordinator.request(self.actor).await;
        (self.actor, outcome)
    }

    /// Spawn the request onto the tokio runtime.
    pub fn spawn(self) -> JoinHandle<(ActorId, RequestOutcome)> {
        tokio::spawn(self.run())
    }
}

/// Spawn one task per actor into a [`JoinSet`].
pub fn spawn_customers(
    coordinator: &Arc<Coordinator>,
    actors: impl IntoIterator<Item = ActorId>,
) -> JoinSet<(ActorId, RequestOutcome)> {
    let mut set = JoinSet::new();
    for actor in actors {
        set.spawn(CustomerTask::new(actor, Arc::clone(coordinator)).run());
    }
    set
}

/// Spawn one task per actor and wait for all of them.
///
/// Outcomes are returned in completion order.
///
/// # Errors
///
/// Returns the first [`tokio::task::JoinError`] if a task panicked or was
/// cancelled; the remaining tasks are aborted when the set drops.
pub async fn run_customers(
    coordinator: &Arc<Coordinator>,
    actors: impl IntoIterator<Item = ActorId>,
) -> Result<Vec<(ActorId, RequestOutcome)>, tokio::task::JoinError> {
    let mut set = spawn_customers(coordinator, actors);
    let mut outcomes = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        outcomes.push(joined?);
    }
    Ok(outcomes)
}
