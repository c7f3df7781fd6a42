//! End-of-run report: per-theatre seat assignments and the size check.

use seatlock_core::types::display_units;
use seatlock_core::{ActorId, PoolId, UnitIndex, MAX_UNITS_PER_REQUEST};
use seatlock_runtime::Coordinator;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Seats held in one theatre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TheatreReport {
    /// Theatre number
    pub theatre: PoolId,
    /// Customer → seats held here, ascending
    pub assignments: BTreeMap<ActorId, Vec<UnitIndex>>,
    /// Seats booked
    pub booked: usize,
    /// Seats in the theatre
    pub total: usize,
}

/// Snapshot of a finished simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// One entry per theatre, in order
    pub theatres: Vec<TheatreReport>,
    /// Customer → seats booked, for customers that booked
    pub counts: BTreeMap<ActorId, usize>,
}

impl Report {
    /// Read the coordinator's pools and ledger.
    #[must_use]
    pub fn from_coordinator(coordinator: &Coordinator) -> Self {
        let theatres = coordinator
            .pools()
            .iter()
            .enumerate()
            .map(|(position, pool)| {
                let theatre = PoolId::from_position(position);
                TheatreReport {
                    theatre,
                    assignments: coordinator.ledger().units_in_pool(theatre),
                    booked: pool.booked_count(),
                    total: pool.total_units(),
                }
            })
            .collect();

        Self {
            theatres,
            counts: coordinator.counts_by_actor(),
        }
    }

    /// Every customer that booked holds between 1 and 3 seats.
    #[must_use]
    pub fn all_within_limits(&self) -> bool {
        self.counts
            .values()
            .all(|count| (1..=MAX_UNITS_PER_REQUEST).contains(count))
    }

    /// Seats booked across all theatres.
    #[must_use]
    pub fn total_booked(&self) -> usize {
        self.theatres.iter().map(|theatre| theatre.booked).sum()
    }
}

impl fmt::Display for TheatreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Theatre {} customer seat assignments:", self.theatre)?;
        for (actor, seats) in &self.assignments {
            writeln!(
                f,
                "Customer {actor} reserved {} seats: {}",
                seats.len(),
                display_units(seats)
            )?;
        }
        write!(
            f,
            "Total seats booked in Theatre {}: {}/{}",
            self.theatre, self.booked, self.total
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for theatre in &self.theatres {
            writeln!(f, "{theatre}")?;
            writeln!(f)?;
        }
        if self.all_within_limits() {
            write!(f, "All customers booked between 1 and 3 seats.")
        } else {
            write!(f, "Some customers did not book between 1 and 3 seats.")
        }
    }
}
