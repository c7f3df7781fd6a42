//! Theatre seat booking simulation.
//!
//! Customers race to book one to three seats each in one of several
//! theatres. Every customer runs as its own task; seats are claimed through
//! the per-seat locking protocol of `seatlock-core`, and after all customers
//! finish the [`Report`] lists who holds which seats.
//!
//! # Configuration
//!
//! See [`Config::from_env`] for the environment variables read at startup.
//! A `.env` file in the working directory is loaded first when present.

pub mod app;
pub mod config;
pub mod report;

pub use app::{build_coordinator, run_simulation, AppError};
pub use config::Config;
pub use report::{Report, TheatreReport};
