//! Simulation domain types.

mod scenario;
mod trace;

pub use scenario::Scenario;
pub use trace::{HaltedRun, RunStats, Trace};
