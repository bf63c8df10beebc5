/*
 * Simulation
 *
 * Replays scenarios and records traces. A scenario is a model plus a fixed
 * entry script; a run executes the script through the propagation engine
 * and either completes with a `Trace` or halts with a `HaltedRun` carrying
 * the steps recorded before the violation.
 *
 * Architecture:
 * - domain/      : `Scenario`, `Trace`, `RunStats`, `HaltedRun`
 * - application/ : `TraceSimulator`
 */

pub mod application;
pub mod domain;

pub use application::TraceSimulator;
pub use domain::{HaltedRun, RunStats, Scenario, Trace};
