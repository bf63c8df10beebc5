//! Simulation application layer.

mod simulator;

pub use simulator::TraceSimulator;
