//! Trace records
//!
//! A `Trace` is the deterministic record of one clean run. Equality and the
//! serialized form cover only the deterministic payload (scenario name and
//! steps); wall-clock statistics ride along for diagnostics but never
//! participate in comparison, so two runs of the same scenario compare and
//! serialize identically.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::propagation::{PropagationError, TraceStep};
use crate::shared::models::IsolationDomain;

/// Per-run statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Operations that acquired a domain.
    pub operations: usize,
    /// Cross-domain hops.
    pub hops: usize,
    pub elapsed_micros: u64,
}

/// Ordered record of one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    /// Name of the scenario that was replayed.
    pub scenario: String,
    pub steps: Vec<TraceStep>,
    #[serde(skip)]
    pub stats: RunStats,
}

impl Trace {
    /// The run as (operation, domain) pairs, in execution order.
    pub fn operations(&self) -> Vec<(&str, &IsolationDomain)> {
        self.steps
            .iter()
            .map(|s| (s.operation.as_str(), &s.domain))
            .collect()
    }
}

impl PartialEq for Trace {
    fn eq(&self, other: &Self) -> bool {
        self.scenario == other.scenario && self.steps == other.steps
    }
}

impl Eq for Trace {}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "  {step}")?;
        }
        write!(
            f,
            "clean trace: {} operations, {} hops",
            self.stats.operations, self.stats.hops
        )
    }
}

/// A run stopped by an isolation violation.
///
/// Steps recorded before the halt stay valid; the offending operation never
/// acquires a domain.
#[derive(Debug, Error)]
#[error("run of '{scenario}' halted: {violation}")]
pub struct HaltedRun {
    pub scenario: String,
    /// Steps recorded before the halt.
    pub steps: Vec<TraceStep>,
    #[source]
    pub violation: PropagationError,
}
