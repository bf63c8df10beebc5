//! Per-operation trace records
//!
//! Suspension is explicit data, not control flow: when an operation crosses
//! into another domain, the step records the domain the caller suspended in.
//! Same-domain calls carry no hop.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::models::IsolationDomain;

/// What kind of operation a step records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Entry into a declared function.
    Call { is_async: bool },
    /// A stored-property assignment.
    Mutation,
    /// An on-change observer fired by a mutation.
    Observer,
}

/// One resolved operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Declared name of the function or property.
    pub operation: String,
    pub kind: StepKind,
    /// Domain the operation executes in.
    pub domain: IsolationDomain,
    /// Domain the caller suspended in, present only when the operation
    /// crossed domains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hop: Option<IsolationDomain>,
}

impl TraceStep {
    pub fn crossed_domains(&self) -> bool {
        self.hop.is_some()
    }
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.domain)?;
        match self.kind {
            StepKind::Mutation => write!(f, " (mutation)")?,
            StepKind::Observer => write!(f, " (observer)")?,
            StepKind::Call { .. } => {}
        }
        if let Some(from) = &self.hop {
            write!(f, " (hop from {from})")?;
        }
        Ok(())
    }
}
