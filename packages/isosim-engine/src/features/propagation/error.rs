//! Propagation errors

use thiserror::Error;

use crate::shared::models::IsolationDomain;

#[derive(Debug, Error)]
pub enum PropagationError {
    /// A synchronous operation needed to enter a named domain it was not
    /// already running in. Sync sites cannot hop, so the run halts.
    #[error("isolation violation at '{operation}': requires '{required}' but would execute in '{executing}' with no hop available")]
    IsolationViolation {
        operation: String,
        required: IsolationDomain,
        executing: IsolationDomain,
    },
}

impl PropagationError {
    /// Name of the operation that triggered the violation.
    pub fn operation(&self) -> &str {
        match self {
            PropagationError::IsolationViolation { operation, .. } => operation,
        }
    }
}

pub type Result<T> = std::result::Result<T, PropagationError>;
