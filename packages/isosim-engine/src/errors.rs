//! Error types for isosim
//!
//! Feature modules define their own error enums; this is the crate-level
//! aggregate used at API boundaries and by the CLI.

use thiserror::Error;

use crate::config::ScenarioFileError;
use crate::features::declaration_model::ModelError;
use crate::features::propagation::PropagationError;
use crate::features::simulation::HaltedRun;

#[derive(Debug, Error)]
pub enum IsosimError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("propagation error: {0}")]
    Propagation(#[from] PropagationError),

    #[error(transparent)]
    Halted(#[from] HaltedRun),

    #[error("scenario file error: {0}")]
    ScenarioFile(#[from] ScenarioFileError),

    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IsosimError>;
