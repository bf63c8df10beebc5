//! Scenario file errors
//!
//! Structured errors for the authoring schema: version problems and name
//! resolution failures get their own variants instead of bubbling up as
//! opaque parse errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::features::declaration_model::ModelError;

#[derive(Debug, Error)]
pub enum ScenarioFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing schema version (expected 'version: 1')")]
    MissingVersion,

    #[error("unsupported schema version {found} (supported: {supported:?})")]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// A reference by name that nothing in the file declares.
    #[error("unknown name '{name}' in {context}")]
    UnknownName { name: String, context: String },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, ScenarioFileError>;
