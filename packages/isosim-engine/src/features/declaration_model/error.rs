//! Declaration model errors
//!
//! All construction problems are fatal and surface immediately; a finished
//! model is fully resolved and the propagation engine never re-checks
//! handles.

use thiserror::Error;

use crate::shared::models::DomainError;

#[derive(Debug, Error)]
pub enum ModelError {
    /// A reference to a declaration the model never issued.
    #[error("unknown declaration: {what} referenced by {referrer}")]
    UnknownDeclaration { what: String, referrer: String },

    /// A conflicting re-declaration under an existing name.
    #[error("duplicate declaration: {what} already declared on {owner}")]
    DuplicateDeclaration { what: String, owner: String },

    /// An annotation names a domain missing from the registry.
    #[error("unknown domain '{name}' (registered: {registered:?})")]
    UnknownDomain {
        name: String,
        registered: Vec<String>,
    },

    /// A conformance requirement has no concrete function satisfying it.
    #[error("type '{ty}' conforms to '{protocol}' but no function satisfies requirement '{requirement}'")]
    MissingWitness {
        ty: String,
        protocol: String,
        requirement: String,
    },

    /// The call graph contains a cycle, so a trace would never terminate.
    #[error("recursive declaration: call cycle through '{function}'")]
    RecursiveDeclaration { function: String },

    /// On-change observers run inline with the assignment and must be
    /// synchronous.
    #[error("observer for property '{property}' must be a synchronous function")]
    AsyncObserver { property: String },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type Result<T> = std::result::Result<T, ModelError>;
