//! Shared model vocabulary used by every feature.

mod domain;

pub use domain::{DomainError, DomainRegistry, IsolationDomain, UNCONSTRAINED_NAME};
