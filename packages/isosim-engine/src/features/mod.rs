//! Feature modules, one vertical slice per concern.

pub mod catalog;
pub mod declaration_model;
pub mod propagation;
pub mod simulation;
