//! Propagation domain logic.

mod resolution;
mod step;

pub use resolution::{
    effective_domain, effective_property_domain, resolve_call, resolve_mutation, Resolution,
};
pub use step::{StepKind, TraceStep};
