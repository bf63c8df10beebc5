/*
 * Propagation
 *
 * Resolves where every operation of a run executes. The fallback chain
 * (function annotation, owning type annotation, protocol annotation at a
 * dispatched boundary, unconstrained) is pure data lookup; the engine then
 * applies the site rules: async call sites hop between domains, sync call
 * sites inherit or fail, mutations require the site to satisfy the
 * property's domain before the write is recorded.
 *
 * Architecture:
 * - domain/      : fallback chain, site rules, trace step records
 * - application/ : `PropagationEngine`, the depth-first walker
 */

pub mod application;
pub mod domain;
pub mod error;

pub use application::PropagationEngine;
pub use domain::{
    effective_domain, effective_property_domain, resolve_call, resolve_mutation, Resolution,
    StepKind, TraceStep,
};
pub use error::PropagationError;
