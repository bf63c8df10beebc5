/*
 * isosim - Isolation Domain Propagation Simulator
 *
 * Models how isolation-domain annotations propagate through a declaration
 * graph (types, protocols, functions, stored properties) and where every
 * call, mutation and observer of a run actually executes. Runs are
 * deterministic replays: a scenario pairs an immutable model with a fixed
 * entry script, and the simulator records one step per operation, with
 * cross-domain hops as explicit data.
 *
 * Feature-First Architecture:
 * - shared/    : common vocabulary (IsolationDomain, DomainRegistry)
 * - features/  : vertical slices, declaration_model -> propagation ->
 *                simulation -> catalog
 * - config/    : versioned scenario files (authoring YAML + machine format)
 */

/// Scenario file loading and export
pub mod config;
/// Crate-level error aggregate
pub mod errors;
/// Feature modules
pub mod features;
/// Shared models
pub mod shared;

// Re-exports for the public API
pub use errors::{IsosimError, Result};
pub use features::catalog::{
    build_scenario, catalog, find_scenario, AnnotationSite, CatalogEntry, Expectation,
    CANONICAL_DOMAIN,
};
pub use features::declaration_model::{
    CallOp, Conformance, ConformanceLocation, Dispatch, FunctionDecl, FunctionId, Model,
    ModelBuilder, ModelError, MutateOp, Op, PropertyId, ProtocolDecl, ProtocolId, Requirement,
    StoredProperty, TypeDecl, TypeId,
};
pub use features::propagation::{
    effective_domain, effective_property_domain, resolve_call, resolve_mutation,
    PropagationEngine, PropagationError, Resolution, StepKind, TraceStep,
};
pub use features::simulation::{HaltedRun, RunStats, Scenario, Trace, TraceSimulator};
pub use shared::models::{DomainRegistry, IsolationDomain};
