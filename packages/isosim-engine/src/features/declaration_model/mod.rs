/*
 * Declaration Model
 *
 * The static configuration a simulation runs over: types (possibly
 * embedded), protocols with required signatures, concrete functions with
 * ordered bodies, stored properties with optional observers, and
 * conformance edges. Any declaration may carry an isolation-domain
 * annotation; most carry none and resolve through the fallback chain.
 *
 * Architecture:
 * - domain/      : handles, declaration records, body ops, whole-graph
 *                  validation on the finished `Model`
 * - application/ : `ModelBuilder`, the sole construction path
 *
 * Construction is strict: unknown handles, duplicate names and unknown
 * domains fail at declaration time; witnesses, dispatch legality and
 * acyclicity fail at `finish`.
 */

pub mod application;
pub mod domain;
pub mod error;

pub use application::ModelBuilder;
pub use domain::{
    CallOp, Conformance, ConformanceLocation, Dispatch, FunctionDecl, FunctionId, Model, MutateOp,
    Op, PropertyId, ProtocolDecl, ProtocolId, Requirement, StoredProperty, TypeDecl, TypeId,
};
pub use error::{ModelError, Result};
