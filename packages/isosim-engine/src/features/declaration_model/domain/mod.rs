//! Declaration model domain types.

mod declarations;
mod handles;
mod ops;

pub use declarations::{
    Conformance, ConformanceLocation, FunctionDecl, Model, ProtocolDecl, Requirement,
    StoredProperty, TypeDecl,
};
pub use handles::{FunctionId, PropertyId, ProtocolId, TypeId};
pub use ops::{CallOp, Dispatch, MutateOp, Op};
