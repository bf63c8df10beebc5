//! Function body operations
//!
//! A body is an ordered list of `Op`s. Two kinds exist: a call to another
//! declared function and a mutation of a stored property. Call sites also
//! record how the target is reached, because protocol-dispatched calls are
//! the only place a protocol annotation can attach.

use serde::{Deserialize, Serialize};

use super::handles::{FunctionId, PropertyId, ProtocolId};

/// How a call site reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    /// Direct reference to the concrete declaration.
    Direct,
    /// Dispatch through a reference typed as the given protocol.
    Protocol(ProtocolId),
}

/// A call to another declared function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallOp {
    pub target: FunctionId,
    pub dispatch: Dispatch,
}

impl CallOp {
    pub fn direct(target: FunctionId) -> Self {
        Self {
            target,
            dispatch: Dispatch::Direct,
        }
    }

    pub fn through(target: FunctionId, protocol: ProtocolId) -> Self {
        Self {
            target,
            dispatch: Dispatch::Protocol(protocol),
        }
    }
}

/// An assignment to a stored property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutateOp {
    pub property: PropertyId,
}

/// One statement in a function body or entry script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Call(CallOp),
    Mutate(MutateOp),
}

impl Op {
    /// Direct call to a concrete function.
    pub fn call(target: FunctionId) -> Self {
        Op::Call(CallOp::direct(target))
    }

    /// Call dispatched through a protocol-typed reference.
    pub fn call_through(target: FunctionId, protocol: ProtocolId) -> Self {
        Op::Call(CallOp::through(target, protocol))
    }

    /// Assignment to a stored property.
    pub fn mutate(property: PropertyId) -> Self {
        Op::Mutate(MutateOp { property })
    }
}
