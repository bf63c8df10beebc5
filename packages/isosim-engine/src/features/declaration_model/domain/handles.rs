//! Typed declaration handles
//!
//! Opaque newtype indices into the model arenas. A handle is only meaningful
//! for the model whose builder issued it; every reference is validated at
//! declaration time and again when the model is finished.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(u32);

/// Handle to a protocol declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolId(u32);

/// Handle to a concrete function declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(u32);

/// Handle to a stored property declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(u32);

macro_rules! impl_handle {
    ($name:ident, $label:literal) => {
        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// Arena index backing this handle.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

impl_handle!(TypeId, "type");
impl_handle!(ProtocolId, "protocol");
impl_handle!(FunctionId, "function");
impl_handle!(PropertyId, "property");
