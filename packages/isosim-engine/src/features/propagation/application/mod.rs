//! Propagation application layer.

mod engine;

pub use engine::PropagationEngine;
