//! Declaration model application layer.

mod builder;

pub use builder::ModelBuilder;
