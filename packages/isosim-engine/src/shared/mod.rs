//! Cross-feature shared modules.

pub mod models;
