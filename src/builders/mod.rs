//! Builders to construct endpoint components from configuration.

pub mod runtime_builder;

pub use runtime_builder::build_runtime;
