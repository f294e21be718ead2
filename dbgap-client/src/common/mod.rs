//! Identifier types shared across the crate

pub mod ids;

pub use ids::{VARIABLE_PREFIX, VariableAccession};
