//! Shared type vocabulary for the jsonsql compiler.
//!
//! This crate is the single source of truth for the SQL dialect enum and the
//! domain-level type lattice (field types and inferred expression types),
//! shared by the core compiler and by downstream callers that want to talk
//! about dialects without pulling in the whole engine.

mod dialect;
mod field;

pub use dialect::Dialect;
pub use field::{ExprType, FieldType};
