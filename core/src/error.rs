//! Error types for the jsonsql compiler.

use compact_str::CompactString;
use thiserror::Error;

/// Category of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid dialect, malformed schema, unknown variable.
    Config,
    /// Unknown table/field, invalid identifier, JSON path on a non-object field.
    Schema,
    /// Structurally invalid query value (empty `$and`, empty selection, ...).
    Shape,
    /// Type mismatch between operator, field, or function argument types.
    Type,
    /// Function argument count mismatch.
    Arity,
    /// Value-level violation (division by zero, invalid UUID, unsupported operator).
    Domain,
    /// No relationship between two referenced tables.
    Relationship,
    /// A statically evaluated NEW_ROW subcondition is false.
    UpdateCondition,
}

/// Compile error: one variant per failure category, message templates
/// rendered verbatim by `Display`.
///
/// Every error aborts the entire compile; no partial SQL is ever returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Config(CompactString),

    #[error("{0}")]
    Schema(CompactString),

    #[error("{0}")]
    Shape(CompactString),

    #[error("{0}")]
    Type(CompactString),

    #[error("{0}")]
    Arity(CompactString),

    #[error("{0}")]
    Domain(CompactString),

    #[error("{0}")]
    Relationship(CompactString),

    #[error("{0}")]
    UpdateCondition(CompactString),
}

impl Error {
    pub(crate) fn config(msg: impl AsRef<str>) -> Self {
        Error::Config(CompactString::new(msg.as_ref()))
    }

    pub(crate) fn schema(msg: impl AsRef<str>) -> Self {
        Error::Schema(CompactString::new(msg.as_ref()))
    }

    pub(crate) fn shape(msg: impl AsRef<str>) -> Self {
        Error::Shape(CompactString::new(msg.as_ref()))
    }

    pub(crate) fn type_mismatch(msg: impl AsRef<str>) -> Self {
        Error::Type(CompactString::new(msg.as_ref()))
    }

    pub(crate) fn arity(msg: impl AsRef<str>) -> Self {
        Error::Arity(CompactString::new(msg.as_ref()))
    }

    pub(crate) fn domain(msg: impl AsRef<str>) -> Self {
        Error::Domain(CompactString::new(msg.as_ref()))
    }

    pub(crate) fn relationship(msg: impl AsRef<str>) -> Self {
        Error::Relationship(CompactString::new(msg.as_ref()))
    }

    pub(crate) fn update_condition(msg: impl AsRef<str>) -> Self {
        Error::UpdateCondition(CompactString::new(msg.as_ref()))
    }

    /// The failure category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Schema(_) => ErrorKind::Schema,
            Error::Shape(_) => ErrorKind::Shape,
            Error::Type(_) => ErrorKind::Type,
            Error::Arity(_) => ErrorKind::Arity,
            Error::Domain(_) => ErrorKind::Domain,
            Error::Relationship(_) => ErrorKind::Relationship,
            Error::UpdateCondition(_) => ErrorKind::UpdateCondition,
        }
    }
}

/// Result type for compile operations.
pub type Result<T> = core::result::Result<T, Error>;
