//! Domain-level field types and the inferred expression type lattice.

use core::fmt;

use crate::Dialect;

/// Declared type of a schema field.
///
/// Each field type maps to a dialect-specific storage/cast type via
/// [`FieldType::storage_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Uuid,
    Date,
    #[cfg_attr(feature = "serde", serde(rename = "datetime"))]
    DateTime,
    Object,
}

impl FieldType {
    /// Parse a field type from its config string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "boolean" => Some(FieldType::Boolean),
            "uuid" => Some(FieldType::Uuid),
            "date" => Some(FieldType::Date),
            "datetime" => Some(FieldType::DateTime),
            "object" => Some(FieldType::Object),
            _ => None,
        }
    }

    /// The config-string name of this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Object => "object",
        }
    }

    /// The storage/cast type name for this field type in the given dialect.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonsql_types::{Dialect, FieldType};
    ///
    /// assert_eq!(FieldType::Number.storage_type(Dialect::PostgreSql), "FLOAT");
    /// assert_eq!(FieldType::Number.storage_type(Dialect::SqliteMinimal), "REAL");
    /// assert_eq!(FieldType::Uuid.storage_type(Dialect::SqliteMinimal), "TEXT");
    /// ```
    #[must_use]
    pub const fn storage_type(&self, dialect: Dialect) -> &'static str {
        if dialect.is_postgres() {
            match self {
                FieldType::String => "TEXT",
                FieldType::Number => "FLOAT",
                FieldType::Boolean => "BOOLEAN",
                FieldType::Uuid => "UUID",
                FieldType::Date => "DATE",
                FieldType::DateTime => "TIMESTAMP",
                FieldType::Object => "JSONB",
            }
        } else {
            match self {
                FieldType::String => "TEXT",
                FieldType::Number => "REAL",
                FieldType::Boolean => "BOOLEAN",
                FieldType::Uuid => "TEXT",
                FieldType::Date => "TEXT",
                FieldType::DateTime => "TEXT",
                FieldType::Object => "JSON",
            }
        }
    }

    /// Whether the storage form in this dialect is already plain text, in
    /// which case JSON text extraction needs no cast.
    #[must_use]
    pub const fn stored_as_text(&self, dialect: Dialect) -> bool {
        // storage_type is a const fn over two small tables; compare names.
        matches!(
            (self, dialect.is_postgres()),
            (FieldType::String, _)
                | (FieldType::Uuid, false)
                | (FieldType::Date, false)
                | (FieldType::DateTime, false)
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inferred type of an evaluated expression.
///
/// Extends [`FieldType`] with `null` (the NULL literal) and `any` (accepts
/// any concrete type, produced e.g. by JSON path extraction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprType {
    String,
    Number,
    Boolean,
    Uuid,
    Date,
    DateTime,
    Object,
    Null,
    Any,
}

impl ExprType {
    /// The display name of this type, matching the config-string vocabulary.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExprType::String => "string",
            ExprType::Number => "number",
            ExprType::Boolean => "boolean",
            ExprType::Uuid => "uuid",
            ExprType::Date => "date",
            ExprType::DateTime => "datetime",
            ExprType::Object => "object",
            ExprType::Null => "null",
            ExprType::Any => "any",
        }
    }

    /// Whether a value of this type is acceptable where `expected` is
    /// declared.
    ///
    /// `any` is permissive on both sides, and a plain `date` is accepted
    /// where a `datetime` is expected.
    #[must_use]
    pub fn matches(&self, expected: ExprType) -> bool {
        *self == expected
            || matches!(*self, ExprType::Any)
            || matches!(expected, ExprType::Any)
            || matches!((expected, *self), (ExprType::DateTime, ExprType::Date))
    }
}

impl From<FieldType> for ExprType {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::String => ExprType::String,
            FieldType::Number => ExprType::Number,
            FieldType::Boolean => ExprType::Boolean,
            FieldType::Uuid => ExprType::Uuid,
            FieldType::Date => ExprType::Date,
            FieldType::DateTime => ExprType::DateTime,
            FieldType::Object => ExprType::Object,
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
