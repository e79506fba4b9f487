//! Schema model and config normalization.
//!
//! A [`Config`] is an immutable input snapshot: the dialect, the allowed
//! tables with their typed fields, inline variables, relationships, and the
//! optional data-table mode. `Config::from_value` accepts the JSON surface
//! form and normalizes it (dialect parse, identifier checks, relationship
//! shape collapse).

use std::collections::HashMap;

use jsonsql_types::{Dialect, FieldType};
use serde::Deserialize;
use serde_json::Value;

use crate::ast::de::scalar_from_value;
use crate::error::{Error, Result};
use crate::value::Scalar;

/// A typed field of an allowed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
}

/// An allowed table: its fields, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TableConfig {
    pub allowed_fields: Vec<FieldConfig>,
}

impl TableConfig {
    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.allowed_fields.iter().find(|f| f.name == name)
    }
}

/// A directed relationship between two tables. The historical one-to-many /
/// many-to-one tag is accepted on input and ignored; only the pair matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub table: String,
    pub field: String,
    pub to_table: String,
    pub to_field: String,
}

/// Data-table mode: every logical row lives as a JSON blob in one physical
/// table, selected by a discriminator column.
#[derive(Debug, Clone)]
pub struct DataTableConfig {
    pub table: String,
    pub data_field: String,
    pub table_field: String,
    pub where_conditions: Vec<String>,
}

/// Compiler configuration: dialect, schema, variables, relationships, and
/// optional data-table mode.
#[derive(Debug, Clone)]
pub struct Config {
    pub dialect: Dialect,
    pub tables: HashMap<String, TableConfig>,
    pub variables: HashMap<String, Scalar>,
    pub relationships: Vec<Relationship>,
    pub data_table: Option<DataTableConfig>,
}

impl Config {
    /// Creates a config with the given dialect and no tables.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Config {
            dialect,
            tables: HashMap::new(),
            variables: HashMap::new(),
            relationships: Vec::new(),
            data_table: None,
        }
    }

    /// Looks up an allowed table.
    pub fn table(&self, name: &str) -> Result<&TableConfig> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::schema(format!("Table '{name}' is not allowed or does not exist")))
    }

    /// Looks up a field of an allowed table.
    pub fn field(&self, table: &str, name: &str) -> Result<&FieldConfig> {
        self.table(table)?.field(name).ok_or_else(|| {
            Error::schema(format!("Field '{name}' is not allowed or does not exist in '{table}'"))
        })
    }

    /// Finds a relationship connecting `a` and `b` in either direction.
    /// Returns the `(a_field, b_field)` column pair when found.
    #[must_use]
    pub fn find_relationship(&self, a: &str, b: &str) -> Option<(&str, &str)> {
        for rel in &self.relationships {
            if rel.table == a && rel.to_table == b {
                return Some((rel.field.as_str(), rel.to_field.as_str()));
            }
            if rel.table == b && rel.to_table == a {
                return Some((rel.to_field.as_str(), rel.field.as_str()));
            }
        }
        None
    }

    /// Parses and normalizes a config from its JSON surface form.
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawConfig::deserialize(value)
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;

        let dialect = Dialect::parse(&raw.dialect)
            .ok_or_else(|| Error::config(format!("Invalid dialect '{}'", raw.dialect)))?;

        let mut tables = HashMap::with_capacity(raw.tables.len());
        for (name, table) in raw.tables {
            check_identifier(&name)?;
            let mut allowed_fields = Vec::with_capacity(table.allowed_fields.len());
            for field in table.allowed_fields {
                check_identifier(&field.name)?;
                let field_type = FieldType::parse(&field.field_type).ok_or_else(|| {
                    Error::config(format!(
                        "Invalid field type '{}' for field '{}'",
                        field.field_type, field.name
                    ))
                })?;
                allowed_fields.push(FieldConfig {
                    name: field.name,
                    field_type,
                    nullable: field.nullable,
                });
            }
            tables.insert(name, TableConfig { allowed_fields });
        }

        let mut variables = HashMap::with_capacity(raw.variables.len());
        for (name, value) in raw.variables {
            let scalar = scalar_from_value(&value)
                .map_err(|_| Error::config(format!("Invalid value for variable '{name}'")))?;
            variables.insert(name, scalar);
        }

        let relationships = raw.relationships.into_iter().map(RawRelationship::normalize).collect();

        let data_table = match raw.data_table {
            Some(dt) => {
                check_identifier(&dt.table)?;
                check_identifier(&dt.data_field)?;
                check_identifier(&dt.table_field)?;
                Some(DataTableConfig {
                    table: dt.table,
                    data_field: dt.data_field,
                    table_field: dt.table_field,
                    where_conditions: dt.where_conditions,
                })
            }
            None => None,
        };

        Ok(Config { dialect, tables, variables, relationships, data_table })
    }
}

impl<'de> serde::Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Config::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Identifiers must match `^[a-z][A-Za-z0-9_]*$`.
pub(crate) fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(s: &str) -> Result<()> {
    if is_valid_identifier(s) {
        Ok(())
    } else {
        Err(Error::schema(format!("Invalid identifier '{s}'")))
    }
}

// Raw surface shapes, deserialized before normalization.

#[derive(Deserialize)]
struct RawConfig {
    dialect: String,
    #[serde(default)]
    tables: HashMap<String, RawTable>,
    #[serde(default)]
    variables: HashMap<String, Value>,
    #[serde(default)]
    relationships: Vec<RawRelationship>,
    #[serde(rename = "dataTable", default)]
    data_table: Option<RawDataTable>,
}

#[derive(Deserialize)]
struct RawTable {
    #[serde(rename = "allowedFields")]
    allowed_fields: Vec<RawField>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    nullable: bool,
}

/// The two accepted relationship surface shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRelationship {
    Flat {
        table: String,
        field: String,
        #[serde(rename = "toTable")]
        to_table: String,
        #[serde(rename = "toField")]
        to_field: String,
        #[serde(rename = "type", default)]
        _type: Option<String>,
    },
    Endpoints {
        from: RelationshipEnd,
        to: RelationshipEnd,
    },
}

#[derive(Deserialize)]
struct RelationshipEnd {
    table: String,
    field: String,
}

impl RawRelationship {
    fn normalize(self) -> Relationship {
        match self {
            RawRelationship::Flat { table, field, to_table, to_field, _type } => {
                Relationship { table, field, to_table, to_field }
            }
            RawRelationship::Endpoints { from, to } => Relationship {
                table: from.table,
                field: from.field,
                to_table: to.table,
                to_field: to.field,
            },
        }
    }
}

#[derive(Deserialize)]
struct RawDataTable {
    table: String,
    #[serde(rename = "dataField")]
    data_field: String,
    #[serde(rename = "tableField")]
    table_field: String,
    #[serde(rename = "whereConditions", default)]
    where_conditions: Vec<String>,
}
