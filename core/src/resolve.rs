//! Field-path resolution.
//!
//! Decodes `table.column[->key…]` references against the schema and emits
//! the physical SQL expression: a plain column, a JSON arrow chain, or the
//! data-table JSON extraction with its storage cast. All builders and
//! evaluators share this one rewrite point.

use jsonsql_types::{ExprType, FieldType};

use crate::config::FieldConfig;
use crate::dialect::DialectExt;
use crate::error::{Error, Result};
use crate::state::ParserState;
use crate::value::quote_string;

/// The SQL-facing part of a resolved reference.
#[derive(Debug, Clone)]
pub struct SelectExpr {
    /// The physical SQL expression for the field.
    pub field: String,
    /// The default alias: the raw path with the root-table prefix stripped.
    pub alias: String,
    /// The inferred type of the expression.
    pub target_type: ExprType,
}

/// The schema-facing part of a resolved reference.
#[derive(Debug, Clone)]
pub struct FieldPath {
    pub table_name: String,
    pub field_name: String,
    pub json_path: Vec<String>,
    pub field_config: FieldConfig,
}

/// A fully resolved field reference.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub select: SelectExpr,
    pub path: FieldPath,
}

impl ResolvedField {
    /// Whether the reference can hold NULL: declared-nullable fields, and
    /// every JSON path extraction (the key may be absent).
    #[must_use]
    pub fn nullable(&self) -> bool {
        self.path.field_config.nullable || !self.path.json_path.is_empty()
    }
}

/// Resolves a textual field path against the schema.
pub fn resolve_field_path(reference: &str, state: &ParserState<'_>) -> Result<ResolvedField> {
    let (table_name, rest) = reference
        .split_once('.')
        .filter(|(table, rest)| !table.is_empty() && !rest.is_empty())
        .ok_or_else(|| Error::schema(format!("Invalid field reference '{reference}'")))?;

    let mut segments = rest.split("->");
    let field_name = segments.next().unwrap_or_default();
    let json_path: Vec<String> = segments.map(str::to_string).collect();

    // Plain multi-dot references (a.b.c with no arrows) are not field paths.
    if field_name.contains('.') {
        return Err(Error::schema(format!("Invalid field reference '{reference}'")));
    }

    let field_config = state.config.field(table_name, field_name)?.clone();

    if !json_path.is_empty() && field_config.field_type != FieldType::Object {
        return Err(Error::schema(format!(
            "JSON path access '{}' is only allowed on JSON fields, but field '{}' is of type '{}'",
            json_path.join("->"),
            field_name,
            field_config.field_type
        )));
    }

    let (field, target_type) = physical_expr(table_name, &field_config, &json_path, state);

    let alias = match reference.strip_prefix(&format!("{}.", state.root_table)) {
        Some(stripped) => stripped.to_string(),
        None => reference.to_string(),
    };

    Ok(ResolvedField {
        select: SelectExpr { field, alias, target_type },
        path: FieldPath {
            table_name: table_name.to_string(),
            field_name: field_name.to_string(),
            json_path,
            field_config,
        },
    })
}

/// Emits the physical SQL for a schema field, applying the data-table
/// rewrite when configured.
fn physical_expr(
    table: &str,
    field: &FieldConfig,
    json_path: &[String],
    state: &ParserState<'_>,
) -> (String, ExprType) {
    let dialect = state.config.dialect;

    let data_table = if state.data_table_enabled {
        state.config.data_table.as_ref()
    } else {
        None
    };

    if let Some(dt) = data_table {
        let base = format!("{table}.{}", dt.data_field);
        if json_path.is_empty() {
            if field.field_type == FieldType::Object {
                // Structural extraction keeps the final `->`.
                return (format!("{base}->'{}'", field.name), ExprType::Object);
            }
            let extracted = format!("{base}->>'{}'", field.name);
            let sql = if field.field_type.stored_as_text(dialect) {
                extracted
            } else {
                dialect.cast(&extracted, field.field_type.storage_type(dialect))
            };
            return (sql, field.field_type.into());
        }
        // T.data->'f'->'a'->>'b': the declared field hop becomes structural,
        // the last JSON hop extracts text.
        let mut sql = format!("{base}->'{}'", field.name);
        append_json_path(&mut sql, json_path);
        return (sql, ExprType::Any);
    }

    if json_path.is_empty() {
        return (format!("{table}.{}", field.name), field.field_type.into());
    }

    let mut sql = format!("{table}.{}", field.name);
    append_json_path(&mut sql, json_path);
    (sql, ExprType::Any)
}

/// Appends `->'a'->'b'->>'c'` hops; path keys go through the escaper, they
/// are caller input.
fn append_json_path(sql: &mut String, json_path: &[String]) {
    for key in &json_path[..json_path.len() - 1] {
        sql.push_str("->");
        sql.push_str(&quote_string(key));
    }
    sql.push_str("->>");
    sql.push_str(&quote_string(&json_path[json_path.len() - 1]));
}

/// The FROM-clause rendering of a logical table: the bare name, or the
/// aliased physical table in data-table mode.
#[must_use]
pub fn from_clause(table: &str, state: &ParserState<'_>) -> String {
    match state.config.data_table.as_ref().filter(|_| state.data_table_enabled) {
        Some(dt) => format!("{} AS \"{table}\"", dt.table),
        None => table.to_string(),
    }
}

/// The implicit conditions a logical table carries in data-table mode: the
/// discriminator equality, plus (for the query root only) the configured raw
/// fragments.
#[must_use]
pub fn implicit_conditions(table: &str, is_root: bool, state: &ParserState<'_>) -> Vec<String> {
    let Some(dt) = state.config.data_table.as_ref().filter(|_| state.data_table_enabled) else {
        return Vec::new();
    };
    let mut conditions = vec![format!("{table}.{} = '{table}'", dt.table_field)];
    if is_root {
        conditions.extend(dt.where_conditions.iter().cloned());
    }
    conditions
}
