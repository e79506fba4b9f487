//! INSERT builder.

use jsonsql_types::{Dialect, ExprType};

use crate::ast::InsertQuery;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::eval::check_insert_condition;
use crate::value::quote_identifier;

/// A parsed INSERT, ready for clause assembly.
#[derive(Debug, Clone)]
pub struct ParsedInsert {
    pub dialect: Dialect,
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

/// Walks an INSERT query into a [`ParsedInsert`].
///
/// The column list is the row's keys as provided, followed by every declared
/// field of the table not present in the row, filled with NULL.
pub fn parse_insert_query(query: &InsertQuery, config: &Config) -> Result<ParsedInsert> {
    let table = config.table(&query.table)?;

    let mut columns = Vec::with_capacity(table.allowed_fields.len());
    let mut values = Vec::with_capacity(table.allowed_fields.len());
    for (name, scalar) in &query.new_row {
        let field = table.field(name).ok_or_else(|| {
            Error::schema(format!(
                "Field '{name}' is not allowed or does not exist in '{}'",
                query.table
            ))
        })?;
        let actual = scalar.expr_type();
        if actual == ExprType::Null {
            if !field.nullable {
                return Err(Error::type_mismatch(format!(
                    "Field '{name}' is not nullable, and cannot be set to NULL"
                )));
            }
        } else if !actual.matches(field.field_type.into()) {
            return Err(Error::type_mismatch(format!(
                "Field type mismatch for field '{name}': expected {}, got {actual}",
                field.field_type
            )));
        }
        columns.push(name.clone());
        values.push(scalar.to_sql(config.dialect)?);
    }

    for field in &table.allowed_fields {
        if !query.new_row.iter().any(|(name, _)| *name == field.name) {
            columns.push(field.name.clone());
            values.push("NULL".to_string());
        }
    }

    if let Some(condition) = &query.condition {
        check_insert_condition(condition, &query.table, &query.new_row, config)?;
    }

    Ok(ParsedInsert {
        dialect: config.dialect,
        table: query.table.clone(),
        columns,
        values,
    })
}

/// Assembles `INSERT INTO <T> ("c1", "c2", …) VALUES (v1, v2, …)`.
#[must_use]
pub fn compile_insert_query(parsed: &ParsedInsert) -> String {
    let columns: Vec<String> = parsed.columns.iter().map(|c| quote_identifier(c)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        parsed.table,
        columns.join(", "),
        parsed.values.join(", ")
    )
}

/// Parses and compiles in one step.
pub fn build_insert_query(query: &InsertQuery, config: &Config) -> Result<String> {
    let parsed = parse_insert_query(query, config)?;
    let sql = compile_insert_query(&parsed);
    crate::trace_build!("insert", &sql);
    Ok(sql)
}
