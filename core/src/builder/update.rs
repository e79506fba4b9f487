//! UPDATE builder, including the NEW_ROW condition rewrite.

use jsonsql_types::{Dialect, ExprType};

use crate::ast::UpdateQuery;
use crate::builder::where_clause_from;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::eval::{parse_condition, parse_expression, rewrite_update_condition};
use crate::state::ParserState;
use crate::value::quote_identifier;

/// A parsed UPDATE, ready for clause assembly.
#[derive(Debug, Clone)]
pub struct ParsedUpdate {
    pub dialect: Dialect,
    pub table: String,
    pub assignments: Vec<(String, String)>,
    pub where_clause: Option<String>,
}

/// Walks an UPDATE query into a [`ParsedUpdate`].
pub fn parse_update_query(query: &UpdateQuery, config: &Config) -> Result<ParsedUpdate> {
    let table = config.table(&query.table)?;
    if query.updates.is_empty() {
        return Err(Error::shape("Update query must have at least one field to update"));
    }

    let mut state = ParserState::new(config, query.table.clone());
    state.data_table_enabled = false;

    let mut assignments = Vec::with_capacity(query.updates.len());
    for (name, expr) in &query.updates {
        let field = table.field(name).ok_or_else(|| {
            Error::schema(format!(
                "Field '{name}' is not allowed or does not exist in '{}'",
                query.table
            ))
        })?;
        let sql = parse_expression(expr, &mut state)?;
        let actual = state.expression_type(expr);
        if actual == ExprType::Null {
            if !field.nullable {
                return Err(Error::type_mismatch(format!(
                    "Field '{name}' is not nullable, and cannot be set to NULL"
                )));
            }
        } else if !actual.matches(field.field_type.into()) {
            return Err(Error::type_mismatch(format!(
                "Field type mismatch for assignment on '{name}': expected {}, got {actual}",
                field.field_type
            )));
        }
        assignments.push((name.clone(), sql));
    }

    let mut where_parts = Vec::new();
    if let Some(condition) = &query.condition {
        if let Some(rewritten) =
            rewrite_update_condition(condition, &query.table, &query.updates)?
        {
            where_parts.push(parse_condition(&rewritten, &mut state)?);
        }
    }

    Ok(ParsedUpdate {
        dialect: config.dialect,
        table: query.table.clone(),
        assignments,
        where_clause: where_clause_from(where_parts),
    })
}

/// Assembles `UPDATE <T> SET "c1" = e1, … [WHERE …]`.
#[must_use]
pub fn compile_update_query(parsed: &ParsedUpdate) -> String {
    let assignments: Vec<String> = parsed
        .assignments
        .iter()
        .map(|(name, value)| format!("{} = {value}", quote_identifier(name)))
        .collect();
    let mut sql = format!("UPDATE {} SET {}", parsed.table, assignments.join(", "));
    if let Some(where_clause) = &parsed.where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    sql
}

/// Parses and compiles in one step.
pub fn build_update_query(query: &UpdateQuery, config: &Config) -> Result<String> {
    let parsed = parse_update_query(query, config)?;
    let sql = compile_update_query(&parsed);
    crate::trace_build!("update", &sql);
    Ok(sql)
}
