//! DELETE builder.

use jsonsql_types::Dialect;

use crate::ast::DeleteQuery;
use crate::config::Config;
use crate::error::Result;
use crate::eval::parse_condition;
use crate::state::ParserState;

/// A parsed DELETE, ready for clause assembly.
#[derive(Debug, Clone)]
pub struct ParsedDelete {
    pub dialect: Dialect,
    pub table: String,
    pub where_clause: Option<String>,
}

/// Walks a DELETE query into a [`ParsedDelete`].
pub fn parse_delete_query(query: &DeleteQuery, config: &Config) -> Result<ParsedDelete> {
    config.table(&query.table)?;

    let mut state = ParserState::new(config, query.table.clone());
    state.data_table_enabled = false;

    let where_clause = match &query.condition {
        Some(condition) => Some(parse_condition(condition, &mut state)?),
        None => None,
    };

    Ok(ParsedDelete {
        dialect: config.dialect,
        table: query.table.clone(),
        where_clause,
    })
}

/// Assembles `DELETE FROM <T> [WHERE …]`.
#[must_use]
pub fn compile_delete_query(parsed: &ParsedDelete) -> String {
    let mut sql = format!("DELETE FROM {}", parsed.table);
    if let Some(where_clause) = &parsed.where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    sql
}

/// Parses and compiles in one step.
pub fn build_delete_query(query: &DeleteQuery, config: &Config) -> Result<String> {
    let parsed = parse_delete_query(query, config)?;
    let sql = compile_delete_query(&parsed);
    crate::trace_build!("delete", &sql);
    Ok(sql)
}
