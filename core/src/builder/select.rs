//! SELECT builder: selection tree, relationship joins, condition, pagination.

use jsonsql_types::Dialect;

use crate::ast::{SelectQuery, SelectionItem};
use crate::builder::{relationship_join, where_clause_from};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::eval::parse_condition;
use crate::eval::parse_expression;
use crate::resolve::{from_clause, implicit_conditions, resolve_field_path};
use crate::state::ParserState;
use crate::value::format_number_relaxed;

/// A parsed SELECT, ready for clause assembly.
#[derive(Debug, Clone)]
pub struct ParsedSelect {
    pub dialect: Dialect,
    pub select_fields: Vec<String>,
    pub from: String,
    pub joins: Vec<String>,
    pub where_clause: Option<String>,
    pub limit: Option<f64>,
    pub offset: Option<f64>,
}

/// Walks a SELECT query into a [`ParsedSelect`].
pub fn parse_select_query(query: &SelectQuery, config: &Config) -> Result<ParsedSelect> {
    config.table(&query.root_table)?;
    let mut state = ParserState::new(config, query.root_table.clone());

    if query.selection.is_empty() {
        return Err(Error::shape("Selection cannot be empty"));
    }
    let mut select_fields = Vec::new();
    process_selection(&query.selection, &query.root_table, "", &mut state, &mut select_fields)?;

    let mut where_parts = implicit_conditions(&query.root_table, true, &state);
    if let Some(condition) = &query.condition {
        where_parts.push(parse_condition(condition, &mut state)?);
    }

    let (limit, offset) = match query.pagination {
        Some(p) => (p.limit, p.offset),
        None => (None, None),
    };

    Ok(ParsedSelect {
        dialect: config.dialect,
        select_fields,
        from: from_clause(&query.root_table, &state),
        joins: state.joins.iter().map(|j| j.sql.clone()).collect(),
        where_clause: where_clause_from(where_parts),
        limit,
        offset,
    })
}

fn process_selection(
    entries: &[(String, SelectionItem)],
    current_table: &str,
    alias_prefix: &str,
    state: &mut ParserState<'_>,
    out: &mut Vec<String>,
) -> Result<()> {
    for (key, item) in entries {
        match item {
            SelectionItem::Field => {
                let resolved = resolve_field_path(&format!("{current_table}.{key}"), state)?;
                out.push(format!("{} AS \"{alias_prefix}{key}\"", resolved.select.field));
            }
            SelectionItem::Expression(expr) => {
                let sql = parse_expression(expr, state)?;
                out.push(format!("{sql} AS \"{alias_prefix}{key}\""));
            }
            SelectionItem::Nested(sub) => {
                relationship_join(current_table, key, state)?;
                let child_prefix = format!("{alias_prefix}{key}.");
                process_selection(sub, key, &child_prefix, state, out)?;
            }
        }
    }
    Ok(())
}

/// Assembles the final SQL in fixed clause order:
/// `SELECT … FROM … [JOINs…] [WHERE …] [LIMIT n] [OFFSET m]`.
#[must_use]
pub fn compile_select_query(parsed: &ParsedSelect) -> String {
    let mut sql = format!("SELECT {} FROM {}", parsed.select_fields.join(", "), parsed.from);
    for join in &parsed.joins {
        sql.push(' ');
        sql.push_str(join);
    }
    if let Some(where_clause) = &parsed.where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    if let Some(limit) = parsed.limit {
        sql.push_str(" LIMIT ");
        sql.push_str(&format_number_relaxed(limit));
    }
    if let Some(offset) = parsed.offset {
        sql.push_str(" OFFSET ");
        sql.push_str(&format_number_relaxed(offset));
    }
    sql
}

/// Parses and compiles in one step.
pub fn build_select_query(query: &SelectQuery, config: &Config) -> Result<String> {
    let parsed = parse_select_query(query, config)?;
    let sql = compile_select_query(&parsed);
    crate::trace_build!("select", &sql);
    Ok(sql)
}
