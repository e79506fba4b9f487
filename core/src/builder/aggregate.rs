//! Aggregation builder: GROUP BY keys and aggregated output columns.

use jsonsql_types::Dialect;

use crate::ast::AggregationQuery;
use crate::builder::{relationship_join, where_clause_from};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::eval::{parse_condition, parse_expression};
use crate::functions;
use crate::resolve::{from_clause, implicit_conditions, resolve_field_path};
use crate::state::ParserState;

/// A parsed aggregation, ready for clause assembly.
#[derive(Debug, Clone)]
pub struct ParsedAggregation {
    pub dialect: Dialect,
    pub select_fields: Vec<String>,
    /// The root FROM entry plus, in data-table mode, one alias per extra
    /// logical table.
    pub from: Vec<String>,
    pub joins: Vec<String>,
    pub where_clause: Option<String>,
    pub group_by: Vec<String>,
}

/// Walks an aggregation query into a [`ParsedAggregation`].
pub fn parse_aggregation_query(
    query: &AggregationQuery,
    config: &Config,
) -> Result<ParsedAggregation> {
    config.table(&query.table)?;
    if query.group_by.is_empty() && query.aggregated_fields.is_empty() {
        return Err(Error::shape(
            "Aggregation query must have at least one group by field or aggregated field",
        ));
    }

    let mut state = ParserState::new(config, query.table.clone());
    let mut extra_from = Vec::new();
    let mut where_parts = implicit_conditions(&query.table, true, &state);

    let mut select_fields = Vec::new();
    let mut group_by = Vec::new();
    for reference in &query.group_by {
        let resolved = resolve_field_path(reference, &state)?;
        ensure_table(
            &resolved.path.table_name,
            &mut state,
            &mut extra_from,
            &mut where_parts,
        )?;
        select_fields.push(format!("{} AS \"{}\"", resolved.select.field, resolved.select.alias));
        group_by.push(resolved.select.field);
    }

    for (alias, aggregated) in &query.aggregated_fields {
        let spec = functions::lookup(&aggregated.function)?;
        if !spec.aggregate {
            return Err(Error::shape(format!(
                "Function '{}' is not an aggregation function",
                spec.name
            )));
        }
        spec.check_arity(1 + aggregated.additional_arguments.len())?;

        let inner = if aggregated.field == "*" {
            if spec.name != "COUNT" {
                return Err(Error::arity(format!(
                    "Aggregation function '{}' cannot be used with '*'. Only COUNT(*) is supported.",
                    spec.name
                )));
            }
            "*".to_string()
        } else {
            let resolved = resolve_field_path(&aggregated.field, &state)?;
            ensure_table(
                &resolved.path.table_name,
                &mut state,
                &mut extra_from,
                &mut where_parts,
            )?;
            spec.check_argument(
                0,
                resolved.select.target_type,
                resolved.select.field,
                config.dialect,
            )?
        };

        let mut args = vec![inner];
        for (index, argument) in aggregated.additional_arguments.iter().enumerate() {
            let sql = parse_expression(argument, &mut state)?;
            let actual = state.expression_type(argument);
            args.push(spec.check_argument(1 + index, actual, sql, config.dialect)?);
        }

        select_fields.push(format!("{} AS \"{alias}\"", spec.emit(&args, config.dialect)));
    }

    if let Some(condition) = &query.condition {
        where_parts.push(parse_condition(condition, &mut state)?);
    }

    let mut from = vec![from_clause(&query.table, &state)];
    from.extend(extra_from);

    Ok(ParsedAggregation {
        dialect: config.dialect,
        select_fields,
        from,
        joins: state.joins.iter().map(|j| j.sql.clone()).collect(),
        where_clause: where_clause_from(where_parts),
        group_by,
    })
}

/// Brings a referenced logical table into scope. Regular schemas get a LEFT
/// JOIN to the root; in data-table mode each extra logical table becomes
/// another alias of the physical table, related through WHERE.
fn ensure_table(
    table: &str,
    state: &mut ParserState<'_>,
    extra_from: &mut Vec<String>,
    where_parts: &mut Vec<String>,
) -> Result<()> {
    if table == state.root_table || state.processed_tables.contains(table) {
        return Ok(());
    }
    match state.config.data_table.as_ref().filter(|_| state.data_table_enabled) {
        Some(dt) => {
            let root = state.root_table.clone();
            let (root_field, other_field) =
                state.config.find_relationship(&root, table).ok_or_else(|| {
                    Error::relationship(format!(
                        "No relationship found between '{root}' and '{table}'"
                    ))
                })?;
            let root_field = root_field.to_string();
            let other_field = other_field.to_string();
            extra_from.push(format!("{} AS \"{table}\"", dt.table));
            where_parts.extend(implicit_conditions(table, false, state));
            where_parts.push(crate::builder::join_condition(
                &root,
                &root_field,
                table,
                &other_field,
                state,
            )?);
            state.processed_tables.insert(table.to_string());
            Ok(())
        }
        None => {
            let root = state.root_table.clone();
            relationship_join(&root, table, state)
        }
    }
}

/// Assembles the final SQL in fixed clause order:
/// `SELECT … FROM … [JOINs] [WHERE …] [GROUP BY …]`.
#[must_use]
pub fn compile_aggregation_query(parsed: &ParsedAggregation) -> String {
    let mut sql = format!("SELECT {} FROM {}", parsed.select_fields.join(", "), parsed.from.join(", "));
    for join in &parsed.joins {
        sql.push(' ');
        sql.push_str(join);
    }
    if let Some(where_clause) = &parsed.where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    if !parsed.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&parsed.group_by.join(", "));
    }
    sql
}

/// Parses and compiles in one step.
pub fn build_aggregation_query(query: &AggregationQuery, config: &Config) -> Result<String> {
    let parsed = parse_aggregation_query(query, config)?;
    let sql = compile_aggregation_query(&parsed);
    crate::trace_build!("aggregation", &sql);
    Ok(sql)
}
