//! Statement builders: one module per operation, plus shared join plumbing.

pub mod aggregate;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use aggregate::{ParsedAggregation, build_aggregation_query, compile_aggregation_query, parse_aggregation_query};
pub use delete::{ParsedDelete, build_delete_query, compile_delete_query, parse_delete_query};
pub use insert::{ParsedInsert, build_insert_query, compile_insert_query, parse_insert_query};
pub use select::{ParsedSelect, build_select_query, compile_select_query, parse_select_query};
pub use update::{ParsedUpdate, build_update_query, compile_update_query, parse_update_query};

use jsonsql_types::FieldType;

use crate::error::{Error, Result};
use crate::resolve::{implicit_conditions, resolve_field_path};
use crate::state::ParserState;

/// Registers a LEFT JOIN from `parent` to `child` through a configured
/// relationship. Repeated references to the same child are idempotent.
pub(crate) fn relationship_join(
    parent: &str,
    child: &str,
    state: &mut ParserState<'_>,
) -> Result<()> {
    let (parent_field, child_field) =
        state.config.find_relationship(parent, child).ok_or_else(|| {
            Error::relationship(format!(
                "No relationship found between '{parent}' and '{child}'"
            ))
        })?;
    if state.processed_tables.contains(child) {
        return Ok(());
    }

    let condition = join_condition(parent, parent_field, child, child_field, state)?;
    let sql = match state.config.data_table.as_ref().filter(|_| state.data_table_enabled) {
        Some(dt) => {
            let mut on_parts = vec![condition];
            on_parts.extend(implicit_conditions(child, false, state));
            format!("LEFT JOIN {} AS \"{child}\" ON {}", dt.table, on_parts.join(" AND "))
        }
        None => format!("LEFT JOIN {child} ON {condition}"),
    };
    state.add_join(child, sql);
    Ok(())
}

/// The `parent.pfield = child.cfield` equality, with UUID casts in postgres
/// when both sides are UUID columns. In data-table mode the resolver's
/// storage casts already carry the types.
pub(crate) fn join_condition(
    parent: &str,
    parent_field: &str,
    child: &str,
    child_field: &str,
    state: &ParserState<'_>,
) -> Result<String> {
    let left = resolve_field_path(&format!("{parent}.{parent_field}"), state)?;
    let right = resolve_field_path(&format!("{child}.{child_field}"), state)?;

    let data_table = state.config.data_table.is_some() && state.data_table_enabled;
    let both_uuid = left.path.field_config.field_type == FieldType::Uuid
        && right.path.field_config.field_type == FieldType::Uuid;
    if state.config.dialect.is_postgres() && both_uuid && !data_table {
        return Ok(format!(
            "CAST({} AS UUID) = CAST({} AS UUID)",
            left.select.field, right.select.field
        ));
    }
    Ok(format!("{} = {}", left.select.field, right.select.field))
}

/// Collapses accumulated WHERE parts into a clause.
pub(crate) fn where_clause_from(parts: Vec<String>) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" AND "))
    }
}
