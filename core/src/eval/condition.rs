//! Condition evaluation: Boolean SQL fragments.

use jsonsql_types::ExprType;

use crate::ast::{Condition, Expression, FieldCondition, OperatorMap};
use crate::dialect::DialectExt;
use crate::error::{Error, Result};
use crate::eval::expression::parse_expression;
use crate::resolve::{from_clause, implicit_conditions, resolve_field_path};
use crate::state::ParserState;
use crate::value::Scalar;

/// What a comparison applies to: a resolved field, or (for the internal
/// NEW_ROW rewrite) an arbitrary expression.
struct ComparisonTarget {
    sql: String,
    expected: ExprType,
    nullable: bool,
    /// Name used in error messages.
    display: String,
}

/// Evaluates a condition node to a Boolean SQL fragment.
pub fn parse_condition(cond: &Condition, state: &mut ParserState<'_>) -> Result<String> {
    match cond {
        Condition::And(items) => combine(items, "AND", "$and", state),
        Condition::Or(items) => combine(items, "OR", "$or", state),
        Condition::Not(inner) => {
            let inner_sql = parse_condition(inner, state)?;
            Ok(format!("NOT ({inner_sql})"))
        }
        Condition::Exists { table, condition } => parse_exists(table, condition, state),
        Condition::Expr(expr) => {
            let sql = parse_expression(expr, state)?;
            let ty = state.expression_type(expr);
            if !ty.matches(ExprType::Boolean) {
                return Err(Error::type_mismatch(format!(
                    "Condition expression must be of type boolean, got {ty}"
                )));
            }
            Ok(sql)
        }
        Condition::Fields(entries) => {
            let mut clauses = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                field_entry_clauses(key, value, state, &mut clauses)?;
            }
            join_clauses(clauses)
        }
        Condition::Compare { name, lhs, ops } => {
            let sql = parse_expression(lhs, state)?;
            let target = ComparisonTarget {
                sql,
                expected: state.expression_type(lhs),
                nullable: true,
                display: name.clone(),
            };
            let mut clauses = Vec::new();
            operator_clauses(&target, ops, state, &mut clauses)?;
            join_clauses(clauses)
        }
    }
}

fn combine(
    items: &[Condition],
    separator: &str,
    combinator: &str,
    state: &mut ParserState<'_>,
) -> Result<String> {
    if items.is_empty() {
        return Err(Error::shape(format!(
            "{combinator} condition should be a non-empty array."
        )));
    }
    let parts = items
        .iter()
        .map(|item| parse_condition(item, state))
        .collect::<Result<Vec<_>>>()?;
    if parts.len() == 1 {
        return Ok(parts.into_iter().next().expect("len checked"));
    }
    Ok(format!("({})", parts.join(&format!(" {separator} "))))
}

fn parse_exists(
    table: &str,
    condition: &Condition,
    state: &mut ParserState<'_>,
) -> Result<String> {
    state.config.table(table)?;

    let previous_root = std::mem::replace(&mut state.root_table, table.to_string());
    let inner = parse_condition(condition, state);
    state.root_table = previous_root;
    let inner = inner?;

    let from = from_clause(table, state);
    let mut parts = implicit_conditions(table, false, state);
    parts.push(inner);
    Ok(format!("EXISTS (SELECT 1 FROM {from} WHERE {})", parts.join(" AND ")))
}

fn field_entry_clauses(
    key: &str,
    value: &FieldCondition,
    state: &mut ParserState<'_>,
    clauses: &mut Vec<String>,
) -> Result<()> {
    if key.starts_with("NEW_ROW.") {
        return Err(Error::schema(
            "NEW_ROW references are only allowed in UPDATE conditions",
        ));
    }
    // Bare keys resolve against the current root table (S3-style
    // `{active: true}` in mutation conditions).
    let qualified;
    let reference = if key.contains('.') {
        key
    } else {
        qualified = format!("{}.{key}", state.root_table);
        qualified.as_str()
    };
    let resolved = resolve_field_path(reference, state)?;
    let target = ComparisonTarget {
        sql: resolved.select.field.clone(),
        expected: resolved.select.target_type,
        nullable: resolved.nullable(),
        display: resolved.path.field_name.clone(),
    };
    match value {
        FieldCondition::Ops(ops) => operator_clauses(&target, ops, state, clauses),
        FieldCondition::Value(expr) => {
            clauses.push(comparison_clause(&target, "$eq", expr, state)?);
            Ok(())
        }
    }
}

fn join_clauses(clauses: Vec<String>) -> Result<String> {
    match clauses.len() {
        0 => Err(Error::shape("Conditions cannot be empty objects")),
        1 => Ok(clauses.into_iter().next().expect("len checked")),
        _ => Ok(format!("({})", clauses.join(" AND "))),
    }
}

/// Emits one clause per present operator, in canonical order:
/// `$ne, $eq, $gt, $gte, $lt, $lte, $like, $ilike, $regex, $in, $nin`.
fn operator_clauses(
    target: &ComparisonTarget,
    ops: &OperatorMap,
    state: &mut ParserState<'_>,
    clauses: &mut Vec<String>,
) -> Result<()> {
    let comparisons: [(&str, &Option<Expression>); 9] = [
        ("$ne", &ops.ne),
        ("$eq", &ops.eq),
        ("$gt", &ops.gt),
        ("$gte", &ops.gte),
        ("$lt", &ops.lt),
        ("$lte", &ops.lte),
        ("$like", &ops.like),
        ("$ilike", &ops.ilike),
        ("$regex", &ops.regex),
    ];
    for (op, value) in comparisons {
        if let Some(expr) = value {
            clauses.push(comparison_clause(target, op, expr, state)?);
        }
    }
    if let Some(items) = &ops.r#in {
        clauses.push(membership_clause(target, "$in", items, state)?);
    }
    if let Some(items) = &ops.nin {
        clauses.push(membership_clause(target, "$nin", items, state)?);
    }
    Ok(())
}

fn comparison_clause(
    target: &ComparisonTarget,
    op: &str,
    value: &Expression,
    state: &mut ParserState<'_>,
) -> Result<String> {
    // NULL comparisons flip to IS [NOT] NULL and require a nullable field.
    if matches!(value, Expression::Scalar(Scalar::Null)) && matches!(op, "$eq" | "$ne") {
        if !target.nullable {
            return Err(Error::type_mismatch(format!(
                "Field '{}' is not nullable, and cannot be compared with NULL",
                target.display
            )));
        }
        let suffix = if op == "$eq" { "IS NULL" } else { "IS NOT NULL" };
        return Ok(format!("{} {suffix}", target.sql));
    }

    match op {
        "$like" | "$ilike" => {
            let rhs = checked_operand(target, op, ExprType::String, value, state)?;
            let operator = state.config.dialect.like_operator(op == "$ilike");
            Ok(format!("{} {operator} {rhs}", lhs_for(target, ExprType::String, state)))
        }
        "$regex" => {
            let rhs = checked_operand(target, op, ExprType::String, value, state)?;
            state
                .config
                .dialect
                .regex_match(&lhs_for(target, ExprType::String, state), &rhs)
        }
        _ => {
            let sql = parse_expression(value, state)?;
            let actual = state.expression_type(value);
            let operator = match op {
                "$ne" => "!=",
                "$eq" => "=",
                "$gt" => ">",
                "$gte" => ">=",
                "$lt" => "<",
                _ => "<=",
            };
            if actual.matches(target.expected) {
                return Ok(format!("{} {operator} {sql}", target.sql));
            }
            if actual == ExprType::String {
                // A string operand compares against the text form of the field.
                let lhs = state.config.dialect.cast(&target.sql, "TEXT");
                return Ok(format!("{lhs} {operator} {sql}"));
            }
            Err(Error::type_mismatch(format!(
                "Field type mismatch for '{op}' comparison on '{}': expected {}, got {actual}",
                target.display, target.expected
            )))
        }
    }
}

/// Evaluates an operand that must be of `expected` type.
fn checked_operand(
    target: &ComparisonTarget,
    op: &str,
    expected: ExprType,
    value: &Expression,
    state: &mut ParserState<'_>,
) -> Result<String> {
    let sql = parse_expression(value, state)?;
    let actual = state.expression_type(value);
    if actual.matches(expected) {
        return Ok(sql);
    }
    Err(Error::type_mismatch(format!(
        "Field type mismatch for '{op}' comparison on '{}': expected {expected}, got {actual}",
        target.display
    )))
}

/// The field side of a pattern comparison, cast to text when the field is
/// not already textual.
fn lhs_for(target: &ComparisonTarget, expected: ExprType, state: &ParserState<'_>) -> String {
    if target.expected.matches(expected) {
        target.sql.clone()
    } else {
        state.config.dialect.cast(&target.sql, "TEXT")
    }
}

fn membership_clause(
    target: &ComparisonTarget,
    op: &str,
    items: &[Expression],
    state: &mut ParserState<'_>,
) -> Result<String> {
    if items.is_empty() {
        return Err(Error::shape(format!("{op} condition should be a non-empty array.")));
    }
    let mut expected = target.expected;
    let mut rendered = Vec::with_capacity(items.len());
    for item in items {
        let sql = parse_expression(item, state)?;
        let actual = state.expression_type(item);
        if !actual.matches(expected) {
            return Err(Error::type_mismatch(format!(
                "Field type mismatch for '{op}' comparison on '{}': expected {expected}, got {actual}",
                target.display
            )));
        }
        if expected == ExprType::Any && actual != ExprType::Any {
            // Pin the element type so mixed-type arrays still fail.
            expected = actual;
        }
        rendered.push(sql);
    }
    let keyword = if op == "$in" { "IN" } else { "NOT IN" };
    Ok(format!("{} {keyword} ({})", target.sql, rendered.join(", ")))
}
