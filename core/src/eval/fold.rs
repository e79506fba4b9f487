//! Static evaluation: the UPDATE NEW_ROW pre-pass and literal-only INSERT
//! condition checking.
//!
//! The folder only decides comparisons where both sides are literal scalars;
//! everything else stays symbolic and is emitted as SQL by the condition
//! evaluator.

use crate::ast::{Condition, Expression, FieldCondition, OperatorMap};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::value::Scalar;

/// Outcome of statically rewriting a condition.
enum Folded {
    True,
    False,
    Cond(Condition),
}

/// Rewrites an UPDATE condition: `NEW_ROW.f` references are substituted with
/// the value to be written (when `f` is updated) or redirected to the
/// pre-update column (when it is not). Subconditions that reduce to a literal
/// Boolean are folded away when true; a provably false subcondition fails the
/// whole compile.
///
/// Returns `None` when the entire condition folds away.
pub fn rewrite_update_condition(
    cond: &Condition,
    table: &str,
    updates: &[(String, Expression)],
) -> Result<Option<Condition>> {
    match rewrite(cond, table, updates)? {
        Folded::True => Ok(None),
        Folded::False => Err(Error::update_condition("Update condition not met")),
        Folded::Cond(rewritten) => Ok(Some(rewritten)),
    }
}

fn rewrite(cond: &Condition, table: &str, updates: &[(String, Expression)]) -> Result<Folded> {
    match cond {
        Condition::And(items) => {
            let mut kept = Vec::with_capacity(items.len());
            for item in items {
                match rewrite(item, table, updates)? {
                    Folded::True => {}
                    Folded::False => return Ok(Folded::False),
                    Folded::Cond(c) => kept.push(c),
                }
            }
            Ok(recombine(kept, Condition::And, Folded::True))
        }
        Condition::Or(items) => {
            let mut kept = Vec::with_capacity(items.len());
            for item in items {
                match rewrite(item, table, updates)? {
                    Folded::True => return Ok(Folded::True),
                    Folded::False => {}
                    Folded::Cond(c) => kept.push(c),
                }
            }
            Ok(recombine(kept, Condition::Or, Folded::False))
        }
        Condition::Not(inner) => Ok(match rewrite(inner, table, updates)? {
            Folded::True => Folded::False,
            Folded::False => Folded::True,
            Folded::Cond(c) => Folded::Cond(Condition::Not(Box::new(c))),
        }),
        Condition::Exists { table: sub_table, condition } => {
            let condition = match rewrite(condition, table, updates)? {
                Folded::True => Condition::Expr(Expression::Scalar(Scalar::Bool(true))),
                Folded::False => Condition::Expr(Expression::Scalar(Scalar::Bool(false))),
                Folded::Cond(c) => c,
            };
            Ok(Folded::Cond(Condition::Exists {
                table: sub_table.clone(),
                condition: Box::new(condition),
            }))
        }
        Condition::Expr(Expression::Scalar(Scalar::Bool(b))) => {
            Ok(if *b { Folded::True } else { Folded::False })
        }
        Condition::Expr(_) | Condition::Compare { .. } => Ok(Folded::Cond(cond.clone())),
        Condition::Fields(entries) => rewrite_fields(entries, table, updates),
    }
}

fn recombine(
    kept: Vec<Condition>,
    combine: fn(Vec<Condition>) -> Condition,
    empty: Folded,
) -> Folded {
    match kept.len() {
        0 => empty,
        1 => Folded::Cond(kept.into_iter().next().expect("len checked")),
        _ => Folded::Cond(combine(kept)),
    }
}

fn rewrite_fields(
    entries: &[(String, FieldCondition)],
    table: &str,
    updates: &[(String, Expression)],
) -> Result<Folded> {
    if !entries.iter().any(|(key, _)| key.starts_with("NEW_ROW.")) {
        return Ok(Folded::Cond(Condition::Fields(entries.to_vec())));
    }

    let mut field_entries = Vec::new();
    let mut compare_parts = Vec::new();

    for (key, value) in entries {
        let Some(field) = key.strip_prefix("NEW_ROW.") else {
            field_entries.push((key.clone(), value.clone()));
            continue;
        };
        match updates.iter().find(|(name, _)| name == field) {
            None => {
                // Not updated: NEW_ROW.f is the pre-update column.
                field_entries.push((format!("{table}.{field}"), value.clone()));
            }
            Some((_, update_expr)) => {
                let ops = match value {
                    FieldCondition::Ops(ops) => ops.clone(),
                    FieldCondition::Value(expr) => OperatorMap {
                        eq: Some(expr.clone()),
                        ..OperatorMap::default()
                    },
                };
                match fold_substituted(key, update_expr, &ops)? {
                    Folded::True => {}
                    Folded::False => return Ok(Folded::False),
                    Folded::Cond(c) => compare_parts.push(c),
                }
            }
        }
    }

    let mut parts = Vec::new();
    if !field_entries.is_empty() {
        parts.push(Condition::Fields(field_entries));
    }
    parts.extend(compare_parts);
    Ok(recombine(parts, Condition::And, Folded::True))
}

/// Folds each operator of a substituted NEW_ROW comparison; operators that
/// stay symbolic are regrouped into an expression-lhs comparison node.
fn fold_substituted(name: &str, lhs: &Expression, ops: &OperatorMap) -> Result<Folded> {
    let lhs_scalar = lhs.as_scalar();
    let mut residual = OperatorMap::default();

    let fold_one = |op: &str,
                        value: &Option<Expression>,
                        slot: &mut Option<Expression>|
     -> Result<bool> {
        let Some(expr) = value else {
            return Ok(true);
        };
        if let (Some(l), Some(r)) = (lhs_scalar, expr.as_scalar()) {
            if let Some(outcome) = compare_scalars(op, l, r) {
                return Ok(outcome);
            }
        }
        *slot = Some(expr.clone());
        Ok(true)
    };

    if !fold_one("$ne", &ops.ne, &mut residual.ne)?
        || !fold_one("$eq", &ops.eq, &mut residual.eq)?
        || !fold_one("$gt", &ops.gt, &mut residual.gt)?
        || !fold_one("$gte", &ops.gte, &mut residual.gte)?
        || !fold_one("$lt", &ops.lt, &mut residual.lt)?
        || !fold_one("$lte", &ops.lte, &mut residual.lte)?
    {
        return Ok(Folded::False);
    }
    // Pattern operators never fold; they stay symbolic as-is.
    residual.like = ops.like.clone();
    residual.ilike = ops.ilike.clone();
    residual.regex = ops.regex.clone();

    for (op, value, slot) in [
        ("$in", &ops.r#in, &mut residual.r#in),
        ("$nin", &ops.nin, &mut residual.nin),
    ] {
        if let Some(items) = value {
            match fold_membership(op, lhs_scalar, items) {
                Some(true) => {}
                Some(false) => return Ok(Folded::False),
                None => *slot = Some(items.clone()),
            }
        }
    }

    if residual.is_empty() {
        return Ok(Folded::True);
    }
    Ok(Folded::Cond(Condition::Compare {
        name: name.to_string(),
        lhs: lhs.clone(),
        ops: residual,
    }))
}

fn fold_membership(op: &str, lhs: Option<&Scalar>, items: &[Expression]) -> Option<bool> {
    let lhs = lhs?;
    let mut contained = false;
    for item in items {
        match compare_scalars("$eq", lhs, item.as_scalar()?) {
            Some(true) => contained = true,
            Some(false) => {}
            None => return None,
        }
    }
    Some(if op == "$in" { contained } else { !contained })
}

/// Statically decides a literal comparison. `None` means the pair is not
/// statically comparable and must stay symbolic.
fn compare_scalars(op: &str, lhs: &Scalar, rhs: &Scalar) -> Option<bool> {
    match op {
        "$eq" => scalar_eq(lhs, rhs),
        "$ne" => scalar_eq(lhs, rhs).map(|b| !b),
        "$gt" | "$gte" | "$lt" | "$lte" => {
            let ordering = scalar_cmp(lhs, rhs)?;
            Some(match op {
                "$gt" => ordering.is_gt(),
                "$gte" => ordering.is_ge(),
                "$lt" => ordering.is_lt(),
                _ => ordering.is_le(),
            })
        }
        _ => None,
    }
}

fn scalar_eq(lhs: &Scalar, rhs: &Scalar) -> Option<bool> {
    match (lhs, rhs) {
        (Scalar::Null, Scalar::Null) => Some(true),
        (Scalar::Null, _) | (_, Scalar::Null) => Some(false),
        (Scalar::Number(a), Scalar::Number(b)) => Some(a == b),
        (Scalar::String(a), Scalar::String(b)) => Some(a == b),
        (Scalar::Bool(a), Scalar::Bool(b)) => Some(a == b),
        (Scalar::Date(a), Scalar::Date(b)) => Some(a == b),
        (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a == b),
        (Scalar::Uuid(a), Scalar::Uuid(b)) => Some(a == b),
        (Scalar::JsonB(a), Scalar::JsonB(b)) => Some(a == b),
        _ => None,
    }
}

fn scalar_cmp(lhs: &Scalar, rhs: &Scalar) -> Option<std::cmp::Ordering> {
    match (lhs, rhs) {
        (Scalar::Number(a), Scalar::Number(b)) => a.partial_cmp(b),
        (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
        // ISO date/timestamp strings order lexically.
        (Scalar::Date(a), Scalar::Date(b)) => Some(a.cmp(b)),
        (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Statically checks an INSERT condition against the literal row. Emits no
/// SQL: the condition either holds or the compile fails.
pub fn check_insert_condition(
    cond: &Condition,
    table: &str,
    row: &[(String, Scalar)],
    config: &Config,
) -> Result<()> {
    if eval_insert(cond, table, row, config)? {
        Ok(())
    } else {
        Err(Error::domain("Insert condition not met"))
    }
}

fn eval_insert(
    cond: &Condition,
    table: &str,
    row: &[(String, Scalar)],
    config: &Config,
) -> Result<bool> {
    match cond {
        Condition::And(items) => {
            for item in items {
                if !eval_insert(item, table, row, config)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Or(items) => {
            for item in items {
                if eval_insert(item, table, row, config)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Condition::Not(inner) => Ok(!eval_insert(inner, table, row, config)?),
        Condition::Expr(Expression::Scalar(Scalar::Bool(b))) => Ok(*b),
        Condition::Fields(entries) => {
            for (key, value) in entries {
                let field = insert_field_name(key, table)?;
                let lhs = row
                    .iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, scalar)| scalar.clone())
                    .unwrap_or(Scalar::Null);
                if !eval_insert_entry(&lhs, value, config)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Err(Error::shape("Insert conditions can only compare literal values")),
    }
}

/// Accepts bare, `NEW_ROW.`-prefixed, and own-table-qualified references.
fn insert_field_name<'k>(key: &'k str, table: &str) -> Result<&'k str> {
    if let Some(field) = key.strip_prefix("NEW_ROW.") {
        return Ok(field);
    }
    match key.split_once('.') {
        None => Ok(key),
        Some((prefix, field)) if prefix == table => Ok(field),
        Some(_) => Err(Error::shape(
            "Insert conditions can only reference the inserted row",
        )),
    }
}

fn eval_insert_entry(lhs: &Scalar, value: &FieldCondition, config: &Config) -> Result<bool> {
    let ops = match value {
        FieldCondition::Ops(ops) => ops.clone(),
        FieldCondition::Value(expr) => OperatorMap { eq: Some(expr.clone()), ..OperatorMap::default() },
    };
    if ops.like.is_some() || ops.ilike.is_some() || ops.regex.is_some() {
        return Err(Error::shape("Insert conditions can only compare literal values"));
    }

    let compare = |op: &str, value: &Option<Expression>| -> Result<bool> {
        let Some(expr) = value else {
            return Ok(true);
        };
        let rhs = literal_operand(expr, config)?;
        // Statically incomparable pairs count as unmet.
        Ok(compare_scalars(op, lhs, &rhs).unwrap_or(false))
    };

    let mut holds = compare("$ne", &ops.ne)?
        && compare("$eq", &ops.eq)?
        && compare("$gt", &ops.gt)?
        && compare("$gte", &ops.gte)?
        && compare("$lt", &ops.lt)?
        && compare("$lte", &ops.lte)?;

    for (op, items) in [("$in", &ops.r#in), ("$nin", &ops.nin)] {
        let Some(items) = items else { continue };
        let scalars = items
            .iter()
            .map(|item| literal_operand(item, config))
            .collect::<Result<Vec<_>>>()?;
        let mut contained = false;
        for rhs in &scalars {
            if scalar_eq(lhs, rhs) == Some(true) {
                contained = true;
            }
        }
        holds = holds && (contained == (op == "$in"));
    }
    Ok(holds)
}

/// Resolves an operand to a literal scalar; `$var` references are inlined.
fn literal_operand(expr: &Expression, config: &Config) -> Result<Scalar> {
    match expr {
        Expression::Scalar(scalar) => Ok(scalar.clone()),
        Expression::Var(name) => config
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown variable '{name}'"))),
        _ => Err(Error::shape("Insert conditions can only compare literal values")),
    }
}
