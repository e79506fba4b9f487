//! Per-invocation parser state.
//!
//! A [`ParserState`] is created at the top of each `parse_*_query` call,
//! mutated during traversal (joins accumulate, the processed-table set grows,
//! the expression-type memo fills), and discarded after compilation.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use jsonsql_types::ExprType;
use smallvec::SmallVec;

use crate::ast::{Condition, Expression, FieldCondition, OperatorMap};
use crate::config::Config;
use crate::value::Scalar;

/// A rendered JOIN clause, tracked per logical table so repeated references
/// stay idempotent.
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub table: String,
    pub sql: String,
}

/// Mutable traversal state for one parse invocation.
#[derive(Debug)]
pub struct ParserState<'a> {
    pub config: &'a Config,
    pub root_table: String,
    pub joins: SmallVec<[JoinClause; 4]>,
    pub processed_tables: HashSet<String>,
    /// When false, field resolution ignores data-table mode. Mutation
    /// builders use this: their statement shapes have no alias for the
    /// physical-table rewrite to attach to.
    pub data_table_enabled: bool,
    expression_types: HashMap<String, ExprType>,
}

impl<'a> ParserState<'a> {
    /// Creates a fresh state rooted at `root_table`.
    pub fn new(config: &'a Config, root_table: impl Into<String>) -> Self {
        ParserState {
            config,
            root_table: root_table.into(),
            joins: SmallVec::new(),
            processed_tables: HashSet::new(),
            data_table_enabled: true,
            expression_types: HashMap::new(),
        }
    }

    /// Records the inferred type of an expression under its canonical key.
    pub fn record_type(&mut self, expr: &Expression, ty: ExprType) {
        self.expression_types.insert(canonical_key(expr), ty);
    }

    /// The inferred type of an already-evaluated expression.
    ///
    /// # Panics
    ///
    /// Panics if the expression was never evaluated; consulting the memo
    /// before evaluation is a programmer error, not an input error.
    #[must_use]
    pub fn expression_type(&self, expr: &Expression) -> ExprType {
        let key = canonical_key(expr);
        match self.expression_types.get(&key) {
            Some(ty) => *ty,
            None => panic!("expression type not inferred for {key}"),
        }
    }

    /// Registers a JOIN for `table` unless one is already present.
    /// Returns whether the table was unseen.
    pub fn add_join(&mut self, table: &str, sql: String) -> bool {
        if self.processed_tables.contains(table) {
            return false;
        }
        self.processed_tables.insert(table.to_string());
        self.joins.push(JoinClause { table: table.to_string(), sql });
        true
    }
}

/// Canonical serialization of an expression: deterministic, with all map
/// keys emitted in sorted order, so structurally identical subtrees share a
/// memo entry regardless of identity or surface key order.
#[must_use]
pub fn canonical_key(expr: &Expression) -> String {
    let mut out = String::new();
    write_expression(&mut out, expr);
    out
}

fn write_expression(out: &mut String, expr: &Expression) {
    match expr {
        Expression::Scalar(s) => write_scalar(out, s),
        Expression::Field(f) => {
            out.push_str("{\"$field\":");
            write_json_string(out, f);
            out.push('}');
        }
        Expression::Var(v) => {
            out.push_str("{\"$var\":");
            write_json_string(out, v);
            out.push('}');
        }
        Expression::Func { name, args } => {
            out.push_str("{\"$func\":{");
            write_json_string(out, name);
            out.push_str(":[");
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_expression(out, arg);
            }
            out.push_str("]}}");
        }
        Expression::Cond { condition, then, otherwise } => {
            // Sorted key order: else, if, then.
            out.push_str("{\"$cond\":{\"else\":");
            write_expression(out, otherwise);
            out.push_str(",\"if\":");
            write_condition(out, condition);
            out.push_str(",\"then\":");
            write_expression(out, then);
            out.push_str("}}");
        }
    }
}

fn write_condition(out: &mut String, cond: &Condition) {
    match cond {
        Condition::And(items) | Condition::Or(items) => {
            out.push_str(if matches!(cond, Condition::And(_)) {
                "{\"$and\":["
            } else {
                "{\"$or\":["
            });
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_condition(out, item);
            }
            out.push_str("]}");
        }
        Condition::Not(inner) => {
            out.push_str("{\"$not\":");
            write_condition(out, inner);
            out.push('}');
        }
        Condition::Exists { table, condition } => {
            out.push_str("{\"$exists\":{\"condition\":");
            write_condition(out, condition);
            out.push_str(",\"table\":");
            write_json_string(out, table);
            out.push_str("}}");
        }
        Condition::Expr(expr) => write_expression(out, expr),
        Condition::Fields(entries) => {
            let mut sorted: Vec<_> = entries.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            out.push('{');
            for (i, (key, value)) in sorted.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(out, key);
                out.push(':');
                match value {
                    FieldCondition::Ops(ops) => write_operator_map(out, ops),
                    FieldCondition::Value(expr) => write_expression(out, expr),
                }
            }
            out.push('}');
        }
        Condition::Compare { name, lhs, ops } => {
            out.push_str("{\"$compare\":{\"lhs\":");
            write_expression(out, lhs);
            out.push_str(",\"name\":");
            write_json_string(out, name);
            out.push_str(",\"ops\":");
            write_operator_map(out, ops);
            out.push_str("}}");
        }
    }
}

fn write_operator_map(out: &mut String, ops: &OperatorMap) {
    // Fixed key order for determinism.
    let single: [(&str, &Option<Expression>); 9] = [
        ("$eq", &ops.eq),
        ("$gt", &ops.gt),
        ("$gte", &ops.gte),
        ("$ilike", &ops.ilike),
        ("$like", &ops.like),
        ("$lt", &ops.lt),
        ("$lte", &ops.lte),
        ("$ne", &ops.ne),
        ("$regex", &ops.regex),
    ];
    out.push('{');
    let mut first = true;
    for (key, value) in single {
        if let Some(expr) = value {
            if !first {
                out.push(',');
            }
            first = false;
            write_json_string(out, key);
            out.push(':');
            write_expression(out, expr);
        }
    }
    for (key, value) in [("$in", &ops.r#in), ("$nin", &ops.nin)] {
        if let Some(items) = value {
            if !first {
                out.push(',');
            }
            first = false;
            write_json_string(out, key);
            out.push_str(":[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_expression(out, item);
            }
            out.push(']');
        }
    }
    out.push('}');
}

fn write_scalar(out: &mut String, scalar: &Scalar) {
    match scalar {
        Scalar::String(s) => write_json_string(out, s),
        Scalar::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Scalar::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Scalar::Null => out.push_str("null"),
        Scalar::Date(s) => {
            out.push_str("{\"$date\":");
            write_json_string(out, s);
            out.push('}');
        }
        Scalar::Timestamp(s) => {
            out.push_str("{\"$timestamp\":");
            write_json_string(out, s);
            out.push('}');
        }
        Scalar::Uuid(s) => {
            out.push_str("{\"$uuid\":");
            write_json_string(out, s);
            out.push('}');
        }
        Scalar::JsonB(value) => {
            out.push_str("{\"$jsonb\":");
            write_json_value(out, value);
            out.push('}');
        }
    }
}

fn write_json_value(out: &mut String, value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(out, key);
                out.push(':');
                write_json_value(out, &map[key.as_str()]);
            }
            out.push('}');
        }
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_value(out, item);
            }
            out.push(']');
        }
        other => {
            let _ = write!(out, "{other}");
        }
    }
}

fn write_json_string(out: &mut String, s: &str) {
    // serde_json's escaping keeps the key canonical for any input.
    let _ = write!(out, "{}", serde_json::Value::from(s));
}
