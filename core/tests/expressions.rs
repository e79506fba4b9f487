//! Expression Evaluator & Function Catalog Tests
//!
//! Exercises `parse_expression` directly: literal escaping, function
//! rendering per dialect, arity and argument-type checking.

use jsonsql_core::{Config, Expression, ParserState, parse_expression};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn config(dialect: &str) -> Config {
    serde_json::from_value(json!({
        "dialect": dialect,
        "tables": {
            "users": {"allowedFields": [
                {"name": "name", "type": "string", "nullable": false},
                {"name": "age", "type": "number", "nullable": false},
                {"name": "balance", "type": "number", "nullable": true},
                {"name": "birthday", "type": "date", "nullable": true},
                {"name": "created_at", "type": "datetime", "nullable": false},
            ]},
        },
        "variables": {"greeting": "hello"},
    }))
    .unwrap()
}

fn eval(expr: serde_json::Value, dialect: &str) -> String {
    let config = config(dialect);
    let mut state = ParserState::new(&config, "users");
    let expr: Expression = serde_json::from_value(expr).unwrap();
    parse_expression(&expr, &mut state).unwrap()
}

fn eval_err(expr: serde_json::Value, dialect: &str) -> String {
    let config = config(dialect);
    let mut state = ParserState::new(&config, "users");
    let expr: Expression = serde_json::from_value(expr).unwrap();
    parse_expression(&expr, &mut state).unwrap_err().to_string()
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn scalar_literals_render_inline() {
    assert_eq!(eval(json!("it's"), "postgresql"), "'it''s'");
    assert_eq!(eval(json!(42), "postgresql"), "42");
    assert_eq!(eval(json!(2.5), "postgresql"), "2.5");
    assert_eq!(eval(json!(true), "sqlite-minimal"), "TRUE");
    assert_eq!(eval(json!(false), "postgresql"), "FALSE");
    assert_eq!(eval(json!(null), "postgresql"), "NULL");
}

#[test]
fn typed_scalars_render_per_dialect() {
    assert_eq!(eval(json!({"$date": "2024-06-01"}), "postgresql"), "'2024-06-01'::DATE");
    assert_eq!(eval(json!({"$date": "2024-06-01"}), "sqlite-minimal"), "'2024-06-01'");
    assert_eq!(
        eval(json!({"$timestamp": "2024-06-01T08:30:00"}), "postgresql"),
        "'2024-06-01 08:30:00'::TIMESTAMP"
    );
    assert_eq!(
        eval(json!({"$jsonb": {"a": 1}}), "postgresql"),
        "'{\"a\":1}'::JSONB"
    );
    assert_eq!(eval(json!({"$jsonb": {"a": 1}}), "sqlite-3.44-extensions"), "'{\"a\":1}'");
}

#[test]
fn invalid_uuid_is_rejected() {
    assert_eq!(eval_err(json!({"$uuid": "not-a-uuid"}), "postgresql"), "Invalid UUID format");
}

#[test]
fn variables_inline_like_literals() {
    assert_eq!(eval(json!({"$var": "greeting"}), "postgresql"), "'hello'");
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn binary_arithmetic_renders_infix() {
    assert_eq!(
        eval(json!({"$func": {"ADD": [{"$field": "users.age"}, 1]}}), "postgresql"),
        "(users.age + 1)"
    );
    assert_eq!(
        eval(json!({"$func": {"MOD": [{"$field": "users.age"}, 7]}}), "sqlite-minimal"),
        "(users.age % 7)"
    );
    assert_eq!(
        eval(json!({"$func": {"POW": [{"$field": "users.age"}, 2]}}), "postgresql"),
        "POWER(users.age, 2)"
    );
}

/// Division by a literal zero fails before any SQL is produced.
#[test]
fn division_by_zero_is_rejected() {
    assert_eq!(
        eval_err(json!({"$func": {"DIVIDE": [{"$field": "users.age"}, 0]}}), "postgresql"),
        "Division by zero is not allowed"
    );
}

#[test]
fn greatest_and_least_follow_dialect() {
    let expr = json!({"$func": {"GREATEST_NUMBER": [{"$field": "users.age"}, 21]}});
    assert_eq!(eval(expr.clone(), "postgresql"), "GREATEST(users.age, 21)");
    assert_eq!(eval(expr, "sqlite-minimal"), "MAX(users.age, 21)");

    let expr = json!({"$func": {"LEAST_NUMBER": [{"$field": "users.age"}, 65]}});
    assert_eq!(eval(expr.clone(), "postgresql"), "LEAST(users.age, 65)");
    assert_eq!(eval(expr, "sqlite-3.44-extensions"), "MIN(users.age, 65)");
}

// =============================================================================
// Strings
// =============================================================================

#[test]
fn concat_joins_with_pipes_and_casts_to_text() {
    assert_eq!(
        eval(
            json!({"$func": {"CONCAT": [{"$field": "users.name"}, " is ", {"$field": "users.age"}]}}),
            "postgresql"
        ),
        "(users.name || ' is ' || CAST(users.age AS TEXT))"
    );
}

#[test]
fn substr_takes_start_and_length() {
    assert_eq!(
        eval(json!({"$func": {"SUBSTR": [{"$field": "users.name"}, 1, 3]}}), "sqlite-minimal"),
        "SUBSTR(users.name, 1, 3)"
    );
}

#[test]
fn coalesce_string_renders_coalesce() {
    assert_eq!(
        eval(
            json!({"$func": {"COALESCE_STRING": [{"$field": "users.name"}, "anonymous"]}}),
            "postgresql"
        ),
        "COALESCE(users.name, 'anonymous')"
    );
}

// =============================================================================
// Date/Time
// =============================================================================

#[test]
fn extract_epoch_renders_per_dialect() {
    let expr = json!({"$func": {"EXTRACT_EPOCH": [{"$field": "users.created_at"}]}});
    assert_eq!(eval(expr.clone(), "postgresql"), "EXTRACT(EPOCH FROM users.created_at)");
    assert_eq!(
        eval(expr.clone(), "sqlite-minimal"),
        "CAST(STRFTIME('%s', users.created_at) AS REAL)"
    );
    assert_eq!(eval(expr, "sqlite-3.44-extensions"), "UNIXEPOCH(users.created_at)");
}

/// A plain date is accepted where a datetime is expected.
#[test]
fn extract_epoch_promotes_dates() {
    assert_eq!(
        eval(json!({"$func": {"EXTRACT_EPOCH": [{"$field": "users.birthday"}]}}), "postgresql"),
        "EXTRACT(EPOCH FROM users.birthday)"
    );
}

// =============================================================================
// Arity & Argument Types
// =============================================================================

#[test]
fn exact_arity_violation_message() {
    assert_eq!(
        eval_err(json!({"$func": {"ADD": [1]}}), "postgresql"),
        "Function 'ADD' requires exactly 2 argument(s), got 1"
    );
}

#[test]
fn variadic_arity_violation_message() {
    assert_eq!(
        eval_err(json!({"$func": {"CONCAT": ["only"]}}), "postgresql"),
        "Function 'CONCAT' requires at least 2 arguments, got 1"
    );
}

#[test]
fn argument_type_violation_message() {
    assert_eq!(
        eval_err(json!({"$func": {"ABS": [{"$field": "users.name"}]}}), "postgresql"),
        "Function 'ABS' requires argument 1 of type number, got string"
    );
}

#[test]
fn unknown_function_message() {
    assert_eq!(
        eval_err(json!({"$func": {"SHOUT": ["hi", "ho"]}}), "postgresql"),
        "Unknown function or operator: \"SHOUT\""
    );
}

// =============================================================================
// Conditionals
// =============================================================================

#[test]
fn cond_type_is_the_common_branch_type() {
    // One NULL branch defers to the other side's type; string result feeds
    // an outer string function without error.
    let sql = eval(
        json!({"$func": {"UPPER": [{"$cond": {
            "if": {"users.age": {"$gte": 18}},
            "then": {"$field": "users.name"},
            "else": null,
        }}]}}),
        "postgresql",
    );
    assert_eq!(sql, "UPPER((CASE WHEN users.age >= 18 THEN users.name ELSE NULL END))");
}

#[test]
fn mismatched_branches_are_rejected() {
    assert_eq!(
        eval_err(
            json!({"$cond": {"if": true, "then": "yes", "else": 1}}),
            "postgresql"
        ),
        "'then' and 'else' expressions must have the same type, got string and number"
    );
}
