//! Condition Evaluator Tests
//!
//! Boolean combinators, field-operator maps in canonical order, NULL
//! handling, type matching, and dialect-specific operators.

use jsonsql_core::{Config, SelectQuery, build_select_query};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn config(dialect: &str) -> Config {
    serde_json::from_value(json!({
        "dialect": dialect,
        "tables": {
            "users": {"allowedFields": [
                {"name": "id", "type": "uuid", "nullable": false},
                {"name": "name", "type": "string", "nullable": false},
                {"name": "email", "type": "string", "nullable": true},
                {"name": "age", "type": "number", "nullable": false},
                {"name": "active", "type": "boolean", "nullable": false},
                {"name": "metadata", "type": "object", "nullable": true},
            ]},
        },
        "variables": {
            "current_user": "123e4567-e89b-12d3-a456-426614174000",
            "adult_age": 18,
        },
    }))
    .unwrap()
}

/// Builds a one-column SELECT and returns everything after ` WHERE `.
fn where_clause(condition: serde_json::Value, dialect: &str) -> String {
    let query: SelectQuery = serde_json::from_value(json!({
        "rootTable": "users",
        "selection": {"id": true},
        "condition": condition,
    }))
    .unwrap();
    let sql = build_select_query(&query, &config(dialect)).unwrap();
    sql.split_once(" WHERE ").map(|(_, rest)| rest.to_string()).unwrap_or(sql)
}

fn where_err(condition: serde_json::Value, dialect: &str) -> String {
    let query: SelectQuery = serde_json::from_value(json!({
        "rootTable": "users",
        "selection": {"id": true},
        "condition": condition,
    }))
    .unwrap();
    build_select_query(&query, &config(dialect)).unwrap_err().to_string()
}

// =============================================================================
// Combinators
// =============================================================================

#[test]
fn and_or_nest_with_parentheses() {
    let clause = where_clause(
        json!({"$and": [
            {"users.active": true},
            {"$or": [
                {"users.age": {"$gte": 65}},
                {"users.age": {"$lt": 18}},
            ]},
        ]}),
        "postgresql",
    );
    assert_eq!(clause, "(users.active = TRUE AND (users.age >= 65 OR users.age < 18))");
}

#[test]
fn single_element_combinators_unwrap() {
    let clause = where_clause(json!({"$and": [{"users.active": true}]}), "postgresql");
    assert_eq!(clause, "users.active = TRUE");
}

#[test]
fn empty_combinators_are_rejected() {
    assert_eq!(
        where_err(json!({"$and": []}), "postgresql"),
        "$and condition should be a non-empty array."
    );
    assert_eq!(
        where_err(json!({"$or": []}), "postgresql"),
        "$or condition should be a non-empty array."
    );
}

#[test]
fn not_wraps_inner_condition() {
    let clause = where_clause(json!({"$not": {"users.active": true}}), "postgresql");
    assert_eq!(clause, "NOT (users.active = TRUE)");
}

#[test]
fn plain_boolean_expression_is_allowed() {
    let clause = where_clause(json!({"$field": "users.active"}), "postgresql");
    assert_eq!(clause, "users.active");
}

#[test]
fn non_boolean_expression_condition_is_rejected() {
    assert_eq!(
        where_err(json!({"$field": "users.age"}), "postgresql"),
        "Condition expression must be of type boolean, got number"
    );
}

// =============================================================================
// Operator Maps
// =============================================================================

/// Multiple operators on one field emit in canonical order regardless of the
/// surface key order.
#[test]
fn operators_emit_in_canonical_order() {
    let clause = where_clause(
        json!({"users.age": {"$in": [30, 40], "$gt": 18, "$ne": 33}}),
        "postgresql",
    );
    assert_eq!(clause, "(users.age != 33 AND users.age > 18 AND users.age IN (30, 40))");
}

#[test]
fn multiple_fields_are_anded() {
    let clause = where_clause(
        json!({"users.active": true, "users.age": {"$gte": 18}}),
        "postgresql",
    );
    assert_eq!(clause, "(users.active = TRUE AND users.age >= 18)");
}

#[test]
fn field_equals_expression_shorthand() {
    let clause = where_clause(json!({"users.age": {"$var": "adult_age"}}), "postgresql");
    assert_eq!(clause, "users.age = 18");
}

// =============================================================================
// NULL Handling
// =============================================================================

#[test]
fn null_comparisons_use_is_null() {
    assert_eq!(
        where_clause(json!({"users.email": {"$eq": null}}), "postgresql"),
        "users.email IS NULL"
    );
    assert_eq!(
        where_clause(json!({"users.email": {"$ne": null}}), "postgresql"),
        "users.email IS NOT NULL"
    );
}

#[test]
fn null_against_non_nullable_field_is_rejected() {
    assert_eq!(
        where_err(json!({"users.age": {"$eq": null}}), "postgresql"),
        "Field 'age' is not nullable, and cannot be compared with NULL"
    );
}

// =============================================================================
// Type Matching
// =============================================================================

#[test]
fn mismatched_comparison_is_rejected() {
    assert_eq!(
        where_err(json!({"users.name": {"$gt": 5}}), "postgresql"),
        "Field type mismatch for '$gt' comparison on 'name': expected string, got number"
    );
}

/// A string operand compares against the text form of a non-string field.
#[test]
fn uuid_field_compared_to_string_var_casts_to_text() {
    let clause = where_clause(
        json!({"users.id": {"$eq": {"$var": "current_user"}}}),
        "postgresql",
    );
    assert_eq!(clause, "CAST(users.id AS TEXT) = '123e4567-e89b-12d3-a456-426614174000'");
}

#[test]
fn json_path_comparisons_accept_any_type() {
    let clause = where_clause(
        json!({"users.metadata->login_count": {"$gte": 3}}),
        "postgresql",
    );
    assert_eq!(clause, "users.metadata->>'login_count' >= 3");
}

#[test]
fn json_path_on_scalar_field_is_rejected() {
    assert_eq!(
        where_err(json!({"users.name->first": {"$eq": "A"}}), "postgresql"),
        "JSON path access 'first' is only allowed on JSON fields, but field 'name' is of type 'string'"
    );
}

#[test]
fn unknown_variable_is_rejected() {
    assert_eq!(
        where_err(json!({"users.name": {"$eq": {"$var": "nope"}}}), "postgresql"),
        "Unknown variable 'nope'"
    );
}

// =============================================================================
// Membership
// =============================================================================

#[test]
fn in_and_nin_render_value_lists() {
    assert_eq!(
        where_clause(json!({"users.age": {"$in": [18, 21, 65]}}), "postgresql"),
        "users.age IN (18, 21, 65)"
    );
    assert_eq!(
        where_clause(json!({"users.name": {"$nin": ["root", "admin"]}}), "postgresql"),
        "users.name NOT IN ('root', 'admin')"
    );
}

#[test]
fn empty_in_is_rejected() {
    assert_eq!(
        where_err(json!({"users.age": {"$in": []}}), "postgresql"),
        "$in condition should be a non-empty array."
    );
}

#[test]
fn mixed_type_in_is_rejected() {
    assert_eq!(
        where_err(json!({"users.age": {"$in": [1, "two"]}}), "postgresql"),
        "Field type mismatch for '$in' comparison on 'age': expected number, got string"
    );
}

// =============================================================================
// Pattern Operators
// =============================================================================

#[test]
fn like_and_ilike_follow_dialect() {
    assert_eq!(
        where_clause(json!({"users.name": {"$like": "A%"}}), "postgresql"),
        "users.name LIKE 'A%'"
    );
    assert_eq!(
        where_clause(json!({"users.name": {"$ilike": "a%"}}), "postgresql"),
        "users.name ILIKE 'a%'"
    );
    // SQLite has no ILIKE; LIKE is already case-insensitive for ASCII.
    assert_eq!(
        where_clause(json!({"users.name": {"$ilike": "a%"}}), "sqlite-minimal"),
        "users.name LIKE 'a%'"
    );
}

#[test]
fn regex_is_postgres_only() {
    assert_eq!(
        where_clause(json!({"users.name": {"$regex": "^A"}}), "postgresql"),
        "users.name ~ '^A'"
    );
    assert_eq!(
        where_err(json!({"users.name": {"$regex": "^A"}}), "sqlite-3.44-extensions"),
        "Operator 'REGEXP' is not supported by default in SQLite"
    );
}

// =============================================================================
// Injection Safety
// =============================================================================

/// Hostile scalar input stays inside a single quoted literal with internal
/// quotes doubled.
#[test]
fn hostile_strings_stay_quoted() {
    let clause = where_clause(
        json!({"users.name": {"$eq": "'; DROP TABLE users; --"}}),
        "postgresql",
    );
    assert_eq!(clause, "users.name = '''; DROP TABLE users; --'");
}
