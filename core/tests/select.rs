//! SELECT Builder Tests
//!
//! End-to-end coverage of the selection tree, relationship joins, WHERE
//! compilation, and pagination clause ordering.

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
                {"name": "id", "type": "number", "nullable": false},
                {"name": "name", "type": "string", "nullable": false},
                {"name": "age", "type": "number", "nullable": false},
                {"name": "active", "type": "boolean", "nullable": false},
                {"name": "metadata", "type": "object", "nullable": true},
            ]},
            "posts": {"allowedFields": [
                {"name": "id", "type": "number", "nullable": false},
                {"name": "user_id", "type": "number", "nullable": false},
                {"name": "title", "type": "string", "nullable": false},
                {"name": "published", "type": "boolean", "nullable": false},
            ]},
        },
        "relationships": [
            {"table": "users", "field": "id", "toTable": "posts", "toField": "user_id"},
        ],
    }))
    .unwrap()
}

fn query(value: serde_json::Value) -> SelectQuery {
    serde_json::from_value(value).unwrap()
}

fn build(value: serde_json::Value, dialect: &str) -> String {
    build_select_query(&query(value), &config(dialect)).unwrap()
}

fn build_err(value: serde_json::Value, dialect: &str) -> String {
    build_select_query(&query(value), &config(dialect)).unwrap_err().to_string()
}

// =============================================================================
// Basic Selection
// =============================================================================

#[test]
fn selects_fields_with_aliases() {
    let sql = build(
        json!({"rootTable": "users", "selection": {"id": true, "name": true}}),
        "sqlite-minimal",
    );
    assert_eq!(sql, r#"SELECT users.id AS "id", users.name AS "name" FROM users"#);
}

#[test]
fn selects_json_leaves_with_arrow_aliases() {
    let sql = build(
        json!({"rootTable": "users", "selection": {"metadata->role": true}}),
        "postgresql",
    );
    assert_eq!(sql, r#"SELECT users.metadata->>'role' AS "metadata->role" FROM users"#);
}

#[test]
fn selects_expression_aliased_to_key() {
    let sql = build(
        json!({
            "rootTable": "users",
            "selection": {"loud": {"$func": {"UPPER": [{"$field": "users.name"}]}}},
        }),
        "postgresql",
    );
    assert_eq!(sql, r#"SELECT UPPER(users.name) AS "loud" FROM users"#);
}

/// Nested conditionals render as nested CASE expressions.
#[test]
fn selects_nested_case_expression() {
    let sql = build(
        json!({
            "rootTable": "users",
            "selection": {"tier": {"$cond": {
                "if": {"users.age": {"$gte": 65}},
                "then": "Senior",
                "else": {"$cond": {
                    "if": {"users.age": {"$gte": 30}},
                    "then": "Adult",
                    "else": "Young",
                }},
            }}},
        }),
        "sqlite-minimal",
    );
    assert_eq!(
        sql,
        "SELECT (CASE WHEN users.age >= 65 THEN 'Senior' ELSE (CASE WHEN users.age >= 30 THEN 'Adult' ELSE 'Young' END) END) AS \"tier\" FROM users"
    );
}

#[test]
fn empty_selection_is_rejected() {
    let err = build_err(json!({"rootTable": "users", "selection": {}}), "postgresql");
    assert_eq!(err, "Selection cannot be empty");
}

#[test]
fn unknown_root_table_is_rejected() {
    let err = build_err(json!({"rootTable": "admins", "selection": {"id": true}}), "postgresql");
    assert_eq!(err, "Table 'admins' is not allowed or does not exist");
}

#[test]
fn unknown_field_is_rejected() {
    let err = build_err(json!({"rootTable": "users", "selection": {"ssn": true}}), "postgresql");
    assert_eq!(err, "Field 'ssn' is not allowed or does not exist in 'users'");
}

// =============================================================================
// Relationship Joins
// =============================================================================

#[test]
fn nested_selection_emits_left_join() {
    let sql = build(
        json!({
            "rootTable": "users",
            "selection": {"id": true, "posts": {"id": true, "title": true}},
        }),
        "postgresql",
    );
    assert_eq!(
        sql,
        "SELECT users.id AS \"id\", posts.id AS \"posts.id\", posts.title AS \"posts.title\" \
         FROM users LEFT JOIN posts ON users.id = posts.user_id"
    );
}

#[test]
fn uuid_joins_cast_both_sides_in_postgres() {
    let config: Config = serde_json::from_value(json!({
        "dialect": "postgresql",
        "tables": {
            "users": {"allowedFields": [
                {"name": "id", "type": "uuid", "nullable": false},
                {"name": "name", "type": "string", "nullable": false},
            ]},
            "posts": {"allowedFields": [
                {"name": "id", "type": "uuid", "nullable": false},
                {"name": "user_id", "type": "uuid", "nullable": false},
            ]},
        },
        "relationships": [
            {"table": "users", "field": "id", "toTable": "posts", "toField": "user_id"},
        ],
    }))
    .unwrap();
    let sql = build_select_query(
        &query(json!({"rootTable": "users", "selection": {"name": true, "posts": {"id": true}}})),
        &config,
    )
    .unwrap();
    assert!(
        sql.contains("LEFT JOIN posts ON CAST(users.id AS UUID) = CAST(posts.user_id AS UUID)"),
        "got: {sql}"
    );
}

#[test]
fn missing_relationship_is_rejected() {
    let config: Config = serde_json::from_value(json!({
        "dialect": "postgresql",
        "tables": {
            "users": {"allowedFields": [{"name": "id", "type": "number", "nullable": false}]},
            "posts": {"allowedFields": [{"name": "id", "type": "number", "nullable": false}]},
        },
    }))
    .unwrap();
    let err = build_select_query(
        &query(json!({"rootTable": "users", "selection": {"posts": {"id": true}}})),
        &config,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "No relationship found between 'users' and 'posts'");
}

// =============================================================================
// EXISTS Subqueries
// =============================================================================

/// The subquery is parsed with the root table switched to the EXISTS table,
/// so correlated references to the outer table stay plain.
#[test]
fn exists_subquery_switches_root_table() {
    let sql = build(
        json!({
            "rootTable": "users",
            "selection": {"id": true},
            "condition": {"$exists": {"table": "posts", "condition": {
                "posts.user_id": {"$eq": {"$field": "users.id"}},
                "posts.published": {"$eq": true},
            }}},
        }),
        "postgresql",
    );
    assert_eq!(
        sql,
        "SELECT users.id AS \"id\" FROM users WHERE EXISTS (SELECT 1 FROM posts WHERE (posts.user_id = users.id AND posts.published = TRUE))"
    );
}

#[test]
fn exists_on_unknown_table_is_rejected() {
    let err = build_err(
        json!({
            "rootTable": "users",
            "selection": {"id": true},
            "condition": {"$exists": {"table": "comments", "condition": true}},
        }),
        "postgresql",
    );
    assert_eq!(err, "Table 'comments' is not allowed or does not exist");
}

// =============================================================================
// Pagination
// =============================================================================

/// Clause order is fixed: WHERE, then LIMIT, then OFFSET.
#[test]
fn pagination_suffix_order() {
    let sql = build(
        json!({
            "rootTable": "users",
            "selection": {"id": true, "posts": {"title": true}},
            "condition": {"users.active": true},
            "pagination": {"limit": 15, "offset": 30},
        }),
        "postgresql",
    );
    assert!(sql.contains(" WHERE users.active = TRUE"), "got: {sql}");
    assert!(sql.ends_with(" WHERE users.active = TRUE LIMIT 15 OFFSET 30"), "got: {sql}");
}

/// Negative and fractional values pass through unvalidated.
#[test]
fn pagination_values_are_not_validated() {
    let sql = build(
        json!({
            "rootTable": "users",
            "selection": {"id": true},
            "pagination": {"limit": -5, "offset": 2.5},
        }),
        "sqlite-3.44-extensions",
    );
    assert!(sql.ends_with("LIMIT -5 OFFSET 2.5"), "got: {sql}");
}

#[test]
fn limit_without_offset() {
    let sql = build(
        json!({"rootTable": "users", "selection": {"id": true}, "pagination": {"limit": 10}}),
        "postgresql",
    );
    assert!(sql.ends_with("FROM users LIMIT 10"), "got: {sql}");
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn repeated_builds_are_byte_identical() {
    let value = json!({
        "rootTable": "users",
        "selection": {"id": true, "posts": {"title": true}},
        "condition": {"$and": [
            {"users.active": true},
            {"users.age": {"$gte": 21, "$lt": 65}},
        ]},
        "pagination": {"limit": 50},
    });
    let first = build(value.clone(), "postgresql");
    let second = build(value, "postgresql");
    assert_eq!(first, second);
}
