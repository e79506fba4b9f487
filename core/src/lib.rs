//! jsonsql core — compiles a JSON-shaped query language into SQL text.
//!
//! A query is a declarative tree describing a SELECT, aggregation, INSERT,
//! UPDATE, or DELETE against a caller-supplied schema of allowed tables and
//! fields. The compiler validates the query against the schema, infers a type
//! for every expression, applies dialect-specific rewrites (including the
//! data-table mode storing logical rows as JSON blobs in one physical table),
//! inlines scalar values with proper escaping, and returns a finished SQL
//! string. It never executes SQL.
//!
//! # Example
//!
//! ```
//! use jsonsql_core::{Config, SelectQuery, build_select_query};
//! use serde_json::json;
//!
//! let config: Config = serde_json::from_value(json!({
//!     "dialect": "postgresql",
//!     "tables": {
//!         "users": {"allowedFields": [
//!             {"name": "id", "type": "number", "nullable": false},
//!             {"name": "name", "type": "string", "nullable": false},
//!         ]}
//!     }
//! })).unwrap();
//! let query: SelectQuery = serde_json::from_value(json!({
//!     "rootTable": "users",
//!     "selection": {"id": true, "name": true},
//! })).unwrap();
//!
//! let sql = build_select_query(&query, &config).unwrap();
//! assert_eq!(sql, r#"SELECT users.id AS "id", users.name AS "name" FROM users"#);
//! ```

pub mod ast;
pub mod builder;
pub mod config;
pub mod dialect;
pub mod error;
pub mod eval;
pub mod functions;
pub mod resolve;
pub mod state;
pub mod trace;
pub mod value;

pub use ast::{
    AggregatedField, AggregationQuery, Condition, DeleteQuery, Expression, FieldCondition,
    InsertQuery, OperatorMap, Pagination, SelectQuery, SelectionItem, UpdateQuery,
};
pub use builder::{
    ParsedAggregation, ParsedDelete, ParsedInsert, ParsedSelect, ParsedUpdate,
    build_aggregation_query, build_delete_query, build_insert_query, build_select_query,
    build_update_query, compile_aggregation_query, compile_delete_query, compile_insert_query,
    compile_select_query, compile_update_query, parse_aggregation_query, parse_delete_query,
    parse_insert_query, parse_select_query, parse_update_query,
};
pub use config::{Config, DataTableConfig, FieldConfig, Relationship, TableConfig};
pub use dialect::{Dialect, DialectExt};
pub use error::{Error, ErrorKind, Result};
pub use eval::{parse_condition, parse_expression};
pub use jsonsql_types::{ExprType, FieldType};
pub use resolve::{ResolvedField, resolve_field_path};
pub use state::ParserState;
pub use value::Scalar;
