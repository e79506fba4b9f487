//! jsonsql — a schema-checked JSON-to-SQL query compiler.
//!
//! Facade crate re-exporting the engine. See [`jsonsql_core`] for the full
//! API surface; the common entry points are the `build_*_query` functions and
//! [`Config`].
//!
//! ```
//! use jsonsql::{Config, DeleteQuery, build_delete_query};
//! use serde_json::json;
//!
//! let config: Config = serde_json::from_value(json!({
//!     "dialect": "sqlite-minimal",
//!     "tables": {
//!         "sessions": {"allowedFields": [
//!             {"name": "expired", "type": "boolean", "nullable": false},
//!         ]}
//!     }
//! })).unwrap();
//! let query: DeleteQuery = serde_json::from_value(json!({
//!     "table": "sessions",
//!     "condition": {"expired": true},
//! })).unwrap();
//!
//! assert_eq!(
//!     build_delete_query(&query, &config).unwrap(),
//!     "DELETE FROM sessions WHERE sessions.expired = TRUE"
//! );
//! ```

pub use jsonsql_core::*;
