//! Dialect re-export and rendering extensions.
//!
//! Every dialect-specific rendering choice lives behind [`DialectExt`], so
//! evaluators and builders never branch on dialect names inline.

pub use jsonsql_types::Dialect;

use crate::error::{Error, Result};

/// Rendering hooks for dialect-specific SQL shapes.
pub trait DialectExt {
    /// Cast suffix for typed scalar literals (`::DATE`, `::UUID`, ...).
    /// Empty in the SQLite family, which compares the text forms directly.
    fn scalar_cast(&self, cast: &'static str) -> &'static str;

    /// Wraps an expression in a cast to the given storage type name.
    fn cast(&self, expr: &str, storage: &str) -> String;

    /// The string-aggregation function name.
    fn string_agg_name(&self) -> &'static str;

    /// Renders epoch-seconds extraction from a datetime expression.
    fn extract_epoch(&self, expr: &str) -> String;

    /// The pattern-match operator, honoring case-insensitivity where the
    /// dialect can.
    fn like_operator(&self, case_insensitive: bool) -> &'static str;

    /// Renders a regular-expression match, or fails on dialects without a
    /// default regexp operator.
    fn regex_match(&self, expr: &str, pattern: &str) -> Result<String>;

    /// Scalar greatest/least function names (`GREATEST`/`LEAST` vs the
    /// SQLite multi-argument `MAX`/`MIN` forms).
    fn greatest_name(&self) -> &'static str;
    fn least_name(&self) -> &'static str;
}

impl DialectExt for Dialect {
    fn scalar_cast(&self, cast: &'static str) -> &'static str {
        if self.is_postgres() { cast } else { "" }
    }

    fn cast(&self, expr: &str, storage: &str) -> String {
        format!("CAST({expr} AS {storage})")
    }

    fn string_agg_name(&self) -> &'static str {
        match self {
            // SQLite 3.44 added STRING_AGG as a GROUP_CONCAT alias.
            Dialect::PostgreSql | Dialect::Sqlite344Extensions => "STRING_AGG",
            Dialect::SqliteMinimal => "GROUP_CONCAT",
        }
    }

    fn extract_epoch(&self, expr: &str) -> String {
        match self {
            Dialect::PostgreSql => format!("EXTRACT(EPOCH FROM {expr})"),
            Dialect::SqliteMinimal => format!("CAST(STRFTIME('%s', {expr}) AS REAL)"),
            Dialect::Sqlite344Extensions => format!("UNIXEPOCH({expr})"),
        }
    }

    fn like_operator(&self, case_insensitive: bool) -> &'static str {
        if case_insensitive && self.is_postgres() {
            "ILIKE"
        } else {
            // SQLite LIKE is already case-insensitive for ASCII.
            "LIKE"
        }
    }

    fn regex_match(&self, expr: &str, pattern: &str) -> Result<String> {
        if self.is_postgres() {
            Ok(format!("{expr} ~ {pattern}"))
        } else {
            Err(Error::domain(
                "Operator 'REGEXP' is not supported by default in SQLite",
            ))
        }
    }

    fn greatest_name(&self) -> &'static str {
        if self.is_postgres() { "GREATEST" } else { "MAX" }
    }

    fn least_name(&self) -> &'static str {
        if self.is_postgres() { "LEAST" } else { "MIN" }
    }
}
