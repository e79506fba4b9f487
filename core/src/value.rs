//! Scalar values and the literal escaper.
//!
//! The escaper is the sole trust boundary between untrusted scalar values and
//! the generated SQL: every scalar that ends up in an emitted statement goes
//! through [`Scalar::to_sql`].

use chrono::{NaiveDate, NaiveDateTime};
use jsonsql_types::{Dialect, ExprType};
use serde_json::Value;
use uuid::Uuid;

use crate::dialect::DialectExt;
use crate::error::{Error, Result};

/// A scalar value: JSON primitive or typed scalar (`$date`, `$timestamp`,
/// `$uuid`, `$jsonb`).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    /// `{$date: "yyyy-mm-dd"}`
    Date(String),
    /// `{$timestamp: "yyyy-mm-ddThh:mm:ss[.fff]"}`
    Timestamp(String),
    /// `{$uuid: "<36-char uuid>"}`
    Uuid(String),
    /// `{$jsonb: <object literal>}`
    JsonB(Value),
}

impl Scalar {
    /// The inferred expression type of this scalar.
    #[must_use]
    pub fn expr_type(&self) -> ExprType {
        match self {
            Scalar::String(_) => ExprType::String,
            Scalar::Number(_) => ExprType::Number,
            Scalar::Bool(_) => ExprType::Boolean,
            Scalar::Null => ExprType::Null,
            Scalar::Date(_) => ExprType::Date,
            Scalar::Timestamp(_) => ExprType::DateTime,
            Scalar::Uuid(_) => ExprType::Uuid,
            Scalar::JsonB(_) => ExprType::Object,
        }
    }

    /// Renders this scalar as a dialect-correct SQL literal.
    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        match self {
            Scalar::String(s) => Ok(quote_string(s)),
            Scalar::Number(n) => format_number(*n),
            Scalar::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Scalar::Null => Ok("NULL".to_string()),
            Scalar::Date(s) => {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|_| Error::domain(format!("Invalid date format '{s}'")))?;
                Ok(format!("{}{}", quote_string(s), dialect.scalar_cast("::DATE")))
            }
            Scalar::Timestamp(s) => {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                    .map_err(|_| Error::domain(format!("Invalid timestamp format '{s}'")))?;
                let normalized = s.replacen('T', " ", 1);
                Ok(format!(
                    "{}{}",
                    quote_string(&normalized),
                    dialect.scalar_cast("::TIMESTAMP")
                ))
            }
            Scalar::Uuid(s) => {
                // Canonical 8-4-4-4-12 form only; the uuid crate also accepts
                // simple/braced/urn forms, which the 36-char check excludes.
                if s.len() != 36 || Uuid::try_parse(s).is_err() {
                    return Err(Error::domain("Invalid UUID format"));
                }
                Ok(format!("{}{}", quote_string(s), dialect.scalar_cast("::UUID")))
            }
            Scalar::JsonB(value) => {
                let serialized = serde_json::to_string(value)
                    .map_err(|e| Error::domain(format!("Invalid JSON value: {e}")))?;
                Ok(format!(
                    "{}{}",
                    quote_string(&serialized),
                    dialect.scalar_cast("::JSONB")
                ))
            }
        }
    }
}

/// Single-quotes a string, doubling internal quotes. Backslashes and control
/// bytes pass through verbatim; both dialect families accept them in standard
/// string literals.
#[must_use]
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Double-quotes an identifier verbatim. Identifiers are constrained to
/// `^[a-z][A-Za-z0-9_]*$` by config validation, so no rewriting is needed.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{name}\"")
}

/// Renders a numeric literal: integer form when there is no fractional part.
pub fn format_number(n: f64) -> Result<String> {
    if !n.is_finite() {
        return Err(Error::domain("Invalid numeric value"));
    }
    Ok(render_number(n))
}

/// Relaxed numeric rendering for pagination values, which pass through
/// without validation.
#[must_use]
pub fn format_number_relaxed(n: f64) -> String {
    if n.is_finite() {
        render_number(n)
    } else {
        n.to_string()
    }
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
