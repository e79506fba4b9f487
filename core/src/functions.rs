//! Function catalog.
//!
//! Every named function is a data record declaring its arity, per-argument
//! expected types, result type, and a dialect-aware emitter. The evaluator
//! validates arguments against the record and hands pre-rendered fragments to
//! the emitter; nothing outside this module knows function-specific SQL.

use jsonsql_types::{Dialect, ExprType};

use crate::dialect::DialectExt;
use crate::error::{Error, Result};

/// Argument count rule.
#[derive(Debug, Clone, Copy)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

/// Per-argument expected types.
#[derive(Debug, Clone, Copy)]
pub enum ArgTypes {
    /// Every argument has the same expected type.
    Uniform(ExprType),
    /// Positional expectations; variadic tails repeat the last entry.
    PerIndex(&'static [ExprType]),
}

/// How a function renders, given pre-rendered argument fragments.
#[derive(Debug, Clone, Copy)]
pub enum Emitter {
    /// `(a <op> b)`
    Infix(&'static str),
    /// `NAME(a, b, ...)`
    Named(&'static str),
    /// `(a || b || ...)`
    Concat,
    /// Dialect-specific epoch extraction.
    ExtractEpoch,
    /// `GREATEST(...)` / SQLite scalar `MAX(...)`
    Greatest,
    /// `LEAST(...)` / SQLite scalar `MIN(...)`
    Least,
    /// `STRING_AGG(value, sep)` / `GROUP_CONCAT(value, sep)`
    StringAgg,
    /// `COUNT(DISTINCT x)`
    CountDistinct,
}

/// One catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub arity: Arity,
    pub arg_types: ArgTypes,
    pub result: ExprType,
    pub emitter: Emitter,
    /// Whether this is an aggregation function (usable in `aggregatedFields`).
    pub aggregate: bool,
}

impl FunctionSpec {
    /// Validates the argument count.
    pub fn check_arity(&self, got: usize) -> Result<()> {
        match self.arity {
            Arity::Exact(n) if got != n => Err(Error::arity(format!(
                "Function '{}' requires exactly {n} argument(s), got {got}",
                self.name
            ))),
            Arity::AtLeast(n) if got < n => Err(Error::arity(format!(
                "Function '{}' requires at least {n} arguments, got {got}",
                self.name
            ))),
            _ => Ok(()),
        }
    }

    /// The expected type of the argument at `index`.
    #[must_use]
    pub fn expected_type(&self, index: usize) -> ExprType {
        match self.arg_types {
            ArgTypes::Uniform(ty) => ty,
            ArgTypes::PerIndex(types) => types[index.min(types.len() - 1)],
        }
    }

    /// Validates one argument's inferred type against the declaration,
    /// auto-casting to TEXT where the declaration expects a string.
    /// Returns the (possibly cast-wrapped) fragment.
    pub fn check_argument(
        &self,
        index: usize,
        actual: ExprType,
        sql: String,
        dialect: Dialect,
    ) -> Result<String> {
        let expected = self.expected_type(index);
        if actual.matches(expected) {
            return Ok(sql);
        }
        if expected == ExprType::String {
            // Every type can cast to TEXT.
            return Ok(dialect.cast(&sql, "TEXT"));
        }
        Err(Error::type_mismatch(format!(
            "Function '{}' requires argument {} of type {expected}, got {actual}",
            self.name,
            index + 1
        )))
    }

    /// Renders the call from pre-rendered argument fragments.
    #[must_use]
    pub fn emit(&self, args: &[String], dialect: Dialect) -> String {
        match self.emitter {
            Emitter::Infix(op) => format!("({} {op} {})", args[0], args[1]),
            Emitter::Named(name) => format!("{name}({})", args.join(", ")),
            Emitter::Concat => format!("({})", args.join(" || ")),
            Emitter::ExtractEpoch => dialect.extract_epoch(&args[0]),
            Emitter::Greatest => format!("{}({})", dialect.greatest_name(), args.join(", ")),
            Emitter::Least => format!("{}({})", dialect.least_name(), args.join(", ")),
            Emitter::StringAgg => {
                format!("{}({})", dialect.string_agg_name(), args.join(", "))
            }
            Emitter::CountDistinct => format!("COUNT(DISTINCT {})", args[0]),
        }
    }
}

const SUBSTR_ARGS: &[ExprType] = &[ExprType::String, ExprType::Number, ExprType::Number];
const STRING_AGG_ARGS: &[ExprType] = &[ExprType::String, ExprType::String];

macro_rules! spec {
    ($name:literal, $arity:expr, $args:expr, $result:ident, $emitter:expr) => {
        spec!($name, $arity, $args, $result, $emitter, false)
    };
    ($name:literal, $arity:expr, $args:expr, $result:ident, $emitter:expr, $agg:literal) => {
        FunctionSpec {
            name: $name,
            arity: $arity,
            arg_types: $args,
            result: ExprType::$result,
            emitter: $emitter,
            aggregate: $agg,
        }
    };
}

static CATALOG: &[FunctionSpec] = &[
    // Arithmetic, binary.
    spec!("ADD", Arity::Exact(2), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Infix("+")),
    spec!("SUBTRACT", Arity::Exact(2), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Infix("-")),
    spec!("MULTIPLY", Arity::Exact(2), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Infix("*")),
    spec!("DIVIDE", Arity::Exact(2), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Infix("/")),
    spec!("MOD", Arity::Exact(2), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Infix("%")),
    spec!("POW", Arity::Exact(2), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("POWER")),
    // Numeric, unary.
    spec!("ABS", Arity::Exact(1), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("ABS")),
    spec!("CEIL", Arity::Exact(1), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("CEIL")),
    spec!("FLOOR", Arity::Exact(1), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("FLOOR")),
    spec!("ROUND", Arity::Exact(1), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("ROUND")),
    // Numeric, variadic.
    spec!("COALESCE_NUMBER", Arity::AtLeast(2), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("COALESCE")),
    spec!("GREATEST_NUMBER", Arity::AtLeast(2), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Greatest),
    spec!("LEAST_NUMBER", Arity::AtLeast(2), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Least),
    // String.
    spec!("UPPER", Arity::Exact(1), ArgTypes::Uniform(ExprType::String), String, Emitter::Named("UPPER")),
    spec!("LOWER", Arity::Exact(1), ArgTypes::Uniform(ExprType::String), String, Emitter::Named("LOWER")),
    spec!("LENGTH", Arity::Exact(1), ArgTypes::Uniform(ExprType::String), Number, Emitter::Named("LENGTH")),
    spec!("TRIM", Arity::Exact(1), ArgTypes::Uniform(ExprType::String), String, Emitter::Named("TRIM")),
    spec!("CONCAT", Arity::AtLeast(2), ArgTypes::Uniform(ExprType::String), String, Emitter::Concat),
    spec!("COALESCE_STRING", Arity::AtLeast(2), ArgTypes::Uniform(ExprType::String), String, Emitter::Named("COALESCE")),
    spec!("SUBSTR", Arity::Exact(3), ArgTypes::PerIndex(SUBSTR_ARGS), String, Emitter::Named("SUBSTR")),
    // Date/time.
    spec!("EXTRACT_EPOCH", Arity::Exact(1), ArgTypes::Uniform(ExprType::DateTime), Number, Emitter::ExtractEpoch),
    // Aggregation.
    spec!("COUNT", Arity::Exact(1), ArgTypes::Uniform(ExprType::Any), Number, Emitter::Named("COUNT"), true),
    spec!("SUM", Arity::Exact(1), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("SUM"), true),
    spec!("AVG", Arity::Exact(1), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("AVG"), true),
    spec!("MIN", Arity::Exact(1), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("MIN"), true),
    spec!("MAX", Arity::Exact(1), ArgTypes::Uniform(ExprType::Number), Number, Emitter::Named("MAX"), true),
    spec!("COUNT_DISTINCT", Arity::Exact(1), ArgTypes::Uniform(ExprType::Any), Number, Emitter::CountDistinct, true),
    spec!("STRING_AGG", Arity::Exact(2), ArgTypes::PerIndex(STRING_AGG_ARGS), String, Emitter::StringAgg, true),
];

/// Looks up a catalog entry by name.
pub fn lookup(name: &str) -> Result<&'static FunctionSpec> {
    CATALOG
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| Error::domain(format!("Unknown function or operator: \"{name}\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_messages_match_templates() {
        let spec = lookup("ADD").unwrap();
        assert_eq!(
            spec.check_arity(3).unwrap_err().to_string(),
            "Function 'ADD' requires exactly 2 argument(s), got 3"
        );
        let spec = lookup("CONCAT").unwrap();
        assert_eq!(
            spec.check_arity(1).unwrap_err().to_string(),
            "Function 'CONCAT' requires at least 2 arguments, got 1"
        );
    }

    #[test]
    fn string_agg_name_is_dialect_specific() {
        let spec = lookup("STRING_AGG").unwrap();
        let args = vec!["users.name".to_string(), "', '".to_string()];
        assert_eq!(spec.emit(&args, Dialect::PostgreSql), "STRING_AGG(users.name, ', ')");
        assert_eq!(spec.emit(&args, Dialect::SqliteMinimal), "GROUP_CONCAT(users.name, ', ')");
        assert_eq!(
            spec.emit(&args, Dialect::Sqlite344Extensions),
            "STRING_AGG(users.name, ', ')"
        );
    }

    #[test]
    fn unknown_function_error() {
        assert_eq!(
            lookup("NOPE").unwrap_err().to_string(),
            "Unknown function or operator: \"NOPE\""
        );
    }
}
