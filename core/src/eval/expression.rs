//! Expression evaluation: SQL text plus type inference.

use jsonsql_types::ExprType;

use crate::ast::Expression;
use crate::error::{Error, Result};
use crate::eval::condition::parse_condition;
use crate::functions;
use crate::resolve::resolve_field_path;
use crate::state::ParserState;
use crate::value::Scalar;

/// Evaluates an expression node to a SQL fragment, recording the inferred
/// type in the state's memo under the node's canonical key.
pub fn parse_expression(expr: &Expression, state: &mut ParserState<'_>) -> Result<String> {
    let (sql, ty) = match expr {
        Expression::Scalar(scalar) => (scalar.to_sql(state.config.dialect)?, scalar.expr_type()),
        Expression::Field(reference) => {
            let resolved = resolve_field_path(reference, state)?;
            (resolved.select.field, resolved.select.target_type)
        }
        Expression::Var(name) => {
            let scalar = state
                .config
                .variables
                .get(name)
                .ok_or_else(|| Error::config(format!("Unknown variable '{name}'")))?;
            (scalar.to_sql(state.config.dialect)?, scalar.expr_type())
        }
        Expression::Func { name, args } => parse_function(name, args, state)?,
        Expression::Cond { condition, then, otherwise } => {
            let condition_sql = parse_condition(condition, state)?;
            let then_sql = parse_expression(then, state)?;
            let otherwise_sql = parse_expression(otherwise, state)?;
            let ty = branch_type(state.expression_type(then), state.expression_type(otherwise))?;
            (
                format!("(CASE WHEN {condition_sql} THEN {then_sql} ELSE {otherwise_sql} END)"),
                ty,
            )
        }
    };
    state.record_type(expr, ty);
    Ok(sql)
}

fn parse_function(
    name: &str,
    args: &[Expression],
    state: &mut ParserState<'_>,
) -> Result<(String, ExprType)> {
    let spec = functions::lookup(name)?;
    spec.check_arity(args.len())?;

    if name == "DIVIDE" {
        if let Some(Scalar::Number(n)) = args[1].as_scalar() {
            if *n == 0.0 {
                return Err(Error::domain("Division by zero is not allowed"));
            }
        }
    }

    let dialect = state.config.dialect;
    let mut fragments = Vec::with_capacity(args.len());
    for (index, arg) in args.iter().enumerate() {
        let sql = parse_expression(arg, state)?;
        let actual = state.expression_type(arg);
        fragments.push(spec.check_argument(index, actual, sql, dialect)?);
    }

    Ok((spec.emit(&fragments, dialect), spec.result))
}

/// The common type of a conditional's branches: equal types win, `null` and
/// `any` defer to the other side.
fn branch_type(then: ExprType, otherwise: ExprType) -> Result<ExprType> {
    let ty = match (then, otherwise) {
        (ExprType::Null, other) | (other, ExprType::Null) => other,
        (ExprType::Any, other) | (other, ExprType::Any) => other,
        (a, b) if a == b => a,
        (a, b) if a.matches(b) => b,
        (a, b) if b.matches(a) => a,
        (a, b) => {
            return Err(Error::type_mismatch(format!(
                "'then' and 'else' expressions must have the same type, got {a} and {b}"
            )));
        }
    };
    Ok(ty)
}
