//! AST evaluators: expressions, conditions, and static folding.

mod condition;
mod expression;
mod fold;

pub use condition::parse_condition;
pub use expression::parse_expression;
pub use fold::{check_insert_condition, rewrite_update_condition};
