//! Typed AST of the JSON-shaped query language.
//!
//! Validation of the raw JSON surface happens in [`de`], which produces these
//! tagged trees; the evaluators and builders only ever pattern-match on them.
//! All AST values are immutable inputs to a compile.

pub mod de;

use serde_json::Value;

use crate::value::Scalar;

/// An expression node: literal, typed scalar, field reference, variable,
/// function call, or conditional.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Scalar primitive or typed scalar, inlined via the escaper.
    Scalar(Scalar),
    /// `{$field: "table.column[->...]"}`
    Field(String),
    /// `{$var: "name"}`
    Var(String),
    /// `{$func: {NAME: [arg, ...]}}` — exactly one name.
    Func { name: String, args: Vec<Expression> },
    /// `{$cond: {if, then, else}}`
    Cond {
        condition: Box<Condition>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
}

impl Expression {
    /// Returns the literal scalar when this expression is one.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Expression::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Scalar> for Expression {
    fn from(value: Scalar) -> Self {
        Expression::Scalar(value)
    }
}

/// A Boolean condition node.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `{$and: [cond, ...]}` — non-empty.
    And(Vec<Condition>),
    /// `{$or: [cond, ...]}` — non-empty.
    Or(Vec<Condition>),
    /// `{$not: cond}`
    Not(Box<Condition>),
    /// `{$exists: {table, condition}}`
    Exists { table: String, condition: Box<Condition> },
    /// A plain expression that must evaluate to boolean.
    Expr(Expression),
    /// A field-operator map: each entry is ANDed.
    Fields(Vec<(String, FieldCondition)>),
    /// Internal: an operator map applied to an expression left-hand side.
    /// Produced by the UPDATE NEW_ROW rewrite when a substituted update
    /// value stays symbolic; not expressible in the JSON surface.
    Compare {
        /// Display name for error messages (the original reference).
        name: String,
        lhs: Expression,
        ops: OperatorMap,
    },
}

/// The value side of a field-map entry: either a compact operator map or a
/// bare expression (shorthand for `$eq`).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCondition {
    Ops(OperatorMap),
    Value(Expression),
}

/// Compact comparison operators on one field, kept in canonical emission
/// order: `$ne, $eq, $gt, $gte, $lt, $lte, $like, $ilike, $regex, $in, $nin`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorMap {
    pub ne: Option<Expression>,
    pub eq: Option<Expression>,
    pub gt: Option<Expression>,
    pub gte: Option<Expression>,
    pub lt: Option<Expression>,
    pub lte: Option<Expression>,
    pub like: Option<Expression>,
    pub ilike: Option<Expression>,
    pub regex: Option<Expression>,
    pub r#in: Option<Vec<Expression>>,
    pub nin: Option<Vec<Expression>>,
}

impl OperatorMap {
    /// Whether no operator is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ne.is_none()
            && self.eq.is_none()
            && self.gt.is_none()
            && self.gte.is_none()
            && self.lt.is_none()
            && self.lte.is_none()
            && self.like.is_none()
            && self.ilike.is_none()
            && self.regex.is_none()
            && self.r#in.is_none()
            && self.nin.is_none()
    }
}

/// One entry of a selection tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionItem {
    /// `true` — include the field named by the key.
    Field,
    /// An expression aliased to the key.
    Expression(Expression),
    /// A relationship projection into a child table.
    Nested(Vec<(String, SelectionItem)>),
}

/// Optional LIMIT/OFFSET. Values pass through unvalidated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pagination {
    pub limit: Option<f64>,
    pub offset: Option<f64>,
}

/// A SELECT query.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub root_table: String,
    pub selection: Vec<(String, SelectionItem)>,
    pub condition: Option<Condition>,
    pub pagination: Option<Pagination>,
}

/// One aggregated output column.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedField {
    pub function: String,
    /// A field path, or `"*"` (COUNT only).
    pub field: String,
    pub additional_arguments: Vec<Expression>,
}

/// An aggregation query.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationQuery {
    pub table: String,
    pub group_by: Vec<String>,
    pub condition: Option<Condition>,
    pub aggregated_fields: Vec<(String, AggregatedField)>,
}

/// An INSERT of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    pub table: String,
    pub new_row: Vec<(String, Scalar)>,
    pub condition: Option<Condition>,
}

/// An UPDATE; values are full expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub table: String,
    pub updates: Vec<(String, Expression)>,
    pub condition: Option<Condition>,
}

/// A DELETE.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub table: String,
    pub condition: Option<Condition>,
}

macro_rules! impl_deserialize_via_value {
    ($($ty:ty => $convert:path),+ $(,)?) => {
        $(
            impl<'de> serde::Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
                where
                    D: serde::Deserializer<'de>,
                {
                    let value = Value::deserialize(deserializer)?;
                    $convert(&value).map_err(serde::de::Error::custom)
                }
            }
        )+
    };
}

impl_deserialize_via_value!(
    Expression => de::expression_from_value,
    Condition => de::condition_from_value,
    SelectQuery => de::select_query_from_value,
    AggregationQuery => de::aggregation_query_from_value,
    InsertQuery => de::insert_query_from_value,
    UpdateQuery => de::update_query_from_value,
    DeleteQuery => de::delete_query_from_value,
    Scalar => de::scalar_from_value,
);
