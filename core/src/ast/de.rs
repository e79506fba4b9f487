//! Checked conversion from raw `serde_json::Value` trees into the typed AST.
//!
//! This is the validation layer for the JSON surface: every shape rule that
//! can be decided without the schema is enforced here, and the core
//! re-checks the load-bearing ones defensively during evaluation.

use serde_json::{Map, Value};

use crate::ast::{
    AggregatedField, AggregationQuery, Condition, DeleteQuery, Expression, FieldCondition,
    InsertQuery, OperatorMap, Pagination, SelectQuery, SelectionItem, UpdateQuery,
};
use crate::error::{Error, Result};
use crate::value::Scalar;

const OPERATOR_KEYS: &[&str] = &[
    "$ne", "$eq", "$gt", "$gte", "$lt", "$lte", "$like", "$ilike", "$regex", "$in", "$nin",
];

/// Converts a JSON value into a scalar (primitive or typed scalar).
pub fn scalar_from_value(value: &Value) -> Result<Scalar> {
    match value {
        Value::Null => Ok(Scalar::Null),
        Value::Bool(b) => Ok(Scalar::Bool(*b)),
        Value::Number(n) => Ok(Scalar::Number(number_value(n)?)),
        Value::String(s) => Ok(Scalar::String(s.clone())),
        Value::Object(map) => {
            typed_scalar_from_map(map)?
                .ok_or_else(|| Error::shape("Invalid scalar value"))
        }
        Value::Array(_) => Err(Error::shape("Invalid scalar value")),
    }
}

fn typed_scalar_from_map(map: &Map<String, Value>) -> Result<Option<Scalar>> {
    if map.len() != 1 {
        return Ok(None);
    }
    let (key, value) = map.iter().next().expect("len checked");
    let scalar = match key.as_str() {
        "$date" => Scalar::Date(expect_string(value, "$date")?),
        "$timestamp" => Scalar::Timestamp(expect_string(value, "$timestamp")?),
        "$uuid" => Scalar::Uuid(expect_string(value, "$uuid")?),
        "$jsonb" => Scalar::JsonB(value.clone()),
        _ => return Ok(None),
    };
    Ok(Some(scalar))
}

/// Converts a JSON value into an expression node.
pub fn expression_from_value(value: &Value) -> Result<Expression> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            Ok(Expression::Scalar(scalar_from_value(value)?))
        }
        Value::Object(map) => expression_from_map(map),
        Value::Array(_) => Err(Error::shape("Arrays are not valid expressions")),
    }
}

fn expression_from_map(map: &Map<String, Value>) -> Result<Expression> {
    if let Some(scalar) = typed_scalar_from_map(map)? {
        return Ok(Expression::Scalar(scalar));
    }
    if map.len() != 1 {
        return Err(Error::shape("Expression objects must have exactly one key"));
    }
    let (key, value) = map.iter().next().expect("len checked");
    match key.as_str() {
        "$field" => Ok(Expression::Field(expect_string(value, "$field")?)),
        "$var" => Ok(Expression::Var(expect_string(value, "$var")?)),
        "$func" => func_from_value(value),
        "$cond" => cond_expression_from_value(value),
        other => Err(Error::shape(format!("Invalid expression key '{other}'"))),
    }
}

fn func_from_value(value: &Value) -> Result<Expression> {
    let map = expect_object(value, "$func")?;
    if map.len() != 1 {
        return Err(Error::shape("$func objects must have exactly one key"));
    }
    let (name, args) = map.iter().next().expect("len checked");
    let args = match args {
        Value::Array(items) => items.iter().map(expression_from_value).collect::<Result<_>>()?,
        _ => return Err(Error::shape(format!("Arguments of function '{name}' must be an array"))),
    };
    Ok(Expression::Func { name: name.clone(), args })
}

fn cond_expression_from_value(value: &Value) -> Result<Expression> {
    let map = expect_object(value, "$cond")?;
    let condition = map
        .get("if")
        .ok_or_else(|| Error::shape("$cond objects must have an 'if' condition"))?;
    let then = map
        .get("then")
        .ok_or_else(|| Error::shape("$cond objects must have a 'then' expression"))?;
    let otherwise = map
        .get("else")
        .ok_or_else(|| Error::shape("$cond objects must have an 'else' expression"))?;
    Ok(Expression::Cond {
        condition: Box::new(condition_from_value(condition)?),
        then: Box::new(expression_from_value(then)?),
        otherwise: Box::new(expression_from_value(otherwise)?),
    })
}

/// Converts a JSON value into a condition node.
pub fn condition_from_value(value: &Value) -> Result<Condition> {
    match value {
        Value::Object(map) => condition_from_map(map),
        // Scalars become plain expressions; the evaluator requires boolean.
        _ => Ok(Condition::Expr(expression_from_value(value)?)),
    }
}

fn condition_from_map(map: &Map<String, Value>) -> Result<Condition> {
    if map.is_empty() {
        return Err(Error::shape("Conditions cannot be empty objects"));
    }
    if map.keys().all(|k| !k.starts_with('$')) {
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            entries.push((key.clone(), field_condition_from_value(value)?));
        }
        return Ok(Condition::Fields(entries));
    }
    if map.len() != 1 {
        return Err(Error::shape("Combinator conditions must have exactly one key"));
    }
    let (key, value) = map.iter().next().expect("len checked");
    match key.as_str() {
        "$and" => Ok(Condition::And(condition_array_from_value(value)?)),
        "$or" => Ok(Condition::Or(condition_array_from_value(value)?)),
        "$not" => Ok(Condition::Not(Box::new(condition_from_value(value)?))),
        "$exists" => {
            let map = expect_object(value, "$exists")?;
            let table = map
                .get("table")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::shape("$exists conditions must name a table"))?;
            let condition = map
                .get("condition")
                .ok_or_else(|| Error::shape("$exists conditions must have a condition"))?;
            Ok(Condition::Exists {
                table: table.to_string(),
                condition: Box::new(condition_from_value(condition)?),
            })
        }
        _ => Ok(Condition::Expr(expression_from_map(map)?)),
    }
}

fn condition_array_from_value(value: &Value) -> Result<Vec<Condition>> {
    match value {
        Value::Array(items) => items.iter().map(condition_from_value).collect(),
        _ => Err(Error::shape("Combinator conditions must be arrays")),
    }
}

fn field_condition_from_value(value: &Value) -> Result<FieldCondition> {
    if let Value::Object(map) = value {
        if map.keys().any(|k| OPERATOR_KEYS.contains(&k.as_str())) {
            return Ok(FieldCondition::Ops(operator_map_from_map(map)?));
        }
    }
    Ok(FieldCondition::Value(expression_from_value(value)?))
}

fn operator_map_from_map(map: &Map<String, Value>) -> Result<OperatorMap> {
    let mut ops = OperatorMap::default();
    for (key, value) in map {
        match key.as_str() {
            "$ne" => ops.ne = Some(expression_from_value(value)?),
            "$eq" => ops.eq = Some(expression_from_value(value)?),
            "$gt" => ops.gt = Some(expression_from_value(value)?),
            "$gte" => ops.gte = Some(expression_from_value(value)?),
            "$lt" => ops.lt = Some(expression_from_value(value)?),
            "$lte" => ops.lte = Some(expression_from_value(value)?),
            "$like" => ops.like = Some(expression_from_value(value)?),
            "$ilike" => ops.ilike = Some(expression_from_value(value)?),
            "$regex" => ops.regex = Some(expression_from_value(value)?),
            "$in" => ops.r#in = Some(expression_array_from_value(value, "$in")?),
            "$nin" => ops.nin = Some(expression_array_from_value(value, "$nin")?),
            other => return Err(Error::shape(format!("Unknown operator '{other}'"))),
        }
    }
    Ok(ops)
}

fn expression_array_from_value(value: &Value, op: &str) -> Result<Vec<Expression>> {
    match value {
        Value::Array(items) => items.iter().map(expression_from_value).collect(),
        _ => Err(Error::shape(format!("{op} condition should be a non-empty array."))),
    }
}

/// Converts a JSON value into a SELECT query.
pub fn select_query_from_value(value: &Value) -> Result<SelectQuery> {
    let map = expect_object(value, "select query")?;
    let root_table = required_string(map, "rootTable", "select query")?;
    let selection = selection_from_value(
        map.get("selection")
            .ok_or_else(|| Error::shape("Select queries must have a selection"))?,
    )?;
    let condition = optional_condition(map)?;
    let pagination = match map.get("pagination") {
        Some(v) => Some(pagination_from_value(v)?),
        None => None,
    };
    Ok(SelectQuery { root_table, selection, condition, pagination })
}

fn selection_from_value(value: &Value) -> Result<Vec<(String, SelectionItem)>> {
    let map = expect_object(value, "selection")?;
    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        entries.push((key.clone(), selection_item_from_value(value)?));
    }
    Ok(entries)
}

fn selection_item_from_value(value: &Value) -> Result<SelectionItem> {
    match value {
        Value::Bool(true) => Ok(SelectionItem::Field),
        Value::Object(map)
            if !map.is_empty() && map.keys().all(|k| !k.starts_with('$')) =>
        {
            Ok(SelectionItem::Nested(selection_from_value(value)?))
        }
        _ => Ok(SelectionItem::Expression(expression_from_value(value)?)),
    }
}

fn pagination_from_value(value: &Value) -> Result<Pagination> {
    let map = expect_object(value, "pagination")?;
    let number_at = |key: &str| -> Result<Option<f64>> {
        match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(Some(number_value(n)?)),
            Some(_) => Err(Error::shape(format!("Pagination '{key}' must be a number"))),
        }
    };
    Ok(Pagination { limit: number_at("limit")?, offset: number_at("offset")? })
}

/// Converts a JSON value into an aggregation query.
pub fn aggregation_query_from_value(value: &Value) -> Result<AggregationQuery> {
    let map = expect_object(value, "aggregation query")?;
    let table = required_string(map, "table", "aggregation query")?;
    let group_by = match map.get("groupBy") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| expect_string(v, "groupBy entries"))
            .collect::<Result<_>>()?,
        Some(_) => return Err(Error::shape("groupBy must be an array of field references")),
    };
    let condition = optional_condition(map)?;
    let aggregated_fields = match map.get("aggregatedFields") {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => {
            let map = expect_object(v, "aggregatedFields")?;
            let mut entries = Vec::with_capacity(map.len());
            for (alias, value) in map {
                entries.push((alias.clone(), aggregated_field_from_value(value)?));
            }
            entries
        }
    };
    Ok(AggregationQuery { table, group_by, condition, aggregated_fields })
}

fn aggregated_field_from_value(value: &Value) -> Result<AggregatedField> {
    let map = expect_object(value, "aggregated field")?;
    let function = required_string(map, "function", "aggregated field")?;
    let field = required_string(map, "field", "aggregated field")?;
    let additional_arguments = match map.get("additionalArguments") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            items.iter().map(expression_from_value).collect::<Result<_>>()?
        }
        Some(_) => return Err(Error::shape("additionalArguments must be an array")),
    };
    Ok(AggregatedField { function, field, additional_arguments })
}

/// Converts a JSON value into an INSERT query.
pub fn insert_query_from_value(value: &Value) -> Result<InsertQuery> {
    let map = expect_object(value, "insert query")?;
    let table = required_string(map, "table", "insert query")?;
    let row = expect_object(
        map.get("newRow")
            .ok_or_else(|| Error::shape("Insert queries must have a newRow"))?,
        "newRow",
    )?;
    let mut new_row = Vec::with_capacity(row.len());
    for (key, value) in row {
        new_row.push((key.clone(), scalar_from_value(value)?));
    }
    let condition = optional_condition(map)?;
    Ok(InsertQuery { table, new_row, condition })
}

/// Converts a JSON value into an UPDATE query.
pub fn update_query_from_value(value: &Value) -> Result<UpdateQuery> {
    let map = expect_object(value, "update query")?;
    let table = required_string(map, "table", "update query")?;
    let raw_updates = expect_object(
        map.get("updates")
            .ok_or_else(|| Error::shape("Update queries must have updates"))?,
        "updates",
    )?;
    let mut updates = Vec::with_capacity(raw_updates.len());
    for (key, value) in raw_updates {
        updates.push((key.clone(), expression_from_value(value)?));
    }
    let condition = optional_condition(map)?;
    Ok(UpdateQuery { table, updates, condition })
}

/// Converts a JSON value into a DELETE query.
pub fn delete_query_from_value(value: &Value) -> Result<DeleteQuery> {
    let map = expect_object(value, "delete query")?;
    let table = required_string(map, "table", "delete query")?;
    let condition = optional_condition(map)?;
    Ok(DeleteQuery { table, condition })
}

fn optional_condition(map: &Map<String, Value>) -> Result<Option<Condition>> {
    match map.get("condition") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Ok(Some(condition_from_value(v)?)),
    }
}

fn number_value(n: &serde_json::Number) -> Result<f64> {
    n.as_f64().ok_or_else(|| Error::domain("Invalid numeric value"))
}

fn expect_object<'v>(value: &'v Value, what: &str) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::shape(format!("Expected an object for {what}")))
}

fn expect_string(value: &Value, what: &str) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::shape(format!("Expected a string for {what}")))
}

fn required_string(map: &Map<String, Value>, key: &str, what: &str) -> Result<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::shape(format!("Missing '{key}' in {what}")))
}
