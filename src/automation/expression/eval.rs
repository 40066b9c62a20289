//! Evaluation of parsed conditions against a read-only scope.

use super::parser::{BinaryOp, Builtin, Expr};
use super::{ExpressionError, Scope, Value};
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

pub(super) fn evaluate(expr: &Expr, scope: &Scope<'_>) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(segments) => scope.resolve(segments),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Not(operand) => Ok(Value::Bool(!expect_bool(&evaluate(operand, scope)?, "!")?)),
        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, scope),
        Expr::Call { builtin, args } => evaluate_call(*builtin, args, scope),
    }
}

fn evaluate_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    scope: &Scope<'_>,
) -> Result<Value, ExpressionError> {
    match op {
        BinaryOp::And => {
            if !expect_bool(&evaluate(left, scope)?, "&&")? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(expect_bool(&evaluate(right, scope)?, "&&")?))
        }
        BinaryOp::Or => {
            if expect_bool(&evaluate(left, scope)?, "||")? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(expect_bool(&evaluate(right, scope)?, "||")?))
        }
        BinaryOp::Eq => Ok(Value::Bool(equals(
            &evaluate(left, scope)?,
            &evaluate(right, scope)?,
        )?)),
        BinaryOp::Ne => Ok(Value::Bool(!equals(
            &evaluate(left, scope)?,
            &evaluate(right, scope)?,
        )?)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&evaluate(left, scope)?, &evaluate(right, scope)?)?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
    }
}

fn evaluate_call(
    builtin: Builtin,
    args: &[Expr],
    scope: &Scope<'_>,
) -> Result<Value, ExpressionError> {
    match (builtin, args) {
        (Builtin::Now, []) => Ok(Value::Timestamp(scope.now())),
        (Builtin::Has, [Expr::Path(segments)]) => Ok(Value::Bool(scope.contains(segments))),
        (Builtin::In, [needle, haystack]) => {
            let value = evaluate(needle, scope)?;
            let Value::List(items) = evaluate(haystack, scope)? else {
                return Err(ExpressionError::TypeMismatch(
                    "in() expects a list as its second argument".to_owned(),
                ));
            };
            Ok(Value::Bool(
                items
                    .iter()
                    .any(|item| equals(&value, item).unwrap_or(false)),
            ))
        }
        (Builtin::AgeDays, [argument]) => {
            let instant = as_timestamp(&evaluate(argument, scope)?)?;
            let days = scope.now().signed_duration_since(instant).num_days();
            let bounded = i32::try_from(days).map_err(|_| {
                ExpressionError::TypeMismatch(format!("age of {days} days is out of range"))
            })?;
            Ok(Value::Number(f64::from(bounded)))
        }
        _ => Err(ExpressionError::TypeMismatch(format!(
            "invalid arguments for built-in {builtin:?}"
        ))),
    }
}

fn expect_bool(value: &Value, operator: &str) -> Result<bool, ExpressionError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        other => Err(ExpressionError::TypeMismatch(format!(
            "{operator} expects booleans, got {}",
            other.type_name()
        ))),
    }
}

/// Equality is defined within a type; `null` compares unequal to everything
/// but `null`. Any other mix of types is a type mismatch.
fn equals(left: &Value, right: &Value) -> Result<bool, ExpressionError> {
    match (left, right) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Text(a), Value::Text(b)) => Ok(a == b),
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b) == Some(Ordering::Equal)),
        (Value::Timestamp(_), _) | (_, Value::Timestamp(_)) => {
            Ok(compare(left, right)? == Ordering::Equal)
        }
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (x, y) in a.iter().zip(b) {
                if !equals(x, y)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Err(mismatch("==", left, right)),
    }
}

fn compare(left: &Value, right: &Value) -> Result<Ordering, ExpressionError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .partial_cmp(b)
            .ok_or_else(|| ExpressionError::TypeMismatch("numbers are not comparable".to_owned())),
        (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Ok(a.cmp(b)),
        (Value::Timestamp(a), Value::Text(_)) => Ok(a.cmp(&as_timestamp(right)?)),
        (Value::Text(_), Value::Timestamp(b)) => Ok(as_timestamp(left)?.cmp(b)),
        _ => Err(mismatch("comparison", left, right)),
    }
}

fn as_timestamp(value: &Value) -> Result<DateTime<Utc>, ExpressionError> {
    match value {
        Value::Timestamp(instant) => Ok(*instant),
        Value::Text(raw) => parse_timestamp(raw),
        other => Err(ExpressionError::TypeMismatch(format!(
            "expected a timestamp, got {}",
            other.type_name()
        ))),
    }
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
///
/// # Errors
///
/// Returns [`ExpressionError::InvalidTimestamp`] when neither form matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ExpressionError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ExpressionError::InvalidTimestamp(raw.to_owned()))
}

fn mismatch(operator: &str, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::TypeMismatch(format!(
        "{operator} between {} and {}",
        left.type_name(),
        right.type_name()
    ))
}
