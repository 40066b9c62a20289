//! Condition language for automation rules and transition guards.
//!
//! A small, total, side-effect-free language: field path reads rooted at a
//! fixed set of names, comparisons, boolean connectives, list literals and
//! the built-ins `now()`, `has(path)`, `in(value, list)` and
//! `age_days(datetime)`. Anything else is rejected at parse time.
//!
//! Evaluation never performs I/O. `now()` is the instant supplied by the
//! caller, so evaluating the same expression against the same scope always
//! yields the same result.

mod eval;
mod lexer;
mod parser;

use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use thiserror::Error;

pub use eval::parse_timestamp;

/// Roots accepted by automation rule conditions.
pub const RULE_ROOTS: &[&str] = &["entity", "event", "actor", "before", "after"];

/// Roots accepted by transition guards.
pub const GUARD_ROOTS: &[&str] = &["entity", "payload"];

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpressionError {
    /// The source text is not a valid expression.
    #[error("parse error at offset {offset}: {reason}")]
    Parse {
        /// Byte offset of the offending token.
        offset: usize,
        /// Description of the problem.
        reason: String,
    },

    /// A path does not resolve in the evaluation scope.
    #[error("unknown field '{0}'")]
    UnknownPath(String),

    /// Operands have incompatible types.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A value could not be read as a timestamp.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

impl ExpressionError {
    fn parse(offset: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            reason: reason.into(),
        }
    }
}

/// Runtime value produced during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Any JSON number.
    Number(f64),
    /// String.
    Text(String),
    /// List literal or JSON array.
    List(Vec<Self>),
    /// Instant produced by `now()`.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns a short name of the value's type for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::List(_) => "list",
            Self::Timestamp(_) => "timestamp",
        }
    }

    fn from_json(path: &[String], json: &Json) -> Result<Self, ExpressionError> {
        match json {
            Json::Null => Ok(Self::Null),
            Json::Bool(flag) => Ok(Self::Bool(*flag)),
            Json::Number(number) => number.as_f64().map(Self::Number).ok_or_else(|| {
                ExpressionError::TypeMismatch(format!("'{}' is not a finite number", path.join(".")))
            }),
            Json::String(text) => Ok(Self::Text(text.clone())),
            Json::Array(items) => items
                .iter()
                .map(|item| Self::from_json(path, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            Json::Object(_) => Err(ExpressionError::TypeMismatch(format!(
                "'{}' is an object, not a value",
                path.join(".")
            ))),
        }
    }
}

/// Read-only bindings an expression is evaluated against.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    roots: BTreeMap<&'static str, &'a Json>,
    now: DateTime<Utc>,
}

impl<'a> Scope<'a> {
    /// Creates an empty scope whose `now()` is `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            roots: BTreeMap::new(),
            now,
        }
    }

    /// Binds a root name to a JSON document.
    #[must_use]
    pub fn with_root(mut self, name: &'static str, value: &'a Json) -> Self {
        self.roots.insert(name, value);
        self
    }

    /// Returns the instant used by `now()`.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn lookup(&self, segments: &[String]) -> Option<&'a Json> {
        let (root, rest) = segments.split_first()?;
        let mut current = *self.roots.get(root.as_str())?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    fn resolve(&self, segments: &[String]) -> Result<Value, ExpressionError> {
        let json = self
            .lookup(segments)
            .ok_or_else(|| ExpressionError::UnknownPath(segments.join(".")))?;
        Value::from_json(segments, json)
    }

    fn contains(&self, segments: &[String]) -> bool {
        self.lookup(segments).is_some_and(|json| !json.is_null())
    }
}

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: parser::Expr,
}

impl Expression {
    /// Parses a rule condition, accepting every root in [`RULE_ROOTS`].
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::Parse`] when the text is not a valid
    /// expression.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        Self::parse_with_roots(source, RULE_ROOTS)
    }

    /// Parses an expression whose paths may only start at `roots`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::Parse`] when the text is not a valid
    /// expression or names a root outside `roots`.
    pub fn parse_with_roots(source: &str, roots: &[&str]) -> Result<Self, ExpressionError> {
        let tokens = lexer::tokenize(source)?;
        let ast = parser::Parser::new(&tokens, roots, source.len()).parse()?;
        Ok(Self {
            source: source.to_owned(),
            ast,
        })
    }

    /// Returns the source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the expression to any value.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError`] when a path is unknown or operand types do
    /// not fit their operator.
    pub fn evaluate_value(&self, scope: &Scope<'_>) -> Result<Value, ExpressionError> {
        eval::evaluate(&self.ast, scope)
    }

    /// Evaluates the expression as a condition.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::TypeMismatch`] when the result is not a
    /// boolean, or any evaluation error.
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<bool, ExpressionError> {
        match self.evaluate_value(scope)? {
            Value::Bool(flag) => Ok(flag),
            other => Err(ExpressionError::TypeMismatch(format!(
                "condition must be boolean, got {}",
                other.type_name()
            ))),
        }
    }
}
