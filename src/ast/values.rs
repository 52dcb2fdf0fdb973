//! Argument leaves of the configuration tree

use super::{MethodCall, SourceLocation, Validate};
use crate::validator::ModelValidator;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// What a [`Value`] holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    /// A constant scalar or structure
    Literal(JsonValue),
    /// An interpolated expression, kept as written
    Expression(String),
}

/// A constant or expression argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Payload
    #[serde(flatten)]
    pub kind: ValueKind,
}

impl Value {
    /// Creates a literal value
    pub fn literal(value: impl Into<JsonValue>) -> Self {
        Self {
            location: None,
            kind: ValueKind::Literal(value.into()),
        }
    }

    /// Creates an expression value
    pub fn expression(expr: impl Into<String>) -> Self {
        Self {
            location: None,
            kind: ValueKind::Expression(expr.into()),
        }
    }

    /// Sets the source location
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Returns true for constants
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ValueKind::Literal(_))
    }

    /// The value as it is handed to extension construction.
    ///
    /// Expressions cannot be resolved here and travel as their source text.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match &self.kind {
            ValueKind::Literal(v) => v.clone(),
            ValueKind::Expression(e) => JsonValue::String(e.clone()),
        }
    }

    /// The literal string content, if this is a string constant
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Literal(JsonValue::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Literal(JsonValue::String(s)) => write!(f, "'{s}'"),
            ValueKind::Literal(v) => write!(f, "{v}"),
            ValueKind::Expression(e) => write!(f, "\"{e}\""),
        }
    }
}

impl Validate for Value {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        validator.validate_value(self)
    }
}

/// A `key: value` argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArgument {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Parameter name
    pub key: String,

    /// Argument value
    pub value: Box<MethodArg>,
}

/// One argument of an invocation-shaped node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodArg {
    /// Positional constant or expression
    Value(Value),
    /// Named argument
    Named(NamedArgument),
    /// Nested invocation, e.g. `upstream(threshold: 'SUCCESS')`
    Call(MethodCall),
}

impl MethodArg {
    /// Creates a positional literal argument
    pub fn literal(value: impl Into<JsonValue>) -> Self {
        Self::Value(Value::literal(value))
    }

    /// Creates a named argument
    pub fn named(key: impl Into<String>, value: MethodArg) -> Self {
        Self::Named(NamedArgument {
            location: None,
            key: key.into(),
            value: Box::new(value),
        })
    }

    /// Creates a named literal argument
    pub fn named_literal(key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::named(key, Self::literal(value))
    }

    /// The argument name, for named arguments
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Named(n) => Some(&n.key),
            _ => None,
        }
    }

    /// Returns true when the payload is an unresolved expression
    #[must_use]
    pub fn is_expression(&self) -> bool {
        match self {
            Self::Value(v) => !v.is_literal(),
            Self::Named(n) => n.value.is_expression(),
            Self::Call(_) => false,
        }
    }

    /// Converts the argument payload for extension construction.
    ///
    /// Nested calls become an object carrying their symbol under `$symbol`
    /// alongside their named arguments.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Value(v) => v.to_json(),
            Self::Named(n) => n.value.to_json(),
            Self::Call(c) => {
                let mut object = serde_json::Map::new();
                object.insert("$symbol".to_string(), JsonValue::String(c.name.clone()));
                for arg in &c.args {
                    if let Some(key) = arg.key() {
                        object.insert(key.to_string(), arg.to_json());
                    }
                }
                JsonValue::Object(object)
            }
        }
    }
}

impl fmt::Display for MethodArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Named(n) => write!(f, "{}: {}", n.key, n.value),
            Self::Call(c) => write!(f, "{c}"),
        }
    }
}

impl Validate for MethodArg {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        match self {
            Self::Value(v) => v.validate(validator),
            Self::Named(n) => n.value.validate(validator),
            Self::Call(c) => c.validate(validator),
        }
    }
}
