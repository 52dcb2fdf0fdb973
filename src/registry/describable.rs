//! Binding generic arguments onto extension parameters
//!
//! A [`DescribableModel`] lists the parameters an extension type accepts.
//! [`DescribableModel::bind`] checks an [`Arguments`] map against that list
//! and produces [`BoundArguments`] the extension's factory reads from.

use crate::ast::MethodArg;
use crate::errors::InstantiationError;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamType {
    /// Text; scalars are converted
    String,
    /// `true`/`false`, also accepted as text
    Boolean,
    /// Whole number, also accepted as text
    Integer,
    /// Anything, passed through unchanged
    Any,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "String",
            Self::Boolean => "boolean",
            Self::Integer => "int",
            Self::Any => "Object",
        })
    }
}

/// One parameter of a [`DescribableModel`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    /// Parameter name
    pub name: &'static str,
    /// Accepted shape
    pub param_type: ParamType,
    /// Whether the parameter must be supplied
    pub required: bool,
    /// Whether an unnamed argument may bind to it
    pub positional: bool,
}

impl ParameterSpec {
    /// A required parameter
    #[must_use]
    pub const fn required(name: &'static str, param_type: ParamType) -> Self {
        Self {
            name,
            param_type,
            required: true,
            positional: true,
        }
    }

    /// An optional parameter
    #[must_use]
    pub const fn optional(name: &'static str, param_type: ParamType) -> Self {
        Self {
            name,
            param_type,
            required: false,
            positional: false,
        }
    }

    /// An optional parameter that also accepts an unnamed argument
    #[must_use]
    pub const fn positional(name: &'static str, param_type: ParamType) -> Self {
        Self {
            name,
            param_type,
            required: false,
            positional: true,
        }
    }

    fn coerce(&self, value: &JsonValue) -> Result<JsonValue, InstantiationError> {
        let mismatch = || InstantiationError::TypeMismatch {
            name: self.name.to_string(),
            expected: self.param_type.to_string(),
            found: render(value),
        };

        match (self.param_type, value) {
            (ParamType::Any, v) => Ok(v.clone()),
            (ParamType::String, JsonValue::String(_)) => Ok(value.clone()),
            (ParamType::String, JsonValue::Number(n)) => Ok(JsonValue::String(n.to_string())),
            (ParamType::String, JsonValue::Bool(b)) => Ok(JsonValue::String(b.to_string())),
            (ParamType::Boolean, JsonValue::Bool(_)) => Ok(value.clone()),
            (ParamType::Boolean, JsonValue::String(s)) => match s.as_str() {
                "true" => Ok(JsonValue::Bool(true)),
                "false" => Ok(JsonValue::Bool(false)),
                _ => Err(mismatch()),
            },
            (ParamType::Integer, JsonValue::Number(n)) if n.is_i64() => Ok(value.clone()),
            (ParamType::Integer, JsonValue::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(JsonValue::from)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        }
    }
}

fn render(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Raw arguments of an invocation, split by shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    /// `key: value` arguments; a repeated key keeps its last value
    pub named: BTreeMap<String, JsonValue>,
    /// Unnamed arguments in order
    pub positional: Vec<JsonValue>,
    /// Named keys holding an unresolved expression
    pub named_expressions: BTreeSet<String>,
    /// Indices of unnamed arguments holding an unresolved expression
    pub positional_expressions: BTreeSet<usize>,
}

impl Arguments {
    /// Creates an empty argument set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named argument
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    /// Adds a positional argument
    #[must_use]
    pub fn with_positional(mut self, value: impl Into<JsonValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a named expression, kept as text
    #[must_use]
    pub fn with_expression(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        let key = key.into();
        self.named.insert(key.clone(), JsonValue::String(text.into()));
        self.named_expressions.insert(key);
        self
    }

    /// Adds a positional expression, kept as text
    #[must_use]
    pub fn with_positional_expression(mut self, text: impl Into<String>) -> Self {
        self.positional_expressions.insert(self.positional.len());
        self.positional.push(JsonValue::String(text.into()));
        self
    }

    /// Splits tree arguments into named and positional values
    #[must_use]
    pub fn from_method_args(args: &[MethodArg]) -> Self {
        let mut out = Self::new();
        for arg in args {
            match arg.key() {
                Some(key) => {
                    out.named.insert(key.to_string(), arg.to_json());
                    if arg.is_expression() {
                        out.named_expressions.insert(key.to_string());
                    } else {
                        out.named_expressions.remove(key);
                    }
                }
                None => {
                    if arg.is_expression() {
                        out.positional_expressions.insert(out.positional.len());
                    }
                    out.positional.push(arg.to_json());
                }
            }
        }
        out
    }

    /// Total number of arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.named.len() + self.positional.len()
    }

    /// Returns true when no argument was supplied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Arguments after binding, keyed by parameter name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    values: BTreeMap<String, JsonValue>,
    expressions: BTreeSet<String>,
}

impl BoundArguments {
    /// Whether `name` was bound to an expression that is only known at run time
    #[must_use]
    pub fn is_expression(&self, name: &str) -> bool {
        self.expressions.contains(name)
    }

    /// Whether any parameter is bound to an expression
    #[must_use]
    pub fn has_expressions(&self) -> bool {
        !self.expressions.is_empty()
    }

    /// Raw bound value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    /// Bound text value
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(JsonValue::as_str)
    }

    /// Bound boolean value
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(JsonValue::as_bool)
    }

    /// Bound integer value
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(JsonValue::as_i64)
    }

    /// Bound text value that the model declares as required.
    ///
    /// # Errors
    ///
    /// Returns [`InstantiationError::MissingArgument`] if the value is absent,
    /// which only happens when a factory is called with unbound arguments.
    pub fn require_str(&self, name: &str) -> Result<&str, InstantiationError> {
        self.get_str(name)
            .ok_or_else(|| InstantiationError::MissingArgument {
                name: name.to_string(),
            })
    }
}

/// The parameter list of an extension type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescribableModel {
    params: Vec<ParameterSpec>,
}

impl DescribableModel {
    /// Creates a model from its parameters in declaration order
    #[must_use]
    pub fn new(params: Vec<ParameterSpec>) -> Self {
        Self { params }
    }

    /// Declared parameters
    #[must_use]
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Number of required parameters
    #[must_use]
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }

    /// Parameters that unnamed arguments bind to, in order.
    ///
    /// These are the required and positional parameters; a model with
    /// neither but exactly one optional parameter accepts that one anonymously.
    fn positional_targets(&self) -> Vec<&ParameterSpec> {
        let targets: Vec<_> = self.params.iter().filter(|p| p.positional).collect();
        if targets.is_empty() && self.params.len() == 1 {
            self.params.iter().collect()
        } else {
            targets
        }
    }

    /// Checks `args` against the model and converts values to their declared types.
    ///
    /// # Errors
    ///
    /// Returns an [`InstantiationError`] for unknown names (with the closest
    /// known name as a suggestion), surplus unnamed arguments, values of the
    /// wrong type and missing required parameters. Expressions are bound as
    /// text without a type check.
    pub fn bind(&self, args: &Arguments) -> Result<BoundArguments, InstantiationError> {
        let mut values = BTreeMap::new();
        let mut expressions = BTreeSet::new();

        let targets = self.positional_targets();
        if args.positional.len() > targets.len() {
            return Err(InstantiationError::TooManyPositional {
                expected: targets.len(),
                found: args.positional.len(),
            });
        }
        for (index, (spec, value)) in targets.iter().zip(&args.positional).enumerate() {
            if args.positional_expressions.contains(&index) {
                expressions.insert(spec.name.to_string());
                values.insert(spec.name.to_string(), value.clone());
            } else {
                values.insert(spec.name.to_string(), spec.coerce(value)?);
            }
        }

        for (key, value) in &args.named {
            let Some(spec) = self.params.iter().find(|p| p.name == key) else {
                let names = self.params.iter().map(|p| p.name);
                return Err(InstantiationError::UnknownArgument {
                    name: key.clone(),
                    suggestion: closest_match(key, names).map(str::to_string),
                });
            };
            if args.named_expressions.contains(key) {
                expressions.insert(key.clone());
                values.insert(key.clone(), value.clone());
            } else {
                values.insert(key.clone(), spec.coerce(value)?);
            }
        }

        if let Some(missing) = self
            .params
            .iter()
            .find(|p| p.required && !values.contains_key(p.name))
        {
            return Err(InstantiationError::MissingArgument {
                name: missing.name.to_string(),
            });
        }

        Ok(BoundArguments {
            values,
            expressions,
        })
    }
}

/// Returns the candidate with the smallest edit distance to `input`.
///
/// Ties go to the earliest candidate.
pub fn closest_match<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|c| (levenshtein(input, c), c))
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, c)| c)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;
    use serde_json::json;

    fn timeout_model() -> DescribableModel {
        DescribableModel::new(vec![
            ParameterSpec::required("time", ParamType::Integer),
            ParameterSpec::optional("activity", ParamType::Boolean),
            ParameterSpec::optional("unit", ParamType::String),
        ])
    }

    #[test]
    fn test_bind_named() {
        let args = Arguments::new().with("time", 5).with("unit", "MINUTES");
        let bound = timeout_model().bind(&args).unwrap();
        assert_eq!(bound.get_i64("time"), Some(5));
        assert_eq!(bound.get_str("unit"), Some("MINUTES"));
        assert_eq!(bound.get_bool("activity"), None);
    }

    #[test]
    fn test_bind_anonymous_positional() {
        let args = Arguments::new().with_positional(10);
        let bound = timeout_model().bind(&args).unwrap();
        assert_eq!(bound.get_i64("time"), Some(10));
    }

    #[test]
    fn test_bind_single_optional_parameter_positionally() {
        let model = DescribableModel::new(vec![ParameterSpec::optional("value", ParamType::Boolean)]);
        let bound = model.bind(&Arguments::new().with_positional("false")).unwrap();
        assert_eq!(bound.get_bool("value"), Some(false));
    }

    #[test]
    fn test_bind_positional_optional_parameter() {
        let model = DescribableModel::new(vec![
            ParameterSpec::positional("pattern", ParamType::String),
            ParameterSpec::optional("comparator", ParamType::String),
        ]);
        let bound = model.bind(&Arguments::new().with_positional("v*")).unwrap();
        assert_eq!(bound.get_str("pattern"), Some("v*"));
        assert!(model.bind(&Arguments::new()).is_ok());
        assert_eq!(model.required_count(), 0);
    }

    #[test]
    fn test_bind_expression_skips_type_check() {
        let args = Arguments::new()
            .with_expression("time", "${env.T}")
            .with("unit", "HOURS");
        let bound = timeout_model().bind(&args).unwrap();
        assert!(bound.is_expression("time"));
        assert!(!bound.is_expression("unit"));
        assert_eq!(bound.get_str("time"), Some("${env.T}"));

        let bound = timeout_model()
            .bind(&Arguments::new().with_positional_expression("${env.T}"))
            .unwrap();
        assert!(bound.has_expressions());
    }

    #[test]
    fn test_bind_missing_required() {
        let err = timeout_model().bind(&Arguments::new().with("unit", "HOURS")).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: 'time'");
    }

    #[test]
    fn test_bind_unknown_suggests_closest() {
        let args = Arguments::new().with("time", 5).with("banana", "x");
        let err = timeout_model().bind(&args).unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter 'banana', did you mean 'unit'?");
    }

    #[test]
    fn test_bind_type_mismatch() {
        let err = timeout_model()
            .bind(&Arguments::new().with("time", "someTime"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expecting int for parameter 'time' but got 'someTime' instead"
        );
    }

    #[test]
    fn test_bind_numeric_text_is_coerced() {
        let bound = timeout_model().bind(&Arguments::new().with("time", "15")).unwrap();
        assert_eq!(bound.get_i64("time"), Some(15));
    }

    #[test]
    fn test_bind_too_many_positional() {
        let args = Arguments::new().with_positional(1).with_positional(2);
        let err = timeout_model().bind(&args).unwrap_err();
        assert_eq!(
            err,
            InstantiationError::TooManyPositional {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_arguments_from_method_args() {
        let args = Arguments::from_method_args(&[
            MethodArg::literal("H * * * *"),
            MethodArg::named_literal("unit", "HOURS"),
        ]);
        assert_eq!(args.positional, vec![json!("H * * * *")]);
        assert_eq!(args.named.get("unit"), Some(&json!("HOURS")));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_arguments_from_method_args_marks_expressions() {
        let args = Arguments::from_method_args(&[
            MethodArg::named("time", MethodArg::Value(Value::expression("${env.T}"))),
            MethodArg::named_literal("unit", "HOURS"),
        ]);
        assert!(args.named_expressions.contains("time"));
        assert!(!args.named_expressions.contains("unit"));
        assert!(args.positional_expressions.is_empty());
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(closest_match("tme", ["unit", "time"]), Some("time"));
        assert_eq!(closest_match("x", std::iter::empty()), None);
    }
}
