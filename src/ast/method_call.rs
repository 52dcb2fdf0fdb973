//! Invocation-shaped nodes: method calls and triggers

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::{MethodArg, SourceLocation, Validate};
use crate::validator::ModelValidator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// A named invocation with ordered arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Invoked symbol
    pub name: String,

    /// Arguments in author order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<MethodArg>,
}

impl MethodCall {
    /// Creates a call without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            location: None,
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument
    pub fn with_arg(mut self, arg: MethodArg) -> Self {
        self.args.push(arg);
        self
    }

    /// Sets the source location
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Returns true if any argument is named
    pub fn has_named_args(&self) -> bool {
        self.args.iter().any(|a| a.key().is_some())
    }

    /// Returns true if any argument is positional
    pub fn has_positional_args(&self) -> bool {
        self.args.iter().any(|a| a.key().is_none())
    }
}

impl fmt::Display for MethodCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl Validate for MethodCall {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_method_call(self);
        valid &= self.args.validate(validator);
        valid
    }
}

/// A build trigger; structurally a [`MethodCall`] named after the trigger type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trigger(pub MethodCall);

impl Trigger {
    /// Creates a trigger of the given type
    pub fn new(name: impl Into<String>) -> Self {
        Self(MethodCall::new(name))
    }

    /// Appends an argument
    pub fn with_arg(self, arg: MethodArg) -> Self {
        Self(self.0.with_arg(arg))
    }

    /// Views the trigger as its underlying call
    pub fn as_method_call(&self) -> &MethodCall {
        &self.0
    }
}

impl Deref for Trigger {
    type Target = MethodCall;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<MethodCall> for Trigger {
    fn from(call: MethodCall) -> Self {
        Self(call)
    }
}

impl Validate for Trigger {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_trigger(self);
        valid &= validator.validate_method_call(self.as_method_call());
        valid &= self.args.validate(validator);
        valid
    }
}

/// The `triggers` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Triggers {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Declared triggers
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl Triggers {
    /// Creates a section from a list of triggers
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self {
            location: None,
            triggers,
        }
    }
}

impl Validate for Triggers {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_triggers(self);
        valid &= self.triggers.validate(validator);
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_call_display() {
        let call = MethodCall::new("timeout")
            .with_arg(MethodArg::named_literal("time", 5))
            .with_arg(MethodArg::named_literal("unit", "MINUTES"));
        assert_eq!(call.to_string(), "timeout(time: 5, unit: 'MINUTES')");
    }

    #[test]
    fn test_argument_shape_queries() {
        let call = MethodCall::new("cron").with_arg(MethodArg::literal("H * * * *"));
        assert!(call.has_positional_args());
        assert!(!call.has_named_args());
    }

    #[test]
    fn test_trigger_derefs_to_call() {
        let trigger = Trigger::new("pollSCM").with_arg(MethodArg::literal("H/5 * * * *"));
        assert_eq!(trigger.name, "pollSCM");
        assert_eq!(trigger.args.len(), 1);
    }

    #[test]
    fn test_trigger_serde_is_transparent() {
        let trigger: Trigger = serde_json::from_str(r#"{"name": "cron"}"#).unwrap();
        assert_eq!(trigger, Trigger::new("cron"));
    }
}
