//! Steps and the branches that hold them

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::{MethodArg, SourceLocation, Validate};
use crate::validator::ModelValidator;
use serde::{Deserialize, Serialize};

/// A single step invocation inside a branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Step name
    pub name: String,

    /// Step arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<MethodArg>,
}

impl Step {
    /// Creates a step without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            location: None,
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Creates an `echo` step
    pub fn echo(message: impl Into<String>) -> Self {
        Self::new("echo").with_arg(MethodArg::literal(message.into()))
    }

    /// Creates a `sh` step
    pub fn sh(script: impl Into<String>) -> Self {
        Self::new("sh").with_arg(MethodArg::literal(script.into()))
    }

    /// Appends an argument
    pub fn with_arg(mut self, arg: MethodArg) -> Self {
        self.args.push(arg);
        self
    }
}

impl Validate for Step {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_step(self);
        valid &= self.args.validate(validator);
        valid
    }
}

/// An ordered body of steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Branch name, for parallel branches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Branch {
    /// Creates an unnamed branch
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            location: None,
            name: None,
            steps,
        }
    }

    /// Creates a named branch
    pub fn named(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(steps)
        }
    }

    /// Returns true if the branch has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Validate for Branch {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_branch(self);
        valid &= self.steps.validate(validator);
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_helpers() {
        let step = Step::sh("make");
        assert_eq!(step.name, "sh");
        assert_eq!(step.args, vec![MethodArg::literal("make")]);
    }

    #[test]
    fn test_branch_from_yaml() {
        let yaml = "name: linux\nsteps:\n  - name: echo\n    args:\n      - value:\n          literal: hi\n";
        let branch: Branch = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(branch.name.as_deref(), Some("linux"));
        assert_eq!(branch.steps, vec![Step::echo("hi")]);
    }

    #[test]
    fn test_empty_branch() {
        assert!(Branch::default().is_empty());
        assert!(!Branch::new(vec![Step::echo("x")]).is_empty());
    }
}
