//! Stages and the sections that configure them

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::{Branch, MethodArg, MethodCall, PostStage, SourceLocation, Validate};
use crate::validator::ModelValidator;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// One entry of an `options` section; structurally a [`MethodCall`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineOption(pub MethodCall);

impl PipelineOption {
    /// Creates an option of the given type
    pub fn new(name: impl Into<String>) -> Self {
        Self(MethodCall::new(name))
    }

    /// Appends an argument
    pub fn with_arg(self, arg: MethodArg) -> Self {
        Self(self.0.with_arg(arg))
    }

    /// Views the option as its underlying call
    pub fn as_method_call(&self) -> &MethodCall {
        &self.0
    }
}

impl Deref for PipelineOption {
    type Target = MethodCall;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Validate for PipelineOption {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_option(self);
        valid &= validator.validate_method_call(self.as_method_call());
        valid &= self.args.validate(validator);
        valid
    }
}

/// An `options` section, at pipeline or stage level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Declared options
    #[serde(default)]
    pub options: Vec<PipelineOption>,

    /// True when the section belongs to a stage
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub in_stage: bool,
}

impl Options {
    /// Creates a pipeline-level section
    pub fn new(options: Vec<PipelineOption>) -> Self {
        Self {
            location: None,
            options,
            in_stage: false,
        }
    }

    /// Creates a stage-level section
    pub fn for_stage(options: Vec<PipelineOption>) -> Self {
        Self {
            in_stage: true,
            ..Self::new(options)
        }
    }
}

impl Validate for Options {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_options(self);
        valid &= self.options.validate(validator);
        valid
    }
}

/// Where a pipeline or stage runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Agent type symbol (`any`, `label`, `docker`, ...)
    #[serde(rename = "type")]
    pub agent_type: String,

    /// Agent arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<MethodArg>,
}

impl Agent {
    /// Creates an agent of the given type
    pub fn new(agent_type: impl Into<String>) -> Self {
        Self {
            location: None,
            agent_type: agent_type.into(),
            args: Vec::new(),
        }
    }

    /// Shorthand for `agent any`
    pub fn any() -> Self {
        Self::new("any")
    }

    /// Appends an argument
    pub fn with_arg(mut self, arg: MethodArg) -> Self {
        self.args.push(arg);
        self
    }
}

impl Validate for Agent {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_agent(self);
        valid &= self.args.validate(validator);
        valid
    }
}

/// One conditional inside a `when` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenCondition {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Conditional symbol (`branch`, `tag`, ...)
    pub name: String,

    /// Conditional arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<MethodArg>,

    /// Nested conditions of `allOf`, `anyOf` and `not`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<WhenCondition>,
}

impl WhenCondition {
    /// Creates a conditional without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            location: None,
            name: name.into(),
            args: Vec::new(),
            children: Vec::new(),
        }
    }

    /// `allOf { ... }`
    pub fn all_of(children: Vec<WhenCondition>) -> Self {
        Self {
            children,
            ..Self::new("allOf")
        }
    }

    /// `anyOf { ... }`
    pub fn any_of(children: Vec<WhenCondition>) -> Self {
        Self {
            children,
            ..Self::new("anyOf")
        }
    }

    /// `not { ... }`
    pub fn not(child: WhenCondition) -> Self {
        Self::new("not").with_child(child)
    }

    /// Shorthand for `branch '<pattern>'`
    pub fn branch(pattern: impl Into<String>) -> Self {
        Self::new("branch").with_arg(MethodArg::literal(pattern.into()))
    }

    /// Appends an argument
    pub fn with_arg(mut self, arg: MethodArg) -> Self {
        self.args.push(arg);
        self
    }

    /// Appends a nested condition
    pub fn with_child(mut self, child: WhenCondition) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the source location
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl Validate for WhenCondition {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_when_condition(self);
        valid &= self.args.validate(validator);
        valid &= self.children.validate(validator);
        valid
    }
}

/// A stage's `when` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct When {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Conditions, all of which must hold
    #[serde(default)]
    pub conditions: Vec<WhenCondition>,
}

impl When {
    /// Creates a block from its conditions
    pub fn new(conditions: Vec<WhenCondition>) -> Self {
        Self {
            location: None,
            conditions,
        }
    }
}

impl Validate for When {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_when(self);
        valid &= self.conditions.validate(validator);
        valid
    }
}

/// A named stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Stage name
    pub name: String,

    /// Stage-level agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,

    /// Execution guard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<When>,

    /// Stage-level options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,

    /// Step bodies; more than one means parallel branches
    #[serde(default)]
    pub branches: Vec<Branch>,

    /// Stage-level post conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<PostStage>,
}

impl Stage {
    /// Creates a stage with a single unnamed branch
    pub fn new(name: impl Into<String>, branch: Branch) -> Self {
        Self {
            location: None,
            name: name.into(),
            agent: None,
            when: None,
            options: None,
            branches: vec![branch],
            post: None,
        }
    }

    /// Sets the stage agent
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Sets the `when` block
    pub fn when(mut self, when: When) -> Self {
        self.when = Some(when);
        self
    }

    /// Sets stage options, marking the section as stage-level
    pub fn options(mut self, mut options: Options) -> Self {
        options.in_stage = true;
        self.options = Some(options);
        self
    }

    /// Sets the stage `post` section
    pub fn post(mut self, post: PostStage) -> Self {
        self.post = Some(post);
        self
    }

    /// Sets the source location
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl Validate for Stage {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_stage(self);
        valid &= self.agent.validate(validator);
        valid &= self.when.validate(validator);
        valid &= self.options.validate(validator);
        valid &= self.branches.validate(validator);
        valid &= self.post.validate(validator);
        valid
    }
}

/// The `stages` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stages {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Stages in execution order
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Stages {
    /// Creates a section from its stages
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            location: None,
            stages,
        }
    }

    /// Stage names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }
}

impl Validate for Stages {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_stages(self);
        valid &= self.stages.validate(validator);
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Step;

    #[test]
    fn test_stage_options_are_marked_in_stage() {
        let stage = Stage::new("build", Branch::new(vec![Step::sh("make")]))
            .options(Options::new(vec![PipelineOption::new("timeout")]));
        assert!(stage.options.as_ref().is_some_and(|o| o.in_stage));
    }

    #[test]
    fn test_agent_type_field_is_renamed() {
        let agent: Agent = serde_json::from_str(r#"{"type": "label", "args": [{"value": {"literal": "linux"}}]}"#).unwrap();
        assert_eq!(agent.agent_type, "label");
        assert_eq!(agent.args.len(), 1);
    }

    #[test]
    fn test_stage_names() {
        let stages = Stages::new(vec![
            Stage::new("build", Branch::default()),
            Stage::new("test", Branch::default()),
        ]);
        assert_eq!(stages.names(), vec!["build", "test"]);
    }

    #[test]
    fn test_when_branch_shorthand() {
        let cond = WhenCondition::branch("main");
        assert_eq!(cond.name, "branch");
        assert_eq!(cond.args, vec![MethodArg::literal("main")]);
    }

    #[test]
    fn test_nested_when_from_yaml() {
        let yaml = "name: not\nchildren:\n  - name: branch\n    args:\n      - value:\n          literal: main\n";
        let cond: WhenCondition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cond, WhenCondition::not(WhenCondition::branch("main")));
        assert!(cond.args.is_empty());
    }
}
