//! Built-in `when` conditionals
//!
//! A conditional is evaluated against a [`ConditionContext`], a snapshot of
//! the values the build exposes (`BRANCH_NAME`, `TAG_NAME`, environment
//! variables). Pattern based conditionals delegate matching to a
//! [`Comparator`].

use crate::ast::WhenCondition;
use crate::comparator::{Comparator, check_pattern};
use crate::errors::{InstantiationError, PatternError};
use crate::registry::{
    Arguments, BoundArguments, Descriptor, DescriptorRegistry, NestedConditions, ParamType,
    ParameterSpec,
};
use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// Values a conditional may inspect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionContext {
    values: HashMap<String, String>,
}

impl ConditionContext {
    /// Creates an empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a value
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Looks up a value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// An instantiated `when` conditional
pub trait StageConditional: fmt::Debug + Send + Sync {
    /// Decides whether the stage runs.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if a regular expression cannot be compiled.
    fn evaluate(&self, context: &ConditionContext) -> Result<bool, PatternError>;

    /// Receives the nested conditions; leaf conditionals ignore them
    fn set_children(&mut self, _children: Vec<Box<dyn StageConditional>>) {}
}

/// Matches with `comparator`; an unknown strategy never matches
fn compare_or_miss(
    comparator: Option<Comparator>,
    pattern: &str,
    actual: Option<&str>,
) -> Result<bool, PatternError> {
    match comparator {
        Some(c) => c.compare(pattern, actual),
        None => Ok(false),
    }
}

/// `branch`: matches `BRANCH_NAME`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchConditional {
    /// Pattern to match; empty matches a build without a branch
    pub compare: String,
    /// Strategy; `None` when an unknown name was given
    pub comparator: Option<Comparator>,
}

impl StageConditional for BranchConditional {
    fn evaluate(&self, context: &ConditionContext) -> Result<bool, PatternError> {
        let branch = context.get("BRANCH_NAME").filter(|b| !b.is_empty());
        if self.compare.is_empty() {
            return Ok(branch.is_none());
        }
        compare_or_miss(self.comparator, &self.compare, branch)
    }
}

/// `tag`: matches `TAG_NAME`; without a pattern any tag matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagConditional {
    /// Pattern to match; empty means "built from any tag"
    pub pattern: String,
    /// Strategy; `None` when an unknown name was given
    pub comparator: Option<Comparator>,
}

impl StageConditional for TagConditional {
    fn evaluate(&self, context: &ConditionContext) -> Result<bool, PatternError> {
        let tag = context.get("TAG_NAME");
        if self.pattern.is_empty() {
            return Ok(tag.is_some_and(|t| !t.is_empty()));
        }
        compare_or_miss(self.comparator, &self.pattern, tag)
    }
}

/// `environment`: compares a named value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConditional {
    /// Variable name
    pub name: String,
    /// Expected value or pattern
    pub value: String,
    /// Compare ignoring case
    pub ignore_case: bool,
    /// Strategy; `None` when an unknown name was given
    pub comparator: Option<Comparator>,
}

impl StageConditional for EnvironmentConditional {
    fn evaluate(&self, context: &ConditionContext) -> Result<bool, PatternError> {
        match self.comparator {
            Some(c) => c.compare_with_case(&self.value, context.get(&self.name), !self.ignore_case),
            None => Ok(false),
        }
    }
}

/// `equals`: compares two already-resolved values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualsConditional {
    /// Expected value
    pub expected: JsonValue,
    /// Actual value
    pub actual: JsonValue,
}

impl StageConditional for EqualsConditional {
    fn evaluate(&self, _: &ConditionContext) -> Result<bool, PatternError> {
        Ok(self.expected == self.actual)
    }
}

/// `expression`: a script expression, kept as text.
///
/// Only `true` and `false`, or the name of a context value holding one of
/// them, can be decided here. Anything else does not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionConditional {
    /// Expression source
    pub block: String,
}

impl StageConditional for ExpressionConditional {
    fn evaluate(&self, context: &ConditionContext) -> Result<bool, PatternError> {
        let block = self.block.trim();
        let resolved = context.get(block).unwrap_or(block);
        Ok(resolved.trim().eq_ignore_ascii_case("true"))
    }
}

/// `allOf`: every nested condition holds
#[derive(Debug, Default)]
pub struct AllOfConditional {
    /// Nested conditions
    pub children: Vec<Box<dyn StageConditional>>,
}

impl StageConditional for AllOfConditional {
    fn evaluate(&self, context: &ConditionContext) -> Result<bool, PatternError> {
        for child in &self.children {
            if !child.evaluate(context)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn set_children(&mut self, children: Vec<Box<dyn StageConditional>>) {
        self.children = children;
    }
}

/// `anyOf`: at least one nested condition holds
#[derive(Debug, Default)]
pub struct AnyOfConditional {
    /// Nested conditions
    pub children: Vec<Box<dyn StageConditional>>,
}

impl StageConditional for AnyOfConditional {
    fn evaluate(&self, context: &ConditionContext) -> Result<bool, PatternError> {
        for child in &self.children {
            if child.evaluate(context)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn set_children(&mut self, children: Vec<Box<dyn StageConditional>>) {
        self.children = children;
    }
}

/// `not`: the nested condition does not hold
#[derive(Debug, Default)]
pub struct NotConditional {
    /// Nested condition
    pub child: Option<Box<dyn StageConditional>>,
}

impl StageConditional for NotConditional {
    fn evaluate(&self, context: &ConditionContext) -> Result<bool, PatternError> {
        match &self.child {
            Some(child) => Ok(!child.evaluate(context)?),
            None => Ok(false),
        }
    }

    fn set_children(&mut self, children: Vec<Box<dyn StageConditional>>) {
        self.child = children.into_iter().next();
    }
}

/// Resolves the optional `comparator` argument and checks `pattern` against it.
///
/// An unknown name resolves to `None`, which never matches.
fn comparator_arg(
    args: &BoundArguments,
    pattern: &str,
    fallback: Comparator,
) -> Result<Option<Comparator>, InstantiationError> {
    let name = args.get_str("comparator");
    let comparator = Comparator::get(name, Some(fallback));
    match comparator {
        Some(c) => check_pattern(c, pattern)?,
        None => tracing::debug!(comparator = name, "unknown comparator, condition never matches"),
    }
    Ok(comparator)
}

fn branch(args: &BoundArguments) -> Result<Box<dyn StageConditional>, InstantiationError> {
    let compare = args.require_str("compare")?.to_string();
    let comparator = comparator_arg(args, &compare, Comparator::Glob)?;
    Ok(Box::new(BranchConditional {
        compare,
        comparator,
    }))
}

fn tag(args: &BoundArguments) -> Result<Box<dyn StageConditional>, InstantiationError> {
    let pattern = args.get_str("pattern").unwrap_or_default().to_string();
    let comparator = comparator_arg(args, &pattern, Comparator::Glob)?;
    Ok(Box::new(TagConditional {
        pattern,
        comparator,
    }))
}

fn environment(args: &BoundArguments) -> Result<Box<dyn StageConditional>, InstantiationError> {
    let value = args.require_str("value")?.to_string();
    let comparator = comparator_arg(args, &value, Comparator::Equals)?;
    Ok(Box::new(EnvironmentConditional {
        name: args.require_str("name")?.to_string(),
        value,
        ignore_case: args.get_bool("ignoreCase").unwrap_or(false),
        comparator,
    }))
}

fn equals(args: &BoundArguments) -> Result<Box<dyn StageConditional>, InstantiationError> {
    Ok(Box::new(EqualsConditional {
        expected: args.get("expected").cloned().unwrap_or(JsonValue::Null),
        actual: args.get("actual").cloned().unwrap_or(JsonValue::Null),
    }))
}

fn expression(args: &BoundArguments) -> Result<Box<dyn StageConditional>, InstantiationError> {
    Ok(Box::new(ExpressionConditional {
        block: args.require_str("block")?.to_string(),
    }))
}

fn all_of(_: &BoundArguments) -> Result<Box<dyn StageConditional>, InstantiationError> {
    Ok(Box::new(AllOfConditional::default()))
}

fn any_of(_: &BoundArguments) -> Result<Box<dyn StageConditional>, InstantiationError> {
    Ok(Box::new(AnyOfConditional::default()))
}

fn not(_: &BoundArguments) -> Result<Box<dyn StageConditional>, InstantiationError> {
    Ok(Box::new(NotConditional::default()))
}

fn builtins() -> Vec<Descriptor<dyn StageConditional>> {
    vec![
        Descriptor::new("BranchConditional", branch)
            .symbol("branch")
            .display_name("Execute the stage if the branch being built matches the pattern")
            .params(vec![
                ParameterSpec::required("compare", ParamType::String),
                ParameterSpec::optional("comparator", ParamType::String),
            ]),
        Descriptor::new("TagConditional", tag)
            .symbol("tag")
            .display_name("Execute the stage if the build is for a tag matching the pattern")
            .params(vec![
                ParameterSpec::positional("pattern", ParamType::String),
                ParameterSpec::optional("comparator", ParamType::String),
            ]),
        Descriptor::new("EnvironmentConditional", environment)
            .symbol("environment")
            .display_name("Execute the stage if an environment variable has a given value")
            .params(vec![
                ParameterSpec::required("name", ParamType::String),
                ParameterSpec::required("value", ParamType::String),
                ParameterSpec::optional("ignoreCase", ParamType::Boolean),
                ParameterSpec::optional("comparator", ParamType::String),
            ]),
        Descriptor::new("EqualsConditional", equals)
            .symbol("equals")
            .display_name("Execute the stage if two values are equal")
            .params(vec![
                ParameterSpec::required("expected", ParamType::Any),
                ParameterSpec::required("actual", ParamType::Any),
            ]),
        Descriptor::new("ExpressionConditional", expression)
            .symbol("expression")
            .display_name("Execute the stage if a Scripted Pipeline expression evaluates as true")
            .params(vec![ParameterSpec::required("block", ParamType::String)]),
        Descriptor::new("AllOfConditional", all_of)
            .symbol("allOf")
            .display_name("Execute the stage if all nested conditions are true")
            .nested(NestedConditions::AtLeastOne),
        Descriptor::new("AnyOfConditional", any_of)
            .symbol("anyOf")
            .display_name("Execute the stage if any of the nested conditions are true")
            .nested(NestedConditions::AtLeastOne),
        Descriptor::new("NotConditional", not)
            .symbol("not")
            .display_name("Execute the stage if the nested condition is false")
            .nested(NestedConditions::Exactly(1)),
    ]
}

/// Process-wide conditional registry, seeded with the built-ins
pub static CONDITIONALS: Lazy<DescriptorRegistry<dyn StageConditional>> = Lazy::new(|| {
    let registry = DescriptorRegistry::new("conditional");
    for descriptor in builtins() {
        if let Err(e) = registry.register(descriptor) {
            tracing::error!(error = %e, "failed to register built-in conditional");
        }
    }
    registry
});

/// Builds a conditional and its nested conditions from the tree.
///
/// Returns `Ok(None)` when the condition or one of its children names an
/// unknown conditional.
///
/// # Errors
///
/// Returns an [`InstantiationError`] if any arguments do not fit.
pub fn instantiate(
    condition: &WhenCondition,
    registry: &DescriptorRegistry<dyn StageConditional>,
) -> Result<Option<Box<dyn StageConditional>>, InstantiationError> {
    let args = Arguments::from_method_args(&condition.args);
    let Some(mut conditional) = registry.instance_from_name(&condition.name, &args)? else {
        return Ok(None);
    };

    let mut children = Vec::with_capacity(condition.children.len());
    for child in &condition.children {
        match instantiate(child, registry)? {
            Some(c) => children.push(c),
            None => return Ok(None),
        }
    }
    conditional.set_children(children);
    Ok(Some(conditional))
}
