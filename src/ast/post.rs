//! Post-build condition containers
//!
//! [`PostBuild`] (pipeline level) and [`PostStage`] (stage level) share the
//! [`BuildConditionsContainer`] capability. Both validate in the same order:
//! their own hook, then the shared container hook, then each condition.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::{Branch, SourceLocation, Step, Validate};
use crate::validator::ModelValidator;
use serde::{Deserialize, Serialize};

/// A named build condition paired with the branch it runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildCondition {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Condition name, e.g. `always` or `failure`
    pub condition: String,

    /// Steps run when the condition holds
    #[serde(default)]
    pub branch: Branch,
}

impl BuildCondition {
    /// Creates a condition running `steps`
    pub fn new(condition: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            location: None,
            condition: condition.into(),
            branch: Branch::new(steps),
        }
    }

    /// Sets the source location
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl Validate for BuildCondition {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_build_condition(self);
        valid &= self.branch.validate(validator);
        valid
    }
}

/// Nodes holding an ordered list of [`BuildCondition`]s
pub trait BuildConditionsContainer {
    /// Section name used in diagnostics (`post`)
    fn section_name(&self) -> &'static str;

    /// Owned conditions in declaration order
    fn conditions(&self) -> &[BuildCondition];

    /// Where the section starts
    fn container_location(&self) -> Option<SourceLocation>;

    /// Condition names in declaration order
    fn condition_names(&self) -> Vec<&str> {
        self.conditions().iter().map(|c| c.condition.as_str()).collect()
    }
}

fn validate_conditions(
    container: &dyn BuildConditionsContainer,
    validator: &mut dyn ModelValidator,
) -> bool {
    let mut valid = validator.validate_build_conditions_container(container);
    for condition in container.conditions() {
        valid &= condition.validate(validator);
    }
    valid
}

/// Pipeline-level `post` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostBuild {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Conditions in declaration order
    #[serde(default)]
    pub conditions: Vec<BuildCondition>,
}

impl PostBuild {
    /// Creates a section from its conditions
    pub fn new(conditions: Vec<BuildCondition>) -> Self {
        Self {
            location: None,
            conditions,
        }
    }
}

impl BuildConditionsContainer for PostBuild {
    fn section_name(&self) -> &'static str {
        "post"
    }

    fn conditions(&self) -> &[BuildCondition] {
        &self.conditions
    }

    fn container_location(&self) -> Option<SourceLocation> {
        self.location
    }
}

impl Validate for PostBuild {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let own = validator.validate_post_build(self);
        own & validate_conditions(self, validator)
    }
}

/// Stage-level `post` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostStage {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Conditions in declaration order
    #[serde(default)]
    pub conditions: Vec<BuildCondition>,
}

impl PostStage {
    /// Creates a section from its conditions
    pub fn new(conditions: Vec<BuildCondition>) -> Self {
        Self {
            location: None,
            conditions,
        }
    }
}

impl BuildConditionsContainer for PostStage {
    fn section_name(&self) -> &'static str {
        "post"
    }

    fn conditions(&self) -> &[BuildCondition] {
        &self.conditions
    }

    fn container_location(&self) -> Option<SourceLocation> {
        self.location
    }
}

impl Validate for PostStage {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let own = validator.validate_post_stage(self);
        own & validate_conditions(self, validator)
    }
}
