//! Validation engine
//!
//! [`ModelValidator`] is the dispatch surface the configuration tree calls
//! into while it walks itself (see [`Validate`]). Every hook defaults to
//! `true`, so an implementation overrides only the node types it has rules
//! for. [`ModelValidatorImpl`] carries the built-in rule set and records
//! diagnostics into an [`ErrorCollector`].

pub mod errors;
pub mod model_validator;

pub use errors::{Diagnostic, ErrorCollector, SimpleErrorCollector};
pub use model_validator::ModelValidatorImpl;

use crate::ast::{
    Agent, Branch, BuildCondition, BuildConditionsContainer, MethodCall, Options, PipelineDef,
    PipelineOption, PostBuild, PostStage, Stage, Stages, Step, Trigger, Triggers, Validate, Value,
    When, WhenCondition,
};
use serde::Serialize;

/// Per-node validation hooks.
///
/// Each hook may record diagnostics as a side effect and returns whether the
/// node passed. Hooks never see children; the tree drives recursion.
#[allow(unused_variables)]
pub trait ModelValidator {
    /// Pipeline root
    fn validate_pipeline_def(&mut self, pipeline: &PipelineDef) -> bool {
        true
    }

    /// `stages` section
    fn validate_stages(&mut self, stages: &Stages) -> bool {
        true
    }

    /// A single stage
    fn validate_stage(&mut self, stage: &Stage) -> bool {
        true
    }

    /// `agent` section
    fn validate_agent(&mut self, agent: &Agent) -> bool {
        true
    }

    /// `when` block
    fn validate_when(&mut self, when: &When) -> bool {
        true
    }

    /// One conditional inside `when`
    fn validate_when_condition(&mut self, condition: &WhenCondition) -> bool {
        true
    }

    /// `options` section
    fn validate_options(&mut self, options: &Options) -> bool {
        true
    }

    /// One option, checked before its call shape
    fn validate_option(&mut self, option: &PipelineOption) -> bool {
        true
    }

    /// `triggers` section
    fn validate_triggers(&mut self, triggers: &Triggers) -> bool {
        true
    }

    /// One trigger, checked before its call shape
    fn validate_trigger(&mut self, trigger: &Trigger) -> bool {
        true
    }

    /// Generic call shape of any invocation-shaped node
    fn validate_method_call(&mut self, call: &MethodCall) -> bool {
        true
    }

    /// Argument value
    fn validate_value(&mut self, value: &Value) -> bool {
        true
    }

    /// A step
    fn validate_step(&mut self, step: &Step) -> bool {
        true
    }

    /// A branch of steps
    fn validate_branch(&mut self, branch: &Branch) -> bool {
        true
    }

    /// One build condition, without its siblings
    fn validate_build_condition(&mut self, condition: &BuildCondition) -> bool {
        true
    }

    /// Rules shared by every build-conditions container
    fn validate_build_conditions_container(
        &mut self,
        container: &dyn BuildConditionsContainer,
    ) -> bool {
        true
    }

    /// Pipeline-level `post`
    fn validate_post_build(&mut self, post: &PostBuild) -> bool {
        true
    }

    /// Stage-level `post`
    fn validate_post_stage(&mut self, post: &PostStage) -> bool {
        true
    }
}

/// Validator that accepts everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidator;

impl ModelValidator for NoopValidator {}

/// Outcome of validating a whole tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// True when every hook passed and nothing was recorded
    pub valid: bool,
    /// Recorded diagnostics in report order
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Process exit code for a linter front-end
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.valid)
    }
}

/// Walks `tree` with the built-in rule set and collects the result.
#[must_use]
pub fn validate_model<T: Validate + ?Sized>(
    tree: &T,
    validator: &mut ModelValidatorImpl<'_>,
) -> ValidationReport {
    let passed = tree.validate(validator);
    let diagnostics = validator.take_diagnostics();
    let valid = passed && diagnostics.is_empty();

    tracing::info!(valid, diagnostics = diagnostics.len(), "validation finished");

    ValidationReport { valid, diagnostics }
}
