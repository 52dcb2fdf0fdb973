//! Built-in validation rules

use super::errors::{Diagnostic, ErrorCollector, SimpleErrorCollector};
use super::ModelValidator;
use crate::ast::{
    Agent, Branch, BuildCondition, BuildConditionsContainer, Located, MethodArg, MethodCall,
    Options, PipelineDef, PipelineOption, SourceLocation, Stage, Stages, Step, Trigger, Triggers,
    When, WhenCondition,
};
use crate::extensions::Registries;
use crate::infrastructure::Config;
use crate::registry::{Arguments, Descriptor, NestedConditions};
use ahash::AHashSet;

/// Validator carrying the standard rule set.
///
/// Diagnostics accumulate across calls until [`take_diagnostics`](Self::take_diagnostics)
/// drains them.
#[derive(Debug)]
pub struct ModelValidatorImpl<'r> {
    config: Config,
    registries: Registries<'r>,
    collector: SimpleErrorCollector,
}

impl ModelValidatorImpl<'static> {
    /// Creates a validator resolving extensions in the process-wide registries
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_registries(config, Registries::global())
    }
}

impl Default for ModelValidatorImpl<'static> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<'r> ModelValidatorImpl<'r> {
    /// Creates a validator resolving extensions in `registries`
    #[must_use]
    pub fn with_registries(config: Config, registries: Registries<'r>) -> Self {
        Self {
            config,
            registries,
            collector: SimpleErrorCollector::new(),
        }
    }

    /// Diagnostics recorded so far
    #[must_use]
    pub fn collector(&self) -> &SimpleErrorCollector {
        &self.collector
    }

    /// Drains recorded diagnostics, sorted by position if configured
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        let mut diagnostics = self.collector.take();
        if self.config.sort_diagnostics {
            diagnostics.sort_by_key(|d| {
                d.location
                    .map_or((u32::MAX, u32::MAX), |l| (l.line, l.column))
            });
        }
        diagnostics
    }

    fn error(&mut self, location: Option<SourceLocation>, message: impl Into<String>) -> bool {
        self.collector.error(location, message.into());
        false
    }

    fn error_at(&mut self, node: &dyn Located, message: impl Into<String>) -> bool {
        self.error(node.location(), message)
    }

    /// Reports mixed and repeated argument names
    fn check_call_shape(&mut self, location: Option<SourceLocation>, args: &[MethodArg]) -> bool {
        let mut valid = true;

        let named = args.iter().filter(|a| a.key().is_some()).count();
        if named > 0 && named < args.len() {
            valid &= self.error(
                location,
                "Can't mix named and unnamed parameter definition arguments",
            );
        }

        let mut seen = AHashSet::new();
        for arg in args {
            if let Some(key) = arg.key()
                && !seen.insert(key)
            {
                valid &= self.error(
                    arg.location().or(location),
                    format!("Duplicate named parameter '{key}' found"),
                );
            }
        }

        valid
    }

    /// Binds `args` against `descriptor`, reporting the first problem.
    ///
    /// Mixed named and unnamed arguments are not bound; the call shape rule
    /// reports them.
    fn check_arguments<T: ?Sized>(
        &mut self,
        name: &str,
        descriptor: &Descriptor<T>,
        location: Option<SourceLocation>,
        args: &[MethodArg],
    ) -> bool {
        let arguments = Arguments::from_method_args(args);
        if !arguments.named.is_empty() && !arguments.positional.is_empty() {
            return false;
        }

        let required = descriptor.model().required_count();
        if arguments.named.is_empty() && required > 0 && arguments.positional.len() != required {
            return self.error(
                location,
                format!(
                    "'{name}' should have {required} arguments but has {} arguments instead",
                    arguments.positional.len()
                ),
            );
        }

        let bound = match descriptor.model().bind(&arguments) {
            Ok(bound) => bound,
            Err(e) => return self.error(location, e.to_string()),
        };
        // Values are only checked once every argument is known
        if bound.has_expressions() {
            return true;
        }
        match descriptor.instantiate(&bound) {
            Ok(_) => true,
            Err(e) => self.error(location, e.to_string()),
        }
    }

    fn check_unique_names<'a>(
        &mut self,
        items: impl IntoIterator<Item = (&'a str, Option<SourceLocation>)>,
        message: impl Fn(&str) -> String,
    ) -> bool {
        let mut valid = true;
        let mut seen = AHashSet::new();
        for (name, location) in items {
            if !seen.insert(name) {
                valid &= self.error(location, message(name));
            }
        }
        valid
    }
}

fn bracketed(names: &[String]) -> String {
    format!("[{}]", names.join(", "))
}

impl ModelValidator for ModelValidatorImpl<'_> {
    fn validate_pipeline_def(&mut self, pipeline: &PipelineDef) -> bool {
        if pipeline.agent.is_none() {
            return self.error_at(pipeline, "Missing required section 'agent'");
        }
        true
    }

    fn validate_stages(&mut self, stages: &Stages) -> bool {
        if stages.stages.is_empty() {
            return self.error_at(stages, "No stages specified");
        }
        self.check_unique_names(
            stages.stages.iter().map(|s| (s.name.as_str(), s.location)),
            |name| format!("Duplicate stage name: '{name}'"),
        )
    }

    fn validate_stage(&mut self, stage: &Stage) -> bool {
        let mut valid = true;
        if stage.name.trim().is_empty() {
            valid &= self.error_at(stage, "Stage name can not be empty");
        }
        if stage.branches.is_empty() {
            valid &= self.error_at(
                stage,
                format!("Nothing to execute within stage '{}'", stage.name),
            );
        }
        valid
    }

    fn validate_agent(&mut self, agent: &Agent) -> bool {
        let Some(descriptor) = self.registries.agents.by_name(&agent.agent_type) else {
            let names = self.registries.agents.names();
            return self.error_at(
                agent,
                format!(
                    "Invalid agent type \"{}\" specified. Must be one of {}",
                    agent.agent_type,
                    bracketed(&names)
                ),
            );
        };
        let shape = self.check_call_shape(agent.location, &agent.args);
        shape & self.check_arguments(&agent.agent_type, &*descriptor, agent.location, &agent.args)
    }

    fn validate_when(&mut self, when: &When) -> bool {
        if when.conditions.is_empty() {
            return self.error_at(when, "Empty 'when' closure in stage");
        }
        true
    }

    fn validate_when_condition(&mut self, condition: &WhenCondition) -> bool {
        let Some(descriptor) = self.registries.conditionals.by_name(&condition.name) else {
            let names = self.registries.conditionals.names();
            return self.error_at(
                condition,
                format!(
                    "Unknown conditional {}. Valid conditionals are: {}",
                    condition.name,
                    bracketed(&names)
                ),
            );
        };

        let name = &condition.name;
        let children = condition.children.len();
        match descriptor.nested_conditions() {
            NestedConditions::None if children > 0 => {
                return self.error_at(
                    condition,
                    format!("Conditional \"{name}\" does not accept nested conditions"),
                );
            }
            NestedConditions::None => {}
            nested => {
                let mut valid = true;
                if !condition.args.is_empty() {
                    valid &= self.error_at(
                        condition,
                        format!("Nested when condition \"{name}\" does not take arguments"),
                    );
                }
                if nested == NestedConditions::AtLeastOne && children == 0 {
                    valid &= self.error_at(
                        condition,
                        format!("Nested when condition \"{name}\" requires at least one child condition"),
                    );
                }
                if let NestedConditions::Exactly(n) = nested
                    && children != n
                {
                    valid &= self.error_at(
                        condition,
                        format!(
                            "Nested when condition \"{name}\" requires exactly {n} child condition(s), but has {children}"
                        ),
                    );
                }
                return valid;
            }
        }

        let shape = self.check_call_shape(condition.location, &condition.args);
        shape & self.check_arguments(name, &*descriptor, condition.location, &condition.args)
    }

    fn validate_options(&mut self, options: &Options) -> bool {
        if options.options.is_empty() {
            return self.error_at(options, "Cannot have empty options section");
        }

        let mut valid = true;
        for option in &options.options {
            let Some(descriptor) = self.registries.options.by_name(&option.name) else {
                continue;
            };
            if options.in_stage && !descriptor.is_allowed_in_stage() {
                let allowed: Vec<String> = self
                    .registries
                    .options
                    .all()
                    .iter()
                    .filter(|d| d.is_allowed_in_stage())
                    .filter_map(|d| d.name().ok().map(str::to_string))
                    .collect();
                valid &= self.error_at(
                    option,
                    format!(
                        "Invalid option type \"{}\". Valid option types: {}",
                        option.name,
                        bracketed(&allowed)
                    ),
                );
            } else if !options.in_stage && descriptor.is_stage_only() {
                valid &= self.error_at(
                    option,
                    format!("Option type \"{}\" can only be used within a stage", option.name),
                );
            }
        }
        valid
    }

    fn validate_option(&mut self, option: &PipelineOption) -> bool {
        let Some(descriptor) = self.registries.options.by_name(&option.name) else {
            let names = self.registries.options.names();
            return self.error_at(
                option,
                format!(
                    "Invalid option type \"{}\". Valid option types: {}",
                    option.name,
                    bracketed(&names)
                ),
            );
        };
        self.check_arguments(&option.name, &*descriptor, option.location, &option.args)
    }

    fn validate_triggers(&mut self, triggers: &Triggers) -> bool {
        if triggers.triggers.is_empty() {
            return self.error_at(triggers, "Cannot have empty triggers section");
        }
        true
    }

    fn validate_trigger(&mut self, trigger: &Trigger) -> bool {
        let Some(descriptor) = self.registries.triggers.by_name(&trigger.name) else {
            let names = self.registries.triggers.names();
            return self.error_at(
                trigger,
                format!(
                    "Invalid trigger type \"{}\". Valid trigger types: {}",
                    trigger.name,
                    bracketed(&names)
                ),
            );
        };
        self.check_arguments(&trigger.name, &*descriptor, trigger.location, &trigger.args)
    }

    fn validate_method_call(&mut self, call: &MethodCall) -> bool {
        self.check_call_shape(call.location, &call.args)
    }

    fn validate_step(&mut self, step: &Step) -> bool {
        if let Some(reason) = self.config.blocked_steps.get(&step.name) {
            let message = format!(
                "Invalid step '{}' used - not allowed in this context - {reason}",
                step.name
            );
            return self.error_at(step, message);
        }
        true
    }

    fn validate_branch(&mut self, branch: &Branch) -> bool {
        if branch.steps.is_empty() {
            return self.error_at(branch, "No steps specified for branch");
        }
        true
    }

    fn validate_build_condition(&mut self, condition: &BuildCondition) -> bool {
        if self.config.is_build_condition(&condition.condition) {
            return true;
        }
        let message = format!(
            "Invalid condition \"{}\" - valid conditions are {}",
            condition.condition,
            bracketed(&self.config.build_conditions)
        );
        self.error_at(condition, message)
    }

    fn validate_build_conditions_container(
        &mut self,
        container: &dyn BuildConditionsContainer,
    ) -> bool {
        if container.conditions().is_empty() {
            return self.error(
                container.container_location(),
                format!("{} can not be empty", container.section_name()),
            );
        }
        self.check_unique_names(
            container
                .conditions()
                .iter()
                .map(|c| (c.condition.as_str(), c.location)),
            |name| format!("Duplicate build condition name: '{name}'"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{PostBuild, Validate};
    use pretty_assertions::assert_eq;

    fn messages<T: Validate>(node: &T) -> Vec<String> {
        let mut validator = ModelValidatorImpl::default();
        node.validate(&mut validator);
        validator
            .take_diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn test_unknown_build_condition() {
        let post = PostBuild::new(vec![BuildCondition::new("sometimes", vec![Step::echo("x")])]);
        assert_eq!(
            messages(&post),
            vec![
                "Invalid condition \"sometimes\" - valid conditions are [always, changed, fixed, regression, aborted, success, unsuccessful, unstable, failure, notBuilt, cleanup]"
            ]
        );
    }

    #[test]
    fn test_empty_post() {
        assert_eq!(messages(&PostBuild::default()), vec!["post can not be empty"]);
    }

    #[test]
    fn test_blocked_step() {
        let branch = Branch::new(vec![Step::new("stage")]);
        assert_eq!(
            messages(&branch),
            vec![
                "Invalid step 'stage' used - not allowed in this context - The stage step cannot be used in Declarative Pipelines"
            ]
        );
    }

    #[test]
    fn test_empty_branch() {
        assert_eq!(messages(&Branch::default()), vec!["No steps specified for branch"]);
    }

    #[test]
    fn test_custom_vocabulary_from_config() {
        let config = Config {
            build_conditions: vec!["always".to_string(), "sometimes".to_string()],
            ..Config::default()
        };
        let mut validator = ModelValidatorImpl::new(config);
        let post = PostBuild::new(vec![BuildCondition::new("sometimes", vec![Step::echo("x")])]);
        assert!(post.validate(&mut validator));
        assert_eq!(validator.collector().error_count(), 0);
    }

    #[test]
    fn test_sorted_diagnostics() {
        let config = Config {
            sort_diagnostics: true,
            ..Config::default()
        };
        let mut validator = ModelValidatorImpl::new(config);
        let post = PostBuild::new(vec![
            BuildCondition::new("nope", vec![Step::echo("x")]).at(SourceLocation::new(9, 1)),
            BuildCondition::new("never", vec![Step::echo("x")]).at(SourceLocation::new(3, 1)),
        ]);
        post.validate(&mut validator);
        let lines: Vec<_> = validator
            .take_diagnostics()
            .iter()
            .filter_map(|d| d.location.map(|l| l.line))
            .collect();
        assert_eq!(lines, vec![3, 9]);
    }

    #[test]
    fn test_call_shape() {
        let call = MethodCall::new("timeout")
            .with_arg(MethodArg::named_literal("time", 5))
            .with_arg(MethodArg::named_literal("time", 6))
            .with_arg(MethodArg::literal("MINUTES"));
        assert_eq!(
            messages(&call),
            vec![
                "Can't mix named and unnamed parameter definition arguments",
                "Duplicate named parameter 'time' found",
            ]
        );
    }
}
