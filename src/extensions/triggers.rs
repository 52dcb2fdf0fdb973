//! Built-in build triggers

use crate::errors::InstantiationError;
use crate::registry::{BoundArguments, Descriptor, DescriptorRegistry, ParamType, ParameterSpec};
use once_cell::sync::Lazy;
use std::fmt;

/// An instantiated trigger
pub trait PipelineTrigger: fmt::Debug + Send + Sync {
    /// Symbol the trigger was declared with
    fn symbol(&self) -> &'static str;
}

/// Result thresholds accepted by `upstream`
pub const THRESHOLDS: [&str; 3] = ["SUCCESS", "UNSTABLE", "FAILURE"];

const CRON_ALIASES: [&str; 7] = [
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
];

/// `cron`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronTrigger {
    /// Schedule, one entry per line
    pub spec: String,
}

/// `pollSCM`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollScmTrigger {
    /// Polling schedule
    pub spec: String,
    /// Ignore changes notified by post-commit hooks
    pub ignore_post_commit_hooks: bool,
}

/// `upstream`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTrigger {
    /// Comma separated job names
    pub upstream_projects: Vec<String>,
    /// Minimum upstream result
    pub threshold: String,
}

impl PipelineTrigger for CronTrigger {
    fn symbol(&self) -> &'static str {
        "cron"
    }
}

impl PipelineTrigger for PollScmTrigger {
    fn symbol(&self) -> &'static str {
        "pollSCM"
    }
}

impl PipelineTrigger for UpstreamTrigger {
    fn symbol(&self) -> &'static str {
        "upstream"
    }
}

/// Checks every non-comment line of a schedule has five fields or is an alias
fn check_schedule(spec: &str) -> Result<(), InstantiationError> {
    for line in spec
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
    {
        let fields = line.split_whitespace().count();
        if fields != 5 && !CRON_ALIASES.contains(&line) {
            return Err(InstantiationError::InvalidValue {
                name: "spec".to_string(),
                reason: format!("'{line}' has {fields} fields, expected 5"),
            });
        }
    }
    Ok(())
}

fn cron(args: &BoundArguments) -> Result<Box<dyn PipelineTrigger>, InstantiationError> {
    let spec = args.require_str("spec")?;
    check_schedule(spec)?;
    Ok(Box::new(CronTrigger {
        spec: spec.to_string(),
    }))
}

fn poll_scm(args: &BoundArguments) -> Result<Box<dyn PipelineTrigger>, InstantiationError> {
    let spec = args.require_str("spec")?;
    check_schedule(spec)?;
    Ok(Box::new(PollScmTrigger {
        spec: spec.to_string(),
        ignore_post_commit_hooks: args.get_bool("ignorePostCommitHooks").unwrap_or(false),
    }))
}

fn upstream(args: &BoundArguments) -> Result<Box<dyn PipelineTrigger>, InstantiationError> {
    let upstream_projects: Vec<String> = args
        .require_str("upstreamProjects")?
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if upstream_projects.is_empty() {
        return Err(InstantiationError::InvalidValue {
            name: "upstreamProjects".to_string(),
            reason: "no project names given".to_string(),
        });
    }

    let threshold = args.get_str("threshold").unwrap_or("SUCCESS");
    if !THRESHOLDS.contains(&threshold) {
        return Err(InstantiationError::InvalidValue {
            name: "threshold".to_string(),
            reason: format!("'{threshold}' is not one of [{}]", THRESHOLDS.join(", ")),
        });
    }

    Ok(Box::new(UpstreamTrigger {
        upstream_projects,
        threshold: threshold.to_string(),
    }))
}

fn builtins() -> Vec<Descriptor<dyn PipelineTrigger>> {
    vec![
        Descriptor::new("CronTrigger", cron)
            .symbol("cron")
            .display_name("Build periodically")
            .params(vec![ParameterSpec::required("spec", ParamType::String)]),
        Descriptor::new("PollScmTrigger", poll_scm)
            .symbol("pollSCM")
            .display_name("Poll SCM")
            .params(vec![
                ParameterSpec::required("spec", ParamType::String),
                ParameterSpec::optional("ignorePostCommitHooks", ParamType::Boolean),
            ]),
        Descriptor::new("UpstreamTrigger", upstream)
            .symbol("upstream")
            .display_name("Build after other projects are built")
            .params(vec![
                ParameterSpec::required("upstreamProjects", ParamType::String),
                ParameterSpec::optional("threshold", ParamType::String),
            ]),
    ]
}

/// Process-wide trigger registry, seeded with the built-ins
pub static TRIGGERS: Lazy<DescriptorRegistry<dyn PipelineTrigger>> = Lazy::new(|| {
    let registry = DescriptorRegistry::new("trigger");
    for descriptor in builtins() {
        if let Err(e) = registry.register(descriptor) {
            tracing::error!(error = %e, "failed to register built-in trigger");
        }
    }
    registry
});
