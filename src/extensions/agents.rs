//! Built-in agent types

use crate::errors::InstantiationError;
use crate::registry::{BoundArguments, Descriptor, DescriptorRegistry, ParamType, ParameterSpec};
use once_cell::sync::Lazy;
use std::fmt;

/// An instantiated `agent` section
pub trait DeclarativeAgent: fmt::Debug + Send + Sync {
    /// Short description of where the work runs
    fn describe(&self) -> String;
}

/// `agent any`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyAgent;

/// `agent none`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoneAgent;

/// `agent { label '...' }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelAgent {
    /// Node label expression
    pub label: String,
}

/// `agent { docker '...' }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerAgent {
    /// Image to run in
    pub image: String,
    /// Extra `docker run` arguments
    pub args: Option<String>,
    /// Node label to run the container on
    pub label: Option<String>,
    /// Reuse the node of the enclosing pipeline
    pub reuse_node: bool,
}

/// `agent { dockerfile { ... } }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerfileAgent {
    /// Dockerfile name, `Dockerfile` when not given
    pub filename: Option<String>,
    /// Build context directory
    pub dir: Option<String>,
    /// Extra `docker build` arguments
    pub additional_build_args: Option<String>,
    /// Extra `docker run` arguments
    pub args: Option<String>,
    /// Node label to build and run on
    pub label: Option<String>,
    /// Reuse the node of the enclosing pipeline
    pub reuse_node: bool,
}

impl DockerfileAgent {
    /// Context directory, `.` when not given
    #[must_use]
    pub fn actual_dir(&self) -> &str {
        self.dir.as_deref().filter(|d| !d.is_empty()).unwrap_or(".")
    }

    /// Path of the Dockerfile relative to the workspace
    #[must_use]
    pub fn dockerfile_path(&self) -> String {
        let filename = self.filename.as_deref().unwrap_or("Dockerfile");
        match self.dir.as_deref().filter(|d| !d.is_empty()) {
            Some(dir) => format!("{dir}/{filename}"),
            None => filename.to_string(),
        }
    }
}

impl DeclarativeAgent for AnyAgent {
    fn describe(&self) -> String {
        "any available agent".to_string()
    }
}

impl DeclarativeAgent for NoneAgent {
    fn describe(&self) -> String {
        "no agent".to_string()
    }
}

impl DeclarativeAgent for LabelAgent {
    fn describe(&self) -> String {
        format!("agent labelled '{}'", self.label)
    }
}

impl DeclarativeAgent for DockerAgent {
    fn describe(&self) -> String {
        format!("docker image '{}'", self.image)
    }
}

impl DeclarativeAgent for DockerfileAgent {
    fn describe(&self) -> String {
        format!("image built from '{}'", self.dockerfile_path())
    }
}

fn any(_: &BoundArguments) -> Result<Box<dyn DeclarativeAgent>, InstantiationError> {
    Ok(Box::new(AnyAgent))
}

fn none(_: &BoundArguments) -> Result<Box<dyn DeclarativeAgent>, InstantiationError> {
    Ok(Box::new(NoneAgent))
}

fn label(args: &BoundArguments) -> Result<Box<dyn DeclarativeAgent>, InstantiationError> {
    let label = args.require_str("label")?;
    if label.trim().is_empty() {
        return Err(InstantiationError::InvalidValue {
            name: "label".to_string(),
            reason: "must not be blank".to_string(),
        });
    }
    Ok(Box::new(LabelAgent {
        label: label.to_string(),
    }))
}

fn docker(args: &BoundArguments) -> Result<Box<dyn DeclarativeAgent>, InstantiationError> {
    Ok(Box::new(DockerAgent {
        image: args.require_str("image")?.to_string(),
        args: args.get_str("args").map(str::to_string),
        label: args.get_str("label").map(str::to_string),
        reuse_node: args.get_bool("reuseNode").unwrap_or(false),
    }))
}

fn dockerfile(args: &BoundArguments) -> Result<Box<dyn DeclarativeAgent>, InstantiationError> {
    let text = |name: &str| args.get_str(name).map(str::to_string);
    Ok(Box::new(DockerfileAgent {
        filename: text("filename"),
        dir: text("dir"),
        additional_build_args: text("additionalBuildArgs"),
        args: text("args"),
        label: text("label"),
        reuse_node: args.get_bool("reuseNode").unwrap_or(false),
    }))
}

fn builtins() -> Vec<Descriptor<dyn DeclarativeAgent>> {
    vec![
        Descriptor::new("AnyAgent", any)
            .symbol("any")
            .display_name("Run on any available agent"),
        Descriptor::new("NoneAgent", none)
            .symbol("none")
            .display_name("Do not allocate an agent"),
        Descriptor::new("LabelAgent", label)
            .symbol("label")
            .display_name("Run on an agent matching a label")
            .params(vec![ParameterSpec::required("label", ParamType::String)]),
        Descriptor::new("DockerAgent", docker)
            .symbol("docker")
            .display_name("Run inside a Docker container")
            .params(vec![
                ParameterSpec::required("image", ParamType::String),
                ParameterSpec::optional("args", ParamType::String),
                ParameterSpec::optional("label", ParamType::String),
                ParameterSpec::optional("reuseNode", ParamType::Boolean),
            ]),
        Descriptor::new("DockerfileAgent", dockerfile)
            .symbol("dockerfile")
            .display_name("Build a Dockerfile and run in a container using that image")
            .params(vec![
                ParameterSpec::optional("filename", ParamType::String),
                ParameterSpec::optional("dir", ParamType::String),
                ParameterSpec::optional("additionalBuildArgs", ParamType::String),
                ParameterSpec::optional("args", ParamType::String),
                ParameterSpec::optional("label", ParamType::String),
                ParameterSpec::optional("reuseNode", ParamType::Boolean),
            ]),
    ]
}

/// Process-wide agent registry, seeded with the built-ins
pub static AGENTS: Lazy<DescriptorRegistry<dyn DeclarativeAgent>> = Lazy::new(|| {
    let registry = DescriptorRegistry::new("agent");
    for descriptor in builtins() {
        if let Err(e) = registry.register(descriptor) {
            tracing::error!(error = %e, "failed to register built-in agent");
        }
    }
    registry
});
