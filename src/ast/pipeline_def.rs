//! Pipeline root node and builder

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::{Agent, Options, PostBuild, SourceLocation, Stage, Stages, Triggers, Validate};
use crate::errors::ModelError;
use crate::validator::ModelValidator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Root of a declarative pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDef {
    /// Source position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Top-level agent; required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,

    /// Pipeline options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,

    /// Build triggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Triggers>,

    /// Stages section
    #[serde(default)]
    pub stages: Stages,

    /// Pipeline-level post conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<PostBuild>,
}

impl PipelineDef {
    /// Creates a new pipeline builder
    pub fn builder() -> PipelineDefBuilder {
        PipelineDefBuilder::new()
    }

    /// Decodes a tree from JSON
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] if the document is not a valid tree.
    pub fn from_json(input: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Decodes a tree from YAML
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] if the document is not a valid tree.
    pub fn from_yaml(input: &str) -> Result<Self, ModelError> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Loads a tree from a file, picking the decoder from the extension.
    ///
    /// `.json` files are read as JSON, everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Io`] if the file cannot be read and
    /// [`ModelError::Parse`] if it cannot be decoded.
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Returns number of stages
    pub fn stage_count(&self) -> usize {
        self.stages.stages.len()
    }
}

impl Validate for PipelineDef {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = validator.validate_pipeline_def(self);
        valid &= self.stages.validate(validator);
        valid &= self.post.validate(validator);
        valid &= self.agent.validate(validator);
        valid &= self.options.validate(validator);
        valid &= self.triggers.validate(validator);
        valid
    }
}

impl fmt::Display for PipelineDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline: {} stages", self.stage_count())
    }
}

/// Builder for assembling pipeline trees in code
#[derive(Debug, Clone, Default)]
pub struct PipelineDefBuilder {
    pipeline: PipelineDef,
}

impl PipelineDefBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the top-level agent
    pub fn agent(mut self, agent: Agent) -> Self {
        self.pipeline.agent = Some(agent);
        self
    }

    /// Adds a stage
    pub fn stage(mut self, stage: Stage) -> Self {
        self.pipeline.stages.stages.push(stage);
        self
    }

    /// Sets pipeline options
    pub fn options(mut self, options: Options) -> Self {
        self.pipeline.options = Some(options);
        self
    }

    /// Sets build triggers
    pub fn triggers(mut self, triggers: Triggers) -> Self {
        self.pipeline.triggers = Some(triggers);
        self
    }

    /// Sets the `post` section
    pub fn post(mut self, post: PostBuild) -> Self {
        self.pipeline.post = Some(post);
        self
    }

    /// Returns the assembled tree without validating it
    #[must_use]
    pub fn build(self) -> PipelineDef {
        self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Branch, Step};
    use std::io::Write;

    const YAML: &str = r"
agent:
  type: any
stages:
  stages:
    - name: build
      branches:
        - steps:
            - name: sh
              args:
                - value:
                    literal: make
";

    #[test]
    fn test_builder() {
        let pipeline = PipelineDef::builder()
            .agent(Agent::any())
            .stage(Stage::new("build", Branch::new(vec![Step::sh("make")])))
            .build();
        assert_eq!(pipeline.stage_count(), 1);
        assert_eq!(pipeline.to_string(), "Pipeline: 1 stages");
    }

    #[test]
    fn test_from_yaml_matches_builder() {
        let parsed = PipelineDef::from_yaml(YAML).unwrap();
        let built = PipelineDef::builder()
            .agent(Agent::any())
            .stage(Stage::new("build", Branch::new(vec![Step::sh("make")])))
            .build();
        assert_eq!(parsed, built);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = PipelineDef::from_json("{not json").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn test_from_path_uses_extension() {
        let built = PipelineDef::from_yaml(YAML).unwrap();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(serde_json::to_string(&built).unwrap().as_bytes())
            .unwrap();
        let loaded = PipelineDef::from_path(file.path()).unwrap();
        assert_eq!(loaded, built);
    }
}
