//! Configuration management

use crate::errors::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Build statuses a `post` condition may name, in evaluation order
pub const DEFAULT_BUILD_CONDITIONS: [&str; 11] = [
    "always",
    "changed",
    "fixed",
    "regression",
    "aborted",
    "success",
    "unsuccessful",
    "unstable",
    "failure",
    "notBuilt",
    "cleanup",
];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,
    /// Known build-condition names
    pub build_conditions: Vec<String>,
    /// Steps rejected inside a pipeline, with the reason shown to the author
    pub blocked_steps: BTreeMap<String, String>,
    /// Order diagnostics by source position instead of traversal order
    pub sort_diagnostics: bool,
}

impl Default for Config {
    fn default() -> Self {
        let blocked_steps = [
            (
                "stage",
                "The stage step cannot be used in Declarative Pipelines",
            ),
            (
                "properties",
                "The properties step cannot be used in Declarative Pipelines",
            ),
            (
                "parallel",
                "The parallel step can only be used as the only top-level step in a stage's step block",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            log_level: "warn".to_string(),
            build_conditions: DEFAULT_BUILD_CONDITIONS.map(String::from).to_vec(),
            blocked_steps,
            sort_diagnostics: false,
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Io`] if the file cannot be read and
    /// [`ModelError::Parse`] if it is not valid YAML.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parses configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] if the text is not valid YAML.
    pub fn from_yaml(content: &str) -> Result<Self, ModelError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Returns true if `name` is a known build condition
    #[must_use]
    pub fn is_build_condition(&self, name: &str) -> bool {
        self.build_conditions.iter().any(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.build_conditions.len(), 11);
        assert!(config.is_build_condition("notBuilt"));
        assert!(!config.is_build_condition("sometimes"));
        assert!(config.blocked_steps.contains_key("stage"));
        assert!(!config.sort_diagnostics);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("sort_diagnostics: true\n").unwrap();
        assert!(config.sort_diagnostics);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.build_conditions, Config::default().build_conditions);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "build_conditions: [always, failure]").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.build_conditions, vec!["always", "failure"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/pipeline-model.yaml")).unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
