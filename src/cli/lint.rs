//! `pipeline-model lint` - Validate a serialized pipeline tree

use super::OutputFormat;
use anyhow::{Context, Result};
use pipeline_model::ast::PipelineDef;
use pipeline_model::infrastructure::Config;
use pipeline_model::validator::{ModelValidatorImpl, ValidationReport, validate_model};
use std::fmt::Write as _;
use std::path::Path;

/// Loads `file` and validates it with the built-in rules
pub fn lint_file(file: &Path, config: &Config) -> Result<ValidationReport> {
    let pipeline = PipelineDef::from_path(file)
        .with_context(|| format!("Failed to load pipeline: {}", file.display()))?;

    tracing::debug!(file = %file.display(), stages = pipeline.stage_count(), "linting");

    let mut validator = ModelValidatorImpl::new(config.clone());
    Ok(validate_model(&pipeline, &mut validator))
}

/// Renders a report for the terminal or for tooling
pub fn format_report(report: &ValidationReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report")
        }
        OutputFormat::Text => {
            if report.valid {
                return Ok("Pipeline is valid.".to_string());
            }
            let mut output = String::new();
            for diagnostic in &report.diagnostics {
                let _ = writeln!(output, "{diagnostic}");
            }
            let _ = write!(output, "{} error(s) found.", report.diagnostics.len());
            Ok(output)
        }
    }
}
