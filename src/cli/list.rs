//! `pipeline-model list` - Show registered extensions

use super::OutputFormat;
use anyhow::{Context, Result};
use pipeline_model::extensions::{ExtensionKind, Registries, list};

/// Renders the extensions of `kind`, sorted by name
pub fn format_listing(kind: ExtensionKind, format: OutputFormat) -> Result<String> {
    let rows = list(kind, Registries::global());
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&rows).context("Failed to serialize listing")
        }
        OutputFormat::Text => Ok(rows
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}
