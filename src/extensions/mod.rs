//! Built-in extensions and their process-wide registries
//!
//! Each registry is created on first use and seeded with the built-in
//! descriptors before anything can read it. Additional extensions can be
//! registered at any time through the same statics.

pub mod agents;
pub mod conditionals;
pub mod options;
pub mod triggers;

pub use agents::{AGENTS, DeclarativeAgent};
pub use conditionals::{CONDITIONALS, ConditionContext, StageConditional, instantiate};
pub use options::{DeclarativeOption, OPTIONS};
pub use triggers::{PipelineTrigger, TRIGGERS};

use crate::comparator::Comparator;
use crate::registry::DescriptorRegistry;
use serde::Serialize;
use std::fmt;

/// The registries a validator resolves extension names against
#[derive(Debug, Clone, Copy)]
pub struct Registries<'r> {
    /// `options` entries
    pub options: &'r DescriptorRegistry<dyn DeclarativeOption>,
    /// `when` conditionals
    pub conditionals: &'r DescriptorRegistry<dyn StageConditional>,
    /// `agent` types
    pub agents: &'r DescriptorRegistry<dyn DeclarativeAgent>,
    /// `triggers` entries
    pub triggers: &'r DescriptorRegistry<dyn PipelineTrigger>,
}

impl Registries<'static> {
    /// The process-wide registries
    #[must_use]
    pub fn global() -> Self {
        Self {
            options: &OPTIONS,
            conditionals: &CONDITIONALS,
            agents: &AGENTS,
            triggers: &TRIGGERS,
        }
    }
}

impl Default for Registries<'static> {
    fn default() -> Self {
        Self::global()
    }
}

/// Kinds of named extension that can be listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExtensionKind {
    /// Pipeline and stage options
    Options,
    /// `when` conditionals
    Conditionals,
    /// Agent types
    Agents,
    /// Build triggers
    Triggers,
    /// String matching strategies
    Comparators,
}

/// One row of an extension listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionSummary {
    /// Symbol
    pub name: String,
    /// Human readable label
    pub label: String,
    /// Parameter names, required ones first marked with `*`
    pub params: Vec<String>,
}

impl fmt::Display for ExtensionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<26} {}", self.name, self.label)?;
        if !self.params.is_empty() {
            write!(f, " ({})", self.params.join(", "))?;
        }
        Ok(())
    }
}

fn summarize<T: ?Sized>(registry: &DescriptorRegistry<T>) -> Vec<ExtensionSummary> {
    registry
        .all()
        .iter()
        .filter_map(|d| {
            let name = d.name().ok()?.to_string();
            let params = d
                .model()
                .params()
                .iter()
                .map(|p| {
                    if p.required {
                        format!("{}*: {}", p.name, p.param_type)
                    } else {
                        format!("{}: {}", p.name, p.param_type)
                    }
                })
                .collect();
            Some(ExtensionSummary {
                name,
                label: d.label().to_string(),
                params,
            })
        })
        .collect()
}

/// Lists the registered extensions of `kind`, sorted by name
#[must_use]
pub fn list(kind: ExtensionKind, registries: Registries<'_>) -> Vec<ExtensionSummary> {
    match kind {
        ExtensionKind::Options => summarize(registries.options),
        ExtensionKind::Conditionals => summarize(registries.conditionals),
        ExtensionKind::Agents => summarize(registries.agents),
        ExtensionKind::Triggers => summarize(registries.triggers),
        ExtensionKind::Comparators => {
            let mut rows: Vec<_> = Comparator::ALL
                .into_iter()
                .map(|c| ExtensionSummary {
                    name: c.name().to_string(),
                    label: c.display_name().to_string(),
                    params: Vec::new(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        }
    }
}
