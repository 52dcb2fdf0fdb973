//! Configuration tree for declarative pipelines
//!
//! The tree is produced by an external parser (or decoded from JSON/YAML) and
//! is never mutated by validation. Every node implements [`Validate`], which
//! walks the node and its children in a fixed order, calling the matching
//! [`ModelValidator`] hooks and AND-ing their results without stopping at the
//! first failure.
//!
//! Order per node: the node's own hook first, then any shared capability
//! hook (e.g. [`BuildConditionsContainer`]), then children in declaration
//! order.

pub mod branch;
pub mod method_call;
pub mod pipeline_def;
pub mod post;
pub mod stage;
pub mod values;

#[cfg(test)]
mod validation_tests;

use crate::validator::ModelValidator;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use branch::{Branch, Step};
pub use method_call::{MethodCall, Trigger, Triggers};
pub use pipeline_def::{PipelineDef, PipelineDefBuilder};
pub use post::{BuildCondition, BuildConditionsContainer, PostBuild, PostStage};
pub use stage::{Agent, Options, PipelineOption, Stage, Stages, When, WhenCondition};
pub use values::{MethodArg, NamedArgument, Value, ValueKind};

/// Position of a node in the source it was parsed from.
///
/// Opaque to validation; it only travels into diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl SourceLocation {
    /// Creates a location
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Nodes that can be walked by a [`ModelValidator`]
pub trait Validate {
    /// Validates this node and everything beneath it.
    ///
    /// Returns `true` only if every hook invoked for this subtree returned
    /// `true`. All descendants are visited even after a failure.
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool;
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        match self {
            Some(value) => value.validate(validator),
            None => true,
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        let mut valid = true;
        for item in self {
            valid &= item.validate(validator);
        }
        valid
    }
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    fn validate(&self, validator: &mut dyn ModelValidator) -> bool {
        (**self).validate(validator)
    }
}

/// Access to the source location carried by every node
pub trait Located {
    /// Where the node came from, if known
    fn location(&self) -> Option<SourceLocation>;
}

macro_rules! impl_located {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Located for $ty {
                fn location(&self) -> Option<SourceLocation> {
                    self.location
                }
            }
        )*
    };
}

impl_located!(
    Value,
    NamedArgument,
    MethodCall,
    Triggers,
    Step,
    Branch,
    BuildCondition,
    PostBuild,
    PostStage,
    Agent,
    Options,
    WhenCondition,
    When,
    Stage,
    Stages,
    PipelineDef,
);

impl Located for Trigger {
    fn location(&self) -> Option<SourceLocation> {
        self.as_method_call().location
    }
}

impl Located for PipelineOption {
    fn location(&self) -> Option<SourceLocation> {
        self.as_method_call().location
    }
}

impl Located for MethodArg {
    fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Value(v) => v.location,
            Self::Named(n) => n.location,
            Self::Call(c) => c.location,
        }
    }
}
