//! # pipeline-model - validation core for declarative pipelines
//!
//! A declarative pipeline is parsed into a typed configuration tree
//! ([`ast`]). Before anything runs, the tree is walked by a
//! [`ModelValidator`](validator::ModelValidator) that records every problem
//! it finds, never stopping at the first. Extension types (options, `when`
//! conditionals, agents, triggers) are looked up by symbol in process-wide
//! [`DescriptorRegistry`](registry::DescriptorRegistry) instances, and
//! conditionals match strings through a [`Comparator`].
//!
//! ## Quick Start
//!
//! ```
//! use pipeline_model::prelude::*;
//!
//! let pipeline = PipelineDef::builder()
//!     .agent(Agent::any())
//!     .stage(Stage::new("build", Branch::new(vec![Step::sh("make")])))
//!     .post(PostBuild::new(vec![
//!         BuildCondition::new("always", vec![Step::echo("done")]),
//!         BuildCondition::new("always", vec![Step::echo("again")]),
//!     ]))
//!     .build();
//!
//! let mut validator = ModelValidatorImpl::default();
//! let report = validate_model(&pipeline, &mut validator);
//! assert!(!report.valid);
//! assert_eq!(
//!     report.diagnostics[0].message,
//!     "Duplicate build condition name: 'always'"
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod ast;
pub mod comparator;
pub mod errors;
pub mod extensions;
pub mod infrastructure;
pub mod registry;
pub mod validator;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use ast::{PipelineDef, Validate};
pub use comparator::Comparator;
pub use errors::{InstantiationError, ModelError, PatternError, RegistrationError};
pub use infrastructure::Config;
pub use registry::{Descriptor, DescriptorRegistry};
pub use validator::{
    Diagnostic, ModelValidator, ModelValidatorImpl, ValidationReport, validate_model,
};

/// Version of the pipeline-model crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
