//! Prelude module for common imports

// Configuration tree
pub use crate::ast::{
    Agent, Branch, BuildCondition, BuildConditionsContainer, Located, MethodArg, MethodCall,
    NamedArgument, Options, PipelineDef, PipelineDefBuilder, PipelineOption, PostBuild, PostStage,
    SourceLocation, Stage, Stages, Step, Trigger, Triggers, Validate, Value, ValueKind, When,
    WhenCondition,
};

// Validation
pub use crate::validator::{
    Diagnostic, ErrorCollector, ModelValidator, ModelValidatorImpl, NoopValidator,
    SimpleErrorCollector, ValidationReport, validate_model,
};

// Extensions and registries
pub use crate::extensions::{
    AGENTS, CONDITIONALS, ConditionContext, DeclarativeAgent, DeclarativeOption, OPTIONS,
    PipelineTrigger, Registries, StageConditional, TRIGGERS,
};
pub use crate::registry::{
    Arguments, BoundArguments, DescribableModel, Descriptor, DescriptorRegistry, ParamType,
    ParameterSpec,
};

// Matching, errors and configuration
pub use crate::comparator::Comparator;
pub use crate::errors::{InstantiationError, ModelError, PatternError, RegistrationError};
pub use crate::infrastructure::Config;
