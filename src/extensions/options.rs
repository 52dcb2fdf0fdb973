//! Built-in pipeline and stage options

use crate::errors::InstantiationError;
use crate::registry::{BoundArguments, Descriptor, DescriptorRegistry, ParamType, ParameterSpec};
use once_cell::sync::Lazy;
use std::fmt;

/// An instantiated `options` entry
pub trait DeclarativeOption: fmt::Debug + Send + Sync {
    /// Symbol the option was declared with
    fn symbol(&self) -> &'static str;
}

/// Units accepted by `timeout`
pub const TIME_UNITS: [&str; 7] = [
    "NANOSECONDS",
    "MICROSECONDS",
    "MILLISECONDS",
    "SECONDS",
    "MINUTES",
    "HOURS",
    "DAYS",
];

/// `skipDefaultCheckout`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipDefaultCheckout {
    /// Whether checkout is skipped
    pub skip: bool,
}

/// `checkoutToSubdirectory`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutToSubdirectory {
    /// Target directory, relative to the workspace
    pub subdirectory: String,
}

/// `disableRestartFromStage`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisableRestartFromStage;

/// `skipStagesAfterUnstable`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipStagesAfterUnstable;

/// `timeout`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeout {
    /// Amount of time
    pub time: i64,
    /// Unit of `time`
    pub unit: String,
    /// Reset the clock on log activity
    pub activity: bool,
}

/// `retry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    /// Maximum attempts
    pub count: i64,
}

macro_rules! option_symbol {
    ($($ty:ty => $symbol:literal),* $(,)?) => {
        $(
            impl DeclarativeOption for $ty {
                fn symbol(&self) -> &'static str {
                    $symbol
                }
            }
        )*
    };
}

option_symbol!(
    SkipDefaultCheckout => "skipDefaultCheckout",
    CheckoutToSubdirectory => "checkoutToSubdirectory",
    DisableRestartFromStage => "disableRestartFromStage",
    SkipStagesAfterUnstable => "skipStagesAfterUnstable",
    Timeout => "timeout",
    Retry => "retry",
);

fn positive(name: &str, value: i64) -> Result<i64, InstantiationError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(InstantiationError::InvalidValue {
            name: name.to_string(),
            reason: format!("must be greater than 0 but was {value}"),
        })
    }
}

fn skip_default_checkout(
    args: &BoundArguments,
) -> Result<Box<dyn DeclarativeOption>, InstantiationError> {
    Ok(Box::new(SkipDefaultCheckout {
        skip: args.get_bool("value").unwrap_or(true),
    }))
}

fn checkout_to_subdirectory(
    args: &BoundArguments,
) -> Result<Box<dyn DeclarativeOption>, InstantiationError> {
    Ok(Box::new(CheckoutToSubdirectory {
        subdirectory: args.require_str("value")?.to_string(),
    }))
}

fn disable_restart_from_stage(
    _: &BoundArguments,
) -> Result<Box<dyn DeclarativeOption>, InstantiationError> {
    Ok(Box::new(DisableRestartFromStage))
}

fn skip_stages_after_unstable(
    _: &BoundArguments,
) -> Result<Box<dyn DeclarativeOption>, InstantiationError> {
    Ok(Box::new(SkipStagesAfterUnstable))
}

fn timeout(args: &BoundArguments) -> Result<Box<dyn DeclarativeOption>, InstantiationError> {
    let time = positive("time", args.get_i64("time").unwrap_or_default())?;
    let unit = args.get_str("unit").unwrap_or("MINUTES");
    if !TIME_UNITS.contains(&unit) {
        return Err(InstantiationError::InvalidValue {
            name: "unit".to_string(),
            reason: format!("'{unit}' is not one of [{}]", TIME_UNITS.join(", ")),
        });
    }
    Ok(Box::new(Timeout {
        time,
        unit: unit.to_string(),
        activity: args.get_bool("activity").unwrap_or(false),
    }))
}

fn retry(args: &BoundArguments) -> Result<Box<dyn DeclarativeOption>, InstantiationError> {
    Ok(Box::new(Retry {
        count: positive("count", args.get_i64("count").unwrap_or_default())?,
    }))
}

fn builtins() -> Vec<Descriptor<dyn DeclarativeOption>> {
    vec![
        Descriptor::new("SkipDefaultCheckout", skip_default_checkout)
            .symbol("skipDefaultCheckout")
            .display_name("Skip the default SCM checkout")
            .params(vec![ParameterSpec::optional("value", ParamType::Boolean)]),
        Descriptor::new("CheckoutToSubdirectory", checkout_to_subdirectory)
            .symbol("checkoutToSubdirectory")
            .display_name("Check out to a subdirectory")
            .params(vec![ParameterSpec::required("value", ParamType::String)]),
        Descriptor::new("DisableRestartFromStage", disable_restart_from_stage)
            .symbol("disableRestartFromStage")
            .display_name("Do not allow restarting from a stage"),
        Descriptor::new("SkipStagesAfterUnstable", skip_stages_after_unstable)
            .symbol("skipStagesAfterUnstable")
            .display_name("Skip remaining stages once the build is unstable"),
        Descriptor::new("Timeout", timeout)
            .symbol("timeout")
            .display_name("Abort after a period of time")
            .params(vec![
                ParameterSpec::required("time", ParamType::Integer),
                ParameterSpec::optional("activity", ParamType::Boolean),
                ParameterSpec::optional("unit", ParamType::String),
            ])
            .allowed_in_stage(true),
        Descriptor::new("Retry", retry)
            .symbol("retry")
            .display_name("Retry on failure")
            .params(vec![ParameterSpec::required("count", ParamType::Integer)])
            .allowed_in_stage(true),
    ]
}

/// Process-wide option registry, seeded with the built-ins
pub static OPTIONS: Lazy<DescriptorRegistry<dyn DeclarativeOption>> = Lazy::new(|| {
    let registry = DescriptorRegistry::new("option");
    for descriptor in builtins() {
        if let Err(e) = registry.register(descriptor) {
            tracing::error!(error = %e, "failed to register built-in option");
        }
    }
    registry
});
