//! Error types for the model, registry and comparator layers
//!
//! Validation problems found in a user's configuration are not errors: they
//! are recorded as [`Diagnostic`](crate::validator::Diagnostic)s. The types
//! here cover broken extensions, failed instantiation and bad patterns.

use thiserror::Error;

/// Errors raised while loading or handling a configuration model
#[derive(Error, Debug)]
pub enum ModelError {
    /// An extension failed to register
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// An extension instance could not be built from its arguments
    #[error(transparent)]
    Instantiation(#[from] InstantiationError),

    /// A comparator pattern is malformed
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// The serialized tree could not be decoded
    #[error("Failed to parse configuration tree: {0}")]
    Parse(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for ModelError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Programming errors in an extension, surfaced when it is registered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The descriptor never declared a symbolic name
    #[error("Descriptor for {type_name} does not declare a symbol")]
    MissingSymbol {
        /// Name of the extension type that was being registered.
        type_name: String,
    },

    /// Another descriptor of the same kind already owns this name
    #[error("A descriptor named '{name}' is already registered")]
    DuplicateSymbol {
        /// The clashing symbol.
        name: String,
    },
}

/// Failures while binding arguments onto an extension type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstantiationError {
    /// A required parameter was not supplied
    #[error("Missing required parameter: '{name}'")]
    MissingArgument {
        /// Name of the missing parameter.
        name: String,
    },

    /// An argument does not correspond to any parameter
    #[error("Invalid parameter '{name}'{}", suggestion.as_ref().map(|s| format!(", did you mean '{s}'?")).unwrap_or_default())]
    UnknownArgument {
        /// Name of the unrecognised argument.
        name: String,
        /// Closest known parameter, when there is one.
        suggestion: Option<String>,
    },

    /// An argument has the wrong shape for its parameter
    #[error("Expecting {expected} for parameter '{name}' but got '{found}' instead")]
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Declared parameter type.
        expected: String,
        /// Rendering of the supplied value.
        found: String,
    },

    /// An argument has the right shape but an unusable value
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidValue {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// More positional arguments than the model can take
    #[error("Expected at most {expected} unnamed arguments but got {found}")]
    TooManyPositional {
        /// Maximum positional arguments accepted.
        expected: usize,
        /// Positional arguments supplied.
        found: usize,
    },

    /// A pattern argument failed to compile
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Invalid patterns handed to a comparator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern is not a valid regular expression
    #[error("Invalid regular expression '{pattern}': {reason}")]
    InvalidRegex {
        /// The offending pattern.
        pattern: String,
        /// Error reported by the regex engine.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_argument_with_suggestion() {
        let err = InstantiationError::UnknownArgument {
            name: "banana".to_string(),
            suggestion: Some("unit".to_string()),
        };
        assert_eq!(err.to_string(), "Invalid parameter 'banana', did you mean 'unit'?");
    }

    #[test]
    fn test_unknown_argument_without_suggestion() {
        let err = InstantiationError::UnknownArgument {
            name: "banana".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "Invalid parameter 'banana'");
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = InstantiationError::TypeMismatch {
            name: "time".to_string(),
            expected: "int".to_string(),
            found: "someTime".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Expecting int for parameter 'time' but got 'someTime' instead"
        );
    }

    #[test]
    fn test_pattern_error_wraps_into_model_error() {
        let err: ModelError = PatternError::InvalidRegex {
            pattern: "(".to_string(),
            reason: "unclosed group".to_string(),
        }
        .into();
        assert!(err.to_string().contains("Invalid regular expression '('"));
    }
}
