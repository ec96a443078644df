//! Errors raised while declaring and binding profile parameters.

use serde::{Deserialize, Serialize};

use super::parameters::ParameterType;

/// Identifies a raw parameter value that cannot be bound to its declaration. Binding stops at the
/// first such value, since nothing downstream can run without a complete parameter set.
#[derive(thiserror::Error, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterError {
    #[error("Parameter '{name}' is declared more than once")]
    DuplicateParameter { name: String },

    #[error("Parameter '{name}' is not declared by this profile")]
    UnknownParameter { name: String },

    #[error("Parameter '{name}' expects a value of type '{expected}', but got '{value}'")]
    InvalidType {
        name: String,
        expected: ParameterType,
        value: String,
    },

    #[error("Parameter '{name}' has value {value}, which is outside of the range {range}")]
    OutOfRange {
        name: String,
        value: i64,
        range: String,
    },

    #[error("Parameter '{name}' has value '{value}', which is not one of: {options}")]
    NotAChoice {
        name: String,
        value: String,
        options: String,
    },

    #[error("Parameter '{name}' has value '{value}', which does not match '{pattern}'")]
    PatternMismatch {
        name: String,
        value: String,
        pattern: String,
    },

    #[error("Parameter '{name}' has an invalid pattern '{pattern}'")]
    InvalidPattern { name: String, pattern: String },

    #[error("Default value of parameter '{name}' does not satisfy its own declaration")]
    InvalidDefault { name: String },
}
