//! Declared profile parameters and their binding to caller input.
//!
//! The registry holds one [`Parameter`] per accepted input. Binding walks the declarations in
//! order, coerces each raw YAML value to the declared type, checks the declared constraints and
//! falls back to the default when the caller gave no value. The result is an immutable
//! [`ParameterSet`] that holds a value for every declared parameter.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};

use log::{debug, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value as RawValue;
use strum_macros::{Display as StrumDisplay, EnumString};

use crate::constants::{
    DEFAULT_NUM_NODES, DEFAULT_OS_IMAGE_INDEX, DEFAULT_STORAGE_SIZE_GB, MAX_NUM_NODES,
    NODE_TYPE_PATTERN, OS_IMAGES, PARAM_AGREE, PARAM_EXT_URI, PARAM_NODE_TYPE, PARAM_NUM_NODES,
    PARAM_OS_IMAGE, PARAM_STORAGE_SIZE, PARAM_USER_NAME, SCRATCH_MOUNT_PATH, USER_NAME_PATTERN,
};

use super::{error::ParameterError, options::Options};

/// Type of a declared parameter.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ParameterType {
    Integer,
    String,
    Boolean,
    /// One of a fixed list of disk images.
    ImageChoice,
    /// A testbed hardware type, or empty for no constraint.
    HardwareChoice,
}

/// A bound parameter value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn matches(&self, kind: ParameterType) -> bool {
        match kind {
            ParameterType::Integer => matches!(self, Value::Integer(_)),
            ParameterType::Boolean => matches!(self, Value::Boolean(_)),
            ParameterType::String | ParameterType::ImageChoice | ParameterType::HardwareChoice => {
                matches!(self, Value::String(_))
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

/// An enumerated option of a choice parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A restriction on the values a parameter accepts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Constraint {
    /// Inclusive bounds for integer parameters.
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },

    /// The value must be one of the listed choice values.
    Choices { options: Vec<Choice> },

    /// The value must match the regular expression.
    Pattern { pattern: String },
}

impl Constraint {
    fn check(&self, name: &str, value: &Value) -> Result<(), ParameterError> {
        match (self, value) {
            (Constraint::Range { min, max }, Value::Integer(i)) => {
                if min.is_some_and(|min| *i < min) || max.is_some_and(|max| *i > max) {
                    return Err(ParameterError::OutOfRange {
                        name: name.into(),
                        value: *i,
                        range: describe_range(*min, *max),
                    });
                }
            }
            (Constraint::Choices { options }, Value::String(s)) => {
                if !options.iter().any(|option| option.value == *s) {
                    return Err(ParameterError::NotAChoice {
                        name: name.into(),
                        value: s.clone(),
                        options: options
                            .iter()
                            .map(|option| format!("'{}'", option.value))
                            .collect::<Vec<_>>()
                            .join(", "),
                    });
                }
            }
            (Constraint::Pattern { pattern }, Value::String(s)) => {
                let regex = Regex::new(pattern).map_err(|_| ParameterError::InvalidPattern {
                    name: name.into(),
                    pattern: pattern.clone(),
                })?;
                if !regex.is_match(s) {
                    return Err(ParameterError::PatternMismatch {
                        name: name.into(),
                        value: s.clone(),
                        pattern: pattern.clone(),
                    });
                }
            }
            // Constraints of another type do not apply to this value.
            _ => (),
        }

        Ok(())
    }
}

fn describe_range(min: Option<i64>, max: Option<i64>) -> String {
    let bound = |b: Option<i64>| b.map_or("..".to_string(), |b| b.to_string());
    format!("[{}, {}]", bound(min), bound(max))
}

/// Declaration of a single profile parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ParameterType,

    /// Short prompt shown next to the input field.
    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub default: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        kind: ParameterType,
        prompt: impl Into<String>,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            prompt: prompt.into(),
            description: None,
            default,
            constraints: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Converts a raw input value to the declared type.
    fn coerce(&self, raw: &RawValue) -> Result<Value, ParameterError> {
        let invalid = || ParameterError::InvalidType {
            name: self.name.clone(),
            expected: self.kind,
            value: describe_raw(raw),
        };

        match self.kind {
            ParameterType::Integer => match raw {
                RawValue::Number(n) => n.as_i64().map(Value::Integer).ok_or_else(invalid),
                RawValue::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| invalid()),
                _ => Err(invalid()),
            },
            ParameterType::Boolean => match raw {
                RawValue::Bool(b) => Ok(Value::Boolean(*b)),
                RawValue::Number(n) => match n.as_i64() {
                    Some(0) => Ok(Value::Boolean(false)),
                    Some(1) => Ok(Value::Boolean(true)),
                    _ => Err(invalid()),
                },
                RawValue::String(s) => parse_boolean(s).map(Value::Boolean).ok_or_else(invalid),
                _ => Err(invalid()),
            },
            ParameterType::String | ParameterType::ImageChoice | ParameterType::HardwareChoice => {
                match raw {
                    RawValue::String(s) => Ok(Value::String(s.clone())),
                    RawValue::Number(n) => Ok(Value::String(n.to_string())),
                    _ => Err(invalid()),
                }
            }
        }
    }

    /// Checks a value of the declared type against every constraint.
    fn check(&self, value: &Value) -> Result<(), ParameterError> {
        self.constraints
            .iter()
            .try_for_each(|constraint| constraint.check(&self.name, value))
    }
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn describe_raw(raw: &RawValue) -> String {
    match raw {
        RawValue::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}

/// The parameters accepted by one profile variant.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ParameterRegistry {
    parameters: Vec<Parameter>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the parameters of the profile variant described by `options`.
    pub fn for_options(options: &Options) -> Result<Self, ParameterError> {
        let mut registry = Self::new();

        registry.declare(
            Parameter::new(
                PARAM_NUM_NODES,
                ParameterType::Integer,
                "Number of nodes",
                Value::Integer(DEFAULT_NUM_NODES),
            )
            .with_constraint(Constraint::Range {
                min: Some(0),
                max: Some(MAX_NUM_NODES),
            }),
        )?;

        registry.declare(
            Parameter::new(
                PARAM_OS_IMAGE,
                ParameterType::ImageChoice,
                "Select OS image",
                Value::String(OS_IMAGES[DEFAULT_OS_IMAGE_INDEX].0.into()),
            )
            .with_constraint(Constraint::Choices {
                options: OS_IMAGES
                    .iter()
                    .map(|(urn, label)| Choice::new(*urn, *label))
                    .collect(),
            }),
        )?;

        registry.declare(
            Parameter::new(
                PARAM_NODE_TYPE,
                ParameterType::HardwareChoice,
                "Hardware type of all nodes",
                Value::String(String::new()),
            )
            .with_description("A specific hardware type to use for each node.")
            .with_constraint(Constraint::Pattern {
                pattern: NODE_TYPE_PATTERN.into(),
            }),
        )?;

        // The scratch volume takes all remaining disk, so a size is only informational
        // when there is none.
        if !options.attach_local_volume {
            registry.declare(
                Parameter::new(
                    PARAM_STORAGE_SIZE,
                    ParameterType::Integer,
                    "Storage Size (GB)",
                    Value::Integer(DEFAULT_STORAGE_SIZE_GB),
                )
                .with_constraint(Constraint::Range {
                    min: Some(1),
                    max: None,
                }),
            )?;
        }

        registry.declare(Parameter::new(
            PARAM_EXT_URI,
            ParameterType::String,
            "External Dataset URI",
            Value::String(String::new()),
        ))?;

        if options.attach_local_volume {
            registry.declare(
                Parameter::new(
                    PARAM_USER_NAME,
                    ParameterType::String,
                    "Username",
                    Value::String(String::new()),
                )
                .with_description(format!(
                    "Account that will own the scratch volume mounted at {SCRATCH_MOUNT_PATH}."
                ))
                .with_constraint(Constraint::Pattern {
                    pattern: USER_NAME_PATTERN.into(),
                }),
            )?;
        }

        if options.require_acknowledgement {
            registry.declare(
                Parameter::new(
                    PARAM_AGREE,
                    ParameterType::Boolean,
                    "I agree to the data-handling policy of the dataset",
                    Value::Boolean(true),
                )
                .with_description(
                    "The experiment cannot be instantiated without accepting the policy.",
                ),
            )?;
        }

        Ok(registry)
    }

    /// Adds a parameter declaration. Names must be unique and the default must satisfy the
    /// declaration.
    pub fn declare(&mut self, parameter: Parameter) -> Result<(), ParameterError> {
        if self.get(&parameter.name).is_some() {
            return Err(ParameterError::DuplicateParameter {
                name: parameter.name,
            });
        }

        if !parameter.default.matches(parameter.kind) || parameter.check(&parameter.default).is_err()
        {
            return Err(ParameterError::InvalidDefault {
                name: parameter.name,
            });
        }

        trace!(
            "Declared parameter '{}' of type '{}'",
            parameter.name,
            parameter.kind
        );
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Binds raw caller input to the declared parameters.
    ///
    /// Parameters absent from `raw`, or given as null, take their default value.
    pub fn bind(&self, raw: &BTreeMap<String, RawValue>) -> Result<ParameterSet, ParameterError> {
        if let Some(unknown) = raw.keys().find(|name| self.get(name).is_none()) {
            return Err(ParameterError::UnknownParameter {
                name: unknown.clone(),
            });
        }

        let mut values = BTreeMap::new();
        for parameter in &self.parameters {
            let value = match raw.get(&parameter.name) {
                None | Some(RawValue::Null) => parameter.default.clone(),
                Some(raw_value) => {
                    let value = parameter.coerce(raw_value)?;
                    parameter.check(&value)?;
                    value
                }
            };
            trace!("Bound parameter '{}' to '{}'", parameter.name, value);
            values.insert(parameter.name.clone(), value);
        }

        debug!("Bound {} parameters", values.len());
        Ok(ParameterSet { values })
    }
}

/// Concrete values for every declared parameter.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, Value>,
}

impl ParameterSet {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_integer)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_boolean)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for ParameterSet {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}
