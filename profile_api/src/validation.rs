//! Cross-parameter rules of the profile.
//!
//! Every rule is evaluated, so a single [`ValidationError`] reports all violations at once. On
//! success the bound values are returned as typed [`ProfileParameters`].

use std::fmt::{Display, Formatter, Result as FmtResult};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    config::{Options, ParameterSet},
    constants::{
        MIN_NUM_NODES, PARAM_AGREE, PARAM_EXT_URI, PARAM_NODE_TYPE, PARAM_NUM_NODES,
        PARAM_OS_IMAGE, PARAM_STORAGE_SIZE, PARAM_USER_NAME, SCRATCH_MOUNT_PATH,
    },
};

/// A single violated rule.
#[derive(thiserror::Error, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationProblem {
    #[error("Acknowledgement of the data-handling policy is required")]
    AcknowledgementRequired,

    #[error("Insufficient node count: {requested} requested, but at least {minimum} are required")]
    InsufficientNodeCount { minimum: u32, requested: u32 },

    #[error("A dataset URI is required")]
    DatasetUriRequired,

    #[error("No value of the expected type was bound")]
    MissingValue,
}

/// A violated rule and the parameter it is attributed to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ValidationFailure {
    pub parameter: String,
    pub problem: ValidationProblem,
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "'{}': {}", self.parameter, self.problem)
    }
}

/// All rules violated by a parameter set.
#[derive(thiserror::Error, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[error("Profile parameters are invalid: {}", describe(.reasons))]
pub struct ValidationError {
    pub reasons: Vec<ValidationFailure>,
}

fn describe(reasons: &[ValidationFailure]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Returns whether any reason is attributed to `parameter`.
    pub fn cites(&self, parameter: &str) -> bool {
        self.reasons.iter().any(|r| r.parameter == parameter)
    }
}

/// Validated, typed profile parameters.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ProfileParameters {
    pub num_nodes: u32,

    pub os_image: String,

    /// Hardware type for workers; `None` lets the testbed choose.
    pub node_type: Option<String>,

    /// Informational only.
    pub storage_size: Option<i64>,

    pub dataset_uri: String,

    /// Owner of the scratch volume; only present when local volumes are attached.
    pub user_name: Option<String>,
}

/// Collects rule violations while extracting typed values.
#[derive(Default)]
struct Collector {
    reasons: Vec<ValidationFailure>,
}

impl Collector {
    fn fail(&mut self, parameter: &str, problem: ValidationProblem) {
        self.reasons.push(ValidationFailure {
            parameter: parameter.into(),
            problem,
        });
    }

    /// Returns `value`, recording a missing-value failure when it is `None`.
    fn require<T>(&mut self, parameter: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.fail(parameter, ValidationProblem::MissingValue);
        }
        value
    }
}

/// Checks `set` against the rules enabled by `options`.
pub fn validate(
    set: &ParameterSet,
    options: &Options,
) -> Result<ProfileParameters, ValidationError> {
    let mut collector = Collector::default();

    if options.require_acknowledgement
        && collector.require(PARAM_AGREE, set.boolean(PARAM_AGREE)) == Some(false)
    {
        collector.fail(PARAM_AGREE, ValidationProblem::AcknowledgementRequired);
    }

    let num_nodes = collector
        .require(PARAM_NUM_NODES, set.integer(PARAM_NUM_NODES))
        .and_then(|n| match u32::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                collector.fail(PARAM_NUM_NODES, ValidationProblem::MissingValue);
                None
            }
        });
    if let Some(requested) = num_nodes {
        if options.require_min_nodes && requested < MIN_NUM_NODES {
            collector.fail(
                PARAM_NUM_NODES,
                ValidationProblem::InsufficientNodeCount {
                    minimum: MIN_NUM_NODES,
                    requested,
                },
            );
        }
    }

    let os_image = collector.require(PARAM_OS_IMAGE, set.string(PARAM_OS_IMAGE));
    let node_type = collector.require(PARAM_NODE_TYPE, set.string(PARAM_NODE_TYPE));

    let dataset_uri = collector.require(PARAM_EXT_URI, set.string(PARAM_EXT_URI));
    if options.require_dataset_uri && dataset_uri.is_some_and(|uri| uri.trim().is_empty()) {
        collector.fail(PARAM_EXT_URI, ValidationProblem::DatasetUriRequired);
    }

    let user_name = if options.attach_local_volume {
        let user_name = collector.require(PARAM_USER_NAME, set.string(PARAM_USER_NAME));
        if user_name.is_some_and(str::is_empty) {
            warn!(
                "No '{PARAM_USER_NAME}' given, ownership of '{SCRATCH_MOUNT_PATH}' will not be \
                 assigned to an account"
            );
        }
        user_name
    } else {
        None
    };

    if !collector.reasons.is_empty() {
        debug!(
            "Parameter validation found {} problem(s)",
            collector.reasons.len()
        );
        return Err(ValidationError {
            reasons: collector.reasons,
        });
    }

    // With no failures recorded, every value above is present.
    Ok(ProfileParameters {
        num_nodes: num_nodes.unwrap_or_default(),
        os_image: os_image.unwrap_or_default().into(),
        node_type: node_type.filter(|t| !t.is_empty()).map(Into::into),
        storage_size: set.integer(PARAM_STORAGE_SIZE),
        dataset_uri: dataset_uri.unwrap_or_default().into(),
        user_name: user_name.map(Into::into),
    })
}
