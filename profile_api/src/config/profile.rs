use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidInputError, ProfileError};

use super::options::{Options, Variant};

/// Definition of a profile request: which variant to generate and the raw parameter values to
/// bind.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProfileConfig {
    // ONLY ONE OF `variant` AND `options` CAN BE PROVIDED
    /// Named preset for the profile options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,

    /// Explicit profile options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,

    /// Raw parameter values, keyed by parameter name. Values are coerced to the declared
    /// parameter types when bound.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_yaml::Value>,
}

impl ProfileConfig {
    /// Resolves the options to generate with. Without a variant or explicit options, the basic
    /// variant is used.
    pub fn resolve_options(&self) -> Result<Options, ProfileError> {
        match (self.variant, self.options) {
            (Some(_), Some(_)) => Err(ProfileError::new(InvalidInputError::ConflictingOptions)),
            (Some(variant), None) => Ok(variant.into()),
            (None, Some(options)) => Ok(options),
            (None, None) => Ok(Variant::default().into()),
        }
    }

    /// Sets a raw parameter value, replacing any value already present.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: serde_yaml::Value) {
        self.parameters.insert(name.into(), value);
    }
}
