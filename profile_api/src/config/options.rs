use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Switches selecting which rules, parameters and resources a profile variant has.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    /// Reject requests for fewer than two worker nodes.
    #[serde(default)]
    pub require_min_nodes: bool,

    /// Declare the `agree` parameter and reject requests that do not accept the data-handling
    /// policy.
    #[serde(default)]
    pub require_acknowledgement: bool,

    /// Attach an elastic scratch volume to every worker, owned by `user_name`.
    #[serde(default)]
    pub attach_local_volume: bool,

    /// Reject requests without a dataset URI.
    #[serde(default)]
    pub require_dataset_uri: bool,
}

/// Named presets for [`Options`].
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Variant {
    /// Shared dataset only; any number of workers.
    #[default]
    Basic,

    /// Shared dataset plus a per-worker scratch volume; at least two workers and an explicit
    /// policy acknowledgement.
    Scratch,
}

impl From<Variant> for Options {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Basic => Options::default(),
            Variant::Scratch => Options {
                require_min_nodes: true,
                require_acknowledgement: true,
                attach_local_volume: true,
                require_dataset_uri: false,
            },
        }
    }
}
