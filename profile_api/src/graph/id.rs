use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

use crate::constants::{
    LOCAL_VOLUME_SUFFIX, STORAGE_DEVICE_ID, STORAGE_LINK_ID, STORAGE_SERVER_ID, SHARED_LAN_ID,
    WORKER_ID_PREFIX,
};

/// The part a resource plays in the topology.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Role {
    SharedLan,
    StorageServer,
    StorageDevice,
    StorageLink,
    Worker,
}

/// Returns the id of the `index`-th resource with the given role.
///
/// Only workers are numbered; every other role has a single instance and ignores `index`.
pub fn id_of(role: Role, index: u32) -> String {
    match role {
        Role::SharedLan => SHARED_LAN_ID.into(),
        Role::StorageServer => STORAGE_SERVER_ID.into(),
        Role::StorageDevice => STORAGE_DEVICE_ID.into(),
        Role::StorageLink => STORAGE_LINK_ID.into(),
        Role::Worker => format!("{WORKER_ID_PREFIX}{index}"),
    }
}

/// Returns the id of the `position`-th interface of a node.
pub fn interface_id(owner: &str, position: usize) -> String {
    format!("{owner}:if{position}")
}

/// Returns the id of the local volume of a node.
pub fn volume_id(owner: &str) -> String {
    format!("{owner}{LOCAL_VOLUME_SUFFIX}")
}
