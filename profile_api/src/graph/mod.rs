//! # Resource graph
//!
//! In-memory model of the requested topology. A [`ResourceGraph`] owns every node, network and
//! storage device of one request and is discarded once serialized.
//!
//! Entities are constructed whole; nothing is patched after creation. Interfaces are owned by
//! their node and referenced by id from the LAN or link they attach to.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

mod builder;
mod id;
mod topology;

pub use builder::ResourceGraphBuilder;
pub use id::{id_of, interface_id, volume_id, Role};
pub use topology::GraphInvariantError;

bitflags! {
    /// Link options understood by the provisioning engine.
    #[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct LinkFlags: u8 {
        /// Allow the engine to oversubscribe bandwidth.
        const BEST_EFFORT = 1;
        /// Carry the link as a tagged VLAN.
        const VLAN_TAGGING = 1 << 1;
        /// Share physical links between several virtual links.
        const LINK_MULTIPLEXING = 1 << 2;
    }
}

/// An attachment point of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub id: String,

    /// Id of the LAN or link the interface is attached to.
    pub attachment: String,
}

/// Size of a local volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeSize {
    /// Use all remaining local disk.
    Elastic,

    /// A fixed size, in GB.
    Gigabytes(u64),
}

/// A volume carved out of a node's local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVolume {
    pub id: String,
    pub mount_path: String,
    pub size: VolumeSize,
}

/// A command run by the engine once the node is provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootAction {
    pub shell: String,
    pub command: String,
}

impl BootAction {
    pub fn new(shell: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            command: command.into(),
        }
    }
}

/// A compute node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub role: Role,
    pub disk_image: String,

    /// `None` lets the engine pick the hardware.
    pub hardware_type: Option<String>,

    pub interfaces: Vec<Interface>,
    pub local_volumes: Vec<LocalVolume>,

    /// Run in declaration order.
    pub boot_actions: Vec<BootAction>,
}

/// A multi-party broadcast domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lan {
    pub id: String,
    pub interfaces: Vec<String>,
    pub flags: LinkFlags,
}

/// A point-to-point connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub interfaces: [String; 2],
    pub flags: LinkFlags,
}

/// An externally managed dataset volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStorageDevice {
    pub id: String,
    pub mount_path: String,

    /// May be empty; reachability is the engine's concern.
    pub dataset_uri: String,

    pub interface: Interface,
}

/// Text shown by the testbed portal alongside the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tour {
    pub description: String,
    pub instructions: String,
}

/// All resources of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGraph {
    pub tour: Tour,

    /// Compute nodes in creation order: the storage server first, then the workers.
    pub nodes: Vec<Node>,

    pub storage_devices: Vec<RemoteStorageDevice>,
    pub lans: Vec<Lan>,
    pub links: Vec<Link>,
}

impl ResourceGraph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn lan(&self, id: &str) -> Option<&Lan> {
        self.lans.iter().find(|l| l.id == id)
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Nodes with the given role, in creation order.
    pub fn nodes_with_role(&self, role: Role) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.role == role)
    }
}
