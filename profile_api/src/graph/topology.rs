//! Structural checks on a built [`ResourceGraph`].
//!
//! The graph is projected onto an undirected petgraph where every node, storage device, LAN and
//! link is a vertex and every interface is an edge between its owner and the network it is
//! attached to.

use std::collections::{BTreeMap, BTreeSet};

use log::trace;
use petgraph::{algo::connected_components, graph::NodeIndex, Graph, Undirected};
use serde::{Deserialize, Serialize};

use crate::constants::{SHARED_LAN_ID, STORAGE_LINK_ID};

use super::{id::Role, Interface, ResourceGraph};

type TopologyPetgraph = Graph<String, String, Undirected>;

#[derive(thiserror::Error, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GraphInvariantError {
    #[error("Resource '{0}' is defined more than once")]
    DuplicateId(String),

    #[error("Interface '{interface}' of '{owner}' is attached to unknown network '{attachment}'")]
    UnknownAttachment {
        interface: String,
        owner: String,
        attachment: String,
    },

    #[error("Network '{network}' lists interface '{interface}', which is not attached to it")]
    DanglingInterfaceRef { network: String, interface: String },

    #[error("Interface '{interface}' is attached to '{network}', but not listed by it")]
    UnlistedInterface { network: String, interface: String },

    #[error("Shared LAN '{0}' is missing")]
    MissingSharedLan(String),

    #[error("Node '{node}' has {count} interface(s) on the shared LAN, but must have exactly one")]
    SharedLanMembership { node: String, count: usize },

    #[error("Storage link '{0}' must join the storage server and the storage device")]
    StorageLinkEndpoints(String),

    #[error("Topology is split into {0} disconnected parts")]
    Disconnected(usize),
}

impl ResourceGraph {
    /// Checks that every resource id is unique, that every interface is attached to exactly one
    /// existing network that lists it, that every compute node has exactly one interface on the
    /// shared LAN, that the storage link joins the storage server and the storage device, and
    /// that the whole topology is connected.
    pub fn verify(&self) -> Result<(), GraphInvariantError> {
        let mut graph = TopologyPetgraph::default();
        let mut vertices: BTreeMap<&str, NodeIndex> = BTreeMap::new();

        let resource_ids = self
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .chain(self.storage_devices.iter().map(|d| d.id.as_str()))
            .chain(self.lans.iter().map(|l| l.id.as_str()))
            .chain(self.links.iter().map(|l| l.id.as_str()));
        for id in resource_ids {
            if vertices.contains_key(id) {
                return Err(GraphInvariantError::DuplicateId(id.into()));
            }
            vertices.insert(id, graph.add_node(id.into()));
        }

        // Interface id -> (owner id, interface)
        let mut interfaces: BTreeMap<&str, (&str, &Interface)> = BTreeMap::new();
        let owned = self
            .nodes
            .iter()
            .flat_map(|n| n.interfaces.iter().map(move |i| (n.id.as_str(), i)))
            .chain(
                self.storage_devices
                    .iter()
                    .map(|d| (d.id.as_str(), &d.interface)),
            );
        for (owner, interface) in owned {
            if interfaces
                .insert(interface.id.as_str(), (owner, interface))
                .is_some()
            {
                return Err(GraphInvariantError::DuplicateId(interface.id.clone()));
            }
        }

        let networks: BTreeMap<&str, Vec<&str>> = self
            .lans
            .iter()
            .map(|l| {
                (
                    l.id.as_str(),
                    l.interfaces.iter().map(String::as_str).collect::<Vec<_>>(),
                )
            })
            .chain(self.links.iter().map(|l| {
                (
                    l.id.as_str(),
                    l.interfaces.iter().map(String::as_str).collect::<Vec<_>>(),
                )
            }))
            .collect();

        for (owner, interface) in interfaces.values() {
            let listed = networks.get(interface.attachment.as_str()).ok_or_else(|| {
                GraphInvariantError::UnknownAttachment {
                    interface: interface.id.clone(),
                    owner: owner.to_string(),
                    attachment: interface.attachment.clone(),
                }
            })?;
            if !listed.contains(&interface.id.as_str()) {
                return Err(GraphInvariantError::UnlistedInterface {
                    network: interface.attachment.clone(),
                    interface: interface.id.clone(),
                });
            }
            graph.add_edge(
                vertices[owner],
                vertices[interface.attachment.as_str()],
                interface.id.clone(),
            );
        }

        for (network, listed) in &networks {
            for interface in listed {
                match interfaces.get(interface) {
                    Some((_, i)) if i.attachment == *network => (),
                    _ => {
                        return Err(GraphInvariantError::DanglingInterfaceRef {
                            network: network.to_string(),
                            interface: interface.to_string(),
                        })
                    }
                }
            }
        }

        if !networks.contains_key(SHARED_LAN_ID) {
            return Err(GraphInvariantError::MissingSharedLan(SHARED_LAN_ID.into()));
        }
        for node in &self.nodes {
            let count = node
                .interfaces
                .iter()
                .filter(|i| i.attachment == SHARED_LAN_ID)
                .count();
            if count != 1 {
                return Err(GraphInvariantError::SharedLanMembership {
                    node: node.id.clone(),
                    count,
                });
            }
        }

        let endpoints_ok = self.link(STORAGE_LINK_ID).is_some_and(|link| {
            let owners = link
                .interfaces
                .iter()
                .filter_map(|i| interfaces.get(i.as_str()).map(|(owner, _)| *owner))
                .collect::<BTreeSet<_>>();
            let server = self
                .nodes_with_role(Role::StorageServer)
                .any(|n| owners.contains(n.id.as_str()));
            let device = self
                .storage_devices
                .iter()
                .any(|d| owners.contains(d.id.as_str()));
            owners.len() == 2 && server && device
        });
        if !endpoints_ok {
            return Err(GraphInvariantError::StorageLinkEndpoints(
                STORAGE_LINK_ID.into(),
            ));
        }

        let components = connected_components(&graph);
        if components != 1 {
            return Err(GraphInvariantError::Disconnected(components));
        }

        trace!(
            "Verified topology with {} vertices and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(())
    }
}
