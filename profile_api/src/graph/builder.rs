//! # Resource graph builder
//!
//! Assembles the topology of one request from validated parameters:
//!
//! - The shared LAN, with every link option enabled so the engine can fall back to software
//!   switching and share physical links on heterogeneous hardware.
//! - The storage server, with one interface on the shared LAN and one on the storage link, and the
//!   server initialization action.
//! - The remote storage device holding the dataset, and the dedicated two-party link joining it to
//!   the storage server.
//! - `num_nodes` workers, each with one shared-LAN interface and the client initialization action.
//!   When local volumes are enabled, each worker also gets an elastic scratch volume and a second
//!   action assigning its ownership. The ownership action is declared after the client action so
//!   the engine runs it once the volume is mounted.
//!
//! Building is total and deterministic: the same parameters always yield the same graph.

use std::iter;

use log::{debug, trace};

use crate::{
    config::Options,
    constants::{
        BOOT_ACTION_SHELL, DATASET_MOUNT_PATH, NFS_CLIENT_COMMAND, NFS_SERVER_COMMAND,
        SCRATCH_CHOWN_COMMAND_PREFIX, SCRATCH_MOUNT_PATH, TOUR_DESCRIPTION, TOUR_INSTRUCTIONS,
    },
    validation::ProfileParameters,
};

use super::{
    id::{id_of, interface_id, volume_id, Role},
    BootAction, Interface, Lan, Link, LinkFlags, LocalVolume, Node, RemoteStorageDevice,
    ResourceGraph, Tour, VolumeSize,
};

/// Flags set on both the shared LAN and the storage link.
const NETWORK_FLAGS: LinkFlags = LinkFlags::all();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceGraphBuilder {
    options: Options,
}

impl ResourceGraphBuilder {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Builds the resource graph for `params`.
    pub fn build(&self, params: &ProfileParameters) -> ResourceGraph {
        debug!(
            "Building resource graph with {} worker node(s)",
            params.num_nodes
        );

        let lan_id = id_of(Role::SharedLan, 0);
        let link_id = id_of(Role::StorageLink, 0);

        let server_id = id_of(Role::StorageServer, 0);
        let server_lan_interface = Interface {
            id: interface_id(&server_id, 0),
            attachment: lan_id.clone(),
        };
        let server_link_interface = Interface {
            id: interface_id(&server_id, 1),
            attachment: link_id.clone(),
        };

        let device_id = id_of(Role::StorageDevice, 0);
        let device = RemoteStorageDevice {
            interface: Interface {
                id: interface_id(&device_id, 0),
                attachment: link_id.clone(),
            },
            id: device_id,
            mount_path: DATASET_MOUNT_PATH.into(),
            dataset_uri: params.dataset_uri.clone(),
        };

        let link = Link {
            id: link_id,
            interfaces: [
                device.interface.id.clone(),
                server_link_interface.id.clone(),
            ],
            flags: NETWORK_FLAGS,
        };

        let server = Node {
            id: server_id,
            role: Role::StorageServer,
            disk_image: params.os_image.clone(),
            hardware_type: None,
            interfaces: vec![server_lan_interface, server_link_interface],
            local_volumes: Vec::new(),
            boot_actions: vec![BootAction::new(BOOT_ACTION_SHELL, NFS_SERVER_COMMAND)],
        };

        let nodes = iter::once(server)
            .chain((0..params.num_nodes).map(|index| self.worker(index, params, &lan_id)))
            .collect::<Vec<_>>();

        let lan = Lan {
            interfaces: nodes
                .iter()
                .flat_map(|node| &node.interfaces)
                .filter(|interface| interface.attachment == lan_id)
                .map(|interface| interface.id.clone())
                .collect(),
            id: lan_id,
            flags: NETWORK_FLAGS,
        };

        trace!(
            "Shared LAN '{}' has {} member(s)",
            lan.id,
            lan.interfaces.len()
        );

        ResourceGraph {
            tour: Tour {
                description: TOUR_DESCRIPTION.into(),
                instructions: TOUR_INSTRUCTIONS.into(),
            },
            nodes,
            storage_devices: vec![device],
            lans: vec![lan],
            links: vec![link],
        }
    }

    fn worker(&self, index: u32, params: &ProfileParameters, lan_id: &str) -> Node {
        let id = id_of(Role::Worker, index);
        trace!("Adding worker '{id}'");

        let (local_volumes, ownership_actions): (Vec<_>, Vec<_>) = self
            .options
            .attach_local_volume
            .then(|| {
                (
                    LocalVolume {
                        id: volume_id(&id),
                        mount_path: SCRATCH_MOUNT_PATH.into(),
                        size: VolumeSize::Elastic,
                    },
                    BootAction::new(
                        BOOT_ACTION_SHELL,
                        format!(
                            "{SCRATCH_CHOWN_COMMAND_PREFIX} {} {SCRATCH_MOUNT_PATH}",
                            params.user_name.as_deref().unwrap_or_default()
                        ),
                    ),
                )
            })
            .into_iter()
            .unzip();

        Node {
            interfaces: vec![Interface {
                id: interface_id(&id, 0),
                attachment: lan_id.into(),
            }],
            id,
            role: Role::Worker,
            disk_image: params.os_image.clone(),
            hardware_type: params.node_type.clone(),
            local_volumes,
            boot_actions: iter::once(BootAction::new(BOOT_ACTION_SHELL, NFS_CLIENT_COMMAND))
                .chain(ownership_actions)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::Variant,
        constants::{OS_IMAGES, SHARED_LAN_ID, STORAGE_LINK_ID},
    };

    use super::*;

    fn params(num_nodes: u32) -> ProfileParameters {
        ProfileParameters {
            num_nodes,
            os_image: OS_IMAGES[2].0.into(),
            node_type: None,
            storage_size: Some(250),
            dataset_uri: "urn:example:dataset".into(),
            user_name: None,
        }
    }

    fn shared_lan_interfaces<'a>(graph: &'a ResourceGraph, node: &'a Node) -> Vec<&'a Interface> {
        let lan = graph.lan(SHARED_LAN_ID).unwrap();
        node.interfaces
            .iter()
            .filter(|i| lan.interfaces.contains(&i.id))
            .collect()
    }

    #[test]
    fn test_basic_graph() {
        let graph = ResourceGraphBuilder::new(Options::default()).build(&params(3));

        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.nodes_with_role(Role::StorageServer).count(), 1);
        assert_eq!(
            graph
                .nodes_with_role(Role::Worker)
                .map(|n| n.id.as_str())
                .collect::<Vec<_>>(),
            vec!["vm0", "vm1", "vm2"]
        );

        let lan = graph.lan(SHARED_LAN_ID).unwrap();
        assert_eq!(
            lan.interfaces,
            vec!["nfs_server:if0", "vm0:if0", "vm1:if0", "vm2:if0"]
        );
        assert_eq!(lan.flags, LinkFlags::all());
        for node in &graph.nodes {
            assert_eq!(shared_lan_interfaces(&graph, node).len(), 1);
        }

        let server = graph.node("nfs_server").unwrap();
        assert_eq!(server.interfaces.len(), 2);
        assert_eq!(
            server.boot_actions,
            vec![BootAction::new(
                "sh",
                "sudo /bin/bash /local/repository/nfs-server.sh"
            )]
        );
        assert_eq!(server.hardware_type, None);

        let link = graph.link(STORAGE_LINK_ID).unwrap();
        assert_eq!(link.interfaces, ["dsnode:if0", "nfs_server:if1"]);
        assert!(link.flags.contains(
            LinkFlags::BEST_EFFORT | LinkFlags::VLAN_TAGGING | LinkFlags::LINK_MULTIPLEXING
        ));

        assert_eq!(graph.storage_devices.len(), 1);
        let device = &graph.storage_devices[0];
        assert_eq!(device.id, "dsnode");
        assert_eq!(device.mount_path, "/nfs_data");
        assert_eq!(device.dataset_uri, "urn:example:dataset");

        for worker in graph.nodes_with_role(Role::Worker) {
            assert_eq!(worker.interfaces.len(), 1);
            assert!(worker.local_volumes.is_empty());
            assert_eq!(
                worker.boot_actions,
                vec![BootAction::new(
                    "sh",
                    "sudo /bin/bash /local/repository/nfs-client.sh"
                )]
            );
            assert_eq!(worker.disk_image, OS_IMAGES[2].0);
        }
    }

    #[test]
    fn test_zero_workers() {
        let graph = ResourceGraphBuilder::new(Options::default()).build(&params(0));
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].id, "nfs_server");
        assert_eq!(
            graph.lan(SHARED_LAN_ID).unwrap().interfaces,
            vec!["nfs_server:if0"]
        );
        assert_eq!(graph.storage_devices.len(), 1);
        assert_eq!(graph.links.len(), 1);
    }

    #[test]
    fn test_scratch_volumes() {
        let builder = ResourceGraphBuilder::new(Options::from(Variant::Scratch));
        let graph = builder.build(&ProfileParameters {
            user_name: Some("alice".into()),
            ..params(2)
        });

        for worker in graph.nodes_with_role(Role::Worker) {
            assert_eq!(
                worker.local_volumes,
                vec![LocalVolume {
                    id: format!("{}-bs", worker.id),
                    mount_path: "/mydata".into(),
                    size: VolumeSize::Elastic,
                }]
            );
            assert_eq!(
                worker.boot_actions,
                vec![
                    BootAction::new("sh", "sudo /bin/bash /local/repository/nfs-client.sh"),
                    BootAction::new("sh", "sudo chown -R alice /mydata"),
                ]
            );
        }

        // The storage server never gets a scratch volume.
        assert!(graph.node("nfs_server").unwrap().local_volumes.is_empty());
    }

    #[test]
    fn test_hardware_type_propagation() {
        let graph = ResourceGraphBuilder::new(Options::default()).build(&ProfileParameters {
            node_type: Some("d430".into()),
            ..params(4)
        });
        assert!(graph
            .nodes_with_role(Role::Worker)
            .all(|n| n.hardware_type.as_deref() == Some("d430")));

        let graph = ResourceGraphBuilder::new(Options::default()).build(&params(4));
        assert!(graph.nodes.iter().all(|n| n.hardware_type.is_none()));
    }

    #[test]
    fn test_deterministic() {
        let builder = ResourceGraphBuilder::new(Options::from(Variant::Scratch));
        let params = ProfileParameters {
            user_name: Some("bob".into()),
            ..params(5)
        };
        assert_eq!(builder.build(&params), builder.build(&params));
    }
}
