//! Serde model of the RSpec request elements written by this profile.

use serde::Serialize;

use crate::{
    constants::{
        CLIENT_NAMESPACE, EMULAB_NAMESPACE, RSPEC_NAMESPACE, RSPEC_SCHEMA_LOCATION, TOUR_NAMESPACE,
        XSI_NAMESPACE,
    },
    graph::{
        BootAction, Lan, Link, LinkFlags, LocalVolume, Node, RemoteStorageDevice, ResourceGraph,
        Role, Tour, VolumeSize,
    },
};

const RAW_PC_SLIVER: &str = "raw-pc";
const BLOCKSTORE_SLIVER: &str = "emulab-blockstore";
const LAN_LINK_TYPE: &str = "lan";
const MARKDOWN: &str = "markdown";
const ANY_PLACEMENT: &str = "any";

#[derive(Debug, Serialize)]
pub(crate) struct Rspec<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,

    #[serde(rename = "@xmlns:emulab")]
    xmlns_emulab: &'static str,

    #[serde(rename = "@xmlns:client")]
    xmlns_client: &'static str,

    #[serde(rename = "@xmlns:xsi")]
    xmlns_xsi: &'static str,

    #[serde(rename = "@xsi:schemaLocation")]
    schema_location: &'static str,

    #[serde(rename = "@type")]
    kind: &'static str,

    #[serde(rename = "rspec_tour")]
    tour: TourElement<'a>,

    #[serde(rename = "node", skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<NodeElement<'a>>,

    #[serde(rename = "link", skip_serializing_if = "Vec::is_empty")]
    links: Vec<LinkElement<'a>>,
}

impl<'a> From<&'a ResourceGraph> for Rspec<'a> {
    fn from(graph: &'a ResourceGraph) -> Self {
        let nodes = graph
            .nodes_with_role(Role::StorageServer)
            .map(NodeElement::from)
            .chain(graph.storage_devices.iter().map(NodeElement::from))
            .chain(
                graph
                    .nodes
                    .iter()
                    .filter(|n| n.role != Role::StorageServer)
                    .map(NodeElement::from),
            )
            .collect();

        let links = graph
            .lans
            .iter()
            .map(LinkElement::from)
            .chain(graph.links.iter().map(LinkElement::from))
            .collect();

        Self {
            xmlns: RSPEC_NAMESPACE,
            xmlns_emulab: EMULAB_NAMESPACE,
            xmlns_client: CLIENT_NAMESPACE,
            xmlns_xsi: XSI_NAMESPACE,
            schema_location: RSPEC_SCHEMA_LOCATION,
            kind: "request",
            tour: TourElement::from(&graph.tour),
            nodes,
            links,
        }
    }
}

#[derive(Debug, Serialize)]
struct TourElement<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,

    description: MarkdownText<'a>,
    instructions: MarkdownText<'a>,
}

impl<'a> From<&'a Tour> for TourElement<'a> {
    fn from(tour: &'a Tour) -> Self {
        Self {
            xmlns: TOUR_NAMESPACE,
            description: MarkdownText::new(&tour.description),
            instructions: MarkdownText::new(&tour.instructions),
        }
    }
}

#[derive(Debug, Serialize)]
struct MarkdownText<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,

    #[serde(rename = "$text")]
    text: &'a str,
}

impl<'a> MarkdownText<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            kind: MARKDOWN,
            text,
        }
    }
}

#[derive(Debug, Serialize)]
struct NodeElement<'a> {
    #[serde(rename = "@client_id")]
    client_id: &'a str,

    #[serde(rename = "@exclusive")]
    exclusive: bool,

    sliver_type: SliverType<'a>,

    #[serde(skip_serializing_if = "Option::is_none")]
    hardware_type: Option<NamedElement<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    services: Option<Services<'a>>,

    #[serde(rename = "interface", skip_serializing_if = "Vec::is_empty")]
    interfaces: Vec<ClientIdElement<'a>>,

    #[serde(rename = "emulab:blockstore", skip_serializing_if = "Vec::is_empty")]
    blockstores: Vec<Blockstore<'a>>,
}

impl<'a> From<&'a Node> for NodeElement<'a> {
    fn from(node: &'a Node) -> Self {
        Self {
            client_id: &node.id,
            exclusive: true,
            sliver_type: SliverType {
                name: RAW_PC_SLIVER,
                disk_image: Some(NamedElement {
                    name: &node.disk_image,
                }),
            },
            hardware_type: node
                .hardware_type
                .as_deref()
                .map(|name| NamedElement { name }),
            services: (!node.boot_actions.is_empty()).then(|| Services {
                execute: node.boot_actions.iter().map(Execute::from).collect(),
            }),
            interfaces: node
                .interfaces
                .iter()
                .map(|i| ClientIdElement { client_id: &i.id })
                .collect(),
            blockstores: node.local_volumes.iter().map(Blockstore::from).collect(),
        }
    }
}

impl<'a> From<&'a RemoteStorageDevice> for NodeElement<'a> {
    fn from(device: &'a RemoteStorageDevice) -> Self {
        Self {
            client_id: &device.id,
            exclusive: false,
            sliver_type: SliverType {
                name: BLOCKSTORE_SLIVER,
                disk_image: None,
            },
            hardware_type: None,
            services: None,
            interfaces: vec![ClientIdElement {
                client_id: &device.interface.id,
            }],
            blockstores: vec![Blockstore::from(device)],
        }
    }
}

#[derive(Debug, Serialize)]
struct SliverType<'a> {
    #[serde(rename = "@name")]
    name: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    disk_image: Option<NamedElement<'a>>,
}

#[derive(Debug, Serialize)]
struct NamedElement<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ClientIdElement<'a> {
    #[serde(rename = "@client_id")]
    client_id: &'a str,
}

#[derive(Debug, Serialize)]
struct Services<'a> {
    execute: Vec<Execute<'a>>,
}

#[derive(Debug, Serialize)]
struct Execute<'a> {
    #[serde(rename = "@shell")]
    shell: &'a str,

    #[serde(rename = "@command")]
    command: &'a str,
}

impl<'a> From<&'a BootAction> for Execute<'a> {
    fn from(action: &'a BootAction) -> Self {
        Self {
            shell: &action.shell,
            command: &action.command,
        }
    }
}

#[derive(Debug, Serialize)]
struct Blockstore<'a> {
    #[serde(rename = "@name")]
    name: &'a str,

    #[serde(rename = "@mountpoint")]
    mount_point: &'a str,

    #[serde(rename = "@class")]
    class: &'static str,

    #[serde(rename = "@size", skip_serializing_if = "Option::is_none")]
    size: Option<String>,

    #[serde(rename = "@placement")]
    placement: &'static str,

    #[serde(rename = "@readonly", skip_serializing_if = "Option::is_none")]
    read_only: Option<bool>,

    #[serde(rename = "@dataset", skip_serializing_if = "Option::is_none")]
    dataset: Option<&'a str>,
}

impl<'a> From<&'a LocalVolume> for Blockstore<'a> {
    fn from(volume: &'a LocalVolume) -> Self {
        Self {
            name: &volume.id,
            mount_point: &volume.mount_path,
            class: "local",
            size: Some(size_attribute(volume.size)),
            placement: ANY_PLACEMENT,
            read_only: None,
            dataset: None,
        }
    }
}

impl<'a> From<&'a RemoteStorageDevice> for Blockstore<'a> {
    fn from(device: &'a RemoteStorageDevice) -> Self {
        Self {
            name: &device.id,
            mount_point: &device.mount_path,
            class: "remote",
            size: None,
            placement: ANY_PLACEMENT,
            read_only: Some(false),
            dataset: Some(device.dataset_uri.as_str()).filter(|uri| !uri.is_empty()),
        }
    }
}

/// Elastic volumes are requested as zero-sized, which the engine reads as "all remaining space".
fn size_attribute(size: VolumeSize) -> String {
    match size {
        VolumeSize::Elastic => "0GB".into(),
        VolumeSize::Gigabytes(gb) => format!("{gb}GB"),
    }
}

#[derive(Debug, Serialize)]
struct LinkElement<'a> {
    #[serde(rename = "@client_id")]
    client_id: &'a str,

    #[serde(rename = "interface_ref")]
    interface_refs: Vec<ClientIdElement<'a>>,

    #[serde(rename = "emulab:best_effort", skip_serializing_if = "Option::is_none")]
    best_effort: Option<Enabled>,

    #[serde(rename = "emulab:vlan_tagging", skip_serializing_if = "Option::is_none")]
    vlan_tagging: Option<Enabled>,

    #[serde(
        rename = "emulab:link_multiplexing",
        skip_serializing_if = "Option::is_none"
    )]
    link_multiplexing: Option<Enabled>,

    #[serde(skip_serializing_if = "Option::is_none")]
    link_type: Option<NamedElement<'static>>,
}

impl<'a> LinkElement<'a> {
    fn new(
        client_id: &'a str,
        interfaces: &'a [String],
        flags: LinkFlags,
        link_type: Option<&'static str>,
    ) -> Self {
        let flag = |f: LinkFlags| flags.contains(f).then_some(Enabled { enabled: true });
        Self {
            client_id,
            interface_refs: interfaces
                .iter()
                .map(|client_id| ClientIdElement { client_id })
                .collect(),
            best_effort: flag(LinkFlags::BEST_EFFORT),
            vlan_tagging: flag(LinkFlags::VLAN_TAGGING),
            link_multiplexing: flag(LinkFlags::LINK_MULTIPLEXING),
            link_type: link_type.map(|name| NamedElement { name }),
        }
    }
}

impl<'a> From<&'a Lan> for LinkElement<'a> {
    fn from(lan: &'a Lan) -> Self {
        Self::new(&lan.id, &lan.interfaces, lan.flags, Some(LAN_LINK_TYPE))
    }
}

impl<'a> From<&'a Link> for LinkElement<'a> {
    fn from(link: &'a Link) -> Self {
        Self::new(&link.id, &link.interfaces, link.flags, None)
    }
}

#[derive(Debug, Serialize)]
struct Enabled {
    #[serde(rename = "@enabled")]
    enabled: bool,
}
