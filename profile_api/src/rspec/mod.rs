//! # RSpec serializer
//!
//! Writes a [`ResourceGraph`] as a GENI RSpec v3 request document. Nodes are written in creation
//! order with the remote storage device right after the storage server, followed by the shared
//! LAN and the storage link. Boot actions and interface references keep their graph order, so
//! the same graph always yields the same bytes.

use log::debug;
use quick_xml::{
    events::{BytesDecl, Event},
    SeError, Writer,
};

use crate::graph::ResourceGraph;

mod elements;

use elements::Rspec;

const XML_HEADER_VERSION: &str = "1.0";
const XML_HEADER_ENCODING: &str = "UTF-8";
const ROOT_TAG: &str = "rspec";
const INDENT_SIZE: usize = 2;

/// Serializes `graph` into an indented request RSpec.
pub fn to_xml(graph: &ResourceGraph) -> Result<String, SeError> {
    let mut data = Vec::new();
    let mut writer = Writer::new_with_indent(&mut data, b' ', INDENT_SIZE);
    writer.write_event(Event::Decl(BytesDecl::new(
        XML_HEADER_VERSION,
        Some(XML_HEADER_ENCODING),
        None,
    )))?;
    writer.write_serializable(ROOT_TAG, &Rspec::from(graph))?;
    data.push(b'\n');

    debug!("Serialized request RSpec ({} bytes)", data.len());
    String::from_utf8(data).map_err(|e| SeError::Custom(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use quick_xml::{events::BytesStart, Reader};

    use crate::{
        config::{Options, Variant},
        constants::OS_IMAGES,
        graph::ResourceGraphBuilder,
        validation::ProfileParameters,
    };

    use super::*;

    /// An element of the document: its name and attributes.
    #[derive(Debug)]
    struct Element {
        name: String,
        attributes: BTreeMap<String, String>,
    }

    impl Element {
        fn attr(&self, name: &str) -> Option<&str> {
            self.attributes.get(name).map(String::as_str)
        }
    }

    fn element(start: &BytesStart) -> Element {
        Element {
            name: String::from_utf8(start.name().as_ref().to_vec()).unwrap(),
            attributes: start
                .attributes()
                .map(|a| {
                    let a = a.unwrap();
                    (
                        String::from_utf8(a.key.as_ref().to_vec()).unwrap(),
                        a.unescape_value().unwrap().into_owned(),
                    )
                })
                .collect(),
        }
    }

    /// Returns every element of `xml` in document order.
    fn parse_elements(xml: &str) -> Vec<Element> {
        let mut reader = Reader::from_str(xml);
        let mut elements = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => elements.push(element(&e)),
                Event::Eof => break,
                _ => (),
            }
        }
        elements
    }

    fn named<'a>(elements: &'a [Element], name: &'a str) -> impl Iterator<Item = &'a Element> {
        elements.iter().filter(move |e| e.name == name)
    }

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

    fn render(options: Options, params: &ProfileParameters) -> String {
        to_xml(&ResourceGraphBuilder::new(options).build(params)).unwrap()
    }

    #[test]
    fn test_header_and_root() {
        let xml = render(Options::default(), &params(1));
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));

        let elements = parse_elements(&xml);
        let root = &elements[0];
        assert_eq!(root.name, "rspec");
        assert_eq!(root.attr("type"), Some("request"));
        assert_eq!(
            root.attr("xmlns"),
            Some("http://www.geni.net/resources/rspec/3")
        );
        assert_eq!(
            root.attr("xmlns:emulab"),
            Some("http://www.protogeni.net/resources/rspec/ext/emulab/1")
        );

        assert_eq!(elements[1].name, "rspec_tour");
        assert_eq!(named(&elements, "description").count(), 1);
        assert_eq!(
            named(&elements, "instructions").next().unwrap().attr("type"),
            Some("markdown")
        );
    }

    #[test]
    fn test_nodes_and_links() {
        let xml = render(Options::default(), &params(3));
        let elements = parse_elements(&xml);

        let nodes = named(&elements, "node")
            .map(|n| n.attr("client_id").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(nodes, vec!["nfs_server", "dsnode", "vm0", "vm1", "vm2"]);

        let links = named(&elements, "link")
            .map(|l| l.attr("client_id").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(links, vec!["nfs_lan", "dslink"]);

        let refs = named(&elements, "interface_ref")
            .map(|r| r.attr("client_id").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            refs,
            vec![
                "nfs_server:if0",
                "vm0:if0",
                "vm1:if0",
                "vm2:if0",
                "dsnode:if0",
                "nfs_server:if1"
            ]
        );

        // Only the shared LAN is typed.
        assert_eq!(named(&elements, "link_type").count(), 1);
        for flag in [
            "emulab:best_effort",
            "emulab:vlan_tagging",
            "emulab:link_multiplexing",
        ] {
            let flags = named(&elements, flag).collect::<Vec<_>>();
            assert_eq!(flags.len(), 2);
            assert!(flags.iter().all(|f| f.attr("enabled") == Some("true")));
        }

        let executes = named(&elements, "execute").collect::<Vec<_>>();
        assert_eq!(executes.len(), 4);
        assert_eq!(
            executes[0].attr("command"),
            Some("sudo /bin/bash /local/repository/nfs-server.sh")
        );
        assert!(executes[1..]
            .iter()
            .all(|e| e.attr("command") == Some("sudo /bin/bash /local/repository/nfs-client.sh")
                && e.attr("shell") == Some("sh")));

        let images = named(&elements, "disk_image").collect::<Vec<_>>();
        assert_eq!(images.len(), 4);
        assert!(images.iter().all(|i| i.attr("name") == Some(OS_IMAGES[2].0)));
        assert_eq!(named(&elements, "hardware_type").count(), 0);
    }

    #[test]
    fn test_storage_device() {
        let xml = render(Options::default(), &params(0));
        let elements = parse_elements(&xml);

        let device = named(&elements, "node")
            .find(|n| n.attr("client_id") == Some("dsnode"))
            .unwrap();
        assert_eq!(device.attr("exclusive"), Some("false"));

        let blockstore = named(&elements, "emulab:blockstore").next().unwrap();
        assert_eq!(blockstore.attr("name"), Some("dsnode"));
        assert_eq!(blockstore.attr("mountpoint"), Some("/nfs_data"));
        assert_eq!(blockstore.attr("class"), Some("remote"));
        assert_eq!(blockstore.attr("dataset"), Some("urn:example:dataset"));
        assert_eq!(blockstore.attr("readonly"), Some("false"));

        let xml = render(
            Options::default(),
            &ProfileParameters {
                dataset_uri: String::new(),
                ..params(0)
            },
        );
        let elements = parse_elements(&xml);
        let blockstore = named(&elements, "emulab:blockstore").next().unwrap();
        assert_eq!(blockstore.attr("dataset"), None);
    }

    #[test]
    fn test_scratch_volumes() {
        let xml = render(
            Options::from(Variant::Scratch),
            &ProfileParameters {
                node_type: Some("d430".into()),
                user_name: Some("alice".into()),
                ..params(2)
            },
        );
        let elements = parse_elements(&xml);

        let local = named(&elements, "emulab:blockstore")
            .filter(|b| b.attr("class") == Some("local"))
            .collect::<Vec<_>>();
        assert_eq!(local.len(), 2);
        assert_eq!(local[0].attr("name"), Some("vm0-bs"));
        assert_eq!(local[0].attr("mountpoint"), Some("/mydata"));
        assert_eq!(local[0].attr("size"), Some("0GB"));
        assert_eq!(local[0].attr("placement"), Some("any"));

        let commands = named(&elements, "execute")
            .map(|e| e.attr("command").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            commands,
            vec![
                "sudo /bin/bash /local/repository/nfs-server.sh",
                "sudo /bin/bash /local/repository/nfs-client.sh",
                "sudo chown -R alice /mydata",
                "sudo /bin/bash /local/repository/nfs-client.sh",
                "sudo chown -R alice /mydata",
            ]
        );

        let hardware = named(&elements, "hardware_type").collect::<Vec<_>>();
        assert_eq!(hardware.len(), 2);
        assert!(hardware.iter().all(|h| h.attr("name") == Some("d430")));
    }

    #[test]
    fn test_byte_identical() {
        let options = Options::from(Variant::Scratch);
        let params = ProfileParameters {
            user_name: Some("bob".into()),
            ..params(8)
        };
        assert_eq!(render(options, &params), render(options, &params));
    }
}
