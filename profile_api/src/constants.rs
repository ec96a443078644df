use const_format::formatcp;

// Parameter names

/// Number of worker nodes.
pub const PARAM_NUM_NODES: &str = "num_nodes";

/// Disk image applied to every node.
pub const PARAM_OS_IMAGE: &str = "os_image";

/// Optional hardware type applied to every worker node.
pub const PARAM_NODE_TYPE: &str = "node_type";

/// Informational storage size, in GB.
pub const PARAM_STORAGE_SIZE: &str = "storage_size";

/// URI of the externally hosted dataset.
pub const PARAM_EXT_URI: &str = "ext_uri";

/// Account that owns the local scratch volume.
pub const PARAM_USER_NAME: &str = "user_name";

/// Acknowledgement of the data-handling policy.
pub const PARAM_AGREE: &str = "agree";

// Parameter defaults and bounds

/// Default number of worker nodes.
pub const DEFAULT_NUM_NODES: i64 = 4;

/// Largest number of worker nodes that can be requested.
pub const MAX_NUM_NODES: i64 = 1024;

/// Minimum number of worker nodes when the minimum-node-count rule is enabled.
pub const MIN_NUM_NODES: u32 = 2;

/// Default informational storage size, in GB.
pub const DEFAULT_STORAGE_SIZE_GB: i64 = 250;

/// Hardware types are either empty or a testbed node type identifier.
pub const NODE_TYPE_PATTERN: &str = r"^([A-Za-z0-9][A-Za-z0-9_.\-]*)?$";

/// Scratch volume owners are either empty or a POSIX account name.
pub const USER_NAME_PATTERN: &str = r"^([a-z_][a-z0-9_-]*\$?)?$";

/// OS images offered by the profile, as `(urn, label)`.
pub const OS_IMAGES: [(&str, &str); 3] = [
    (
        "urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU20-64-STD",
        "UBUNTU 20.04",
    ),
    (
        "urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU18-64-STD",
        "UBUNTU 18.04",
    ),
    (
        "urn:publicid:IDN+emulab.net+image+emulab-ops//UBUNTU16-64-STD",
        "UBUNTU 16.04",
    ),
];

/// Index into [`OS_IMAGES`] of the default image.
pub const DEFAULT_OS_IMAGE_INDEX: usize = 2;

// Topology names

/// Shared LAN joining the storage server and every worker.
pub const SHARED_LAN_ID: &str = "nfs_lan";

/// Node serving the shared dataset over NFS.
pub const STORAGE_SERVER_ID: &str = "nfs_server";

/// Remote blockstore holding the dataset.
pub const STORAGE_DEVICE_ID: &str = "dsnode";

/// Dedicated link between the storage server and the remote blockstore.
pub const STORAGE_LINK_ID: &str = "dslink";

/// Prefix of worker node ids.
pub const WORKER_ID_PREFIX: &str = "vm";

/// Suffix appended to a node id to name its local blockstore.
pub const LOCAL_VOLUME_SUFFIX: &str = "-bs";

// Mount points

/// Where the dataset is mounted on the storage server and exported to workers.
pub const DATASET_MOUNT_PATH: &str = "/nfs_data";

/// Where the local scratch volume is mounted on each worker.
pub const SCRATCH_MOUNT_PATH: &str = "/mydata";

// Boot actions

/// Shell used to run every boot action.
pub const BOOT_ACTION_SHELL: &str = "sh";

/// Location of the profile repository on provisioned nodes.
pub const REPOSITORY_PATH: &str = "/local/repository";

/// Initialization command for the storage server.
pub const NFS_SERVER_COMMAND: &str = formatcp!("sudo /bin/bash {REPOSITORY_PATH}/nfs-server.sh");

/// Initialization command for workers.
pub const NFS_CLIENT_COMMAND: &str = formatcp!("sudo /bin/bash {REPOSITORY_PATH}/nfs-client.sh");

/// Ownership fix for the scratch volume, without the account name.
pub const SCRATCH_CHOWN_COMMAND_PREFIX: &str = "sudo chown -R";

// RSpec namespaces

pub const RSPEC_NAMESPACE: &str = "http://www.geni.net/resources/rspec/3";
pub const EMULAB_NAMESPACE: &str = "http://www.protogeni.net/resources/rspec/ext/emulab/1";
pub const CLIENT_NAMESPACE: &str = "http://www.protogeni.net/resources/rspec/ext/client/1";
pub const TOUR_NAMESPACE: &str = "http://www.protogeni.net/resources/rspec/ext/apt-tour/1";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const RSPEC_SCHEMA_LOCATION: &str =
    formatcp!("{RSPEC_NAMESPACE} {RSPEC_NAMESPACE}/request.xsd");

// Profile tour

/// Tour description shown by the testbed portal.
pub const TOUR_DESCRIPTION: &str = formatcp!(
    "This profile sets up an n-node cluster of machine along with a NFS server. The NFS server \
     uses a long term dataset that is persistent across experiments and is mounted at \
     `{DATASET_MOUNT_PATH}` on all nodes."
);

/// Tour instructions shown by the testbed portal.
pub const TOUR_INSTRUCTIONS: &str = formatcp!(
    "Click on any node in the topology and choose the `shell` menu item. Your shared NFS \
     directory is mounted at `{DATASET_MOUNT_PATH}` on all nodes."
);
