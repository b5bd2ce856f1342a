// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

mod ids;
mod node_metadata;
mod topology;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use ids::{
    SCOPE_DELIM, make_address_node_id, make_container_node_id, make_endpoint_node_id,
    make_host_node_id, make_overlay_node_id, make_process_node_id, parse_node_id,
};
pub use node_metadata::NodeMetadata;
pub use topology::Topology;

/// Metadata keys shared between reporters, taggers and renderers.
pub mod keys {
    pub const PID: &str = "pid";
    pub const COMM: &str = "comm";
    pub const PPID: &str = "ppid";
    pub const CMDLINE: &str = "cmdline";
    pub const THREADS: &str = "threads";

    pub const HOST_NAME: &str = "host_name";
    pub const OS: &str = "os";
    pub const LOAD: &str = "load";
    pub const UPTIME: &str = "uptime";

    pub const CONTAINER_ID: &str = "container_id";
    pub const CONTAINER_NAME: &str = "container_name";
    pub const IMAGE_ID: &str = "image_id";
    pub const IMAGE_NAME: &str = "image_name";

    pub const TOPOLOGY: &str = "topology";
    pub const HOST_NODE_ID: &str = "host_node_id";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyKind {
    Endpoint,
    Process,
    Container,
    Host,
    Overlay,
}

impl TopologyKind {
    pub const ALL: [TopologyKind; 5] = [
        TopologyKind::Endpoint,
        TopologyKind::Process,
        TopologyKind::Container,
        TopologyKind::Host,
        TopologyKind::Overlay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TopologyKind::Endpoint => "endpoint",
            TopologyKind::Process => "process",
            TopologyKind::Container => "container",
            TopologyKind::Host => "host",
            TopologyKind::Overlay => "overlay",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TopologyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TopologyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown topology kind: {s}"))
    }
}

/// Everything a probe knows at one point in time, one [`Topology`] per kind.
///
/// A report is the unit of transport and the unit of merge. Merging is
/// commutative, associative and idempotent on nodes, edges and metadata
/// keys, so reports may arrive late, twice, or from many probes. When two
/// reports disagree on a metadata value the right-hand side wins.
///
/// Every field defaults to empty and unknown fields are ignored, so probes
/// and apps of different versions can talk to each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    endpoint: Topology,
    #[serde(default)]
    process: Topology,
    #[serde(default)]
    container: Topology,
    #[serde(default)]
    host: Topology,
    #[serde(default)]
    overlay: Topology,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(&self, kind: TopologyKind) -> &Topology {
        match kind {
            TopologyKind::Endpoint => &self.endpoint,
            TopologyKind::Process => &self.process,
            TopologyKind::Container => &self.container,
            TopologyKind::Host => &self.host,
            TopologyKind::Overlay => &self.overlay,
        }
    }

    /// Reports change only through merge; builders go through
    /// [`Report::with_topology`].
    fn topology_mut(&mut self, kind: TopologyKind) -> &mut Topology {
        match kind {
            TopologyKind::Endpoint => &mut self.endpoint,
            TopologyKind::Process => &mut self.process,
            TopologyKind::Container => &mut self.container,
            TopologyKind::Host => &mut self.host,
            TopologyKind::Overlay => &mut self.overlay,
        }
    }

    /// Builder used by reporters and tests: replaces the topology of `kind`
    /// with its merge with `topology`.
    pub fn with_topology(mut self, kind: TopologyKind, topology: Topology) -> Self {
        self.topology_mut(kind).merge(&topology);
        self
    }

    pub fn topologies(&self) -> impl Iterator<Item = (TopologyKind, &Topology)> {
        TopologyKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.topology(kind)))
    }

    pub fn merge(&mut self, other: &Report) {
        for kind in TopologyKind::ALL {
            self.topology_mut(kind).merge(other.topology(kind));
        }
    }

    /// Non-mutating form of [`Report::merge`].
    pub fn merged(&self, other: &Report) -> Report {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Finds the metadata of a node in whichever topology holds it.
    pub fn find_node(&self, id: &str) -> Option<(TopologyKind, &NodeMetadata)> {
        self.topologies()
            .find_map(|(kind, topology)| topology.node(id).map(|md| (kind, md)))
    }

    /// Metadata of the host node with the given host node id.
    pub fn origin_host(&self, host_node_id: &str) -> Option<&NodeMetadata> {
        self.host.node(host_node_id)
    }

    pub fn is_empty(&self) -> bool {
        self.topologies().all(|(_, topology)| topology.is_empty())
    }
}
