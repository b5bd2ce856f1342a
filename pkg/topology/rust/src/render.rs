// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

mod detailed;
mod labels;

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::id_list::IDList;
use crate::report::{NodeMetadata, Report, Topology, TopologyKind};

pub use detailed::{DetailedNode, EdgeDetails, OriginNode, edge_details, node_details};

/// Group id for nodes that lack the grouping key.
pub const UNKNOWN_GROUP: &str = "unknown";

/// One node of a rendered view. It may summarize several raw nodes, listed
/// in `origins`; `adjacency` holds ids of other render nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderableNode {
    pub id: String,
    pub label_major: String,
    pub label_minor: String,
    pub rank: String,
    pub origins: IDList,
    pub adjacency: IDList,
    pub metadata: NodeMetadata,
}

pub type RenderableNodes = BTreeMap<String, RenderableNode>;

/// Turns a [`Report`] into render nodes.
///
/// Renderers compose by wrapping: `FilterUnconnected` owns the renderer it
/// decorates and never touches that renderer's output map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderer {
    /// Every raw node of one topology, 1:1, edges verbatim.
    Topology(TopologyKind),
    /// Raw nodes sharing the value of metadata `key` collapse into one.
    Grouped { topology: TopologyKind, key: String },
    /// Drops nodes with neither incoming nor outgoing edges.
    FilterUnconnected(Box<Renderer>),
}

impl Renderer {
    pub fn grouped(topology: TopologyKind, key: impl Into<String>) -> Self {
        Renderer::Grouped {
            topology,
            key: key.into(),
        }
    }

    pub fn filter_unconnected(self) -> Self {
        Renderer::FilterUnconnected(Box::new(self))
    }

    pub fn render(&self, report: &Report) -> RenderableNodes {
        match self {
            Renderer::Topology(kind) => render_topology(*kind, report.topology(*kind)),
            Renderer::Grouped { topology, key } => {
                render_grouped(*topology, key, report.topology(*topology))
            }
            Renderer::FilterUnconnected(inner) => filter_unconnected(&inner.render(report)),
        }
    }
}

fn render_topology(kind: TopologyKind, topology: &Topology) -> RenderableNodes {
    topology
        .node_ids()
        .map(|id| {
            let metadata = topology.node(id).cloned().unwrap_or_default();
            let labels = labels::for_node(kind, id, &metadata);
            let node = RenderableNode {
                id: id.to_string(),
                label_major: labels.major,
                label_minor: labels.minor,
                rank: labels.rank,
                origins: IDList::make([id]),
                adjacency: topology.adjacent(id).cloned().unwrap_or_default(),
                metadata,
            };
            (id.to_string(), node)
        })
        .collect()
}

fn render_grouped(kind: TopologyKind, key: &str, topology: &Topology) -> RenderableNodes {
    let group_of = |id: &str| -> String {
        topology
            .node(id)
            .and_then(|md| md.get(key))
            .unwrap_or(UNKNOWN_GROUP)
            .to_string()
    };

    let mut nodes = RenderableNodes::new();
    for id in topology.node_ids() {
        let group = group_of(id);
        let node = nodes
            .entry(group.clone())
            .or_insert_with(|| RenderableNode {
                id: group.clone(),
                label_major: group.clone(),
                rank: group,
                ..Default::default()
            });

        node.origins.add([id]);
        if let Some(metadata) = topology.node(id) {
            node.metadata.merge(metadata);
        }
        // Edges to nodes this topology has never seen cannot be grouped.
        if let Some(targets) = topology.adjacent(id) {
            node.adjacency.add(
                targets
                    .iter()
                    .filter(|target| topology.contains(target))
                    .map(group_of),
            );
        }
    }

    for node in nodes.values_mut() {
        node.label_minor = labels::group_minor(kind, node.origins.len());
    }
    nodes
}

/// Copy-on-filter: builds a new map holding the nodes that have at least
/// one outgoing edge or are the target of an edge from another render node.
fn filter_unconnected(nodes: &RenderableNodes) -> RenderableNodes {
    let mut connected: HashSet<&str> = HashSet::new();
    for node in nodes.values() {
        if node.adjacency.is_empty() {
            continue;
        }
        connected.insert(&node.id);
        connected.extend(
            node.adjacency
                .iter()
                .filter(|target| nodes.contains_key(*target)),
        );
    }

    nodes
        .iter()
        .filter(|(id, _)| connected.contains(id.as_str()))
        .map(|(id, node)| (id.clone(), node.clone()))
        .collect()
}
