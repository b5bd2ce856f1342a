// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id_list::IDList;
use crate::report::NodeMetadata;

/// One kind of graph (processes, containers, ...): per-node metadata plus
/// the outgoing edges of every node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    adjacency: BTreeMap<String, IDList>,
    #[serde(default)]
    node_metadatas: BTreeMap<String, NodeMetadata>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a node, merging `metadata` into whatever is already known.
    pub fn add_node(&mut self, id: impl Into<String>, metadata: NodeMetadata) {
        self.node_metadatas
            .entry(id.into())
            .or_default()
            .merge(&metadata);
    }

    /// Builder form of [`Topology::add_node`].
    pub fn with_node(mut self, id: impl Into<String>, metadata: NodeMetadata) -> Self {
        self.add_node(id, metadata);
        self
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.adjacency.entry(from.into()).or_default().add([to.into()]);
    }

    /// Builder form of [`Topology::add_edge`].
    pub fn with_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.add_edge(from, to);
        self
    }

    /// Node-wise union. Metadata merges with the right-hand-wins policy of
    /// [`NodeMetadata::merge`], adjacency is a sorted-set union.
    pub fn merge(&mut self, other: &Topology) {
        for (id, metadata) in &other.node_metadatas {
            match self.node_metadatas.get_mut(id) {
                Some(existing) => existing.merge(metadata),
                None => {
                    self.node_metadatas.insert(id.clone(), metadata.clone());
                }
            }
        }
        for (id, targets) in &other.adjacency {
            match self.adjacency.get_mut(id) {
                Some(existing) => *existing = existing.merge(targets),
                None => {
                    self.adjacency.insert(id.clone(), targets.clone());
                }
            }
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeMetadata> {
        self.node_metadatas.get(id)
    }

    pub fn adjacent(&self, id: &str) -> Option<&IDList> {
        self.adjacency.get(id)
    }

    /// A node exists once it has metadata or outgoing edges.
    pub fn contains(&self, id: &str) -> bool {
        self.node_metadatas.contains_key(id) || self.adjacency.contains_key(id)
    }

    /// Every node id, sorted and deduplicated.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        let ids: BTreeSet<&str> = self
            .node_metadatas
            .keys()
            .chain(self.adjacency.keys())
            .map(String::as_str)
            .collect();
        ids.into_iter()
    }

    pub fn node_metadatas(&self) -> impl Iterator<Item = (&str, &NodeMetadata)> {
        self.node_metadatas.iter().map(|(id, md)| (id.as_str(), md))
    }

    pub fn adjacency(&self) -> impl Iterator<Item = (&str, &IDList)> {
        self.adjacency.iter().map(|(id, targets)| (id.as_str(), targets))
    }

    pub fn is_empty(&self) -> bool {
        self.node_metadatas.is_empty() && self.adjacency.is_empty()
    }
}
