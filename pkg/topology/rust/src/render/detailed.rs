// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use serde::Serialize;

use crate::errors::{Error, Result};
use crate::render::{RenderableNode, Renderer};
use crate::report::{NodeMetadata, Report, TopologyKind};

/// A rendered node together with the raw nodes it summarizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedNode {
    #[serde(flatten)]
    pub node: RenderableNode,
    pub origin_nodes: Vec<OriginNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OriginNode {
    pub id: String,
    pub topology: TopologyKind,
    pub metadata: NodeMetadata,
}

/// Renders `view` and looks up one of its nodes. Origins that no longer
/// appear in any topology are skipped.
pub fn node_details(
    report: &Report,
    view: &str,
    renderer: &Renderer,
    node_id: &str,
) -> Result<DetailedNode> {
    let mut nodes = renderer.render(report);
    let node = nodes.remove(node_id).ok_or_else(|| Error::NodeNotFound {
        view: view.to_string(),
        node: node_id.to_string(),
    })?;

    let origin_nodes = node
        .origins
        .iter()
        .filter_map(|origin| {
            report.find_node(origin).map(|(topology, metadata)| OriginNode {
                id: origin.to_string(),
                topology,
                metadata: metadata.clone(),
            })
        })
        .collect();

    Ok(DetailedNode { node, origin_nodes })
}

/// One rendered edge and what is known about both of its ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeDetails {
    pub local: String,
    pub remote: String,
    /// Metadata of `local` merged with that of `remote`; `remote` wins on
    /// shared keys.
    pub metadata: NodeMetadata,
}

/// Renders `view` and looks up the edge `local -> remote`. The remote end
/// may be absent from the view when its topology has not reported it yet.
pub fn edge_details(
    report: &Report,
    view: &str,
    renderer: &Renderer,
    local: &str,
    remote: &str,
) -> Result<EdgeDetails> {
    let nodes = renderer.render(report);
    let not_found = || Error::EdgeNotFound {
        view: view.to_string(),
        local: local.to_string(),
        remote: remote.to_string(),
    };

    let local_node = nodes.get(local).ok_or_else(not_found)?;
    if !local_node.adjacency.contains(remote) {
        return Err(not_found());
    }

    let mut metadata = local_node.metadata.clone();
    if let Some(remote_node) = nodes.get(remote) {
        metadata.merge(&remote_node.metadata);
    }

    Ok(EdgeDetails {
        local: local.to_string(),
        remote: remote.to_string(),
        metadata,
    })
}
