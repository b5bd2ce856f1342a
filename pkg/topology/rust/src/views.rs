// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::{Error, Result};
use crate::render::{self, DetailedNode, EdgeDetails, RenderableNodes, Renderer};
use crate::report::{Report, TopologyKind, keys};

/// A named, renderer-backed projection of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyView {
    pub label: String,
    /// Grouped views drill down from their parent; top-level views have none.
    pub parent: Option<String>,
    pub renderer: Renderer,
}

impl TopologyView {
    pub fn new(label: impl Into<String>, renderer: Renderer) -> Self {
        Self {
            label: label.into(),
            parent: None,
            renderer,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Entry of the view listing served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyDescription {
    pub id: String,
    pub name: String,
    pub url: String,
    pub stats: TopologyStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_topologies: Vec<TopologyDescription>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopologyStats {
    pub node_count: usize,
}

/// The fixed table of views, keyed by stable id. Built once at startup and
/// shared read-only with the query layer.
#[derive(Debug, Clone, Default)]
pub struct TopologyRegistry {
    views: BTreeMap<String, TopologyView>,
}

impl TopologyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(mut self, id: impl Into<String>, view: TopologyView) -> Self {
        self.views.insert(id.into(), view);
        self
    }

    /// The views served by the app.
    pub fn standard() -> Self {
        Self::new()
            .with_view(
                "applications",
                TopologyView::new(
                    "Applications",
                    Renderer::Topology(TopologyKind::Process).filter_unconnected(),
                ),
            )
            .with_view(
                "applications-by-name",
                TopologyView::new(
                    "by name",
                    Renderer::grouped(TopologyKind::Process, keys::COMM).filter_unconnected(),
                )
                .with_parent("applications"),
            )
            .with_view(
                "containers",
                TopologyView::new("Containers", Renderer::Topology(TopologyKind::Container)),
            )
            .with_view(
                "containers-by-image",
                TopologyView::new(
                    "by image",
                    Renderer::grouped(TopologyKind::Container, keys::IMAGE_NAME),
                )
                .with_parent("containers"),
            )
            .with_view(
                "hosts",
                TopologyView::new("Hosts", Renderer::Topology(TopologyKind::Host)),
            )
    }

    pub fn get(&self, id: &str) -> Result<&TopologyView> {
        self.views
            .get(id)
            .ok_or_else(|| Error::ViewNotFound(id.to_string()))
    }

    pub fn render(&self, id: &str, report: &Report) -> Result<RenderableNodes> {
        Ok(self.get(id)?.renderer.render(report))
    }

    pub fn node(&self, id: &str, node_id: &str, report: &Report) -> Result<DetailedNode> {
        let view = self.get(id)?;
        render::node_details(report, id, &view.renderer, node_id)
    }

    pub fn edge(&self, id: &str, local: &str, remote: &str, report: &Report) -> Result<EdgeDetails> {
        let view = self.get(id)?;
        render::edge_details(report, id, &view.renderer, local, remote)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Top-level views with their children nested under them. A view whose
    /// parent is not registered is listed at the top level.
    pub fn descriptions(&self, report: &Report) -> Vec<TopologyDescription> {
        let describe = |id: &str, view: &TopologyView| TopologyDescription {
            id: id.to_string(),
            name: view.label.clone(),
            url: format!("/api/topology/{id}"),
            stats: TopologyStats {
                node_count: view.renderer.render(report).len(),
            },
            sub_topologies: Vec::new(),
        };

        let is_top_level = |view: &TopologyView| {
            view.parent
                .as_deref()
                .is_none_or(|parent| !self.views.contains_key(parent))
        };

        self.views
            .iter()
            .filter(|(_, view)| is_top_level(*view))
            .map(|(id, view)| {
                let mut description = describe(id.as_str(), view);
                description.sub_topologies = self
                    .views
                    .iter()
                    .filter(|(_, child)| child.parent.as_deref() == Some(id.as_str()))
                    .map(|(child_id, child)| describe(child_id.as_str(), child))
                    .collect();
                description
            })
            .collect()
    }
}
