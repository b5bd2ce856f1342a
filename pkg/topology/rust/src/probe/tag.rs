// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::probe::Tagger;
use crate::report::{NodeMetadata, Report, Topology, TopologyKind, keys, make_host_node_id};

/// Applies each tagger in order.
pub fn apply(report: Report, taggers: &[Box<dyn Tagger>]) -> Report {
    taggers
        .iter()
        .fold(report, |report, tagger| tagger.apply(report))
}

/// Builds a decoration report that sets `key` on every node of `report` and
/// merges it in, so tagging can only add to what is already known.
fn tag_every_node(mut report: Report, key: &str, value: impl Fn(TopologyKind) -> String) -> Report {
    let mut tags = Report::new();
    for (kind, topology) in report.topologies() {
        let value = value(kind);
        let tagged = topology
            .node_ids()
            .fold(Topology::new(), |tagged, id| {
                tagged.with_node(id, NodeMetadata::new().with(key, value.as_str()))
            });
        tags = tags.with_topology(kind, tagged);
    }
    report.merge(&tags);
    report
}

/// Records which topology each node belongs to.
pub struct TopologyTagger;

impl Tagger for TopologyTagger {
    fn apply(&self, report: Report) -> Report {
        tag_every_node(report, keys::TOPOLOGY, |kind| kind.name().to_string())
    }
}

/// Records which host every node was observed on.
pub struct OriginHostTagger {
    host_node_id: String,
}

impl OriginHostTagger {
    pub fn new(host_id: &str) -> Self {
        Self {
            host_node_id: make_host_node_id(host_id),
        }
    }
}

impl Tagger for OriginHostTagger {
    fn apply(&self, report: Report) -> Report {
        tag_every_node(report, keys::HOST_NODE_ID, |_| self.host_node_id.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report::new()
            .with_topology(
                TopologyKind::Process,
                Topology::new()
                    .with_node("web1;1", NodeMetadata::new().with(keys::PID, "1"))
                    .with_edge("web1;2", "web1;1"),
            )
            .with_topology(
                TopologyKind::Host,
                Topology::new().with_node("web1;<host>", NodeMetadata::new()),
            )
    }

    #[test]
    fn test_topology_tagger() {
        let tagged = TopologyTagger.apply(report());

        let process = tagged.topology(TopologyKind::Process);
        assert_eq!(process.node("web1;1").unwrap().get(keys::TOPOLOGY), Some("process"));
        assert_eq!(process.node("web1;2").unwrap().get(keys::TOPOLOGY), Some("process"));
        let host = tagged.topology(TopologyKind::Host);
        assert_eq!(host.node("web1;<host>").unwrap().get(keys::TOPOLOGY), Some("host"));
    }

    #[test]
    fn test_taggers_never_drop_data() {
        let original = report();
        let tagged = OriginHostTagger::new("web1").apply(original.clone());

        // Tagging is a merge, so the original is contained in the result.
        assert_eq!(tagged.merged(&original), tagged);
        let node = tagged.topology(TopologyKind::Process).node("web1;1").unwrap();
        assert_eq!(node.get(keys::PID), Some("1"));
        assert_eq!(node.get(keys::HOST_NODE_ID), Some("web1;<host>"));
    }

    #[test]
    fn test_apply_in_order_and_idempotent() {
        let taggers: Vec<Box<dyn Tagger>> =
            vec![Box::new(TopologyTagger), Box::new(OriginHostTagger::new("web1"))];
        let once = apply(report(), &taggers);
        let twice = apply(once.clone(), &taggers);
        assert_eq!(once, twice);

        let node = once.topology(TopologyKind::Host).node("web1;<host>").unwrap();
        assert_eq!(node.get(keys::TOPOLOGY), Some("host"));
        assert_eq!(node.get(keys::HOST_NODE_ID), Some("web1;<host>"));
    }

    #[test]
    fn test_apply_no_taggers() {
        assert_eq!(apply(report(), &[]), report());
    }
}
