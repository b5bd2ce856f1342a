// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::report::{NodeMetadata, TopologyKind, keys, parse_node_id};

pub(super) struct Labels {
    pub major: String,
    pub minor: String,
    pub rank: String,
}

pub(super) fn for_node(kind: TopologyKind, id: &str, md: &NodeMetadata) -> Labels {
    let (scope, local) = parse_node_id(id).unwrap_or(("", id));
    let first = |candidates: &[&str], fallback: &str| -> String {
        candidates
            .iter()
            .find_map(|key| md.get(key))
            .unwrap_or(fallback)
            .to_string()
    };

    match kind {
        TopologyKind::Process => {
            let pid = md.get(keys::PID).unwrap_or(local);
            Labels {
                major: first(&[keys::COMM], pid),
                minor: format!("{scope} ({pid})"),
                rank: first(&[keys::COMM], ""),
            }
        }
        TopologyKind::Container => Labels {
            major: first(&[keys::CONTAINER_NAME, keys::CONTAINER_ID], local),
            minor: first(&[keys::IMAGE_NAME], scope),
            rank: first(&[keys::IMAGE_NAME], ""),
        },
        TopologyKind::Host => Labels {
            major: first(&[keys::HOST_NAME], scope),
            minor: first(&[keys::OS], ""),
            rank: first(&[keys::HOST_NAME], scope),
        },
        TopologyKind::Endpoint => Labels {
            major: local.replace(';', ":"),
            minor: scope.to_string(),
            rank: scope.to_string(),
        },
        TopologyKind::Overlay => Labels {
            major: scope.to_string(),
            minor: String::new(),
            rank: id.to_string(),
        },
    }
}

pub(super) fn group_minor(kind: TopologyKind, members: usize) -> String {
    let (one, many) = match kind {
        TopologyKind::Process => ("process", "processes"),
        TopologyKind::Container => ("container", "containers"),
        TopologyKind::Host => ("host", "hosts"),
        TopologyKind::Endpoint => ("endpoint", "endpoints"),
        TopologyKind::Overlay => ("peer", "peers"),
    };
    format!("{members} {}", if members == 1 { one } else { many })
}
