// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Node identifiers are `<scope>;<local id>` so that nodes reported by
//! different probes only collide when they describe the same entity.

/// Separates the scope (usually the host id) from the local part of an id.
pub const SCOPE_DELIM: char = ';';

const HOST_LOCAL_ID: &str = "<host>";
const OVERLAY_LOCAL_ID: &str = "<overlay>";

pub fn make_endpoint_node_id(host_id: &str, address: &str, port: &str) -> String {
    format!("{host_id}{SCOPE_DELIM}{address}{SCOPE_DELIM}{port}")
}

pub fn make_address_node_id(host_id: &str, address: &str) -> String {
    format!("{host_id}{SCOPE_DELIM}{address}")
}

pub fn make_process_node_id(host_id: &str, pid: &str) -> String {
    format!("{host_id}{SCOPE_DELIM}{pid}")
}

pub fn make_container_node_id(host_id: &str, container_id: &str) -> String {
    format!("{host_id}{SCOPE_DELIM}{container_id}")
}

pub fn make_host_node_id(host_id: &str) -> String {
    format!("{host_id}{SCOPE_DELIM}{HOST_LOCAL_ID}")
}

pub fn make_overlay_node_id(peer_name: &str) -> String {
    format!("{peer_name}{SCOPE_DELIM}{OVERLAY_LOCAL_ID}")
}

/// Splits an id into its scope and local part. Ids without a scope yield `None`.
pub fn parse_node_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(SCOPE_DELIM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_ids() {
        assert_eq!(make_process_node_id("host1", "42"), "host1;42");
        assert_eq!(make_host_node_id("host1"), "host1;<host>");
        assert_eq!(make_endpoint_node_id("host1", "10.0.0.1", "80"), "host1;10.0.0.1;80");
        assert_eq!(make_address_node_id("host1", "10.0.0.1"), "host1;10.0.0.1");
        assert_eq!(make_container_node_id("host1", "abc123"), "host1;abc123");
        assert_eq!(make_overlay_node_id("peer"), "peer;<overlay>");
    }

    #[test]
    fn test_parse_node_id() {
        assert_eq!(parse_node_id("host1;42"), Some(("host1", "42")));
        assert_eq!(
            parse_node_id("host1;10.0.0.1;80"),
            Some(("host1", "10.0.0.1;80"))
        );
        assert_eq!(parse_node_id("no-scope"), None);
    }
}
