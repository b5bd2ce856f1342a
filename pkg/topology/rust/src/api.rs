// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Read-only HTTP queries over the app's aggregate.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{debug, error, info};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;

use crate::errors::Result;
use crate::views::TopologyRegistry;
use crate::xfer::Collector;

static NOTFOUND: &[u8] = b"Not found";
static INTERNAL_ERROR: &[u8] = b"Internal server error";

pub struct ApiState {
    pub registry: TopologyRegistry,
    pub collector: Arc<Collector>,
}

type Body = BoxBody<Bytes, std::io::Error>;

fn to_json<T: Serialize>(value: &T) -> (StatusCode, Vec<u8>) {
    match serde_json::to_vec(value) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!("Failed to serialize response: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_vec())
        }
    }
}

fn not_found() -> (StatusCode, Vec<u8>) {
    (StatusCode::NOT_FOUND, NOTFOUND.to_vec())
}

fn query_result<T: Serialize>(result: Result<T>) -> (StatusCode, Vec<u8>) {
    match result {
        Ok(value) => to_json(&value),
        Err(e) if e.is_not_found() => {
            debug!("{e}");
            not_found()
        }
        Err(e) => {
            error!("query failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_vec())
        }
    }
}

/// Splits a path on `/` and percent-decodes each segment. Ids holding a
/// literal `/` arrive as `%2F` and stay within one segment. Segments that
/// are not UTF-8 once decoded yield `None`.
fn decode_segments(path: &str) -> Option<Vec<String>> {
    path.split('/')
        .map(|segment| {
            percent_decode_str(segment)
                .decode_utf8()
                .ok()
                .map(Cow::into_owned)
        })
        .collect()
}

/// Answers one request against a snapshot of the aggregate.
///
/// `/api/topology/{view}` renders a view, `/{view}/{node}` details one
/// node and `/{view}/{local}/{remote}` one edge.
pub fn route(method: &Method, path: &str, state: &ApiState) -> (StatusCode, Vec<u8>) {
    if method != Method::GET {
        debug!("{method} request to {path} rejected");
        return not_found();
    }

    let report = state.collector.report();
    let path = path.trim_end_matches('/');

    if path == "/api" {
        return to_json(&json!({ "version": env!("CARGO_PKG_VERSION") }));
    }
    if path == "/api/report" {
        return to_json(&*report);
    }
    if path == "/api/topology" {
        return to_json(&state.registry.descriptions(&report));
    }
    if let Some(rest) = path.strip_prefix("/api/topology/") {
        let Some(segments) = decode_segments(rest) else {
            debug!("undecodable path: {path}");
            return not_found();
        };
        return match segments.as_slice() {
            [view] => query_result(
                state
                    .registry
                    .render(view, &report)
                    .map(|nodes| json!({ "nodes": nodes })),
            ),
            [view, node] => query_result(
                state
                    .registry
                    .node(view, node, &report)
                    .map(|node| json!({ "node": node })),
            ),
            [view, local, remote] => query_result(
                state
                    .registry
                    .edge(view, local, remote, &report)
                    .map(|edge| json!({ "edge": edge })),
            ),
            _ => not_found(),
        };
    }
    if let Some(id) = path.strip_prefix("/api/origin/host/") {
        return match decode_segments(id).as_deref() {
            Some([id]) => match report.origin_host(id) {
                Some(metadata) => to_json(metadata),
                None => not_found(),
            },
            _ => not_found(),
        };
    }

    debug!("{method} request to unknown endpoint: {path}");
    not_found()
}

fn respond(status: StatusCode, body: Vec<u8>) -> Response<Body> {
    let content_type = if status == StatusCode::OK {
        "application/json"
    } else {
        "text/plain"
    };
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .body(Full::new(Bytes::from(body)).map_err(|e| match e {}).boxed())
        .unwrap_or_else(|e| {
            error!("Failed to build response: {e}");
            Response::new(Full::new(Bytes::from(INTERNAL_ERROR)).map_err(|e| match e {}).boxed())
        })
}

async fn handle_request(req: Request<hyper::body::Incoming>, state: Arc<ApiState>) -> Response<Body> {
    let (status, body) = route(req.method(), req.uri().path(), &state);
    respond(status, body)
}

/// Serves the query API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ApiState>,
    shutdown: impl Future<Output = ()>,
) -> std::io::Result<()> {
    info!("serving topology API on {}", listener.local_addr()?);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("accept failed: {e}");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::task::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, std::convert::Infallible>(handle_request(req, state).await) }
                    });
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {peer}: {err}");
                    }
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::report::{NodeMetadata, Report, Topology, TopologyKind, keys};

    fn state() -> ApiState {
        let collector = Arc::new(Collector::new());
        collector.add(
            &Report::new()
                .with_topology(
                    TopologyKind::Process,
                    Topology::new()
                        .with_node("h;1", NodeMetadata::new().with(keys::COMM, "curl"))
                        .with_node("h;2", NodeMetadata::new().with(keys::COMM, "nginx"))
                        .with_node("h;a/b", NodeMetadata::new().with(keys::COMM, "slashed"))
                        .with_edge("h;1", "h;2")
                        .with_edge("h;1", "h;a/b"),
                )
                .with_topology(
                    TopologyKind::Host,
                    Topology::new().with_node("h;<host>", NodeMetadata::new().with(keys::HOST_NAME, "h")),
                ),
        );
        ApiState {
            registry: TopologyRegistry::standard(),
            collector,
        }
    }

    fn get(path: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = route(&Method::GET, path, &state());
        let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[test]
    fn test_api_version() {
        let (status, body) = get("/api");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_topology_list() {
        let (status, body) = get("/api/topology");
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["applications", "containers", "hosts"]);
    }

    #[test]
    fn test_topology_view() {
        let (status, body) = get("/api/topology/applications-by-name");
        assert_eq!(status, StatusCode::OK);
        let nodes = body["nodes"].as_object().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes["curl"]["adjacency"][0], "nginx");
    }

    #[test]
    fn test_topology_node() {
        let (status, body) = get("/api/topology/applications/h;1");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["node"]["id"], "h;1");
        assert_eq!(body["node"]["origin_nodes"][0]["id"], "h;1");
    }

    #[test]
    fn test_topology_node_percent_encoded() {
        let (status, body) = get("/api/topology/hosts/h%3B%3Chost%3E");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["node"]["id"], "h;<host>");

        let (status, body) = get("/api/topology/applications/h%3Ba%2Fb");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["node"]["id"], "h;a/b");
    }

    #[test]
    fn test_topology_edge() {
        let (status, body) = get("/api/topology/applications/h;1/h;2");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["edge"]["local"], "h;1");
        assert_eq!(body["edge"]["remote"], "h;2");
        assert_eq!(body["edge"]["metadata"][keys::COMM], "nginx");

        let (status, body) = get("/api/topology/applications-by-name/curl/slashed");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["edge"]["remote"], "slashed");
    }

    #[test]
    fn test_origin_host() {
        for path in ["/api/origin/host/h;<host>", "/api/origin/host/h%3B%3Chost%3E"] {
            let (status, body) = get(path);
            assert_eq!(status, StatusCode::OK, "{path}");
            assert_eq!(body[keys::HOST_NAME], "h");
        }
    }

    #[test]
    fn test_raw_report() {
        let (status, body) = get("/api/report");
        assert_eq!(status, StatusCode::OK);
        assert!(body["process"]["node_metadatas"]["h;1"].is_object());
    }

    #[test]
    fn test_not_found() {
        for path in [
            "/api/topology/no-such-view",
            "/api/topology/applications/h;404",
            "/api/topology/applications/h;2/h;1",
            "/api/topology/applications/h;1/h;2/extra",
            "/api/topology/applications/h%3B%FF",
            "/api/origin/host/nowhere",
            "/api/origin/host/h;<host>/extra",
            "/api/origin/host/%FF",
            "/metrics",
        ] {
            let (status, body) = route(&Method::GET, path, &state());
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body, NOTFOUND);
        }
    }

    #[test]
    fn test_only_get_is_served() {
        let (status, _) = route(&Method::POST, "/api/report", &state());
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
