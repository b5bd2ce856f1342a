// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A reporter could not gather its data for this tick.
    #[error("reporter {reporter} failed: {context}")]
    Collection { reporter: String, context: String },

    #[error("reporter {reporter} did not finish within {}ms", timeout.as_millis())]
    ReporterTimeout { reporter: String, timeout: Duration },

    /// A peer sent bytes that do not decode to a report.
    #[error("malformed report: {0}")]
    Protocol(#[from] rmp_serde::decode::Error),

    #[error("could not encode report: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("topology view not found: {0}")]
    ViewNotFound(String),

    #[error("node {node} not found in topology view {view}")]
    NodeNotFound { view: String, node: String },

    #[error("no edge from {local} to {remote} in topology view {view}")]
    EdgeNotFound {
        view: String,
        local: String,
        remote: String,
    },
}

impl Error {
    /// Query errors are the caller's fault and map to "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ViewNotFound(_) | Error::NodeNotFound { .. } | Error::EdgeNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
