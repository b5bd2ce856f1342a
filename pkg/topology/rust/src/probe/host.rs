// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::errors::Result;
use crate::probe::Reporter;
use crate::report::{NodeMetadata, Report, Topology, TopologyKind, keys, make_host_node_id};

/// Hostname of the machine, or "unknown" when the OS will not say.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reports a single node describing the local host.
pub struct HostReporter {
    host_id: String,
    host_name: String,
    proc_root: PathBuf,
}

impl HostReporter {
    pub fn new(
        host_id: impl Into<String>,
        host_name: impl Into<String>,
        proc_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host_id: host_id.into(),
            host_name: host_name.into(),
            proc_root: proc_root.into(),
        }
    }

    /// The three load averages from `loadavg`, space separated.
    fn load(&self) -> Option<String> {
        let raw = self.read("loadavg")?;
        let load: Vec<&str> = raw.split_whitespace().take(3).collect();
        (load.len() == 3).then(|| load.join(" "))
    }

    /// Whole seconds since boot, from `uptime`.
    fn uptime(&self) -> Option<String> {
        let raw = self.read("uptime")?;
        let seconds: f64 = raw.split_whitespace().next()?.parse().ok()?;
        Some(format!("{}", seconds.trunc()))
    }

    fn read(&self, file: &str) -> Option<String> {
        let path = self.proc_root.join(file);
        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) => {
                debug!("[host] cannot read {}: {e}", path.display());
                None
            }
        }
    }
}

impl Reporter for HostReporter {
    fn name(&self) -> &str {
        "host"
    }

    fn report(&self) -> Result<Report> {
        let mut metadata = NodeMetadata::new()
            .with(keys::HOST_NAME, self.host_name.as_str())
            .with(keys::OS, std::env::consts::OS);
        if let Some(load) = self.load() {
            metadata.insert(keys::LOAD, load);
        }
        if let Some(uptime) = self.uptime() {
            metadata.insert(keys::UPTIME, uptime);
        }

        let topology = Topology::new().with_node(make_host_node_id(&self.host_id), metadata);
        Ok(Report::new().with_topology(TopologyKind::Host, topology))
    }
}
