// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::PathBuf;

use crate::errors::{Error, Result};
use crate::probe::{Reporter, procfs};
use crate::report::{NodeMetadata, Report, Topology, TopologyKind, keys, make_process_node_id};

/// Reports the process table of the local host.
pub struct ProcessReporter {
    proc_root: PathBuf,
    host_id: String,
}

impl ProcessReporter {
    pub fn new(proc_root: impl Into<PathBuf>, host_id: impl Into<String>) -> Self {
        Self {
            proc_root: proc_root.into(),
            host_id: host_id.into(),
        }
    }
}

impl Reporter for ProcessReporter {
    fn name(&self) -> &str {
        "process"
    }

    fn report(&self) -> Result<Report> {
        let processes = procfs::walk(&self.proc_root).map_err(|e| Error::Collection {
            reporter: self.name().to_string(),
            context: format!("walking {}: {e}", self.proc_root.display()),
        })?;

        let mut topology = Topology::new();
        for p in processes {
            let pid = p.pid.to_string();
            let mut metadata = NodeMetadata::new()
                .with(keys::PID, pid.as_str())
                .with(keys::COMM, p.comm)
                .with(keys::CMDLINE, p.cmdline)
                .with(keys::THREADS, p.threads.to_string());
            if p.ppid > 0 {
                metadata.insert(keys::PPID, p.ppid.to_string());
            }
            topology.add_node(make_process_node_id(&self.host_id, &pid), metadata);
        }

        Ok(Report::new().with_topology(TopologyKind::Process, topology))
    }
}
