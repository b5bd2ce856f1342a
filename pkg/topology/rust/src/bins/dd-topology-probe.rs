// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dd_topology::config::{self, DEFAULT_PROBE_CONFIG, ProbeConfig};
use dd_topology::probe::host::{HostReporter, local_hostname};
use dd_topology::probe::process::ProcessReporter;
use dd_topology::probe::tag::{OriginHostTagger, TopologyTagger};
use dd_topology::probe::Probe;
use dd_topology::xfer::TcpPublisher;
use log::info;
use tokio::signal::unix::{SignalKind, signal};

#[derive(Parser, Debug)]
#[command(name = "dd-topology-probe")]
#[command(about = "Reports the topology of this host to connected apps")]
#[command(version)]
struct Args {
    /// YAML config file (defaults to $DD_TOPOLOGY_CONFIG, then /etc/datadog-agent/topology-probe.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to publish reports on
    #[arg(long)]
    listen: Option<String>,

    /// Where procfs is mounted
    #[arg(long)]
    proc_root: Option<PathBuf>,

    /// Identifier of this host in node ids (defaults to the hostname)
    #[arg(long)]
    host_id: Option<String>,

    #[arg(long)]
    log_level: Option<String>,

    /// Do not report processes
    #[arg(long)]
    no_processes: bool,
}

impl Args {
    fn apply(self, config: &mut ProbeConfig) {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(proc_root) = self.proc_root {
            config.proc_root = proc_root;
        }
        if let Some(host_id) = self.host_id {
            config.host_id = Some(host_id);
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        if self.no_processes {
            config.processes = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();
    let path = config::config_path(args.config.take());
    let mut config: ProbeConfig = config::load(path.as_deref(), Path::new(DEFAULT_PROBE_CONFIG))?;
    args.apply(&mut config);
    config.validate()?;

    let log_level = config::log_level(&config.log_level);
    simple_logger::init_with_level(log_level)?;
    info!(
        "dd-topology-probe starting (version {})",
        env!("CARGO_PKG_VERSION")
    );

    let host_name = local_hostname();
    let host_id = config.host_id.clone().unwrap_or_else(|| host_name.clone());
    info!("reporting as host {host_id}");

    let publisher = Arc::new(
        TcpPublisher::bind(config.listen.as_str())
            .await
            .with_context(|| format!("failed to listen on {}", config.listen))?,
    );

    let mut probe = Probe::new(publisher, config.intervals()).with_reporter(HostReporter::new(
        host_id.as_str(),
        host_name,
        config.proc_root.clone(),
    ));
    if config.processes {
        probe = probe.with_reporter(ProcessReporter::new(config.proc_root.clone(), host_id.as_str()));
    }
    let probe = probe
        .with_tagger(TopologyTagger)
        .with_tagger(OriginHostTagger::new(&host_id));

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    };

    probe.run(shutdown).await;
    info!("dd-topology-probe stopped");
    Ok(())
}
