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
use dd_topology::api::{self, ApiState};
use dd_topology::config::{self, AppConfig, DEFAULT_APP_CONFIG};
use dd_topology::xfer::Collector;
use dd_topology::TopologyRegistry;
use log::info;
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};

#[derive(Parser, Debug)]
#[command(name = "dd-topology-app")]
#[command(about = "Aggregates probe reports and serves topology views over HTTP")]
#[command(version)]
struct Args {
    /// YAML config file (defaults to $DD_TOPOLOGY_CONFIG, then /etc/datadog-agent/topology-app.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to serve the HTTP API on
    #[arg(long)]
    listen: Option<String>,

    /// Probe to collect from, as host:port. Repeatable; replaces the configured list.
    #[arg(long = "probe")]
    probes: Vec<String>,

    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut AppConfig) {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if !self.probes.is_empty() {
            config.probes = self.probes;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();
    let path = config::config_path(args.config.take());
    let mut config: AppConfig = config::load(path.as_deref(), Path::new(DEFAULT_APP_CONFIG))?;
    args.apply(&mut config);
    config.validate()?;

    let log_level = config::log_level(&config.log_level);
    simple_logger::init_with_level(log_level)?;
    info!(
        "dd-topology-app starting (version {})",
        env!("CARGO_PKG_VERSION")
    );

    let listener = TcpListener::bind(config.listen.as_str())
        .await
        .with_context(|| format!("failed to listen on {}", config.listen))?;

    let collector = Arc::new(Collector::new());
    for probe in &config.probes {
        info!("collecting from probe {probe}");
        collector.connect(probe.as_str(), config.reconnect_backoff());
    }

    let state = Arc::new(ApiState {
        registry: TopologyRegistry::standard(),
        collector: Arc::clone(&collector),
    });

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    };

    api::serve(listener, state, shutdown)
        .await
        .context("HTTP server failed")?;
    collector.stop();
    info!("dd-topology-app stopped");
    Ok(())
}
