// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{info, warn};
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::Result;
use crate::report::Report;
use crate::xfer::{decode_report, read_frame};

/// The app-side aggregate of every report received from every probe.
///
/// Readers get an immutable snapshot; a merge that races with a reader
/// copies the aggregate instead of mutating the snapshot.
///
/// The aggregate only grows. Nothing expires, so a process that exited
/// stays in every view until the app restarts.
pub struct Collector {
    report: Mutex<Arc<Report>>,
    stopped: watch::Sender<bool>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            report: Mutex::new(Arc::new(Report::new())),
            stopped,
        }
    }

    // Merges never panic, so a poisoned lock still guards a valid report.
    fn lock(&self) -> MutexGuard<'_, Arc<Report>> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, report: &Report) {
        let mut current = self.lock();
        Arc::make_mut(&mut current).merge(report);
    }

    /// Consistent snapshot of the aggregate.
    pub fn report(&self) -> Arc<Report> {
        Arc::clone(&self.lock())
    }

    /// Merges every report read from `reader` until the peer closes it.
    ///
    /// Frames that do not decode are logged and skipped. Framing errors end
    /// the stream since there is no way to find the next frame.
    pub async fn consume<R>(&self, mut reader: R, peer: &str) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        while let Some(body) = read_frame(&mut reader).await? {
            match decode_report(&body) {
                Ok(report) => self.add(&report),
                Err(e) => warn!("discarding report from {peer}: {e}"),
            }
        }
        Ok(())
    }

    /// Keeps a connection to the probe at `addr` until [`Collector::stop`],
    /// redialling `backoff` after every failure or disconnect.
    pub fn connect(self: &Arc<Self>, addr: impl Into<String>, backoff: Duration) -> JoinHandle<()> {
        let collector = Arc::clone(self);
        let addr = addr.into();
        let mut stopped = self.stopped.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = wait_stopped(&mut stopped) => break,
                    _ = collector.dial(&addr) => {}
                }
                tokio::select! {
                    _ = wait_stopped(&mut stopped) => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
            info!("stopped collecting from {addr}");
        })
    }

    /// Ends every connection started with [`Collector::connect`].
    pub fn stop(&self) {
        self.stopped.send_replace(true);
    }

    async fn dial(&self, addr: &str) {
        let stream = match TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("cannot connect to probe {addr}: {e}");
                return;
            }
        };

        info!("connected to probe {addr}");
        match self.consume(stream, addr).await {
            Ok(()) => info!("probe {addr} closed the connection"),
            Err(e) => warn!("connection to probe {addr} failed: {e}"),
        }
    }
}

async fn wait_stopped(stopped: &mut watch::Receiver<bool>) {
    loop {
        let is_stopped = *stopped.borrow_and_update();
        if is_stopped || stopped.changed().await.is_err() {
            return;
        }
    }
}
