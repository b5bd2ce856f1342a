// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod host;
pub mod process;
pub mod procfs;
pub mod tag;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, timeout_at};

use crate::errors::{Error, Result};
use crate::report::Report;
use crate::xfer::Publisher;

/// Produces a partial report describing what it can see right now.
///
/// Called from a blocking thread. A reporter that cannot gather everything
/// returns what it has; an error drops its whole contribution for the tick.
pub trait Reporter: Send + Sync {
    fn name(&self) -> &str;
    fn report(&self) -> Result<Report>;
}

/// Pure decoration of the report accumulated since the last publish.
pub trait Tagger: Send + Sync {
    fn apply(&self, report: Report) -> Report;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeIntervals {
    /// How often reporters are invoked.
    pub spy: Duration,
    /// How often the accumulated report is handed to the publisher.
    pub publish: Duration,
    /// Upper bound on a single scan; slower reporters are skipped for the tick.
    pub reporter_timeout: Duration,
}

impl Default for ProbeIntervals {
    fn default() -> Self {
        Self {
            spy: Duration::from_secs(1),
            publish: Duration::from_secs(3),
            reporter_timeout: Duration::from_secs(5),
        }
    }
}

struct RegisteredReporter {
    reporter: Arc<dyn Reporter>,
    // Set while a report() call is in flight, including one that outlived
    // its timeout.
    busy: Arc<AtomicBool>,
}

/// Clears the busy flag when the blocking call returns or unwinds.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The probe control loop: scans on one timer, publishes deltas on another.
pub struct Probe {
    publisher: Arc<dyn Publisher>,
    reporters: Vec<RegisteredReporter>,
    taggers: Vec<Box<dyn Tagger>>,
    intervals: ProbeIntervals,
}

impl Probe {
    pub fn new(publisher: Arc<dyn Publisher>, intervals: ProbeIntervals) -> Self {
        Self {
            publisher,
            reporters: Vec::new(),
            taggers: Vec::new(),
            intervals,
        }
    }

    /// Registration order is merge order.
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(RegisteredReporter {
            reporter: Arc::new(reporter),
            busy: Arc::new(AtomicBool::new(false)),
        });
        self
    }

    /// Taggers run in registration order over the accumulated report after
    /// every scan.
    pub fn with_tagger(mut self, tagger: impl Tagger + 'static) -> Self {
        self.taggers.push(Box::new(tagger));
        self
    }

    /// Runs every reporter once and returns the merged result.
    ///
    /// Reporters run concurrently, each on its own blocking task, under a
    /// shared deadline. Results are merged in registration order regardless
    /// of completion order. A reporter still busy with a previous scan is
    /// not invoked again.
    pub async fn scan(&self) -> Report {
        let deadline = Instant::now() + self.intervals.reporter_timeout;

        let mut pending: Vec<(&str, JoinHandle<Result<Report>>)> =
            Vec::with_capacity(self.reporters.len());
        for registered in &self.reporters {
            let name = registered.reporter.name();
            if registered.busy.swap(true, Ordering::AcqRel) {
                warn!("[{name}] previous report still running, skipping");
                continue;
            }
            let reporter = Arc::clone(&registered.reporter);
            let guard = BusyGuard(Arc::clone(&registered.busy));
            let handle = tokio::task::spawn_blocking(move || {
                let _guard = guard;
                reporter.report()
            });
            pending.push((name, handle));
        }

        let mut report = Report::new();
        for (name, handle) in pending {
            match timeout_at(deadline, handle).await {
                Ok(Ok(Ok(partial))) => report.merge(&partial),
                Ok(Ok(Err(e))) => warn!("[{name}] {e}"),
                Ok(Err(e)) => error!("[{name}] reporter task failed: {e}"),
                Err(_) => {
                    let e = Error::ReporterTimeout {
                        reporter: name.to_string(),
                        timeout: self.intervals.reporter_timeout,
                    };
                    warn!("[{name}] {e}");
                }
            }
        }
        report
    }

    /// Merges a scan into the pending report and retags all of it, so
    /// taggers always see every node gathered since the last publish.
    fn accumulate(&self, pending: &mut Report, scanned: &Report) {
        pending.merge(scanned);
        *pending = tag::apply(std::mem::take(pending), &self.taggers);
    }

    /// Runs until `shutdown` resolves, then closes the publisher. Whatever
    /// was scanned since the last publish is dropped.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let mut spy = interval(self.intervals.spy);
        spy.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut publish = interval(self.intervals.publish);
        publish.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First publish one full interval after start, not immediately.
        publish.reset();

        info!(
            "probe started with {} reporters (spy {}ms, publish {}ms)",
            self.reporters.len(),
            self.intervals.spy.as_millis(),
            self.intervals.publish.as_millis()
        );

        let mut report = Report::new();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = publish.tick() => {
                    debug!("publishing report");
                    self.publisher.publish(std::mem::take(&mut report));
                }
                _ = spy.tick() => {
                    let scanned = self.scan().await;
                    self.accumulate(&mut report, &scanned);
                }
            }
        }

        info!("probe shutting down");
        self.publisher.close();
    }
}
