// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use dd_topology::report::{NodeMetadata, Report, Topology, TopologyKind, keys};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A process report with one node per `(pid, comm)`.
pub fn process_report(host: &str, processes: &[(&str, &str)]) -> Report {
    let topology = processes.iter().fold(Topology::new(), |t, (pid, comm)| {
        t.with_node(
            format!("{host};{pid}"),
            NodeMetadata::new().with(keys::PID, *pid).with(keys::COMM, *comm),
        )
    });
    Report::new().with_topology(TopologyKind::Process, topology)
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// A port nothing is listening on right now.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Writes a fake `<root>/<pid>/{stat,cmdline}` entry.
pub fn write_process(root: &Path, pid: i32, comm: &str, ppid: i32) {
    let dir = root.join(pid.to_string());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("stat"),
        format!("{pid} ({comm}) S {ppid} {pid} {pid} 0 -1 4194560 1000 0 0 0 10 5 0 0 20 0 1 0 100 1000000 200"),
    )
    .unwrap();
    std::fs::write(dir.join("cmdline"), format!("{comm}\0")).unwrap();
}

/// Handle to a running dd-topology-probe process.
pub struct ProbeHandle {
    child: Child,
    log_lines: Arc<Mutex<Vec<String>>>,
    _stdout_thread: std::thread::JoinHandle<()>,
    _stderr_thread: std::thread::JoinHandle<()>,
}

fn capture(
    stream: impl std::io::Read + Send + 'static,
    prefix: &'static str,
    lines: Arc<Mutex<Vec<String>>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            match line {
                Ok(l) => {
                    eprintln!("[{prefix}] {l}");
                    lines.lock().unwrap().push(l);
                }
                Err(_) => break,
            }
        }
    })
}

impl ProbeHandle {
    /// Starts the probe with the given extra arguments.
    pub fn start(args: &[&str]) -> Self {
        let bin = env!("CARGO_BIN_EXE_dd-topology-probe");
        let mut child = Command::new(bin)
            .args(args)
            .env_remove("DD_TOPOLOGY_CONFIG")
            .env_remove("DD_LOG_LEVEL")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to start dd-topology-probe");

        let stdout = child.stdout.take().expect("failed to capture stdout");
        let stderr = child.stderr.take().expect("failed to capture stderr");
        let log_lines = Arc::new(Mutex::new(Vec::<String>::new()));

        Self {
            _stdout_thread: capture(stdout, "probe", Arc::clone(&log_lines)),
            _stderr_thread: capture(stderr, "probe:err", Arc::clone(&log_lines)),
            child,
            log_lines,
        }
    }

    /// Wait until a log line containing `pattern` appears, or timeout.
    pub fn wait_for_log(&self, pattern: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self
                .log_lines
                .lock()
                .unwrap()
                .iter()
                .any(|l| l.contains(pattern))
            {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    pub fn send_signal(&self, sig: Signal) {
        let pid = self.child.id() as i32;
        signal::kill(Pid::from_raw(pid), sig).expect("failed to send signal to probe");
    }

    /// Send SIGTERM and wait for the probe to exit.
    pub fn stop(&mut self) -> std::process::ExitStatus {
        self.send_signal(Signal::SIGTERM);
        self.wait_with_timeout(DEFAULT_TIMEOUT)
    }

    /// Wait for the probe to exit, killing it after `timeout`.
    pub fn wait_with_timeout(&mut self, timeout: Duration) -> std::process::ExitStatus {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait().expect("failed to check probe status") {
                Some(status) => return status,
                None => {
                    if Instant::now() >= deadline {
                        self.child.kill().ok();
                        return self.child.wait().expect("failed to wait on killed probe");
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }
}

impl Drop for ProbeHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
