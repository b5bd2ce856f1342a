// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

/// Where procfs is mounted when nothing is configured.
pub fn default_root() -> PathBuf {
    if let Ok(v) = env::var("HOST_PROC") {
        return v.into();
    }

    if env::var("DOCKER_DD_AGENT").is_ok() && Path::new("/host").exists() {
        return "/host/proc".into();
    }

    "/proc".into()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub pid: i32,
    pub ppid: i32,
    pub comm: String,
    pub cmdline: String,
    pub threads: u32,
}

/// Reads every `<root>/<pid>` directory. Processes that vanish or cannot be
/// parsed while walking are skipped; only an unreadable root is an error.
pub fn walk(root: &Path) -> io::Result<Vec<Process>> {
    let mut processes = Vec::new();

    for entry in fs::read_dir(root)? {
        let Ok(entry) = entry else {
            continue;
        };
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<i32>().ok())
        else {
            continue;
        };

        match read_process(&entry.path(), pid) {
            Ok(process) => processes.push(process),
            Err(e) => debug!("skipping pid {pid}: {e}"),
        }
    }

    processes.sort_by_key(|p| p.pid);
    Ok(processes)
}

/// Process names and arguments are arbitrary bytes; invalid UTF-8 is
/// replaced rather than dropping the process.
fn read_lossy(path: &Path) -> io::Result<String> {
    fs::read(path).map(|raw| String::from_utf8_lossy(&raw).into_owned())
}

fn read_process(dir: &Path, pid: i32) -> io::Result<Process> {
    let stat = read_lossy(&dir.join("stat"))?;
    let (comm, ppid, threads) = parse_stat(&stat).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, format!("malformed stat: {stat:?}"))
    })?;

    // Kernel threads have an empty cmdline.
    let cmdline = read_lossy(&dir.join("cmdline"))
        .map(|raw| normalize_cmdline(&raw))
        .unwrap_or_default();

    Ok(Process {
        pid,
        ppid,
        comm,
        cmdline,
        threads,
    })
}

/// Extracts `(comm, ppid, num_threads)` from `/proc/<pid>/stat`.
///
/// The command name is enclosed in parentheses and may itself contain
/// spaces and parentheses, so the fields after it are located from the last
/// closing parenthesis.
fn parse_stat(stat: &str) -> Option<(String, i32, u32)> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    let comm = stat.get(open + 1..close)?.to_string();

    // Fields following the comm, starting at field 3 (state).
    let mut fields = stat.get(close + 1..)?.split_whitespace();
    let ppid = fields.nth(1)?.parse().ok()?;
    // num_threads is field 20; nth(1) above consumed fields 3 and 4.
    let threads = fields.nth(15)?.parse().ok()?;

    Some((comm, ppid, threads))
}

/// Joins NUL-separated arguments with spaces, dropping the trailing NULs
/// left behind by processes that rewrite their command line.
fn normalize_cmdline(raw: &str) -> String {
    raw.trim_end_matches('\0')
        .split('\0')
        .collect::<Vec<_>>()
        .join(" ")
}
