// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::probe::{ProbeIntervals, procfs};
use crate::xfer::DEFAULT_PROBE_PORT;

pub const DEFAULT_PROBE_CONFIG: &str = "/etc/datadog-agent/topology-probe.yaml";
pub const DEFAULT_APP_CONFIG: &str = "/etc/datadog-agent/topology-app.yaml";
pub const DEFAULT_APP_PORT: u16 = 4040;

fn default_probe_listen() -> String {
    format!("0.0.0.0:{DEFAULT_PROBE_PORT}")
}

fn default_app_listen() -> String {
    format!("0.0.0.0:{DEFAULT_APP_PORT}")
}

fn default_spy_interval_ms() -> u64 {
    1000
}

fn default_publish_interval_ms() -> u64 {
    3000
}

fn default_reporter_timeout_ms() -> u64 {
    5000
}

fn default_reconnect_backoff_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_listen")]
    pub listen: String,
    #[serde(default = "default_spy_interval_ms")]
    pub spy_interval_ms: u64,
    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,
    #[serde(default = "default_reporter_timeout_ms")]
    pub reporter_timeout_ms: u64,
    #[serde(default = "procfs::default_root")]
    pub proc_root: PathBuf,
    #[serde(default = "default_true")]
    pub processes: bool,
    /// Defaults to the hostname.
    #[serde(default)]
    pub host_id: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            listen: default_probe_listen(),
            spy_interval_ms: default_spy_interval_ms(),
            publish_interval_ms: default_publish_interval_ms(),
            reporter_timeout_ms: default_reporter_timeout_ms(),
            proc_root: procfs::default_root(),
            processes: true,
            host_id: None,
            log_level: default_log_level(),
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("spy_interval_ms", self.spy_interval_ms),
            ("publish_interval_ms", self.publish_interval_ms),
            ("reporter_timeout_ms", self.reporter_timeout_ms),
        ] {
            if value == 0 {
                bail!("{name} must be greater than zero");
            }
        }
        Ok(())
    }

    pub fn intervals(&self) -> ProbeIntervals {
        ProbeIntervals {
            spy: Duration::from_millis(self.spy_interval_ms),
            publish: Duration::from_millis(self.publish_interval_ms),
            reporter_timeout: Duration::from_millis(self.reporter_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_listen")]
    pub listen: String,
    /// `host:port` of every probe to collect from.
    #[serde(default)]
    pub probes: Vec<String>,
    #[serde(default = "default_reconnect_backoff_ms")]
    pub reconnect_backoff_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: default_app_listen(),
            probes: Vec::new(),
            reconnect_backoff_ms: default_reconnect_backoff_ms(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_backoff_ms == 0 {
            bail!("reconnect_backoff_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }
}

/// Config file to read: `explicit` (from `--config`), else
/// `DD_TOPOLOGY_CONFIG`. `None` means the default location.
pub fn config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| env::var_os("DD_TOPOLOGY_CONFIG").map(PathBuf::from))
}

/// Loads a YAML config. A config file that was asked for must exist; a
/// missing file at the default location means all defaults.
pub fn load<T>(explicit: Option<&Path>, default_path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let path = match explicit {
        Some(path) => path,
        None if !default_path.exists() => {
            warn!(
                "config file {} does not exist, using defaults",
                default_path.display()
            );
            return Ok(T::default());
        }
        None => default_path,
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    debug!("loaded config from {}", path.display());
    // An empty file is an empty document, not an error.
    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Maps agent-style level names onto `log::Level`. `DD_LOG_LEVEL` overrides
/// the configured value.
pub fn log_level(configured: &str) -> log::Level {
    match env::var("DD_LOG_LEVEL") {
        Ok(level) => parse_log_level(&level),
        Err(_) => parse_log_level(configured),
    }
}

pub fn parse_log_level(level: &str) -> log::Level {
    match level.to_ascii_lowercase().as_str() {
        "trace" => log::Level::Trace,
        "debug" => log::Level::Debug,
        "info" => log::Level::Info,
        "warn" | "warning" => log::Level::Warn,
        "error" | "critical" | "off" => log::Level::Error,
        _ => log::Level::Info,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_probe_defaults() {
        let config: ProbeConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ProbeConfig::default());
        assert_eq!(config.listen, "0.0.0.0:4030");
        assert_eq!(config.intervals(), ProbeIntervals::default());
        assert!(config.processes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.listen, "0.0.0.0:4040");
        assert!(config.probes.is_empty());
        assert_eq!(config.reconnect_backoff(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_probe_config() {
        let file = write_config(
            "listen: 127.0.0.1:9999\nspy_interval_ms: 250\nproc_root: /host/proc\nhost_id: web1\nprocesses: false\n",
        );
        let config: ProbeConfig = load(Some(file.path()), Path::new("/nonexistent")).unwrap();

        assert_eq!(config.listen, "127.0.0.1:9999");
        assert_eq!(config.intervals().spy, Duration::from_millis(250));
        assert_eq!(config.publish_interval_ms, 3000);
        assert_eq!(config.proc_root, PathBuf::from("/host/proc"));
        assert_eq!(config.host_id.as_deref(), Some("web1"));
        assert!(!config.processes);
    }

    #[test]
    fn test_load_app_config() {
        let file = write_config("probes:\n  - 10.0.0.1:4030\n  - 10.0.0.2:4030\nlog_level: debug\n");
        let config: AppConfig = load(Some(file.path()), Path::new("/nonexistent")).unwrap();
        assert_eq!(config.probes, vec!["10.0.0.1:4030", "10.0.0.2:4030"]);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_default_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config: AppConfig = load(None, &dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<AppConfig> = load(Some(&dir.path().join("absent.yaml")), Path::new("/nonexistent"));
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let file = write_config("spy_interval_ms: [not, a, number]\n");
        let result: Result<ProbeConfig> = load(Some(file.path()), Path::new("/nonexistent"));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_config_file() {
        let file = write_config("");
        let config: ProbeConfig = load(Some(file.path()), Path::new("/nonexistent")).unwrap();
        assert_eq!(config, ProbeConfig::default());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let config = ProbeConfig {
            publish_interval_ms: 0,
            ..ProbeConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("publish_interval_ms"));

        let config = AppConfig {
            reconnect_backoff_ms: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug"), log::Level::Debug);
        assert_eq!(parse_log_level("WARNING"), log::Level::Warn);
        assert_eq!(parse_log_level("critical"), log::Level::Error);
        assert_eq!(parse_log_level("bogus"), log::Level::Info);
    }
}
