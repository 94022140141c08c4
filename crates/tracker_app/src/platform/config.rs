use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use engine_logging::engine_info;
use serde::{Deserialize, Serialize};
use tracker_core::TrackerPolicy;
use tracker_engine::{ServerCapabilities, TrackerSettings, TransportSettings};

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "solve-tracker.ron";

/// Everything the tracker needs to know about the deployed server and local policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: Option<u64>,
    pub capabilities: ServerCapabilities,
    pub policy: TrackerPolicy,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            poll_interval_ms: 500,
            connect_timeout_ms: 10_000,
            request_timeout_ms: None,
            capabilities: ServerCapabilities::default(),
            policy: TrackerPolicy::default(),
            log_destination: LogDestination::File,
            log_file: PathBuf::from("./solve-tracker.log"),
        }
    }
}

impl TrackerConfig {
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            policy: self.policy,
        }
    }
}

/// Reads `path` as RON. A missing file yields the defaults; a malformed one is an error.
pub fn load_config(path: &Path) -> Result<TrackerConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(TrackerConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config file {}", path.display()));
        }
    };

    let config: TrackerConfig = ron::from_str(&content)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    engine_info!("Loaded tracker config from {:?}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracker_core::ErrorPolicy;
    use tracker_engine::IdLocation;

    #[test]
    fn missing_file_means_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config(&temp.path().join(DEFAULT_CONFIG_FILENAME)).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.tracker_settings().poll_interval, Duration::from_millis(500));
        assert_eq!(config.transport_settings().request_timeout, None);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(
                base_url: "https://solver.example.com/app",
                poll_interval_ms: 250,
                capabilities: (id_location: Query, send_credential_digest: true),
                policy: (require_input: false, on_transport_error: Halt),
            )"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.base_url, "https://solver.example.com/app");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.capabilities.id_location, IdLocation::Query);
        assert!(config.capabilities.send_credential_digest);
        assert!(config.capabilities.list_operations);
        assert!(!config.policy.require_input);
        assert_eq!(config.policy.on_transport_error, ErrorPolicy::Halt);
        assert_eq!(config.log_destination, LogDestination::File);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, "(poll_interval_ms: \"fast\")").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("parsing config file"));
    }
}
