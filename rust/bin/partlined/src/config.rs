//! Server configuration, read from `/etc/partline/<name>.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use production::counter::CounterOptions;
use production::relay::DEFAULT_OUTBOX_CAPACITY;
use production::scheduler::SchedulerConfig;
use production::service::ServiceOptions;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,

    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub serial: SerialSection,

    #[serde(default)]
    pub relay: RelaySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `data.redb` and `data.sqlite`.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Seconds between reset checks; capped at 60.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SerialSection {
    #[serde(default = "default_persist_attempts")]
    pub persist_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySection {
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

fn default_interval_secs() -> u64 {
    30
}

fn default_persist_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    50
}

fn default_outbox_capacity() -> usize {
    DEFAULT_OUTBOX_CAPACITY
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            persist_attempts: default_persist_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            outbox_capacity: default_outbox_capacity(),
        }
    }
}

impl ServerConfig {
    /// A context name maps to `/etc/partline/<name>.toml`; anything that
    /// looks like a path is used as-is.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/partline/{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: ServerConfig = toml::from_str(content)?;
        if config.storage.data_dir.trim().is_empty() {
            anyhow::bail!("storage.data_dir is empty in configuration");
        }
        Ok(config)
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            counter: CounterOptions {
                persist_attempts: self.serial.persist_attempts.max(1),
                retry_backoff: Duration::from_millis(self.serial.retry_backoff_ms),
            },
            outbox_capacity: self.relay.outbox_capacity,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.scheduler.interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_context_name_or_path() {
        assert_eq!(
            ServerConfig::resolve_path("line2"),
            PathBuf::from("/etc/partline/line2.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./dev.toml"),
            PathBuf::from("./dev.toml")
        );
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = ServerConfig::parse("[storage]\ndata_dir = \"/var/lib/partline\"\n").unwrap();
        assert_eq!(config.scheduler.interval_secs, 30);
        let options = config.service_options();
        assert_eq!(options.counter.persist_attempts, 3);
        assert_eq!(options.outbox_capacity, DEFAULT_OUTBOX_CAPACITY);
    }

    #[test]
    fn full_config() {
        let config = ServerConfig::parse(
            r#"
            [storage]
            data_dir = "/data"

            [scheduler]
            interval_secs = 120

            [serial]
            persist_attempts = 5
            retry_backoff_ms = 10

            [relay]
            outbox_capacity = 32
            "#,
        )
        .unwrap();
        assert_eq!(config.scheduler_config().effective_interval(), Duration::from_secs(60));
        let options = config.service_options();
        assert_eq!(options.counter.persist_attempts, 5);
        assert_eq!(options.counter.retry_backoff, Duration::from_millis(10));
        assert_eq!(options.outbox_capacity, 32);
    }

    #[test]
    fn empty_data_dir_is_rejected() {
        assert!(ServerConfig::parse("[storage]\ndata_dir = \"\"\n").is_err());
        assert!(ServerConfig::parse("").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.toml");
        std::fs::write(&path, "[storage]\ndata_dir = \"/tmp/line\"\n").unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap().storage.data_dir, "/tmp/line");
        assert!(ServerConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
