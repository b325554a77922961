use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use forge_core::{PollConfig, DEFAULT_MAX_BACKOFF_TICKS};
use forge_engine::{ApiSettings, ChatReloadSettings, EngineSettings};
use forge_logging::{forge_info, forge_warn, LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "forge.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogOutput {
    Terminal,
    File,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub api_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_file_bytes: u64,
    pub max_backoff_ticks: u32,
    pub chat_reload_interval_ms: u64,
    pub chat_reload_timeout_ms: u64,
    pub log_destination: LogOutput,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            poll_interval_ms: 1000,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            max_file_bytes: 5 * 1024 * 1024,
            max_backoff_ticks: DEFAULT_MAX_BACKOFF_TICKS,
            chat_reload_interval_ms: 500,
            chat_reload_timeout_ms: 10_000,
            log_destination: LogOutput::File,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_level: "info".to_string(),
        }
    }
}

impl ForgeConfig {
    /// Reads `path`, or `forge.ron` in the working directory when no path is given.
    ///
    /// A missing default file yields the defaults; a missing explicit file or a
    /// file that does not parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("cannot read config {}", path.display()))
            }
        };
        let config: ForgeConfig = ron::from_str(&content)
            .with_context(|| format!("cannot parse config {}", path.display()))?;
        forge_info!("loaded config from {:?}", path);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, api_url: Option<String>, poll_ms: Option<u64>) {
        if let Some(api_url) = api_url {
            self.api_url = api_url;
        }
        if let Some(poll_ms) = poll_ms {
            self.poll_interval_ms = poll_ms;
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match self.log_destination {
            LogOutput::Terminal => LogDestination::Terminal,
            LogOutput::File => LogDestination::File(self.log_file.clone()),
            LogOutput::Both => LogDestination::Both(self.log_file.clone()),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or_else(|_| {
            forge_warn!("unknown log level {:?}, using info", self.log_level);
            LevelFilter::Info
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            api: ApiSettings {
                base_url: self.api_url.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                max_bytes: self.max_file_bytes,
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            chat_reload: ChatReloadSettings {
                interval: Duration::from_millis(self.chat_reload_interval_ms),
                timeout: Duration::from_millis(self.chat_reload_timeout_ms),
            },
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_backoff_ticks: self.max_backoff_ticks,
        }
    }

    /// Longest a single foreground command may wait for its responses.
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(
            self.connect_timeout_ms + self.request_timeout_ms + self.chat_reload_timeout_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"(api_url: "http://forge.internal/api", poll_interval_ms: 250, log_destination: Both)"#
        )
        .unwrap();

        let config = ForgeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api_url, "http://forge.internal/api");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.log_destination, LogOutput::Both);
        assert_eq!(config.max_backoff_ticks, 8);
        assert_eq!(config.chat_reload_timeout_ms, 10_000);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ron");
        assert!(ForgeConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(poll_interval_ms: \"fast\")").unwrap();
        assert!(ForgeConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn cli_flags_override_the_file() {
        let mut config = ForgeConfig::default();
        config.apply_overrides(Some("http://127.0.0.1:9000".to_string()), None);
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.poll_interval_ms, 1000);

        config.apply_overrides(None, Some(200));
        assert_eq!(
            config.engine_settings().poll_interval,
            Duration::from_millis(200)
        );
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = ForgeConfig {
            log_level: "chatty".to_string(),
            ..ForgeConfig::default()
        };
        assert_eq!(config.log_level(), LevelFilter::Info);

        let config = ForgeConfig {
            log_level: "debug".to_string(),
            ..ForgeConfig::default()
        };
        assert_eq!(config.log_level(), LevelFilter::Debug);
    }
}
