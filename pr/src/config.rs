//! procrelay configuration types and loading

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::EventKind;
use crate::error::RelayError;

pub const BUFFER_SECONDS_MIN: u64 = 1;
pub const BUFFER_SECONDS_MAX: u64 = 5;
pub const QUEUE_MAX_MIN: usize = 10;
pub const QUEUE_MAX_MAX: usize = 100;

/// Main procrelay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Queue, buffering and routing settings
    pub relay: RelayConfig,

    /// Paste service for oversized descriptions
    pub paste: PasteConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Out-of-range numbers are clamped; malformed webhook URLs are rejected.
    pub fn validate(self) -> Result<Self> {
        let relay = self.relay.validated().context("Invalid relay configuration")?;
        Ok(Self { relay, ..self })
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .procrelay.yml
        let local_config = PathBuf::from(".procrelay.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/procrelay/procrelay.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("procrelay").join("procrelay.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Per-kind overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Enqueue this kind at all; falls back to the kind's default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Destination for this kind instead of the default webhook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
}

/// Queue, buffering and routing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Name of the relay's own process, excluded from relaying
    pub name: String,

    /// Only relay events from this process
    #[serde(rename = "process-filter", skip_serializing_if = "Option::is_none")]
    pub process_filter: Option<String>,

    /// Coalesce same-kind messages that arrive close together
    pub buffer: bool,

    /// Coalescing window in seconds
    #[serde(rename = "buffer-seconds")]
    pub buffer_seconds: u64,

    /// Queue length that triggers suppression
    #[serde(rename = "queue-max")]
    pub queue_max: usize,

    /// Pause between drain ticks
    #[serde(rename = "tick-interval-secs")]
    pub tick_interval_secs: u64,

    /// Destination used when a kind has no override
    #[serde(rename = "default-webhook", skip_serializing_if = "Option::is_none")]
    pub default_webhook: Option<String>,

    /// Username shown on posted notifications
    pub username: String,

    /// Avatar shown on posted notifications
    #[serde(rename = "avatar-url", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Per-kind toggles and destinations
    pub events: HashMap<EventKind, EventSettings>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            name: "procrelay".to_string(),
            process_filter: None,
            buffer: true,
            buffer_seconds: 1,
            queue_max: 100,
            tick_interval_secs: 10,
            default_webhook: None,
            username: "PM2".to_string(),
            avatar_url: None,
            events: HashMap::new(),
        }
    }
}

impl RelayConfig {
    /// Clamp numeric ranges and check webhook URLs
    pub fn validated(mut self) -> Result<Self, RelayError> {
        debug!("RelayConfig::validated: called");
        let buffer_seconds = self.buffer_seconds.clamp(BUFFER_SECONDS_MIN, BUFFER_SECONDS_MAX);
        if buffer_seconds != self.buffer_seconds {
            warn!(
                requested = self.buffer_seconds,
                applied = buffer_seconds,
                "buffer-seconds out of range, clamping"
            );
            self.buffer_seconds = buffer_seconds;
        }

        let queue_max = self.queue_max.clamp(QUEUE_MAX_MIN, QUEUE_MAX_MAX);
        if queue_max != self.queue_max {
            warn!(requested = self.queue_max, applied = queue_max, "queue-max out of range, clamping");
            self.queue_max = queue_max;
        }

        if self.tick_interval_secs == 0 {
            return Err(RelayError::Config("tick-interval-secs must be at least 1".to_string()));
        }

        if let Some(url) = &self.default_webhook {
            check_url("default-webhook", url)?;
        }
        for (kind, settings) in &self.events {
            if let Some(url) = &settings.webhook {
                check_url(&format!("events.{}.webhook", kind), url)?;
            }
        }

        Ok(self)
    }

    /// Whether a kind should be enqueued at all
    pub fn is_enabled(&self, kind: &EventKind) -> bool {
        self.events
            .get(kind)
            .and_then(|s| s.enabled)
            .unwrap_or_else(|| kind.enabled_by_default())
    }

    /// Destination for a kind: its override, else the default
    pub fn webhook_for(&self, kind: &EventKind) -> Option<&str> {
        self.events
            .get(kind)
            .and_then(|s| s.webhook.as_deref())
            .or(self.default_webhook.as_deref())
    }

    /// Coalescing window, or None when buffering is off
    pub fn buffer_window(&self) -> Option<i64> {
        self.buffer.then_some(self.buffer_seconds as i64)
    }

    /// Pause between drain ticks as a Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

fn check_url(field: &str, url: &str) -> Result<(), RelayError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(RelayError::Config(format!("{} must be an http(s) URL, got '{}'", field, url)))
    }
}

/// Paste service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Upload endpoint; oversized descriptions degrade to a placeholder when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Language hint sent with each upload
    pub language: String,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            url: None,
            language: "text".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.relay.buffer);
        assert_eq!(config.relay.buffer_seconds, 1);
        assert_eq!(config.relay.queue_max, 100);
        assert_eq!(config.relay.tick_interval(), Duration::from_secs(10));
        assert!(config.relay.default_webhook.is_none());
        assert_eq!(config.paste.language, "text");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug
relay:
  name: relay-proc
  process-filter: api
  buffer: false
  buffer-seconds: 3
  queue-max: 50
  default-webhook: https://hooks.example.com/default
  events:
    log:
      enabled: true
    restart-overlimit:
      webhook: https://hooks.example.com/restarts
paste:
  url: https://paste.example.com/api
  language: log
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.relay.name, "relay-proc");
        assert_eq!(config.relay.process_filter.as_deref(), Some("api"));
        assert!(!config.relay.buffer);
        assert_eq!(config.relay.buffer_seconds, 3);
        assert_eq!(config.relay.queue_max, 50);
        assert!(config.relay.is_enabled(&EventKind::Log));
        assert_eq!(
            config.relay.webhook_for(&EventKind::RestartOverlimit),
            Some("https://hooks.example.com/restarts")
        );
        assert_eq!(config.paste.language, "log");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
relay:
  queue-max: 20
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.relay.queue_max, 20);
        assert!(config.relay.buffer);
        assert_eq!(config.relay.username, "PM2");
        assert!(config.paste.url.is_none());
    }

    #[test]
    fn test_toggle_fallbacks() {
        let mut relay = RelayConfig::default();
        assert!(!relay.is_enabled(&EventKind::Log));
        assert!(relay.is_enabled(&EventKind::Error));
        assert!(!relay.is_enabled(&EventKind::Other("custom".to_string())));

        relay.events.insert(
            EventKind::Error,
            EventSettings {
                enabled: Some(false),
                webhook: None,
            },
        );
        assert!(!relay.is_enabled(&EventKind::Error));
    }

    #[test]
    fn test_webhook_override_then_default() {
        let mut relay = RelayConfig::default();
        assert_eq!(relay.webhook_for(&EventKind::Error), None);

        relay.default_webhook = Some("https://hooks.example.com/default".to_string());
        relay.events.insert(
            EventKind::Error,
            EventSettings {
                enabled: None,
                webhook: Some("https://hooks.example.com/errors".to_string()),
            },
        );

        assert_eq!(relay.webhook_for(&EventKind::Error), Some("https://hooks.example.com/errors"));
        assert_eq!(relay.webhook_for(&EventKind::Log), Some("https://hooks.example.com/default"));
    }

    #[test]
    fn test_validate_clamps_ranges() {
        let relay = RelayConfig {
            buffer_seconds: 30,
            queue_max: 500,
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(relay.buffer_seconds, 5);
        assert_eq!(relay.queue_max, 100);

        let relay = RelayConfig {
            buffer_seconds: 0,
            queue_max: 2,
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(relay.buffer_seconds, 1);
        assert_eq!(relay.queue_max, 10);
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let relay = RelayConfig {
            default_webhook: Some("ftp://nope".to_string()),
            ..Default::default()
        };
        assert!(relay.validated().is_err());

        let mut relay = RelayConfig::default();
        relay.events.insert(
            EventKind::Kill,
            EventSettings {
                enabled: None,
                webhook: Some("not a url".to_string()),
            },
        );
        let err = relay.validated().unwrap_err();
        assert!(err.to_string().contains("events.kill.webhook"));
    }

    #[test]
    fn test_buffer_window() {
        let mut relay = RelayConfig {
            buffer_seconds: 2,
            ..Default::default()
        };
        assert_eq!(relay.buffer_window(), Some(2));
        relay.buffer = false;
        assert_eq!(relay.buffer_window(), None);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.yml");
        fs::write(&path, "log-level: warn\nrelay:\n  queue-max: 42\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.relay.queue_max, 42);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    #[serial]
    fn test_load_project_local_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".procrelay.yml"), "relay:\n  name: local-relay\n").unwrap();

        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let config = Config::load(None);
        std::env::set_current_dir(previous).unwrap();

        assert_eq!(config.unwrap().relay.name, "local-relay");
    }
}
