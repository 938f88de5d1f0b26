//! TOML configuration for courtwatch.
//!
//! A layered model: compiled-in defaults for every tunable, a TOML file for
//! the deployment, and an environment override for the chat secret. The
//! tracked player and the notification channel have no sensible default and
//! must be supplied; [`AppConfig::validate`] rejects a config without them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "COURTWATCH_CONFIG";

/// Environment variable overriding `notify.bot_id`.
pub const BOT_ID_ENV: &str = "COURTWATCH_BOT_ID";

/// Config file used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "courtwatch.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting `{0}` is missing or empty")]
    Missing(&'static str),

    #[error("setting `{key}` is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for a courtwatch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded courtwatch configuration");
        Ok(config)
    }

    /// Resolve, load, apply environment overrides and validate.
    ///
    /// The file is taken from `explicit` if given, else from `COURTWATCH_CONFIG`,
    /// else from `./courtwatch.toml`. Unlike the tunables, the secrets have no
    /// fallback, so a missing file is an error rather than a silent default.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = config_path(explicit);
        debug!(path = %path.display(), "resolving configuration");

        let mut config = Self::load(&path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Like [`AppConfig::resolve`] but for read-only diagnostics: a missing
    /// file falls back to defaults and nothing is validated.
    pub fn resolve_lenient(explicit: Option<&Path>) -> Result<Self> {
        let path = config_path(explicit);
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment overrides on top of file values.
    pub fn apply_env(&mut self) {
        if let Ok(bot_id) = std::env::var(BOT_ID_ENV) {
            if !bot_id.trim().is_empty() {
                debug!("notify.bot_id taken from {}", BOT_ID_ENV);
                self.notify.bot_id = bot_id;
            }
        }
    }

    /// Check that the startup-critical settings are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player.slug.trim().is_empty() {
            return Err(ConfigError::Missing("player.slug"));
        }
        if self.notify.bot_id.trim().is_empty() {
            return Err(ConfigError::Missing("notify.bot_id"));
        }
        if self.storage.history_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "storage.history_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        for (key, url) in [
            ("source.base_url", &self.source.base_url),
            ("stream.search_url", &self.stream.search_url),
            ("notify.endpoint", &self.notify.endpoint),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("`{url}` is not an http(s) URL"),
                });
            }
        }
        Ok(())
    }
}

/// Config file location: `explicit`, else `COURTWATCH_CONFIG`, else the default.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => match std::env::var(CONFIG_ENV) {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => PathBuf::from(DEFAULT_CONFIG_PATH),
        },
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Identity of the tracked player.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Site slug, e.g. `adam-harvey`.
    pub slug: String,
    /// Name used in messages. Derived from the slug when unset.
    pub display_name: Option<String>,
}

impl PlayerConfig {
    /// Name used in notification text.
    pub fn display_name(&self) -> String {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => title_case_slug(&self.slug),
        }
    }

    /// First name used to locate the player's side in roster data.
    pub fn first_name(&self) -> String {
        self.display_name()
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// `adam-harvey` -> `Adam Harvey`.
fn title_case_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Notify
// ---------------------------------------------------------------------------

/// Chat webhook configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// GroupMe bot identifier. Overridable via `COURTWATCH_BOT_ID`.
    pub bot_id: String,
    /// Bot post endpoint.
    pub endpoint: String,
    /// Per-request timeout (seconds).
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            bot_id: String::new(),
            endpoint: "https://api.groupme.com/v3/bots/post".to_string(),
            timeout_secs: 10,
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Results site and API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Site root, used for the player page, match URLs and the results API.
    pub base_url: String,
    /// Pause between consecutive results API calls (milliseconds).
    pub request_delay_ms: u64,
    /// Per-request timeout (seconds).
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pickleball.com".to_string(),
            request_delay_ms: 500,
            timeout_secs: 10,
        }
    }
}

impl SourceConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

/// Live-stream search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Channel search page; the court label is passed as `?query=`.
    pub search_url: String,
    /// Pause between consecutive stream lookups (milliseconds).
    pub request_delay_ms: u64,
    /// Per-request timeout (seconds).
    pub timeout_secs: u64,
    /// Court whose broadcast is free to watch.
    pub free_court: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.youtube.com/@PPAStreamedCourts/search".to_string(),
            request_delay_ms: 1000,
            timeout_secs: 15,
            free_court: "CC".to_string(),
        }
    }
}

impl StreamConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Persisted state configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON state file holding matches and execution history.
    pub state_path: PathBuf,
    /// Number of execution records retained.
    pub history_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("courtwatch_state.json"),
            history_limit: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.player.slug = "adam-harvey".to_string();
        cfg.notify.bot_id = "bot-123".to_string();
        cfg
    }

    #[test]
    fn test_defaults_are_sane() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.source.base_url, "https://pickleball.com");
        assert_eq!(cfg.source.request_delay(), Duration::from_millis(500));
        assert_eq!(cfg.source.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.stream.request_delay(), Duration::from_secs(1));
        assert_eq!(cfg.stream.timeout(), Duration::from_secs(15));
        assert_eq!(cfg.stream.free_court, "CC");
        assert_eq!(cfg.notify.endpoint, "https://api.groupme.com/v3/bots/post");
        assert_eq!(cfg.storage.history_limit, 100);
        assert!(cfg.player.slug.is_empty());
        assert!(cfg.notify.bot_id.is_empty());
    }

    #[test]
    fn test_parse_example_toml() {
        let toml_str = r#"
[player]
slug = "adam-harvey"
display_name = "Adam Harvey"

[notify]
bot_id = "abc123"
timeout_secs = 5

[source]
base_url = "https://staging.pickleball.com"
request_delay_ms = 250

[stream]
free_court = "GS"

[storage]
state_path = "/var/lib/courtwatch/state.json"
history_limit = 20
"#;

        let cfg: AppConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(cfg.player.slug, "adam-harvey");
        assert_eq!(cfg.player.display_name(), "Adam Harvey");
        assert_eq!(cfg.notify.bot_id, "abc123");
        assert_eq!(cfg.notify.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.source.base_url, "https://staging.pickleball.com");
        assert_eq!(cfg.source.request_delay_ms, 250);
        assert_eq!(cfg.source.timeout_secs, 10);
        assert_eq!(cfg.stream.free_court, "GS");
        assert_eq!(cfg.stream.request_delay_ms, 1000);
        assert_eq!(
            cfg.storage.state_path,
            PathBuf::from("/var/lib/courtwatch/state.json")
        );
        assert_eq!(cfg.storage.history_limit, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_fails_validation() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("player.slug"))));
    }

    #[test]
    fn test_missing_bot_id_is_rejected() {
        let mut cfg = valid();
        cfg.notify.bot_id = "   ".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("notify.bot_id"))));
    }

    #[test]
    fn test_zero_history_limit_is_rejected() {
        let mut cfg = valid();
        cfg.storage.history_limit = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { key: "storage.history_limit", .. })
        ));
    }

    #[test]
    fn test_non_http_url_is_rejected() {
        let mut cfg = valid();
        cfg.source.base_url = "pickleball.com".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { key: "source.base_url", .. })
        ));
    }

    #[test]
    fn test_display_name_from_slug() {
        let player = PlayerConfig {
            slug: "anna-leigh-waters".to_string(),
            display_name: None,
        };
        assert_eq!(player.display_name(), "Anna Leigh Waters");
        assert_eq!(player.first_name(), "Anna");
    }

    #[test]
    fn test_explicit_display_name_wins() {
        let player = PlayerConfig {
            slug: "adam-harvey".to_string(),
            display_name: Some("  Adam H.  ".to_string()),
        };
        assert_eq!(player.display_name(), "Adam H.");
        assert_eq!(player.first_name(), "Adam");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("courtwatch.toml");
        std::fs::write(
            &path,
            r#"
[player]
slug = "adam-harvey"

[notify]
bot_id = "xyz"
"#,
        )
        .unwrap();

        let cfg = AppConfig::load(&path).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.player.slug, "adam-harvey");
        assert_eq!(cfg.notify.bot_id, "xyz");
    }

    #[test]
    fn test_resolve_missing_file_errors() {
        let result = AppConfig::resolve(Some(Path::new("/nonexistent/path/courtwatch.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_lenient_missing_file_uses_defaults() {
        let cfg = AppConfig::resolve_lenient(Some(Path::new("/nonexistent/path/courtwatch.toml"))).unwrap();
        assert_eq!(cfg.source.base_url, "https://pickleball.com");
        assert!(cfg.player.slug.is_empty());
    }

    #[test]
    fn test_explicit_path_wins() {
        assert_eq!(
            config_path(Some(Path::new("/etc/courtwatch.toml"))),
            PathBuf::from("/etc/courtwatch.toml")
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let cfg = valid();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let roundtripped: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(cfg.player.slug, roundtripped.player.slug);
        assert_eq!(cfg.notify.bot_id, roundtripped.notify.bot_id);
        assert_eq!(cfg.storage.state_path, roundtripped.storage.state_path);
    }
}
