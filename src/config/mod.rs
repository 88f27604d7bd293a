//! Configuration management.
//!
//! Configuration is read from `~/.config/stripfeed/config.toml`. If the file
//! doesn't exist, a default configuration with comments is created. Telegram
//! credentials can also come from the `BOT_TOKEN` and `RECIPIENT_ID`
//! environment variables, which win over the file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::collector::DEFAULT_SOURCE_TIMEOUT_SECS;

pub const BOT_TOKEN_VAR: &str = "BOT_TOKEN";
pub const RECIPIENT_ID_VAR: &str = "RECIPIENT_ID";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub collector: CollectorConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub recipient_id: Option<String>,
    pub api_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            recipient_id: None,
            api_url: "https://api.telegram.org".to_string(),
        }
    }
}

impl TelegramConfig {
    /// Token and recipient, or the reason they can't be used.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let token = self
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing(BOT_TOKEN_VAR))?;
        let recipient = self
            .recipient_id
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or(ConfigError::Missing(RECIPIENT_ID_VAR))?;
        Ok((token, recipient))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Lookback window for sources without a stored watermark.
    pub lookback_days: i64,
    /// Per-source deadline; 0 disables it.
    pub source_timeout_secs: u64,
    /// Source ids to collect; empty means all.
    pub sources: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            lookback_days: 1,
            source_timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("stripfeed/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load `path`, creating it with defaults when it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Override Telegram credentials from the environment.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(token) = var(BOT_TOKEN_VAR) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(recipient) = var(RECIPIENT_ID_VAR) {
            self.telegram.recipient_id = Some(recipient);
        }
    }

    /// Get the default config file path: `~/.config/stripfeed/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("stripfeed").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# stripfeed configuration

[telegram]
# Bot API token and chat id of the recipient. The BOT_TOKEN and
# RECIPIENT_ID environment variables take precedence.
# bot_token = "123456:ABC-DEF"
# recipient_id = "123456789"
api_url = "https://api.telegram.org"

[collector]
# Days to look back for sources that have never been collected
lookback_days = 1

# Give up on a single source after this many seconds (0 = never)
source_timeout_secs = 120

# Only collect these source ids (empty = all); see `stripfeed sources`
sources = []

[http]
timeout_secs = 30
user_agent = "stripfeed/0.1.0"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No {0} configured")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.collector.lookback_days, 1);
        assert_eq!(config.collector.source_timeout_secs, 120);
        assert!(config.collector.sources.is_empty());
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.telegram.bot_token, None);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[collector]
sources = ["xkcd", "smbc"]
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.collector.sources, vec!["xkcd", "smbc"]);
        assert_eq!(config.collector.lookback_days, 1);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.collector.lookback_days, 1);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.telegram.api_url, config.telegram.api_url);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[collector\nlookback_days = ").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut config: Config = toml::from_str(
            r#"
[telegram]
bot_token = "from-file"
"#,
        )
        .unwrap();

        config.apply_env(|name| match name {
            RECIPIENT_ID_VAR => Some("42".to_string()),
            _ => None,
        });

        assert_eq!(config.telegram.credentials().unwrap(), ("from-file", "42"));
    }

    #[test]
    fn test_missing_credentials() {
        let config = Config::default();
        assert!(matches!(
            config.telegram.credentials(),
            Err(ConfigError::Missing(BOT_TOKEN_VAR))
        ));
    }
}
