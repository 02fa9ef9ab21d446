//! Configuration module for the starter bot.
//!
//! Loads configuration from environment variables (and `.env` if present).

use std::env;
use std::fmt;

use thiserror::Error;

/// Default store when `DB_URI` is not set.
pub const DEFAULT_DB_URI: &str = "sqlite:///bot.db";

/// Default rate-limit window for guarded commands, in seconds.
pub const DEFAULT_RATE_LIMIT_WINDOW: u64 = 10;

/// Errors raised while reading the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("unsupported DB_URI scheme in {0:?} (expected sqlite:// or mongodb://)")]
    UnsupportedDatabase(String),
}

/// Bot running mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// MTProto application id. The Bot API transport authenticates with the
    /// token alone, so this is only validated and reported.
    pub api_id: Option<i32>,
    /// MTProto application hash.
    pub api_hash: Option<String>,

    /// Owner user IDs (comma-separated).
    pub owner_ids: Vec<u64>,

    // Storage
    pub db_uri: String,
    pub mongodb_database: String,

    /// Seconds a user must wait between two calls of a rate-limited command.
    pub rate_limit_window: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let bot_mode = match lookup("BOT_MODE")
            .unwrap_or_else(|| "polling".to_string())
            .to_lowercase()
            .as_str()
        {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = lookup("WEBHOOK_URL").filter(|s| !s.is_empty());
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::Missing("WEBHOOK_URL"));
        }

        let webhook_port = parse_var(&lookup, "WEBHOOK_PORT")?.unwrap_or(8443);
        let webhook_secret = lookup("WEBHOOK_SECRET").filter(|s| !s.is_empty());

        let api_id = parse_var(&lookup, "API_ID")?;
        let api_hash = lookup("API_HASH").filter(|s| !s.is_empty());

        let owner_ids = lookup("OWNER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        let rate_limit_window =
            parse_var(&lookup, "RATE_LIMIT_WINDOW")?.unwrap_or(DEFAULT_RATE_LIMIT_WINDOW);

        Ok(Self {
            bot_token,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret,
            api_id,
            api_hash,
            owner_ids,
            db_uri: lookup("DB_URI").unwrap_or_else(|| DEFAULT_DB_URI.to_string()),
            mongodb_database: lookup("MONGODB_DATABASE")
                .unwrap_or_else(|| "starter_bot".to_string()),
            rate_limit_window,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

// Secrets never reach the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("bot_mode", &self.bot_mode)
            .field("webhook_url", &self.webhook_url)
            .field("webhook_port", &self.webhook_port)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("api_id", &self.api_id)
            .field("api_hash", &self.api_hash.as_ref().map(|_| "<redacted>"))
            .field("owner_ids", &self.owner_ids)
            .field("db_uri", &self.db_uri)
            .field("mongodb_database", &self.mongodb_database)
            .field("rate_limit_window", &self.rate_limit_window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("BOT_TOKEN", "123:abc")]).unwrap();

        assert_eq!(config.bot_mode, BotMode::Polling);
        assert_eq!(config.db_uri, DEFAULT_DB_URI);
        assert_eq!(config.rate_limit_window, DEFAULT_RATE_LIMIT_WINDOW);
        assert!(config.owner_ids.is_empty());
        assert!(config.api_id.is_none());
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("BOT_TOKEN"))));
    }

    #[test]
    fn test_webhook_requires_url() {
        let result = load(&[("BOT_TOKEN", "t"), ("BOT_MODE", "webhook")]);
        assert!(matches!(result, Err(ConfigError::Missing("WEBHOOK_URL"))));
    }

    #[test]
    fn test_bot_mode_parsing() {
        let config = load(&[
            ("BOT_TOKEN", "t"),
            ("BOT_MODE", "WEBHOOK"),
            ("WEBHOOK_URL", "https://example.org/hook"),
        ])
        .unwrap();
        assert_eq!(config.bot_mode, BotMode::Webhook);

        let config = load(&[("BOT_TOKEN", "t"), ("BOT_MODE", "longpoll")]).unwrap();
        assert_eq!(config.bot_mode, BotMode::Polling);
    }

    #[test]
    fn test_invalid_api_id() {
        let result = load(&[("BOT_TOKEN", "t"), ("API_ID", "six")]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: "API_ID", .. })));
    }

    #[test]
    fn test_owner_ids_and_window() {
        let config = load(&[
            ("BOT_TOKEN", "t"),
            ("OWNER_IDS", "1, 2,oops,3"),
            ("RATE_LIMIT_WINDOW", "60"),
        ])
        .unwrap();

        assert_eq!(config.owner_ids, vec![1, 2, 3]);
        assert_eq!(config.rate_limit_window, 60);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[("BOT_TOKEN", "123:hunter2"), ("API_HASH", "deadbeef")]).unwrap();
        let printed = format!("{:?}", config);

        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("deadbeef"));
    }
}
