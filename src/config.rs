//! # Bot Configuration Module
//!
//! All runtime settings are read once at startup and carried in a
//! [`BotConfig`] that is passed explicitly to the dispatcher and its
//! collaborators.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Placeholder value shipped in sample `.env` files
pub const PLACEHOLDER_TOKEN: &str = "YOUR_TOKEN_HERE";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://medici_bot.db";
pub const DEFAULT_MATERIALS_DIR: &str = "files";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_TYPING_DELAY_MS: u64 = 600;
pub const DEFAULT_ANALYSIS_STEP_MS: u64 = 800;

/// Errors raised while building the configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN must be set")]
    MissingToken,
    #[error("TELEGRAM_BOT_TOKEN still holds the placeholder value")]
    PlaceholderToken,
    #[error("{key} must be an integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Runtime configuration of the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Operator chat receiving booking notifications, `None` disables them
    pub operator_chat_id: Option<i64>,
    pub database_url: String,
    pub materials_dir: PathBuf,
    /// Idle time after which a session is evicted
    pub session_ttl: Duration,
    /// Base pause before each reply, zero disables typing effects
    pub typing_delay: Duration,
    /// Delay between frames of the upload analysis progress bar
    pub analysis_step_delay: Duration,
}

impl BotConfig {
    /// Build the configuration from process environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;
        if bot_token == PLACEHOLDER_TOKEN {
            return Err(ConfigError::PlaceholderToken);
        }

        let operator_chat_id = match non_empty(lookup("MANAGER_CHAT_ID")) {
            Some(raw) => {
                let id = parse_number::<i64>("MANAGER_CHAT_ID", &raw)?;
                (id != 0).then_some(id)
            }
            None => None,
        };

        let database_url = non_empty(lookup("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let materials_dir = non_empty(lookup("MATERIALS_DIR"))
            .unwrap_or_else(|| DEFAULT_MATERIALS_DIR.to_string())
            .into();

        let session_ttl = Duration::from_secs(number_or(
            &lookup,
            "SESSION_TTL_SECS",
            DEFAULT_SESSION_TTL_SECS,
        )?);
        let typing_delay = Duration::from_millis(number_or(
            &lookup,
            "TYPING_DELAY_MS",
            DEFAULT_TYPING_DELAY_MS,
        )?);
        let analysis_step_delay = Duration::from_millis(number_or(
            &lookup,
            "ANALYSIS_STEP_MS",
            DEFAULT_ANALYSIS_STEP_MS,
        )?);

        Ok(Self {
            bot_token,
            operator_chat_id,
            database_url,
            materials_dir,
            session_ttl,
            typing_delay,
            analysis_step_delay,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_string(),
    })
}

fn number_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        Some(raw) => parse_number(key, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let result = BotConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::MissingToken);

        let result = BotConfig::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "   ")]));
        assert_eq!(result.unwrap_err(), ConfigError::MissingToken);
    }

    #[test]
    fn test_placeholder_token_is_fatal() {
        let result = BotConfig::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", PLACEHOLDER_TOKEN)]));
        assert_eq!(result.unwrap_err(), ConfigError::PlaceholderToken);
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.operator_chat_id, None);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.materials_dir, PathBuf::from(DEFAULT_MATERIALS_DIR));
        assert_eq!(config.session_ttl, Duration::from_secs(DEFAULT_SESSION_TTL_SECS));
        assert_eq!(config.typing_delay, Duration::from_millis(DEFAULT_TYPING_DELAY_MS));
    }

    #[test]
    fn test_operator_chat_zero_disables_notifications() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("MANAGER_CHAT_ID", "0"),
        ]))
        .unwrap();
        assert_eq!(config.operator_chat_id, None);

        let config = BotConfig::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("MANAGER_CHAT_ID", "-100200300"),
        ]))
        .unwrap();
        assert_eq!(config.operator_chat_id, Some(-100200300));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let result = BotConfig::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("SESSION_TTL_SECS", "soon"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber { key: "SESSION_TTL_SECS", .. })
        ));
    }
}
