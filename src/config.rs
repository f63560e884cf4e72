use crate::core::moderation::ModerationConfig;
use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "data/moderation.db";
const DEFAULT_MUTE_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Discord
    pub discord_token: String,

    // Storage
    pub database_url: String,

    // Translation (paid fallback is only used when a key is present)
    pub gcp_api_key: Option<String>,

    // Enforcement
    pub moderation: ModerationConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            discord_token: lookup("DISCORD_TOKEN")
                .filter(|v| !v.is_empty())
                .context("DISCORD_TOKEN not set")?,

            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),

            gcp_api_key: lookup("GCP_API_KEY").filter(|v| !v.is_empty()),

            moderation: ModerationConfig {
                required_language: lookup("REQUIRED_LANG")
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| "en".to_string()),
                be_helpful: lookup("BE_HELPFUL").as_deref() == Some("true"),
                mute_people: lookup("MUTE_PEOPLE").as_deref() == Some("true"),
                // BAN_TIMEOUT is the older name for the same setting.
                mute_timeout: Duration::from_millis(
                    timeout_ms(lookup("MUTE_TIMEOUT"))
                        .or_else(|| timeout_ms(lookup("BAN_TIMEOUT")))
                        .unwrap_or(DEFAULT_MUTE_TIMEOUT_MS),
                ),
            },
        })
    }
}

fn timeout_ms(value: Option<String>) -> Option<u64> {
    value.and_then(|v| v.parse().ok()).filter(|ms| *ms > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DISCORD_TOKEN", "token")]).unwrap();

        assert_eq!(config.database_url, "data/moderation.db");
        assert!(config.gcp_api_key.is_none());
        assert_eq!(config.moderation.required_language, "en");
        assert!(!config.moderation.be_helpful);
        assert!(!config.moderation.mute_people);
        assert_eq!(config.moderation.mute_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DISCORD_TOKEN", "token"),
            ("GCP_API_KEY", "key"),
            ("REQUIRED_LANG", "pl"),
            ("BE_HELPFUL", "true"),
            ("MUTE_PEOPLE", "true"),
            ("MUTE_TIMEOUT", "45000"),
        ])
        .unwrap();

        assert_eq!(config.gcp_api_key.as_deref(), Some("key"));
        assert_eq!(config.moderation.required_language, "pl");
        assert!(config.moderation.be_helpful);
        assert!(config.moderation.mute_people);
        assert_eq!(config.moderation.mute_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_flags_must_be_exactly_true() {
        let config = load(&[
            ("DISCORD_TOKEN", "token"),
            ("BE_HELPFUL", "yes"),
            ("MUTE_PEOPLE", "TRUE"),
            ("MUTE_TIMEOUT", "soon"),
        ])
        .unwrap();

        assert!(!config.moderation.be_helpful);
        assert!(!config.moderation.mute_people);
        assert_eq!(config.moderation.mute_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_ban_timeout_is_a_fallback_for_mute_timeout() {
        let legacy = load(&[
            ("DISCORD_TOKEN", "token"),
            ("MUTE_PEOPLE", "true"),
            ("BAN_TIMEOUT", "45000"),
        ])
        .unwrap();
        assert_eq!(legacy.moderation.mute_timeout, Duration::from_secs(45));

        let unparsable = load(&[
            ("DISCORD_TOKEN", "token"),
            ("MUTE_TIMEOUT", "soon"),
            ("BAN_TIMEOUT", "10000"),
        ])
        .unwrap();
        assert_eq!(unparsable.moderation.mute_timeout, Duration::from_secs(10));

        let both = load(&[
            ("DISCORD_TOKEN", "token"),
            ("MUTE_TIMEOUT", "20000"),
            ("BAN_TIMEOUT", "10000"),
        ])
        .unwrap();
        assert_eq!(both.moderation.mute_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(load(&[]).is_err());
    }
}
