use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::generation::service::{GenerationSettings, DEFAULT_IDEA_COUNT, DEFAULT_IDEA_TTL_DAYS};
use crate::generation::validator::MAX_IDEAS_COUNT;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// 0 disables expiration.
    pub idea_ttl_days: i64,
    pub default_idea_count: usize,
    pub generation_timeout: Duration,
    pub prompt_cache_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_idea_count: usize = env_or("DEFAULT_IDEA_COUNT", DEFAULT_IDEA_COUNT)?;
        if default_idea_count == 0 || default_idea_count > MAX_IDEAS_COUNT as usize {
            return Err(anyhow!(
                "DEFAULT_IDEA_COUNT must be between 1 and {MAX_IDEAS_COUNT}"
            ));
        }

        let idea_ttl_days: i64 = env_or("IDEA_TTL_DAYS", DEFAULT_IDEA_TTL_DAYS)?;
        if idea_ttl_days < 0 {
            return Err(anyhow!("IDEA_TTL_DAYS cannot be negative"));
        }

        let prompt_cache_enabled = match std::env::var("PROMPT_CACHE_ENABLED") {
            Ok(value) => parse_flag(&value)
                .with_context(|| format!("PROMPT_CACHE_ENABLED has invalid value '{value}'"))?,
            Err(_) => true,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            idea_ttl_days,
            default_idea_count,
            generation_timeout: Duration::from_secs(env_or("GENERATION_TIMEOUT_SECS", 90)?),
            prompt_cache_enabled,
        })
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            default_idea_count: self.default_idea_count,
            idea_ttl: (self.idea_ttl_days > 0).then(|| chrono::Duration::days(self.idea_ttl_days)),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has invalid value '{value}'")),
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
