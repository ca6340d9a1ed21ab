use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::preview::SectionGating;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means snapshots live in process memory only.
    pub redis_url: Option<String>,
    pub rasterizer_url: String,
    pub pdf_service_url: String,
    pub service_timeout_secs: u64,
    pub preview_debounce_ms: u64,
    pub persist_debounce_ms: u64,
    pub pdf_settle_delay_ms: u64,
    /// Inactivity after which a session is flushed and dropped from memory.
    pub session_idle_secs: u64,
    pub session_sweep_secs: u64,
    pub section_gating: SectionGating,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            rasterizer_url: require_env("RASTERIZER_URL")?,
            pdf_service_url: require_env("PDF_SERVICE_URL")?,
            service_timeout_secs: env_or::<u64>("SERVICE_TIMEOUT_SECS", 30)?,
            preview_debounce_ms: env_or::<u64>("PREVIEW_DEBOUNCE_MS", 300)?,
            persist_debounce_ms: env_or::<u64>("PERSIST_DEBOUNCE_MS", 1000)?,
            pdf_settle_delay_ms: env_or::<u64>("PDF_SETTLE_DELAY_MS", 500)?,
            session_idle_secs: env_or::<u64>("SESSION_IDLE_SECS", 1800)?,
            session_sweep_secs: env_or::<u64>("SESSION_SWEEP_SECS", 60)?,
            section_gating: env_or("SECTION_GATING", SectionGating::RepresentativeEntry)?,
            port: env_or::<u16>("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_or(key, std::env::var(key).ok(), default)
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value for '{key}': {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_uses_default_when_unset() {
        assert_eq!(parse_or::<u64>("PREVIEW_DEBOUNCE_MS", None, 300).unwrap(), 300);
        assert_eq!(
            parse_or::<u64>("PREVIEW_DEBOUNCE_MS", Some(" 150 ".into()), 300).unwrap(),
            150
        );
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        let err = parse_or::<u16>("PORT", Some("eighty".into()), 8080).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_section_gating_from_env_value() {
        assert_eq!(
            parse_or("SECTION_GATING", Some("any".into()), SectionGating::RepresentativeEntry)
                .unwrap(),
            SectionGating::AnyEntry
        );
    }
}
