use std::env;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use anyhow::{Context, anyhow, bail};
use chrono::{Duration, FixedOffset};
use dotenvy::dotenv;

use crate::service::EngineSettings;

/// One day; keeps the moka TTL well inside its accepted range.
const MAX_LOCATION_CACHE_TTL_SECS: u64 = 86_400;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_clock_per_min: u32,
    pub rate_protected_per_min: u32,

    // Attendance rules
    pub duplicate_window_secs: i64,
    pub location_cache_ttl_secs: u64,
    pub report_utc_offset_minutes: i32,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            rate_clock_per_min: parse_or(&lookup, "RATE_CLOCK_PER_MIN", 30)?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            duplicate_window_secs: parse_or(&lookup, "DUPLICATE_WINDOW_SECS", 300)?, // 5 min
            location_cache_ttl_secs: parse_or(&lookup, "LOCATION_CACHE_TTL_SECS", 30)?,
            report_utc_offset_minutes: parse_or(&lookup, "REPORT_UTC_OFFSET_MINUTES", 0)?,

            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parse_or(&lookup, "LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }

    pub fn engine_settings(&self) -> anyhow::Result<EngineSettings> {
        let report_offset = self
            .report_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("REPORT_UTC_OFFSET_MINUTES is out of range"))?;

        if self.duplicate_window_secs <= 0 {
            bail!("DUPLICATE_WINDOW_SECS must be positive");
        }
        let duplicate_window = Duration::try_seconds(self.duplicate_window_secs)
            .ok_or_else(|| anyhow!("DUPLICATE_WINDOW_SECS is too large"))?;

        if self.location_cache_ttl_secs > MAX_LOCATION_CACHE_TTL_SECS {
            bail!("LOCATION_CACHE_TTL_SECS cannot exceed {MAX_LOCATION_CACHE_TTL_SECS}");
        }

        Ok(EngineSettings {
            duplicate_window,
            location_cache_ttl: StdDuration::from_secs(self.location_cache_ttl_secs),
            report_offset,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SERVER_ADDR", "127.0.0.1:8080"),
        ("DATABASE_URL", "mysql://localhost/hrm"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.duplicate_window_secs, 300);
        assert_eq!(config.rate_clock_per_min, 30);
        assert_eq!(config.log_level, tracing::Level::DEBUG);

        let settings = config.engine_settings().unwrap();
        assert_eq!(settings.duplicate_window, Duration::minutes(5));
    }

    #[test]
    fn missing_required_value_is_an_error() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn bad_numbers_are_reported() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DUPLICATE_WINDOW_SECS", "five"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(format!("{err:#}").contains("DUPLICATE_WINDOW_SECS"));
    }

    fn settings_with(key: &str, value: &str) -> anyhow::Result<EngineSettings> {
        let mut pairs = REQUIRED.to_vec();
        pairs.push((key, value));
        Config::from_lookup(lookup(&pairs))?.engine_settings()
    }

    #[test]
    fn duplicate_window_must_be_positive() {
        let err = settings_with("DUPLICATE_WINDOW_SECS", "-300").unwrap_err();
        assert!(err.to_string().contains("DUPLICATE_WINDOW_SECS"));
        assert!(settings_with("DUPLICATE_WINDOW_SECS", "0").is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let max = i64::MAX.to_string();
        let err = settings_with("DUPLICATE_WINDOW_SECS", &max).unwrap_err();
        assert!(err.to_string().contains("too large"));

        let ttl = (MAX_LOCATION_CACHE_TTL_SECS + 1).to_string();
        assert!(settings_with("LOCATION_CACHE_TTL_SECS", &ttl).is_err());
        assert!(settings_with("REPORT_UTC_OFFSET_MINUTES", &i32::MAX.to_string()).is_err());
    }

    #[test]
    fn report_offset_is_in_minutes() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("REPORT_UTC_OFFSET_MINUTES", "540"));
        pairs.push(("LOG_LEVEL", "info"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.log_level, tracing::Level::INFO);
        let settings = config.engine_settings().unwrap();
        assert_eq!(settings.report_offset.local_minus_utc(), 9 * 3600);
    }
}
