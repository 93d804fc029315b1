//! Server configuration parsed from environment variables.
//!
//! `from_env` is a thin wrapper over `from_lookup`, which takes any key lookup
//! so tests can feed a map instead of mutating process-wide env state.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_LOCALES_DIR: &str = "locales";
pub const DEFAULT_DOCS_DIR: &str = "content/docs";
pub const DEFAULT_WEB_DIR: &str = "web/dist";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub session_ttl_days: i64,
    pub cookie_secure: bool,
    pub app_url: String,
    /// Allowed CORS origin. `None` allows any origin.
    pub cors_origin: Option<String>,
    pub locales_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub web_dir: PathBuf,
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a variable fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS)?;
        let session_ttl_days = parse_or("SESSION_TTL_DAYS", get("SESSION_TTL_DAYS"), DEFAULT_SESSION_TTL_DAYS)?;
        if session_ttl_days <= 0 {
            return Err(ConfigError::Invalid { key: "SESSION_TTL_DAYS", value: session_ttl_days.to_string() });
        }

        let app_url = get("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_owned());
        let cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "COOKIE_SECURE", value: raw })?,
            None => app_url.starts_with("https://"),
        };

        Ok(Self {
            database_url,
            port,
            db_max_connections,
            session_ttl_days,
            cookie_secure,
            app_url,
            cors_origin: get("CORS_ORIGIN"),
            locales_dir: get("LOCALES_DIR").unwrap_or_else(|| DEFAULT_LOCALES_DIR.to_owned()).into(),
            docs_dir: get("DOCS_DIR").unwrap_or_else(|| DEFAULT_DOCS_DIR.to_owned()).into(),
            web_dir: get("WEB_DIR").unwrap_or_else(|| DEFAULT_WEB_DIR.to_owned()).into(),
        })
    }
}

/// Parse a boolean flag. Accepts `1/true/yes/on` and `0/false/no/off`.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
