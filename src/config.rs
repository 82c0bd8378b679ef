use std::fmt;

use crate::listing::ListingSettings;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_PAGE_SIZE: i64 = 20;
const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// Service configuration, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` only when running against the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub session_key: Option<String>,
    pub page_size: i64,
    pub public_base_url: String,
    pub db_max_connections: u32,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "{key}='{value}' is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_key: None,
            page_size: DEFAULT_PAGE_SIZE,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl AppConfig {
    pub fn from_env(require_database: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), require_database)
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F, require_database: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if require_database && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let page_size = match lookup("AGENDA_PAGE_SIZE") {
            Some(raw) => {
                let n: i64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "AGENDA_PAGE_SIZE",
                    value: raw.clone(),
                    reason: "not a number".to_string(),
                })?;
                if !(1..=100).contains(&n) {
                    return Err(ConfigError::Invalid {
                        key: "AGENDA_PAGE_SIZE",
                        value: raw,
                        reason: "must be between 1 and 100".to_string(),
                    });
                }
                n
            }
            None => defaults.page_size,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: raw.clone(),
                reason: "not a positive integer".to_string(),
            })?,
            None => defaults.db_max_connections,
        };

        Ok(AppConfig {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_key: lookup("SESSION_KEY"),
            page_size,
            public_base_url: lookup("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            db_max_connections,
        })
    }

    pub fn listing_settings(&self) -> ListingSettings {
        ListingSettings {
            page_size: self.page_size,
            public_base_url: self.public_base_url.clone(),
            ..ListingSettings::default()
        }
    }
}
