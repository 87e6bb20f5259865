//! Server configuration, read from `BUNGALOW_*` environment variables.
//!
//! A `.env` file in the working directory is loaded first (see `main`),
//! so every key below may also live there.

use std::fmt;
use std::str::FromStr;

use bungalow_auth::AuthConfig;
use bungalow_db::DbConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("could not read {key} from {path}: {source}")]
    Io {
        key: &'static str,
        path: String,
        source: std::io::Error,
    },
}

/// Controls how much detail error responses carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind_addr: String,
    pub environment: Environment,
    /// IANA zone used for default booking zones and daily statistics.
    pub hotel_time_zone: String,
    pub db: DbConfig,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            environment: Environment::Production,
            hotel_time_zone: "Europe/Istanbul".into(),
            db: DbConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = get("BUNGALOW_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(env) = get("BUNGALOW_ENV") {
            config.environment = env.parse().map_err(|reason| ConfigError::Invalid {
                key: "BUNGALOW_ENV",
                reason,
            })?;
        }
        if let Some(zone) = get("BUNGALOW_HOTEL_TIME_ZONE") {
            config.hotel_time_zone = zone;
        }

        if let Some(url) = get("BUNGALOW_DB_URL") {
            config.db.url = url;
        }
        if let Some(ns) = get("BUNGALOW_DB_NAMESPACE") {
            config.db.namespace = ns;
        }
        if let Some(db) = get("BUNGALOW_DB_DATABASE") {
            config.db.database = db;
        }
        config.db.username = get("BUNGALOW_DB_USERNAME");
        config.db.password = get("BUNGALOW_DB_PASSWORD");

        config.auth.jwt_public_key_pem = pem(&get, "BUNGALOW_JWT_PUBLIC_KEY")?
            .ok_or(ConfigError::Missing("BUNGALOW_JWT_PUBLIC_KEY"))?;
        config.auth.jwt_private_key_pem = pem(&get, "BUNGALOW_JWT_PRIVATE_KEY")?;
        if let Some(issuer) = get("BUNGALOW_JWT_ISSUER") {
            config.auth.jwt_issuer = issuer;
        }
        if let Some(lifetime) = get("BUNGALOW_JWT_LIFETIME_SECS") {
            config.auth.access_token_lifetime_secs =
                lifetime.parse().map_err(|e| ConfigError::Invalid {
                    key: "BUNGALOW_JWT_LIFETIME_SECS",
                    reason: format!("{e}"),
                })?;
        }

        Ok(config)
    }
}

/// A PEM given inline under `key`, or read from the path in `key_FILE`.
fn pem(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<String>, ConfigError> {
    if let Some(inline) = get(key) {
        // Single-line env values carry escaped newlines.
        return Ok(Some(inline.replace("\\n", "\n")));
    }
    match get(&format!("{key}_FILE")) {
        Some(path) => std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| ConfigError::Io { key, path, source }),
        None => Ok(None),
    }
}
