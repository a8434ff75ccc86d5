//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

const DEV_JWT_SECRET: &str = "pharmacy-dev-secret-change-in-production";

/// Twilio credentials for SMS delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, E.164.
    pub from_number: String,
}

/// Credentials for the first admin, created at startup when none exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    /// How long a password reset code stays valid
    pub reset_code_lifetime_secs: i64,

    /// SMS gateway; `None` logs codes instead of sending them
    pub twilio: Option<TwilioConfig>,

    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ApiConfig {
            http_port: parse_or(&lookup, "HTTP_PORT", 8080)?,

            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "./pharmacy.db".to_string()),

            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,

            jwt_secret: match lookup("JWT_SECRET") {
                Some(secret) if !secret.is_empty() => secret,
                _ => {
                    tracing::warn!("JWT_SECRET not set, using the development secret");
                    DEV_JWT_SECRET.to_string()
                }
            },

            jwt_access_lifetime_secs: parse_or(&lookup, "JWT_ACCESS_LIFETIME_SECS", 259_200)?, // 72 hours

            jwt_refresh_lifetime_secs: parse_or(&lookup, "JWT_REFRESH_LIFETIME_SECS", 604_800)?, // 7 days

            reset_code_lifetime_secs: parse_or(&lookup, "RESET_CODE_LIFETIME_SECS", 600)?,

            twilio: twilio_from(&lookup)?,

            bootstrap_admin: match (
                lookup("BOOTSTRAP_ADMIN_PHONE"),
                lookup("BOOTSTRAP_ADMIN_PASSWORD"),
            ) {
                (Some(phone_number), Some(password)) => Some(BootstrapAdmin {
                    phone_number,
                    password,
                }),
                (None, None) => None,
                (Some(_), None) => {
                    return Err(ConfigError::MissingRequired(
                        "BOOTSTRAP_ADMIN_PASSWORD".to_string(),
                    ))
                }
                (None, Some(_)) => {
                    return Err(ConfigError::MissingRequired(
                        "BOOTSTRAP_ADMIN_PHONE".to_string(),
                    ))
                }
            },
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// All three Twilio variables or none of them.
fn twilio_from<F>(lookup: &F) -> Result<Option<TwilioConfig>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    const KEYS: [&str; 3] = [
        "TWILIO_ACCOUNT_SID",
        "TWILIO_AUTH_TOKEN",
        "TWILIO_PHONE_NUMBER",
    ];

    let values: Vec<Option<String>> = KEYS.iter().map(|k| lookup(k)).collect();
    if values.iter().all(Option::is_none) {
        return Ok(None);
    }

    if let Some(pos) = values.iter().position(Option::is_none) {
        return Err(ConfigError::MissingRequired(KEYS[pos].to_string()));
    }

    let mut values = values.into_iter().flatten();
    match (values.next(), values.next(), values.next()) {
        (Some(account_sid), Some(auth_token), Some(from_number)) => Ok(Some(TwilioConfig {
            account_sid,
            auth_token,
            from_number,
        })),
        _ => Err(ConfigError::MissingRequired("TWILIO_ACCOUNT_SID".to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database_path, "./pharmacy.db");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.jwt_access_lifetime_secs, 72 * 3600);
        assert_eq!(config.jwt_refresh_lifetime_secs, 7 * 24 * 3600);
        assert_eq!(config.reset_code_lifetime_secs, 600);
        assert!(config.twilio.is_none());
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_malformed_value_names_variable() {
        let err = load(&[("HTTP_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k) if k == "HTTP_PORT"));

        let err = load(&[("DB_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_twilio_all_or_none() {
        let config = load(&[
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "tok"),
            ("TWILIO_PHONE_NUMBER", "+15550001111"),
        ])
        .unwrap();
        let twilio = config.twilio.unwrap();
        assert_eq!(twilio.account_sid, "AC123");
        assert_eq!(twilio.from_number, "+15550001111");

        let err = load(&[("TWILIO_ACCOUNT_SID", "AC123")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref k) if k == "TWILIO_AUTH_TOKEN"));
    }

    #[test]
    fn test_bootstrap_admin_needs_both_values() {
        let config = load(&[
            ("BOOTSTRAP_ADMIN_PHONE", "+251900000001"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "password123"),
        ])
        .unwrap();
        assert!(config.bootstrap_admin.is_some());

        assert!(load(&[("BOOTSTRAP_ADMIN_PHONE", "+251900000001")]).is_err());
    }
}
