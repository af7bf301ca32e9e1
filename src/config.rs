use std::env;
use std::time::Duration;

use crate::models::Cadence;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // JWT
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,

    // Server
    pub host: String,
    pub port: u16,

    // Execution
    pub request_timeout_seconds: u64,

    // Scheduler
    pub scheduler_cadences: Vec<Cadence>,
    pub scheduler_in_server: bool,

    // Logging
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        let request_timeout_seconds: u64 = env::var("REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?;
        if request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"));
        }

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            // JWT
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("JWT_EXPIRATION_HOURS"))?,

            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,

            request_timeout_seconds,

            // Scheduler
            scheduler_cadences: parse_cadences(
                &env::var("SCHEDULER_CADENCES")
                    .unwrap_or_else(|_| "hourly,daily,weekly,monthly".to_string()),
            )?,
            scheduler_in_server: parse_bool(
                "SCHEDULER_IN_SERVER",
                &env::var("SCHEDULER_IN_SERVER").unwrap_or_else(|_| "false".to_string()),
            )?,

            log_json: match env::var("LOG_FORMAT").as_deref() {
                Err(_) | Ok("text") => false,
                Ok("json") => true,
                Ok(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
            },
        })
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-step request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Parse a comma separated cadence list such as `"hourly,daily"`.
///
/// Duplicates are collapsed; an empty list is allowed and disables scheduling.
pub fn parse_cadences(raw: &str) -> Result<Vec<Cadence>, ConfigError> {
    let mut cadences = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let cadence: Cadence = name
            .parse()
            .map_err(|_| ConfigError::Invalid("SCHEDULER_CADENCES"))?;
        if !cadences.contains(&cadence) {
            cadences.push(cadence);
        }
    }
    Ok(cadences)
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Invalid(name)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cadences() {
        let cadences = parse_cadences("daily, hourly,daily").unwrap();
        assert_eq!(cadences, vec![Cadence::Daily, Cadence::Hourly]);

        assert!(parse_cadences("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_cadences_rejects_unknown_name() {
        let err = parse_cadences("hourly,fortnightly").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("SCHEDULER_CADENCES")));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
