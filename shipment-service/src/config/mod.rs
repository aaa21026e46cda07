use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Signing secret used when `JWT_SECRET` is absent outside production.
pub const FALLBACK_JWT_SECRET: &str = "fallback-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct ShipmentConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub token_expiry_days: i64,
    /// True when the process runs on [`FALLBACK_JWT_SECRET`].
    #[serde(default)]
    pub using_fallback_secret: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    pub max_page_size: i64,
}

impl ShipmentConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let (jwt_secret, using_fallback_secret) = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => (secret, false),
            _ if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET is required in production but not set"
                )))
            }
            _ => (FALLBACK_JWT_SECRET.to_string(), true),
        };

        Ok(ShipmentConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("shipment_db"), is_prod)?,
            },
            store: StoreConfig {
                backend: get_env("STORE_BACKEND", Some("mongo"), false)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(jwt_secret),
                token_expiry_days: parse_env("JWT_EXPIRY_DAYS", 7)?,
                using_fallback_secret,
            },
            query: QueryConfig {
                max_page_size: parse_env("MAX_PAGE_SIZE", 100)?,
            },
        })
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env(key: &str, default: i64) -> Result<i64, AppError> {
    match env::var(key) {
        Ok(val) => val.parse::<i64>().ok().filter(|v| *v > 0).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "{} must be a positive integer, got '{}'",
                key,
                val
            ))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("mongo".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert_eq!("MongoDB".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_parse_env_defaults_when_unset() {
        assert_eq!(
            parse_env("SHIPMENT_TEST_UNSET_VARIABLE_4F2A", 42).unwrap(),
            42
        );
    }
}
