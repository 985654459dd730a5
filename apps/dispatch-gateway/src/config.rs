//! Typed configuration read once at boot from flat environment variables
//! (spec §6 "Configuration"). No layered `config`-crate setup, matching the
//! teacher's `dotenvy`-only approach.

use rust_decimal::Decimal;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_auth_token: Option<String>,
    pub bind_address: SocketAddr,
    pub auth_signing_key: String,
    pub cors_allowed_origins: Vec<String>,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub dynamic_multiplier_ceiling: Decimal,
    pub sla_warning_threshold_min: i64,
    pub offer_expiry_sweep_interval_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    Missing(&'static str),
    #[error("environment variable `{name}` has an invalid value: {detail}")]
    Invalid { name: &'static str, detail: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let database_auth_token = env::var("DATABASE_AUTH_TOKEN").ok();

        let bind_address = env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDRESS",
                detail: format!("{e}"),
            })?;

        let auth_signing_key =
            env::var("AUTH_SIGNING_KEY").map_err(|_| ConfigError::Missing("AUTH_SIGNING_KEY"))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let default_page_size = parse_env_or("DEFAULT_PAGE_SIZE", 20)?;
        let max_page_size = parse_env_or("MAX_PAGE_SIZE", 100)?;
        let sla_warning_threshold_min = parse_env_or("SLA_WARNING_THRESHOLD_MIN", 5)?;
        let offer_expiry_sweep_interval_secs =
            parse_env_or("OFFER_EXPIRY_SWEEP_INTERVAL_SECS", 15)?;

        let dynamic_multiplier_ceiling = match env::var("DYNAMIC_MULTIPLIER_CEILING") {
            Ok(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                name: "DYNAMIC_MULTIPLIER_CEILING",
                detail: format!("{e}"),
            })?,
            Err(_) => dispatch_domain_pricing::DEFAULT_MULTIPLIER_CEILING,
        };

        Ok(Self {
            database_url,
            database_auth_token,
            bind_address,
            auth_signing_key,
            cors_allowed_origins,
            default_page_size,
            max_page_size,
            dynamic_multiplier_ceiling,
            sla_warning_threshold_min,
            offer_expiry_sweep_interval_secs,
        })
    }
}

fn parse_env_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
            name,
            detail: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}
