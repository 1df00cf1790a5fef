//! Environment-driven configuration. `.env` is loaded by `main` through
//! dotenvy before these are read.

use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use crate::domain::value_objects::{Currency, Money};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub currency: Currency,
    pub shipping_fee: Money,
    pub brand_aliases_path: Option<PathBuf>,
    pub chat_capacity: usize,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8083, database_url: None, nats_url: None, currency: Currency::Npr,
            shipping_fee: Money::npr(150), brand_aliases_path: None, chat_capacity: 256,
            request_timeout: Duration::from_secs(10),
        }
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    var(key).map(|value| value.parse::<T>().map_err(|_| ConfigError::Invalid { key, value })).transpose()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let currency = parse::<Currency>("CURRENCY")?.unwrap_or(defaults.currency);
        let fee = parse::<Decimal>("SHIPPING_FEE")?.unwrap_or(defaults.shipping_fee.amount());
        if fee.is_sign_negative() {
            return Err(ConfigError::Invalid { key: "SHIPPING_FEE", value: fee.to_string() });
        }
        Ok(Self {
            port: parse("PORT")?.unwrap_or(defaults.port),
            database_url: var("DATABASE_URL"),
            nats_url: var("NATS_URL"),
            currency,
            shipping_fee: Money::new(fee, currency),
            brand_aliases_path: var("BRAND_ALIASES_PATH").map(PathBuf::from),
            chat_capacity: parse("CHAT_CAPACITY")?.unwrap_or(defaults.chat_capacity),
            request_timeout: parse::<u64>("REQUEST_TIMEOUT_SECS")?.map(Duration::from_secs).unwrap_or(defaults.request_timeout),
        })
    }
}

/// Settings for [`crate::client::StorefrontClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub shipping_fee: Money,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8083".to_string(), timeout: Duration::from_secs(10), shipping_fee: Config::default().shipping_fee }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let server = Config::from_env()?;
        Ok(Self {
            base_url: var("STOREFRONT_API_URL").map(|u| u.trim_end_matches('/').to_string()).unwrap_or(defaults.base_url),
            timeout: server.request_timeout,
            shipping_fee: server.shipping_fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.port, 8083);
        assert_eq!(config.currency, Currency::Npr);
        assert_eq!(config.shipping_fee.amount(), Decimal::from(150));
    }

    #[test]
    fn parse_reports_key_and_value() {
        std::env::set_var("STOREFRONT_TEST_PORT", "eighty");
        let err = parse::<u16>("STOREFRONT_TEST_PORT").unwrap_err();
        assert_eq!(err.to_string(), "invalid value for STOREFRONT_TEST_PORT: eighty");
        std::env::remove_var("STOREFRONT_TEST_PORT");
        assert!(parse::<u16>("STOREFRONT_TEST_PORT").unwrap().is_none());
    }
}
