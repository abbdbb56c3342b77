use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// What happens to a cart line whose product disappears from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletedProductPolicy {
    /// Keep the line at its last known price and quantity; block increases.
    #[default]
    Freeze,
    /// Drop the line as soon as a snapshot without the product arrives.
    Evict,
}

impl FromStr for DeletedProductPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "freeze" => Ok(Self::Freeze),
            "evict" => Ok(Self::Evict),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub cart_buffer_size: usize,
    pub feed_buffer_size: usize,
    pub deleted_product_policy: DeletedProductPolicy,
    /// Filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cart_buffer_size: 100,
            feed_buffer_size: 100,
            deleted_product_policy: DeletedProductPolicy::Freeze,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Reads the environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cart_buffer_size = parse_or(&lookup, "CART_BUFFER_SIZE", defaults.cart_buffer_size)?;
        let feed_buffer_size = parse_or(&lookup, "FEED_BUFFER_SIZE", defaults.feed_buffer_size)?;
        let deleted_product_policy = parse_or(
            &lookup,
            "CART_DELETED_PRODUCT_POLICY",
            defaults.deleted_product_policy,
        )?;
        let log_level = lookup("LOG_LEVEL").unwrap_or(defaults.log_level);

        if cart_buffer_size == 0 {
            return Err(ConfigError::Invalid {
                name: "CART_BUFFER_SIZE",
                value: "0".to_string(),
            });
        }
        if feed_buffer_size == 0 {
            return Err(ConfigError::Invalid {
                name: "FEED_BUFFER_SIZE",
                value: "0".to_string(),
            });
        }

        tracing::debug!(?deleted_product_policy, cart_buffer_size, feed_buffer_size, "Engine configuration loaded");

        Ok(Self {
            cart_buffer_size,
            feed_buffer_size,
            deleted_product_policy,
            log_level,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
