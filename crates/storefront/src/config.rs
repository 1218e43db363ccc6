//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CART_DIR` - Directory holding the saved cart (default: .)
//! - `STOREFRONT_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping (default: 75.00)
//! - `STOREFRONT_SHIPPING_FEE` - Flat shipping fee (default: 9.99)
//! - `STOREFRONT_TAX_RATE` - Tax rate as a fraction (default: 0.08)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use tjs_core::PricingPolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory where the cart payload file lives
    pub cart_dir: PathBuf,
    /// Shipping and tax rules for the order summary
    pub pricing: PricingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., "production")
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparseable values, or if the
    /// resulting pricing policy is negative.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_or_default::<IpAddr>(&lookup, "STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_or_default::<u16>(&lookup, "STOREFRONT_PORT", "3000")?;
        let cart_dir = PathBuf::from(lookup("STOREFRONT_CART_DIR").unwrap_or_else(|| ".".into()));

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            free_shipping_threshold: parse_decimal(
                &lookup,
                "STOREFRONT_FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            )?,
            shipping_fee: parse_decimal(&lookup, "STOREFRONT_SHIPPING_FEE", defaults.shipping_fee)?,
            tax_rate: parse_decimal(&lookup, "STOREFRONT_TAX_RATE", defaults.tax_rate)?,
        };

        Ok(Self {
            host,
            port,
            cart_dir,
            pricing,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            cart_dir: PathBuf::from("."),
            pricing: PricingPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable, falling back to `default` when unset.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a non-negative decimal variable.
fn parse_decimal(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Decimal,
) -> Result<Decimal, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let value = Decimal::from_str(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if value < Decimal::ZERO {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.cart_dir, PathBuf::from("."));
        assert_eq!(config.pricing, PricingPolicy::default());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("STOREFRONT_HOST", "0.0.0.0"),
            ("STOREFRONT_PORT", "8080"),
            ("STOREFRONT_CART_DIR", "/var/lib/tjs"),
            ("STOREFRONT_FREE_SHIPPING_THRESHOLD", "100"),
            ("STOREFRONT_SHIPPING_FEE", "4.50"),
            ("STOREFRONT_TAX_RATE", "0.0725"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.cart_dir, PathBuf::from("/var/lib/tjs"));
        assert_eq!(config.pricing.free_shipping_threshold, Decimal::from(100));
        assert_eq!(config.pricing.shipping_fee, Decimal::new(450, 2));
        assert_eq!(config.pricing.tax_rate, Decimal::new(725, 4));
    }

    #[test]
    fn test_invalid_port() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[("STOREFRONT_PORT", "http")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar(ref key, _)) if key == "STOREFRONT_PORT"
        ));
    }

    #[test]
    fn test_negative_tax_rate_rejected() {
        let result =
            StorefrontConfig::from_lookup(lookup_from(&[("STOREFRONT_TAX_RATE", "-0.08")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_empty_sentry_dsn_is_none() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[("SENTRY_DSN", "")])).unwrap();
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig::default();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
