//! Server Configuration
//!
//! Read from the environment (after `.env` is loaded). Payments stay disabled
//! when neither NOWPayments credential is set; setting only one of them is a
//! startup error.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use labtrust_payments::{
    CheckoutSettings, DEFAULT_CURRENCY, DEFAULT_SHIPPING_USD, NowPaymentsConfig, PaymentError,
};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("NOWPayments: {0}")]
    Payments(#[from] PaymentError),
}

/// Abandoned checkouts are dropped after this long
pub const DEFAULT_PENDING_CART_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,

    /// Externally reachable base URL, used for provider callbacks
    pub public_base_url: String,

    pub catalog_path: PathBuf,

    /// Invoice currency
    pub price_currency: String,

    /// Flat shipping charge per order
    pub shipping: Decimal,

    /// Age at which an unpaid pending cart is purged
    pub pending_cart_ttl: Duration,

    /// `None` when credentials are missing
    pub nowpayments: Option<NowPaymentsConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            public_base_url: "http://localhost:3000".into(),
            catalog_path: PathBuf::from("data/catalog.json"),
            price_currency: DEFAULT_CURRENCY.into(),
            shipping: DEFAULT_SHIPPING_USD,
            pending_cart_ttl: DEFAULT_PENDING_CART_TTL,
            nowpayments: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let shipping = match get("SHIPPING_FLAT_USD") {
            Some(raw) => Decimal::from_str(raw.trim())
                .ok()
                .filter(|d| !d.is_sign_negative())
                .ok_or(ConfigError::Invalid {
                    key: "SHIPPING_FLAT_USD",
                    value: raw,
                })?,
            None => defaults.shipping,
        };

        let pending_cart_ttl = match get("PENDING_CART_TTL_MINS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|mins| *mins > 0)
                .and_then(|mins| mins.checked_mul(60))
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    key: "PENDING_CART_TTL_MINS",
                    value: raw,
                })?,
            None => defaults.pending_cart_ttl,
        };

        let nowpayments =
            if get("NOWPAYMENTS_API_KEY").is_none() && get("NOWPAYMENTS_IPN_SECRET").is_none() {
                None
            } else {
                Some(NowPaymentsConfig::from_lookup(&lookup)?)
            };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_base_url: get("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            catalog_path: get("CATALOG_PATH").map_or(defaults.catalog_path, PathBuf::from),
            price_currency: get("PRICE_CURRENCY")
                .map_or(defaults.price_currency, |c| c.trim().to_lowercase()),
            shipping,
            pending_cart_ttl,
            nowpayments,
        })
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        let mut settings = CheckoutSettings::for_base_url(&self.public_base_url);
        settings.currency.clone_from(&self.price_currency);
        settings.shipping = self.shipping;
        settings
    }
}
