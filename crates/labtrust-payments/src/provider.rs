//! Invoice Provider Strategy
//!
//! Checkout talks to the payment processor only through `InvoiceProvider`,
//! so tests and alternative processors can stand in for NOWPayments.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// Invoice parameters sent to the provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvoiceRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub price_amount: Decimal,

    pub price_currency: String,

    /// Our pending cart id, echoed back in the IPN callback
    pub order_id: String,

    pub order_description: String,
    pub ipn_callback_url: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Provider-issued invoice
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,

    /// Hosted payment page the customer is redirected to
    pub invoice_url: String,
}

#[async_trait]
pub trait InvoiceProvider: Send + Sync {
    /// Request a hosted invoice for the given amount
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice>;

    /// Provider name, used in logs and payment method labels
    fn name(&self) -> &str;
}

/// Accept an identifier sent either as a JSON string or number
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
