//! NOWPayments Integration
//!
//! Hosted crypto invoices: the customer is redirected to the provider's
//! invoice page and settlement is reported back through the IPN webhook.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{PaymentError, Result};
use crate::provider::{Invoice, InvoiceProvider, InvoiceRequest, lenient_id};
use crate::signature::IpnVerifier;

pub const DEFAULT_API_URL: &str = "https://api.nowpayments.io/v1";

/// NOWPayments credentials and endpoint
#[derive(Clone)]
pub struct NowPaymentsConfig {
    pub api_key: String,

    /// Shared secret for IPN signatures
    pub ipn_secret: String,

    pub api_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl NowPaymentsConfig {
    pub fn new(api_key: impl Into<String>, ipn_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ipn_secret: ipn_secret.into(),
            api_url: DEFAULT_API_URL.into(),
            timeout_secs: 30,
        }
    }

    /// Create from a key/value source such as the process environment
    ///
    /// Reads `NOWPAYMENTS_API_KEY`, `NOWPAYMENTS_IPN_SECRET` and the optional
    /// `NOWPAYMENTS_API_URL`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PaymentError::Config(format!("{key} not set")))
        };
        let mut config = Self::new(
            required("NOWPAYMENTS_API_KEY")?,
            required("NOWPAYMENTS_IPN_SECRET")?,
        );
        if let Some(url) = lookup("NOWPAYMENTS_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url;
        }
        Ok(config)
    }

    pub fn verifier(&self) -> IpnVerifier {
        IpnVerifier::new(&self.ipn_secret)
    }
}

impl std::fmt::Debug for NowPaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NowPaymentsConfig")
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// NOWPayments REST client
pub struct NowPaymentsClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl NowPaymentsClient {
    pub fn new(config: &NowPaymentsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaymentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }
}

/// Invoice creation response (only the fields we use)
#[derive(Debug, Deserialize)]
struct InvoiceResponse {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,

    #[serde(default)]
    invoice_url: Option<String>,
}

#[async_trait]
impl InvoiceProvider for NowPaymentsClient {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice> {
        let response = self
            .http
            .post(self.endpoint("invoice"))
            .header("x-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::provider(None, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::provider(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(PaymentError::provider(
                Some(status.as_u16()),
                error_text(status.as_u16(), &body),
            ));
        }

        parse_invoice(&body).map_err(|message| PaymentError::provider(Some(status.as_u16()), message))
    }

    fn name(&self) -> &str {
        "nowpayments"
    }
}

fn parse_invoice(body: &str) -> std::result::Result<Invoice, String> {
    let parsed: InvoiceResponse =
        serde_json::from_str(body).map_err(|e| format!("unexpected invoice response: {e}"))?;

    match (parsed.id, parsed.invoice_url) {
        (Some(id), Some(invoice_url)) if !invoice_url.is_empty() => Ok(Invoice { id, invoice_url }),
        _ => Err("invoice response missing id or invoice_url".into()),
    }
}

/// Extract the provider's error text from an error body
///
/// NOWPayments answers errors with `{"statusCode": .., "code": .., "message": ..}`.
fn error_text(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("HTTP {status}"))
}
