//! Payment Error Types

use labtrust_core::StoreError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Cart validation or storage failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Customer or address details rejected
    #[error("Invalid checkout request: {0}")]
    InvalidRequest(String),

    /// Payment provider call failed; `message` is the provider's error text
    #[error("Payment provider error: {message}")]
    Provider { status: Option<u16>, message: String },

    /// Webhook arrived without a signature header
    #[error("Webhook signature missing")]
    MissingSignature,

    /// Webhook signature did not match the body
    #[error("Webhook signature invalid")]
    InvalidSignature,

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }

    /// HTTP status this error should surface as
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Store(e) if e.is_client_error() => 400,
            Self::Store(_) => 500,
            Self::InvalidRequest(_) | Self::WebhookParse(_) => 400,
            Self::MissingSignature | Self::InvalidSignature => 403,
            Self::Provider { .. } => 502,
            Self::Config(_) => 503,
        }
    }

    /// Stable machine-readable code for API responses
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Store(StoreError::EmptyCart) => "EMPTY_CART",
            Self::Store(StoreError::UnknownProduct(_)) => "UNKNOWN_PRODUCT",
            Self::Store(StoreError::InvalidQuantity { .. }) => "INVALID_QUANTITY",
            Self::Store(_) => "STORAGE_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::MissingSignature => "MISSING_SIGNATURE",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::WebhookParse(_) => "INVALID_PAYLOAD",
            Self::Config(_) => "PAYMENTS_MISCONFIGURED",
        }
    }

    /// Get user-facing message
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(e) if e.is_client_error() => e.to_string(),
            Self::Store(_) => "An error occurred processing your request.".into(),
            Self::Provider { message, .. } => message.clone(),
            Self::Config(_) => "Service configuration error.".into(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PaymentError::Store(StoreError::EmptyCart).status_code(), 400);
        assert_eq!(PaymentError::Store(StoreError::Storage("x".into())).status_code(), 500);
        assert_eq!(PaymentError::InvalidSignature.status_code(), 403);
        assert_eq!(PaymentError::MissingSignature.status_code(), 403);
        assert_eq!(PaymentError::provider(Some(400), "bad").status_code(), 502);
    }

    #[test]
    fn test_provider_text_is_user_message() {
        let err = PaymentError::provider(Some(400), "price_amount is too small");
        assert_eq!(err.user_message(), "price_amount is too small");
        assert_eq!(err.code(), "PROVIDER_ERROR");
    }

    #[test]
    fn test_storage_details_hidden() {
        let err = PaymentError::Store(StoreError::Storage("lock poisoned".into()));
        assert!(!err.user_message().contains("poisoned"));
    }
}
