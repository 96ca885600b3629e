//! Error Types

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Catalog, cart and order errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Cart submitted without any items
    #[error("Cart is empty")]
    EmptyCart,

    /// Slug does not resolve to an active product
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// Quantity outside the accepted range
    #[error("Invalid quantity {qty} for {slug} (allowed 1-{max})")]
    InvalidQuantity { slug: String, qty: u32, max: u32 },

    /// Catalog seed is malformed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Backing storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error (catalog loading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the error was caused by client input rather than the server
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyCart | Self::UnknownProduct(_) | Self::InvalidQuantity { .. }
        )
    }

    pub(crate) fn poisoned() -> Self {
        Self::Storage("lock poisoned".into())
    }
}
