//! LabTrust storefront HTTP server
//!
//! Axum router for the catalog, NOWPayments checkout and the IPN webhook.

pub mod config;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    create_invoice, get_order, health_check, list_products, nowpayments_webhook, product_detail,
};

pub use crate::config::{AppConfig, ConfigError};
pub use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & catalog
        .route("/api/health", get(health_check))
        .route("/api/products", get(list_products))
        .route("/api/products/{slug}", get(product_detail))
        // Payments
        .route("/api/checkout/invoice", post(create_invoice))
        .route("/api/webhooks/nowpayments", post(nowpayments_webhook))
        .route("/api/orders/{id}", get(get_order))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
