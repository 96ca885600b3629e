//! LabTrust storefront server
//!
//! Serves the product catalog and takes crypto payments through NOWPayments.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labtrust_core::{MemoryCatalog, ProductCatalog};
use labtrust_payments::NowPaymentsClient;
use labtrust_server::{AppConfig, AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Catalog
    let catalog = if config.catalog_path.exists() {
        MemoryCatalog::load_from_path(&config.catalog_path).with_context(|| {
            format!("loading catalog from {}", config.catalog_path.display())
        })?
    } else {
        tracing::warn!("⚠ Catalog not found at {}", config.catalog_path.display());
        tracing::warn!("  Set CATALOG_PATH to a JSON product seed");
        MemoryCatalog::new()
    };
    tracing::info!("✓ Catalog: {} products", catalog.len());

    let mut state = AppState::new(Arc::new(catalog));

    // Initialize payments
    if let Some(nowpayments) = &config.nowpayments {
        let client = NowPaymentsClient::new(nowpayments)?;
        state = state.with_payments(
            Arc::new(client),
            nowpayments.verifier(),
            config.checkout_settings(),
        );
        tracing::info!("✓ NOWPayments configured ({})", nowpayments.api_url);
    } else {
        tracing::warn!("⚠ NOWPayments not configured - payments disabled");
        tracing::warn!("  Set NOWPAYMENTS_API_KEY and NOWPAYMENTS_IPN_SECRET in .env");
    }

    // Drop checkouts that were never paid
    let sweep_every = config.pending_cart_ttl.min(Duration::from_secs(300));
    state.spawn_cart_sweeper(config.pending_cart_ttl, sweep_every);
    tracing::info!(
        "✓ Pending carts expire after {} minutes",
        config.pending_cart_ttl.as_secs() / 60
    );

    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 labtrust server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /api/health              - Health check");
    tracing::info!("  GET  /api/products            - List/search products");
    tracing::info!("  GET  /api/products/{{slug}}     - Product detail");
    tracing::info!("  POST /api/checkout/invoice    - Create NOWPayments invoice");
    tracing::info!("  POST /api/webhooks/nowpayments - IPN callback");
    tracing::info!("  GET  /api/orders/{{id}}         - Order lookup");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
