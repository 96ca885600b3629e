//! HTTP Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use labtrust_core::{Order, Product};
use labtrust_payments::{CheckoutRequest, CheckoutSession, IpnOutcome, PaymentError, SIGNATURE_HEADER};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub ts: DateTime<Utc>,
    pub version: &'static str,
    pub payments_configured: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn error_response(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn payment_error(e: &PaymentError) -> ApiError {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, e.user_message(), e.code())
}

fn payments_disabled() -> ApiError {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "Payments not configured",
        "PAYMENTS_DISABLED",
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ts: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        payments_configured: state.payments_configured(),
    })
}

/// Active products, optionally filtered by `?q=`
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<ProductListResponse> {
    let products = match query.q.as_deref() {
        Some(q) => state.catalog.search(q),
        None => state.catalog.list_active(),
    };

    Json(ProductListResponse {
        count: products.len(),
        products,
    })
}

pub async fn product_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Product> {
    state.catalog.get_active(&slug).map(Json).ok_or_else(|| {
        error_response(StatusCode::NOT_FOUND, "Product not found", "PRODUCT_NOT_FOUND")
    })
}

/// Price the cart and open a NOWPayments invoice
pub async fn create_invoice(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<CheckoutSession> {
    let checkout = state.checkout.as_ref().ok_or_else(payments_disabled)?;

    let Json(request) = payload.map_err(|rejection| {
        error_response(StatusCode::BAD_REQUEST, rejection.body_text(), "INVALID_REQUEST")
    })?;

    let session = checkout.create_invoice(request).await.map_err(|e| {
        if e.status_code() >= 500 {
            tracing::error!(error = %e, code = e.code(), "Checkout error");
        } else {
            tracing::debug!(error = %e, code = e.code(), "Checkout rejected");
        }
        payment_error(&e)
    })?;

    Ok(Json(session))
}

/// NOWPayments IPN webhook
///
/// Takes the raw body so the signature is checked over the exact bytes sent.
pub async fn nowpayments_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<IpnOutcome> {
    let ipn = state.ipn.as_ref().ok_or_else(payments_disabled)?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = ipn.process(&body, signature).map_err(|e| {
        if e.status_code() >= 500 {
            tracing::error!(error = %e, code = e.code(), "Webhook processing error");
        }
        payment_error(&e)
    })?;

    Ok(Json(outcome))
}

/// Finalized order lookup
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Order> {
    match state.orders.get(id) {
        Ok(Some(order)) => Ok(Json(order)),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            "Order not found",
            "ORDER_NOT_FOUND",
        )),
        Err(e) => {
            tracing::error!(order_id = %id, error = %e, "Order lookup failed");
            Err(payment_error(&PaymentError::from(e)))
        }
    }
}
