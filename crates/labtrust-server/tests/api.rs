//! End-to-end API tests against the in-process router

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

use labtrust_core::{MemoryCatalog, Product};
use labtrust_payments::{
    CheckoutSettings, Invoice, InvoiceProvider, InvoiceRequest, IpnVerifier, PaymentError,
    SIGNATURE_HEADER,
};
use labtrust_server::{AppState, router};

const IPN_SECRET: &str = "test-ipn-secret";

struct FakeNowPayments {
    fail_with: Option<String>,
}

#[async_trait]
impl InvoiceProvider for FakeNowPayments {
    async fn create_invoice(&self, request: &InvoiceRequest) -> labtrust_payments::Result<Invoice> {
        if let Some(message) = &self.fail_with {
            return Err(PaymentError::provider(Some(400), message.clone()));
        }
        Ok(Invoice {
            id: "5077125051".into(),
            invoice_url: format!("https://nowpayments.io/payment/?iid=5077125051&order={}", request.order_id),
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn catalog() -> Arc<MemoryCatalog> {
    let mut retired = Product::new("Old Blend", dec!(10));
    retired.is_active = false;

    Arc::new(
        MemoryCatalog::from_products([
            Product::new("BPC-157", dec!(40)),
            Product::new("TB-500", dec!(55.50)),
            retired,
        ])
        .unwrap(),
    )
}

fn app_with(fail_with: Option<&str>) -> Router {
    let state = AppState::new(catalog()).with_payments(
        Arc::new(FakeNowPayments {
            fail_with: fail_with.map(str::to_string),
        }),
        IpnVerifier::new(IPN_SECRET),
        CheckoutSettings::for_base_url("https://shop.example"),
    );
    router(state)
}

fn app() -> Router {
    app_with(None)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn webhook(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhooks/nowpayments")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn checkout_body(items: &Value) -> Value {
    json!({
        "customer": { "name": "Sam Rivera", "email": "sam@example.com" },
        "address": {
            "line1": "12 Harbor Rd",
            "city": "Portland",
            "postal_code": "97201",
            "country": "US"
        },
        "items": items
    })
}

fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a money value: {other}"),
    }
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["payments_configured"], true);
    assert!(body["ts"].is_string());

    let disabled = router(AppState::new(catalog()));
    let (_, body) = send(&disabled, get("/api/health")).await;
    assert_eq!(body["payments_configured"], false);
}

#[tokio::test]
async fn test_product_listing_and_search() {
    let app = app();

    let (status, body) = send(&app, get("/api/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (_, body) = send(&app, get("/api/products?q=bpc")).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["products"][0]["slug"], "bpc-157");

    let (_, body) = send(&app, get("/api/products?q=old")).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_product_detail() {
    let app = app();

    let (status, body) = send(&app, get("/api/products/tb-500")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "TB-500");
    assert_eq!(money(&body["price_usd"]), dec!(55.50));

    for slug in ["old-blend", "nope"] {
        let (status, body) = send(&app, get(&format!("/api/products/{slug}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PRODUCT_NOT_FOUND");
    }
}

#[tokio::test]
async fn test_create_invoice() {
    let items = json!([
        { "slug": "bpc-157", "qty": 2 },
        { "slug": "tb-500", "qty": 1 }
    ]);
    let (status, body) = send(&app(), post_json("/api/checkout/invoice", &checkout_body(&items))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoice_id"], "5077125051");
    assert!(body["invoice_url"].as_str().unwrap().starts_with("https://nowpayments.io/"));
    assert_eq!(money(&body["totals"]["subtotal"]), dec!(135.50));
    assert_eq!(money(&body["totals"]["shipping"]), dec!(9.00));
    assert_eq!(money(&body["totals"]["total"]), dec!(144.50));
}

#[tokio::test]
async fn test_create_invoice_rejects_bad_carts() {
    let app = app();

    let cases = [
        (json!([]), "EMPTY_CART"),
        (json!([{ "slug": "unknown", "qty": 1 }]), "UNKNOWN_PRODUCT"),
        (json!([{ "slug": "old-blend", "qty": 1 }]), "UNKNOWN_PRODUCT"),
        (json!([{ "slug": "bpc-157", "qty": 0 }]), "INVALID_QUANTITY"),
    ];
    for (items, code) in cases {
        let (status, body) = send(&app, post_json("/api/checkout/invoice", &checkout_body(&items))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{code}");
        assert_eq!(body["code"], code);
    }
}

#[tokio::test]
async fn test_create_invoice_malformed_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/checkout/invoice")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_create_invoice_provider_error() {
    let app = app_with(Some("price_amount is less than minimal"));
    let items = json!([{ "slug": "bpc-157", "qty": 1 }]);
    let (status, body) = send(&app, post_json("/api/checkout/invoice", &checkout_body(&items))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "PROVIDER_ERROR");
    assert_eq!(body["error"], "price_amount is less than minimal");
}

#[tokio::test]
async fn test_payments_disabled() {
    let app = router(AppState::new(catalog()));
    let items = json!([{ "slug": "bpc-157", "qty": 1 }]);

    let (status, body) = send(&app, post_json("/api/checkout/invoice", &checkout_body(&items))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "PAYMENTS_DISABLED");

    let (status, body) = send(&app, webhook("{}", Some("00"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "PAYMENTS_DISABLED");
}

#[tokio::test]
async fn test_webhook_rejects_bad_signatures() {
    let app = app();
    let body = r#"{"payment_id":1,"payment_status":"finished","order_id":"x"}"#;

    let (status, json) = send(&app, webhook(body, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "MISSING_SIGNATURE");

    let forged = IpnVerifier::new("wrong-secret").sign(body.as_bytes()).unwrap();
    let (status, json) = send(&app, webhook(body, Some(&forged))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "INVALID_SIGNATURE");
}

#[tokio::test]
async fn test_paid_invoice_becomes_order() {
    let app = app();
    let verifier = IpnVerifier::new(IPN_SECRET);

    let items = json!([{ "slug": "bpc-157", "qty": 3 }]);
    let (_, session) = send(&app, post_json("/api/checkout/invoice", &checkout_body(&items))).await;
    let cart_id = session["cart_id"].as_str().unwrap().to_string();

    // Intermediate status: nothing happens
    let waiting = json!({
        "payment_id": 6022712345_u64,
        "invoice_id": 5077125051_u64,
        "order_id": cart_id,
        "payment_status": "waiting",
        "price_amount": 129,
        "price_currency": "usd",
        "pay_currency": "btc"
    })
    .to_string();
    let sig = verifier.sign(waiting.as_bytes()).unwrap();
    let (status, outcome) = send(&app, webhook(&waiting, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["result"], "ignored");

    let finished = waiting.replace("\"waiting\"", "\"finished\"");
    let sig = verifier.sign(finished.as_bytes()).unwrap();
    let (status, outcome) = send(&app, webhook(&finished, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["result"], "order_created");
    assert_eq!(outcome["cart_id"], cart_id.as_str());
    let order_id = outcome["order_id"].as_str().unwrap().to_string();

    // Redelivery of the same callback finds no pending cart
    let (status, outcome) = send(&app, webhook(&finished, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["result"], "unknown_cart");

    let (status, order) = send(&app, get(&format!("/api/orders/{order_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["paid"], true);
    assert_eq!(order["status"], "paid");
    assert_eq!(order["payment_method"], "nowpayments:btc");
    assert_eq!(order["payment_id"], "6022712345");
    assert_eq!(money(&order["totals"]["total"]), dec!(129.00));
}

#[tokio::test]
async fn test_unknown_order() {
    let uri = format!("/api/orders/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app(), get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ORDER_NOT_FOUND");
}

#[test]
fn test_shipped_catalog_loads() {
    use labtrust_core::ProductCatalog;

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/catalog.json");
    let catalog = MemoryCatalog::load_from_path(path).unwrap();
    assert_eq!(catalog.len(), 5);
    assert!(catalog.get_active("tb-500-5mg").is_some());
    assert!(catalog.get_active("ipamorelin-5mg").is_none());
    assert_eq!(catalog.list_active()[0].slug, "ghk-cu-50mg");
}
