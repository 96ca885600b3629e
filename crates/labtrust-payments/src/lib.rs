//! # labtrust-payments
//!
//! Crypto checkout for the LabTrust storefront via NOWPayments hosted
//! invoices.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  create_invoice  ┌──────────────────┐   pays   ┌─────────────┐
//! │  Storefront │─────────────────▶│ NOWPayments page │─────────▶│  Customer   │
//! │  checkout   │◀─ invoice_url ───│   (hosted)       │          │   wallet    │
//! └─────────────┘                  └──────────────────┘          └─────────────┘
//!        ▲                                  │
//!        │        IPN (x-nowpayments-sig)   │
//!        └──────────── IpnHandler ◀─────────┘
//!                 verify → take cart → Order
//! ```
//!
//! 1. `CheckoutService::create_invoice` prices the cart against the catalog,
//!    holds it as a `TempCart` and asks the `InvoiceProvider` for an invoice.
//! 2. The provider calls back on every status change. `IpnHandler` verifies
//!    the HMAC-SHA512 signature, ignores anything short of a completed
//!    payment, and turns the pending cart into a paid `Order` at most once.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use labtrust_payments::{NowPaymentsClient, NowPaymentsConfig};
//!
//! let config = NowPaymentsConfig::from_lookup(|key| std::env::var(key).ok())?;
//! let client = NowPaymentsClient::new(&config)?;
//! let handler = IpnHandler::new(config.verifier(), pending, orders);
//! ```

mod checkout;
mod error;
mod nowpayments;
mod provider;
mod signature;
mod webhook;

pub use checkout::{
    CheckoutRequest, CheckoutService, CheckoutSession, CheckoutSettings, DEFAULT_CURRENCY,
    DEFAULT_SHIPPING_USD,
};
pub use error::{PaymentError, Result};
pub use nowpayments::{DEFAULT_API_URL, NowPaymentsClient, NowPaymentsConfig};
pub use provider::{Invoice, InvoiceProvider, InvoiceRequest};
pub use signature::{IpnVerifier, SIGNATURE_HEADER};
pub use webhook::{IpnHandler, IpnNotification, IpnOutcome, PaymentStatus};
