//! NOWPayments IPN Webhook Handling
//!
//! Turns a verified "payment completed" callback into a paid order.

use std::sync::Arc;

use labtrust_core::{Order, OrderStore, PaymentDetails, PendingCartStore, TempCart};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PaymentError, Result};
use crate::provider::lenient_id;
use crate::signature::IpnVerifier;

/// Payment lifecycle states reported by NOWPayments
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    Waiting,
    Confirming,
    Confirmed,
    Sending,
    PartiallyPaid,
    Finished,
    Failed,
    Refunded,
    Expired,
    Other(String),
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "waiting" => Self::Waiting,
            "confirming" => Self::Confirming,
            "confirmed" => Self::Confirmed,
            "sending" => Self::Sending,
            "partially_paid" => Self::PartiallyPaid,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            "refunded" => Self::Refunded,
            "expired" => Self::Expired,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Waiting => "waiting",
            Self::Confirming => "confirming",
            Self::Confirmed => "confirmed",
            Self::Sending => "sending",
            Self::PartiallyPaid => "partially_paid",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::Expired => "expired",
            Self::Other(s) => s,
        }
    }

    /// Funds confirmed on-chain or already forwarded to the merchant
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Finished)
    }
}

/// IPN callback body (fields we use; the provider sends more)
#[derive(Clone, Debug, Deserialize)]
pub struct IpnNotification {
    #[serde(default, deserialize_with = "lenient_id")]
    pub payment_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_id")]
    pub invoice_id: Option<String>,

    /// Our pending cart id
    #[serde(default, deserialize_with = "lenient_id")]
    pub order_id: Option<String>,

    pub payment_status: String,

    #[serde(default)]
    pub price_amount: Option<Decimal>,

    #[serde(default)]
    pub price_currency: Option<String>,

    #[serde(default)]
    pub pay_currency: Option<String>,

    #[serde(default)]
    pub actually_paid: Option<Decimal>,
}

impl IpnNotification {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::parse(&self.payment_status)
    }
}

/// What the webhook did with a callback
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum IpnOutcome {
    /// Payment not completed yet (or failed); nothing to do
    Ignored { status: String },

    /// No pending cart matches; already finalized or never created
    UnknownCart { order_id: Option<String> },

    /// Order materialized from the pending cart
    OrderCreated { order_id: Uuid, cart_id: Uuid },
}

/// Webhook handler
pub struct IpnHandler {
    verifier: IpnVerifier,
    pending: Arc<dyn PendingCartStore>,
    orders: Arc<dyn OrderStore>,
    provider_name: String,
}

impl IpnHandler {
    pub fn new(
        verifier: IpnVerifier,
        pending: Arc<dyn PendingCartStore>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            verifier,
            pending,
            orders,
            provider_name: "nowpayments".into(),
        }
    }

    /// Verify, parse and handle a raw callback
    pub fn process(&self, payload: &[u8], signature: Option<&str>) -> Result<IpnOutcome> {
        if let Err(e) = self.verifier.verify(payload, signature) {
            tracing::warn!(error = %e, "Rejected IPN callback");
            return Err(e);
        }
        let notification = Self::parse(payload)?;
        self.handle(notification)
    }

    pub fn parse(payload: &[u8]) -> Result<IpnNotification> {
        serde_json::from_slice(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))
    }

    /// Handle a verified notification
    pub fn handle(&self, notification: IpnNotification) -> Result<IpnOutcome> {
        let status = notification.status();

        tracing::info!(
            payment_id = ?notification.payment_id,
            order_id = ?notification.order_id,
            status = status.as_str(),
            "Processing IPN callback"
        );

        if !status.is_completed() {
            tracing::debug!(status = status.as_str(), "Payment not completed, ignoring");
            return Ok(IpnOutcome::Ignored {
                status: status.as_str().to_string(),
            });
        }

        let Some(cart) = self.take_cart(&notification)? else {
            tracing::warn!(
                order_id = ?notification.order_id,
                invoice_id = ?notification.invoice_id,
                "No pending cart for completed payment (duplicate delivery?)"
            );
            return Ok(IpnOutcome::UnknownCart {
                order_id: notification.order_id,
            });
        };

        if let Some(paid) = notification.price_amount {
            if paid != cart.totals.total {
                tracing::warn!(
                    cart_id = %cart.id,
                    expected = %cart.totals.total,
                    notified = %paid,
                    "IPN amount differs from cart total"
                );
            }
        }

        let payment = PaymentDetails {
            method: self.payment_method(notification.pay_currency.as_deref()),
            payment_id: notification.payment_id,
            invoice_id: notification.invoice_id,
        };
        let cart_id = cart.id;
        let order = Order::from_paid_cart(cart.clone(), payment);

        if let Err(e) = self.orders.save(&order) {
            tracing::error!(cart_id = %cart_id, error = %e, "Failed to save order");
            // Hand the cart back so the provider's retry can finalize it
            if let Err(restore) = self.pending.save(&cart) {
                tracing::error!(cart_id = %cart_id, error = %restore, "Failed to restore pending cart");
            }
            return Err(e.into());
        }

        tracing::info!(
            order_id = %order.id,
            cart_id = %cart_id,
            amount = %order.amount_total(),
            method = %order.payment_method,
            "Order paid"
        );

        Ok(IpnOutcome::OrderCreated {
            order_id: order.id,
            cart_id,
        })
    }

    /// Atomically claim the pending cart: by our order id, else by invoice id
    fn take_cart(&self, notification: &IpnNotification) -> Result<Option<TempCart>> {
        if let Some(id) = notification
            .order_id
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
        {
            if let Some(cart) = self.pending.take(id)? {
                return Ok(Some(cart));
            }
        }

        match notification.invoice_id.as_deref() {
            Some(invoice_id) => Ok(self.pending.take_by_invoice(invoice_id)?),
            None => Ok(None),
        }
    }

    fn payment_method(&self, pay_currency: Option<&str>) -> String {
        match pay_currency.map(str::trim).filter(|c| !c.is_empty()) {
            Some(currency) => format!("{}:{}", self.provider_name, currency.to_lowercase()),
            None => self.provider_name.clone(),
        }
    }
}
