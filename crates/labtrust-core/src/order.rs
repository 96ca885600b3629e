//! Orders
//!
//! Durable record of a paid cart. Orders exist only after the payment
//! provider has confirmed settlement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::TempCart;
use crate::model::{Customer, LineItem, ShippingAddress, Totals};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Paid,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement details reported by the payment provider
#[derive(Clone, Debug, Default)]
pub struct PaymentDetails {
    /// e.g. "nowpayments:btc"
    pub method: String,
    pub payment_id: Option<String>,
    pub invoice_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,

    /// Pending cart this order was materialized from
    pub cart_id: Uuid,

    pub customer: Customer,
    pub address: ShippingAddress,
    pub items: Vec<LineItem>,
    pub totals: Totals,
    pub currency: String,

    pub payment_method: String,
    pub payment_id: Option<String>,
    pub invoice_id: Option<String>,

    pub status: OrderStatus,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Materialize a paid order from a confirmed pending cart
    pub fn from_paid_cart(cart: TempCart, payment: PaymentDetails) -> Self {
        Self {
            id: Uuid::new_v4(),
            cart_id: cart.id,
            customer: cart.customer,
            address: cart.address,
            items: cart.items,
            totals: cart.totals,
            currency: cart.currency,
            payment_method: payment.method,
            payment_id: payment.payment_id,
            invoice_id: payment.invoice_id.or(cart.invoice_id),
            status: OrderStatus::Paid,
            paid: true,
            created_at: Utc::now(),
        }
    }

    pub const fn amount_total(&self) -> Decimal {
        self.totals.total
    }
}
