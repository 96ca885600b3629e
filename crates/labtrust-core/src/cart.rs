//! Cart Pricing
//!
//! Turns client-submitted cart lines into priced line items and holds the
//! pending cart between invoice creation and payment confirmation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ProductCatalog;
use crate::error::{Result, StoreError};
use crate::model::{Customer, LineItem, ShippingAddress, Totals};

/// Upper bound on a single line's quantity
pub const MAX_QTY: u32 = 99;

/// Cart line as submitted by the client
///
/// Only the slug and quantity are trusted; prices come from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemInput {
    #[serde(alias = "sku")]
    pub slug: String,

    #[serde(alias = "quantity")]
    pub qty: u32,
}

impl CartItemInput {
    pub fn new(slug: impl Into<String>, qty: u32) -> Self {
        Self {
            slug: slug.into(),
            qty,
        }
    }
}

/// Priced cart, ready to be invoiced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricedCart {
    pub items: Vec<LineItem>,
    pub totals: Totals,
}

/// Resolve and price cart lines
///
/// Duplicate slugs are merged, preserving first-seen order. Fails on an empty
/// cart, a quantity outside `1..=MAX_QTY`, or a slug that is not an active
/// product.
pub fn price_cart(
    catalog: &dyn ProductCatalog,
    items: &[CartItemInput],
    shipping: Decimal,
) -> Result<PricedCart> {
    if items.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    let mut merged: Vec<(String, u32)> = Vec::with_capacity(items.len());
    for item in items {
        // Slugs are always lowercase
        let slug = item.slug.trim().to_ascii_lowercase();
        check_qty(&slug, item.qty)?;
        match merged.iter_mut().find(|(s, _)| *s == slug) {
            Some((_, qty)) => {
                *qty = qty.saturating_add(item.qty);
                check_qty(&slug, *qty)?;
            }
            None => merged.push((slug, item.qty)),
        }
    }

    let lines = merged
        .into_iter()
        .map(|(slug, qty)| {
            catalog
                .get_active(&slug)
                .map(|product| LineItem::from_product(&product, qty))
                .ok_or(StoreError::UnknownProduct(slug))
        })
        .collect::<Result<Vec<_>>>()?;

    let totals = Totals::compute(&lines, shipping);
    Ok(PricedCart { items: lines, totals })
}

fn check_qty(slug: &str, qty: u32) -> Result<()> {
    if qty == 0 || qty > MAX_QTY {
        return Err(StoreError::InvalidQuantity {
            slug: slug.to_string(),
            qty,
            max: MAX_QTY,
        });
    }
    Ok(())
}

/// Cart held server-side while the customer pays
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TempCart {
    /// Also sent to the payment provider as its `order_id`
    pub id: Uuid,

    pub customer: Customer,
    pub address: ShippingAddress,
    pub items: Vec<LineItem>,
    pub totals: Totals,

    /// Invoice currency, e.g. "usd"
    pub currency: String,

    /// Provider invoice reference, set once the invoice exists
    pub invoice_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl TempCart {
    pub fn new(
        customer: Customer,
        address: ShippingAddress,
        priced: PricedCart,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer,
            address,
            items: priced.items,
            totals: priced.totals,
            currency: currency.into(),
            invoice_id: None,
            created_at: Utc::now(),
        }
    }

    /// Short human-readable summary, used as the invoice description
    pub fn description(&self) -> String {
        let units: u32 = self.items.iter().map(|i| i.qty).sum();
        match self.items.as_slice() {
            [only] => format!("{} x{}", only.name, only.qty),
            _ => format!("{} items ({} units)", self.items.len(), units),
        }
    }
}
