//! Domain Models
//!
//! Catalog and checkout data types. All monetary values use `rust_decimal`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product image reference
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,

    #[serde(default)]
    pub alt: Option<String>,

    /// Display order, lowest first
    #[serde(default)]
    pub position: u32,
}

/// A catalog item
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,

    pub name: String,

    /// URL-safe identifier, unique within the catalog
    pub slug: String,

    /// Unit price in USD
    pub price_usd: Decimal,

    /// Inactive products are hidden from the storefront and cannot be bought
    pub is_active: bool,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub images: Vec<ProductImage>,

    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>, price_usd: Decimal) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            slug: crate::catalog::slugify(&name),
            name,
            price_usd,
            is_active: true,
            description: None,
            images: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Image shown on listings (lowest position)
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.iter().min_by_key(|img| img.position)
    }
}

/// Buyer contact details
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,
}

/// Shipping destination
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,

    #[serde(default)]
    pub line2: Option<String>,

    pub city: String,

    #[serde(default)]
    pub state: Option<String>,

    pub postal_code: String,
    pub country: String,
}

/// A priced cart line, resolved against the catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub slug: String,
    pub name: String,
    pub unit_price: Decimal,
    pub qty: u32,
    pub line_total: Decimal,
}

impl LineItem {
    pub fn from_product(product: &Product, qty: u32) -> Self {
        Self {
            product_id: product.id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            unit_price: product.price_usd,
            qty,
            line_total: round_money(product.price_usd * Decimal::from(qty)),
        }
    }
}

/// Cart totals
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Sum line totals and add flat shipping
    pub fn compute(items: &[LineItem], shipping: Decimal) -> Self {
        let subtotal = round_money(items.iter().map(|i| i.line_total).sum());
        let shipping = round_money(shipping);
        Self {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}

/// Round to cents
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}
