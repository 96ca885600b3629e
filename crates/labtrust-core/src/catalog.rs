//! Product Catalog
//!
//! Read-only query interface over the products offered in the storefront,
//! plus an in-memory implementation seeded from a JSON file.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::model::{Product, ProductImage};

/// Catalog query trait (Strategy pattern)
///
/// Checkout resolves slugs through this interface only, so a database-backed
/// catalog can replace `MemoryCatalog` without touching the payment flow.
pub trait ProductCatalog: Send + Sync {
    /// Active products, newest first
    fn list_active(&self) -> Vec<Product>;

    /// Active products whose name or slug contains `query` (case-insensitive)
    fn search(&self, query: &str) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.list_active();
        }
        self.list_active()
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle) || p.slug.contains(&needle))
            .collect()
    }

    /// Any product by slug, active or not
    fn get(&self, slug: &str) -> Option<Product>;

    /// Active product by slug
    fn get_active(&self, slug: &str) -> Option<Product> {
        self.get(slug).filter(|p| p.is_active)
    }

    /// Number of products, including inactive ones
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Derive a URL slug from a product name
///
/// Lowercases ASCII alphanumerics and collapses every other run of characters
/// into a single hyphen: `"BPC-157 (5mg)"` becomes `"bpc-157-5mg"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Catalog seed entry
#[derive(Debug, Deserialize)]
struct SeedProduct {
    #[serde(default)]
    id: Option<Uuid>,
    name: String,
    #[serde(default)]
    slug: Option<String>,
    price_usd: Decimal,
    #[serde(default = "default_active")]
    is_active: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    images: Vec<ProductImage>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl SeedProduct {
    fn into_product(self) -> Result<Product> {
        let slug = self
            .slug
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| slugify(&self.name));

        if slug.is_empty() {
            return Err(StoreError::Catalog(format!(
                "cannot derive slug for product '{}'",
                self.name
            )));
        }
        if self.price_usd.is_sign_negative() {
            return Err(StoreError::Catalog(format!("negative price for '{slug}'")));
        }

        Ok(Product {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name,
            slug,
            price_usd: self.price_usd,
            is_active: self.is_active,
            description: self.description,
            images: self.images,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// In-memory catalog
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: HashMap<String, Product>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from products, rejecting duplicate slugs
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Result<Self> {
        let mut catalog = Self::new();
        for product in products {
            catalog.insert(product)?;
        }
        Ok(catalog)
    }

    /// Parse a JSON array of seed products
    pub fn from_json(json: &str) -> Result<Self> {
        let seeds: Vec<SeedProduct> = serde_json::from_str(json)?;
        let products = seeds
            .into_iter()
            .map(SeedProduct::into_product)
            .collect::<Result<Vec<_>>>()?;
        Self::from_products(products)
    }

    /// Load a JSON seed file
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), products = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn insert(&mut self, product: Product) -> Result<()> {
        if self.products.contains_key(&product.slug) {
            return Err(StoreError::Catalog(format!("duplicate slug '{}'", product.slug)));
        }
        self.products.insert(product.slug.clone(), product);
        Ok(())
    }
}

impl ProductCatalog for MemoryCatalog {
    fn list_active(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name)));
        products
    }

    fn get(&self, slug: &str) -> Option<Product> {
        self.products.get(slug).cloned()
    }

    fn len(&self) -> usize {
        self.products.len()
    }
}
