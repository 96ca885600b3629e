//! # labtrust-core
//!
//! Storefront domain for the LabTrust peptide catalog: products, cart
//! pricing, pending carts and paid orders.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌──────────────┐  price_cart   ┌──────────────┐  payment confirmed  ┌─────────┐
//! │ CartItemInput│──────────────▶│   TempCart   │────────────────────▶│  Order  │
//! │ (slug, qty)  │   (catalog)   │  (pending)   │    take + paid      │ (paid)  │
//! └──────────────┘               └──────────────┘                     └─────────┘
//! ```
//!
//! Storage sits behind the `ProductCatalog`, `PendingCartStore` and
//! `OrderStore` traits; the in-memory implementations back development and
//! tests.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod model;
pub mod order;
pub mod store;

pub use cart::{CartItemInput, MAX_QTY, PricedCart, TempCart, price_cart};
pub use catalog::{MemoryCatalog, ProductCatalog, slugify};
pub use error::{Result, StoreError};
pub use model::{Customer, LineItem, Product, ProductImage, ShippingAddress, Totals};
pub use order::{Order, OrderStatus, PaymentDetails};
pub use store::{MemoryOrderStore, MemoryPendingCartStore, OrderStore, PendingCartStore};
