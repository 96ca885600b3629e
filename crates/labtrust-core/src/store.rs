//! Pending Cart and Order Storage

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cart::TempCart;
use crate::error::{Result, StoreError};
use crate::order::Order;

/// Storage for carts awaiting payment
pub trait PendingCartStore: Send + Sync {
    /// Save or replace a pending cart
    fn save(&self, cart: &TempCart) -> Result<()>;

    fn get(&self, id: Uuid) -> Result<Option<TempCart>>;

    /// Attach the provider invoice reference; returns false if the cart is gone
    fn set_invoice_id(&self, id: Uuid, invoice_id: &str) -> Result<bool>;

    /// Remove and return a cart (atomic: concurrent callers get it at most once)
    fn take(&self, id: Uuid) -> Result<Option<TempCart>>;

    /// Remove and return the cart holding `invoice_id`
    fn take_by_invoice(&self, invoice_id: &str) -> Result<Option<TempCart>>;

    fn delete(&self, id: Uuid) -> Result<()>;

    /// Drop carts created before `cutoff`; returns how many were removed
    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    fn len(&self) -> Result<usize>;
}

/// Storage for finalized orders
pub trait OrderStore: Send + Sync {
    fn save(&self, order: &Order) -> Result<()>;

    fn get(&self, id: Uuid) -> Result<Option<Order>>;

    /// All orders, newest first
    fn list(&self) -> Result<Vec<Order>>;
}

/// In-memory pending cart store (for development)
#[derive(Default)]
pub struct MemoryPendingCartStore {
    carts: RwLock<HashMap<Uuid, TempCart>>,
}

impl MemoryPendingCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PendingCartStore for MemoryPendingCartStore {
    fn save(&self, cart: &TempCart) -> Result<()> {
        let mut carts = self.carts.write().map_err(|_| StoreError::poisoned())?;
        carts.insert(cart.id, cart.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<TempCart>> {
        let carts = self.carts.read().map_err(|_| StoreError::poisoned())?;
        Ok(carts.get(&id).cloned())
    }

    fn set_invoice_id(&self, id: Uuid, invoice_id: &str) -> Result<bool> {
        let mut carts = self.carts.write().map_err(|_| StoreError::poisoned())?;
        Ok(carts.get_mut(&id).is_some_and(|cart| {
            cart.invoice_id = Some(invoice_id.to_string());
            true
        }))
    }

    fn take(&self, id: Uuid) -> Result<Option<TempCart>> {
        let mut carts = self.carts.write().map_err(|_| StoreError::poisoned())?;
        Ok(carts.remove(&id))
    }

    fn take_by_invoice(&self, invoice_id: &str) -> Result<Option<TempCart>> {
        let mut carts = self.carts.write().map_err(|_| StoreError::poisoned())?;
        let id = carts
            .values()
            .find(|cart| cart.invoice_id.as_deref() == Some(invoice_id))
            .map(|cart| cart.id);
        Ok(id.and_then(|id| carts.remove(&id)))
    }

    fn delete(&self, id: Uuid) -> Result<()> {
        let mut carts = self.carts.write().map_err(|_| StoreError::poisoned())?;
        carts.remove(&id);
        Ok(())
    }

    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut carts = self.carts.write().map_err(|_| StoreError::poisoned())?;
        let before = carts.len();
        carts.retain(|_, cart| cart.created_at >= cutoff);
        Ok(before - carts.len())
    }

    fn len(&self) -> Result<usize> {
        let carts = self.carts.read().map_err(|_| StoreError::poisoned())?;
        Ok(carts.len())
    }
}

/// In-memory order store (for development)
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for MemoryOrderStore {
    fn save(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().map_err(|_| StoreError::poisoned())?;
        orders.insert(order.id, order.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<Order>> {
        let orders = self.orders.read().map_err(|_| StoreError::poisoned())?;
        Ok(orders.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().map_err(|_| StoreError::poisoned())?;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}
