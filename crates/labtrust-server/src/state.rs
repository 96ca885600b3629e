//! Application State

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::task::JoinHandle;

use labtrust_core::{
    MemoryOrderStore, MemoryPendingCartStore, OrderStore, PendingCartStore, ProductCatalog,
};
use labtrust_payments::{CheckoutService, CheckoutSettings, InvoiceProvider, IpnHandler, IpnVerifier};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn ProductCatalog>,

    /// Carts awaiting payment
    pub pending: Arc<dyn PendingCartStore>,

    pub orders: Arc<dyn OrderStore>,

    /// Invoice creation (None if payments are not configured)
    pub checkout: Option<Arc<CheckoutService>>,

    /// IPN webhook handler (None if payments are not configured)
    pub ipn: Option<Arc<IpnHandler>>,
}

impl AppState {
    /// State with in-memory stores and payments disabled
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self {
            catalog,
            pending: Arc::new(MemoryPendingCartStore::new()),
            orders: Arc::new(MemoryOrderStore::new()),
            checkout: None,
            ipn: None,
        }
    }

    /// Enable checkout and the webhook against the state's stores
    #[must_use]
    pub fn with_payments(
        mut self,
        provider: Arc<dyn InvoiceProvider>,
        verifier: IpnVerifier,
        settings: CheckoutSettings,
    ) -> Self {
        self.checkout = Some(Arc::new(CheckoutService::new(
            self.catalog.clone(),
            self.pending.clone(),
            provider,
            settings,
        )));
        self.ipn = Some(Arc::new(IpnHandler::new(
            verifier,
            self.pending.clone(),
            self.orders.clone(),
        )));
        self
    }

    pub const fn payments_configured(&self) -> bool {
        self.checkout.is_some() && self.ipn.is_some()
    }

    /// Periodically purge pending carts older than `ttl`
    ///
    /// Carts already claimed by a webhook are no longer in the store and are
    /// never touched.
    pub fn spawn_cart_sweeper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let pending = self.pending.clone();
        let max_age = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let cutoff = Utc::now()
                    .checked_sub_signed(max_age)
                    .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
                match pending.purge_older_than(cutoff) {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "Purged abandoned pending carts"),
                    Err(e) => tracing::warn!(error = %e, "Pending cart purge failed"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labtrust_core::{Customer, MemoryCatalog, PricedCart, ShippingAddress, TempCart, Totals};
    use rust_decimal_macros::dec;

    fn cart(age: TimeDelta) -> TempCart {
        let mut cart = TempCart::new(
            Customer { name: "Ana".into(), email: "ana@example.com".into(), phone: None },
            ShippingAddress {
                line1: "1 Elm".into(),
                line2: None,
                city: "Austin".into(),
                state: None,
                postal_code: "73301".into(),
                country: "US".into(),
            },
            PricedCart { items: Vec::new(), totals: Totals::compute(&[], dec!(9)) },
            "usd",
        );
        cart.created_at -= age;
        cart
    }

    #[tokio::test]
    async fn test_sweeper_purges_abandoned_carts() {
        let state = AppState::new(Arc::new(MemoryCatalog::new()));
        let stale = cart(TimeDelta::hours(3));
        let fresh = cart(TimeDelta::zero());
        state.pending.save(&stale).unwrap();
        state.pending.save(&fresh).unwrap();

        let sweeper = state.spawn_cart_sweeper(Duration::from_secs(3600), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();

        assert!(state.pending.get(stale.id).unwrap().is_none());
        assert!(state.pending.get(fresh.id).unwrap().is_some());
    }
}
