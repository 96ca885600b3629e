//! Checkout: cart → pending cart → provider invoice

use std::sync::Arc;

use labtrust_core::{
    CartItemInput, Customer, PendingCartStore, ProductCatalog, ShippingAddress, TempCart, Totals,
    price_cart,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PaymentError, Result};
use crate::provider::{InvoiceProvider, InvoiceRequest};

/// Flat shipping charge added to every order
pub const DEFAULT_SHIPPING_USD: Decimal = dec!(9.00);

pub const DEFAULT_CURRENCY: &str = "usd";

/// Where the provider should call back and redirect to
#[derive(Clone, Debug)]
pub struct CheckoutSettings {
    pub currency: String,
    pub shipping: Decimal,
    pub ipn_callback_url: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSettings {
    /// Standard storefront URLs under a public base URL
    pub fn for_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            currency: DEFAULT_CURRENCY.into(),
            shipping: DEFAULT_SHIPPING_USD,
            ipn_callback_url: format!("{base}/api/webhooks/nowpayments"),
            success_url: format!("{base}/checkout/success"),
            cancel_url: format!("{base}/checkout"),
        }
    }
}

/// Client checkout submission
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer: Customer,
    pub address: ShippingAddress,

    #[serde(default)]
    pub items: Vec<CartItemInput>,
}

/// Result of creating an invoice
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Pending cart id (the provider's `order_id`)
    pub cart_id: Uuid,

    pub invoice_id: String,

    /// URL to redirect the customer to
    pub invoice_url: String,

    pub totals: Totals,
    pub currency: String,
}

pub struct CheckoutService {
    catalog: Arc<dyn ProductCatalog>,
    pending: Arc<dyn PendingCartStore>,
    provider: Arc<dyn InvoiceProvider>,
    settings: CheckoutSettings,
}

impl CheckoutService {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        pending: Arc<dyn PendingCartStore>,
        provider: Arc<dyn InvoiceProvider>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            catalog,
            pending,
            provider,
            settings,
        }
    }

    pub const fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// Price the cart, hold it pending payment and request a hosted invoice
    ///
    /// The pending cart is removed again if the provider call fails.
    pub async fn create_invoice(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        validate_contact(&request.customer, &request.address)?;

        let priced = price_cart(self.catalog.as_ref(), &request.items, self.settings.shipping)?;
        let cart = TempCart::new(
            request.customer,
            request.address,
            priced,
            self.settings.currency.clone(),
        );
        self.pending.save(&cart)?;

        let invoice_request = InvoiceRequest {
            price_amount: cart.totals.total,
            price_currency: cart.currency.clone(),
            order_id: cart.id.to_string(),
            order_description: cart.description(),
            ipn_callback_url: self.settings.ipn_callback_url.clone(),
            success_url: self.settings.success_url.clone(),
            cancel_url: self.settings.cancel_url.clone(),
        };

        let invoice = match self.provider.create_invoice(&invoice_request).await {
            Ok(invoice) => invoice,
            Err(e) => {
                tracing::error!(
                    cart_id = %cart.id,
                    provider = self.provider.name(),
                    error = %e,
                    "Invoice creation failed"
                );
                if let Err(cleanup) = self.pending.delete(cart.id) {
                    tracing::warn!(cart_id = %cart.id, error = %cleanup, "Failed to drop pending cart");
                }
                return Err(e);
            }
        };

        self.pending.set_invoice_id(cart.id, &invoice.id)?;

        tracing::info!(
            cart_id = %cart.id,
            invoice_id = %invoice.id,
            total = %cart.totals.total,
            items = cart.items.len(),
            "Created invoice"
        );

        Ok(CheckoutSession {
            cart_id: cart.id,
            invoice_id: invoice.id,
            invoice_url: invoice.invoice_url,
            totals: cart.totals,
            currency: cart.currency,
        })
    }
}

fn validate_contact(customer: &Customer, address: &ShippingAddress) -> Result<()> {
    if customer.name.trim().is_empty() {
        return Err(PaymentError::InvalidRequest("customer name is required".into()));
    }
    let email = customer.email.trim();
    if email.len() < 3 || !email.contains('@') {
        return Err(PaymentError::InvalidRequest("a valid email is required".into()));
    }
    let required = [
        ("address line1", &address.line1),
        ("city", &address.city),
        ("postal code", &address.postal_code),
        ("country", &address.country),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(PaymentError::InvalidRequest(format!("{field} is required")));
    }
    Ok(())
}
