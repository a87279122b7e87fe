//! Cart page and header badge views.

use bazaar_core::{Cart, CartLine, CurrencyCode, Price};

use crate::api::CartRemote;
use crate::cart::{CartReconciler, CartSource, CartSubscription};

/// Cart item display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub product_id: String,
    pub title: String,
    pub seller_name: Option<String>,
    pub sku: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub thumbnail_url: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
    pub source: CartSource,
}

impl CartView {
    /// Build a view of `cart` read from `source`.
    #[must_use]
    pub fn new(cart: &Cart, source: CartSource, currency: CurrencyCode) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView::new(line, currency))
                .collect(),
            subtotal: Price::new(cart.subtotal(), currency).display(),
            item_count: cart.item_count(),
            source,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CartItemView {
    #[must_use]
    pub fn new(line: &CartLine, currency: CurrencyCode) -> Self {
        let price = Price::new(line.unit_price, currency);
        Self {
            product_id: line.product_id.to_string(),
            title: line.title.clone(),
            seller_name: non_empty(&line.seller_name),
            sku: non_empty(&line.sku),
            quantity: line.quantity.get(),
            price: price.display(),
            line_price: price.times(line.quantity.get()).display(),
            thumbnail_url: line.thumbnail_url.clone(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

/// Header cart count badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartBadge {
    count: u64,
}

impl CartBadge {
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Set the count from a cart already in hand.
    pub fn show(&mut self, cart: &Cart) {
        self.count = cart.item_count();
    }

    /// Reload the cart and update the count.
    pub async fn refresh<R: CartRemote>(&mut self, reconciler: &CartReconciler<R>) -> u64 {
        self.count = reconciler.load().await.cart.item_count();
        self.count
    }

    /// Wait for the next cart change, then reload the count.
    ///
    /// Returns `None` once every publisher is gone.
    pub async fn follow<R: CartRemote>(
        &mut self,
        subscription: &mut CartSubscription,
        reconciler: &CartReconciler<R>,
    ) -> Option<u64> {
        subscription.changed().await?;
        Some(self.refresh(reconciler).await)
    }
}
