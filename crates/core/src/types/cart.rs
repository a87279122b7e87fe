//! Cart lines and the ordered cart sequence.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s. Insertion order is display
//! order. Carts built through [`Cart::add`] stay unique by product; carts
//! handed back by the backend are taken as-is, since uniqueness there is the
//! server's business.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartLineId, ProductId};
use super::price::round_to_currency;
use super::quantity::Quantity;

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    /// Price of a single unit at the time the line was added.
    pub unit_price: Decimal,
    pub quantity: Quantity,
    #[serde(default)]
    pub seller_name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Present only when the line came from the remote cart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_line_id: Option<CartLineId>,
}

impl CartLine {
    /// Create a local line with quantity 1 and no remote identity.
    #[must_use]
    pub fn new(product_id: ProductId, title: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id,
            title: title.into(),
            unit_price: round_to_currency(unit_price),
            quantity: Quantity::ONE,
            seller_name: String::new(),
            sku: String::new(),
            thumbnail_url: None,
            remote_line_id: None,
        }
    }

    /// Builder-style quantity setter.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }

    /// Builder-style seller setter.
    #[must_use]
    pub fn with_seller(mut self, seller_name: impl Into<String>) -> Self {
        self.seller_name = seller_name.into();
        self
    }

    /// Builder-style SKU setter.
    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    /// Builder-style thumbnail setter.
    #[must_use]
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Builder-style remote identity setter.
    #[must_use]
    pub fn with_remote_line_id(mut self, id: CartLineId) -> Self {
        self.remote_line_id = Some(id);
        self
    }

    /// Unit price times quantity, at currency precision.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        round_to_currency(self.unit_price * Decimal::from(self.quantity.get()))
    }
}

/// An ordered sequence of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Wrap lines exactly as given, without de-duplication.
    #[must_use]
    pub const fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.product_id == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.line(product_id).is_some()
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line for the same product keeps its position and remote
    /// identity, has its quantity incremented, and takes the incoming
    /// snapshot fields (title, price, seller, SKU, thumbnail). Otherwise the
    /// line is appended with `quantity`.
    pub fn add(&mut self, line: CartLine, quantity: Quantity) {
        if let Some(existing) = self.line_mut(&line.product_id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            existing.title = line.title;
            existing.unit_price = line.unit_price;
            existing.seller_name = line.seller_name;
            existing.sku = line.sku;
            existing.thumbnail_url = line.thumbnail_url;
        } else {
            self.lines.push(line.with_quantity(quantity));
        }
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        match Quantity::new(quantity) {
            Some(q) => self.line_mut(product_id).is_some_and(|line| {
                line.quantity = q;
                true
            }),
            None => self.remove(product_id).is_some(),
        }
    }

    /// Lower a line's quantity by one, removing it if it would drop below 1.
    ///
    /// Returns the new quantity, `Some(None)` when the line was removed, and
    /// `None` when the product is not in the cart.
    pub fn decrement(&mut self, product_id: &ProductId) -> Option<Option<Quantity>> {
        let current = self.line(product_id)?.quantity;
        let next = current.decremented();
        match next {
            Some(q) => {
                if let Some(line) = self.line_mut(product_id) {
                    line.quantity = q;
                }
            }
            None => {
                self.remove(product_id);
            }
        }
        Some(next)
    }

    /// Remove a product's line, returning it.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| &l.product_id == product_id)?;
        Some(self.lines.remove(index))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity.get())).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

impl FromIterator<CartLine> for Cart {
    fn from_iter<I: IntoIterator<Item = CartLine>>(iter: I) -> Self {
        Self::from_lines(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
