//! Checkout line selection.
//!
//! Which loaded lines are ticked for checkout is view state only: it is never
//! persisted and is rebuilt from the "select all" toggle whenever the
//! checkout screen is entered.

use std::collections::HashMap;

use bazaar_core::{Cart, CartLine, CurrencyCode, Price, ProductId};
use rust_decimal::Decimal;

/// Per-line checkout ticks, keyed by product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutSelection {
    selected: HashMap<ProductId, bool>,
    all_selected: bool,
}

impl CheckoutSelection {
    /// Start a selection over `cart` with every line set to `select_all`.
    #[must_use]
    pub fn from_cart(cart: &Cart, select_all: bool) -> Self {
        Self {
            selected: cart
                .lines()
                .iter()
                .map(|l| (l.product_id.clone(), select_all))
                .collect(),
            all_selected: select_all,
        }
    }

    /// Tick every known line.
    pub fn select_all(&mut self) {
        self.selected.values_mut().for_each(|v| *v = true);
        self.all_selected = true;
    }

    /// Untick every known line.
    pub fn deselect_all(&mut self) {
        self.selected.values_mut().for_each(|v| *v = false);
        self.all_selected = false;
    }

    /// Set one line. Unknown products are ignored.
    pub fn set(&mut self, product_id: &ProductId, selected: bool) {
        if let Some(v) = self.selected.get_mut(product_id) {
            *v = selected;
            if !selected {
                self.all_selected = false;
            }
        }
    }

    /// Flip one line. Unknown products are ignored.
    pub fn toggle(&mut self, product_id: &ProductId) {
        let current = self.is_selected(product_id);
        self.set(product_id, !current);
    }

    #[must_use]
    pub fn is_selected(&self, product_id: &ProductId) -> bool {
        self.selected.get(product_id).copied().unwrap_or(false)
    }

    /// State of the "select all" toggle.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        self.all_selected && self.selected.values().all(|v| *v)
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.values().filter(|v| **v).count()
    }

    /// Follow a reloaded cart: forget vanished lines, and give new lines the
    /// current "select all" state.
    pub fn retain_lines(&mut self, cart: &Cart) {
        self.selected.retain(|id, _| cart.contains(id));
        for line in cart.lines() {
            self.selected
                .entry(line.product_id.clone())
                .or_insert(self.all_selected);
        }
    }

    /// Selected lines, in cart order.
    #[must_use]
    pub fn selected_lines<'a>(&self, cart: &'a Cart) -> Vec<&'a CartLine> {
        cart.lines()
            .iter()
            .filter(|l| self.is_selected(&l.product_id))
            .collect()
    }
}

/// Totals for the lines going to checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub lines: Vec<CartLine>,
    pub item_count: u64,
    pub subtotal: Price,
}

impl CheckoutSummary {
    /// Summarize the ticked lines of `cart`.
    #[must_use]
    pub fn from_selection(
        cart: &Cart,
        selection: &CheckoutSelection,
        currency: CurrencyCode,
    ) -> Self {
        let lines: Vec<CartLine> = selection
            .selected_lines(cart)
            .into_iter()
            .cloned()
            .collect();
        let item_count = lines.iter().map(|l| u64::from(l.quantity.get())).sum();
        let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();
        Self {
            lines,
            item_count,
            subtotal: Price::new(subtotal, currency),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::Quantity;

    use super::*;

    fn cart(ids: &[&str]) -> Cart {
        ids.iter()
            .map(|id| CartLine::new(ProductId::new(*id), *id, Decimal::new(1000, 2)))
            .collect()
    }

    #[test]
    fn test_select_all_then_deselect_one() {
        let cart = cart(&["a", "b", "c", "d"]);
        let mut selection = CheckoutSelection::from_cart(&cart, false);
        assert_eq!(selection.selected_count(), 0);

        selection.select_all();
        selection.set(&ProductId::new("b"), false);

        assert_eq!(selection.selected_count(), cart.len() - 1);
        assert!(!selection.all_selected());

        selection.deselect_all();
        assert_eq!(selection.selected_count(), 0);
        assert!(selection.selected_lines(&cart).is_empty());
    }

    #[test]
    fn test_toggle_and_unknown_ids() {
        let cart = cart(&["a", "b"]);
        let mut selection = CheckoutSelection::from_cart(&cart, true);
        assert!(selection.all_selected());

        selection.toggle(&ProductId::new("a"));
        selection.toggle(&ProductId::new("zzz"));
        assert!(!selection.is_selected(&ProductId::new("a")));
        assert!(!selection.is_selected(&ProductId::new("zzz")));
        assert_eq!(selection.selected_count(), 1);
    }

    #[test]
    fn test_retain_lines_follows_reload() {
        let mut selection = CheckoutSelection::from_cart(&cart(&["a", "b"]), true);
        selection.retain_lines(&cart(&["b", "c"]));

        assert!(!selection.is_selected(&ProductId::new("a")));
        assert!(selection.is_selected(&ProductId::new("c")));
        assert_eq!(selection.selected_count(), 2);
    }

    #[test]
    fn test_summary_of_selected_lines() {
        let mut cart = cart(&["a", "b", "c"]);
        cart.set_quantity(&ProductId::new("a"), 3);
        let mut selection = CheckoutSelection::from_cart(&cart, true);
        selection.set(&ProductId::new("c"), false);

        let summary = CheckoutSummary::from_selection(&cart, &selection, CurrencyCode::INR);

        let ids: Vec<_> = summary.lines.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(summary.item_count, 4);
        assert_eq!(summary.subtotal.display(), "₹40.00");
        assert_eq!(summary.lines[0].quantity, Quantity::new(3).unwrap());
    }
}
