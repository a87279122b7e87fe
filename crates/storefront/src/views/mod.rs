//! Display-ready cart state.
//!
//! Views hold formatted strings and view-only state (which lines are ticked
//! for checkout). They never talk to storage or the network directly; they
//! are built from a [`bazaar_core::Cart`] handed out by the reconciler.

mod cart;
mod checkout;

pub use cart::{CartBadge, CartItemView, CartView};
pub use checkout::{CheckoutSelection, CheckoutSummary};
