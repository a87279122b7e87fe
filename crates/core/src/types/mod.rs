//! Core types for the Bazaar storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod quantity;

pub use cart::{Cart, CartLine};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use quantity::Quantity;
