//! Bazaar Core - Shared types library.
//!
//! This crate provides the domain types used across the Bazaar storefront:
//! - `storefront` - Client library for carts, auth context, and the remote API
//! - `cli` - Terminal front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no
//! storage access, no HTTP clients. Reconciliation between the local and
//! remote carts lives in the storefront crate; everything here is
//! deterministic and synchronous.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, quantities, cart lines, and carts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
