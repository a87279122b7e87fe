//! Bazaar storefront cart library.
//!
//! Keeps a shopper's cart consistent between the local storage slot and the
//! marketplace backend:
//!
//! - [`storage`] - key-value slots on disk or in memory
//! - [`auth`] - session credential resolution
//! - [`api`] - REST clients for the remote cart and the catalog
//! - [`cart`] - local store, reconciler, and change notifications
//! - [`views`] - cart page, badge, and checkout selection models
//! - [`state`] - the [`Storefront`](state::Storefront) session tying them together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod config;
pub mod state;
pub mod storage;
pub mod views;

pub use state::Storefront;
