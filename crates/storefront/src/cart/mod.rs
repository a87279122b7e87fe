//! Client-side cart state.
//!
//! # Architecture
//!
//! The cart lives in two tiers:
//! - [`LocalCartStore`] - a storage slot, always available, also used as a
//!   display cache when signed in
//! - the remote cart resource ([`crate::api::CartRemote`]), authoritative
//!   when the session carries a credential
//!
//! [`CartReconciler`] decides per read which tier to trust and mirrors remote
//! reads back into the local slot. Mutations are applied locally first and
//! then forwarded; a failed forward rolls the local slot back and reloads.
//! Every mutation is announced on [`CartEvents`] so independently created
//! views can refresh.

mod events;
mod local;
mod reconciler;

pub use events::{CartEvent, CartEvents, CartSubscription};
pub use local::LocalCartStore;
pub use reconciler::{
    CartError, CartReconciler, CartSource, CartUpdate, MergePolicy, Reconciled, SyncStatus,
    reconcile,
};
