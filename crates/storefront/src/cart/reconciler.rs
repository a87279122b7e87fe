//! Local/remote cart reconciliation.

use std::fmt;
use std::str::FromStr;

use bazaar_core::{Cart, CartLine, CartLineId, ProductId, Quantity};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::events::{CartEvent, CartEvents};
use super::local::LocalCartStore;
use crate::api::{ApiError, CartRemote};
use crate::auth::AuthContext;
use crate::storage::StorageError;

/// Which tier a cart was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartSource {
    /// The local storage slot.
    Local,
    /// The remote cart, mirrored into the local slot.
    Remote,
    /// The remote cart plus local lines it has never seen.
    Merged,
}

/// How a successful remote read is combined with the local cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// The remote cart replaces the local one outright.
    #[default]
    Overwrite,
    /// Keep local lines that were never synced and that the remote cart
    /// doesn't contain, appended after the remote lines.
    PreserveUnsynced,
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "preserve-unsynced" | "preserve_unsynced" => Ok(Self::PreserveUnsynced),
            other => Err(format!(
                "unknown merge policy '{other}' (expected overwrite or preserve-unsynced)"
            )),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overwrite => "overwrite",
            Self::PreserveUnsynced => "preserve-unsynced",
        })
    }
}

/// A cart together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub cart: Cart,
    pub source: CartSource,
}

/// Outcome of forwarding a mutation to the remote cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing was sent: anonymous session, or the line has no remote identity.
    LocalOnly,
    /// The remote cart accepted the change.
    Synced,
    /// The remote call failed; the local change was rolled back. Carries a
    /// message for a transient notification.
    Failed(String),
}

/// Result of a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartUpdate {
    pub cart: Cart,
    pub source: CartSource,
    pub sync: SyncStatus,
}

/// Errors from cart mutations. Remote failures are not errors here; they
/// show up as [`SyncStatus::Failed`].
#[derive(Debug, Error)]
pub enum CartError {
    /// The local slot could not be written.
    #[error("Local cart error: {0}")]
    Storage(#[from] StorageError),

    /// The product is not in the cart.
    #[error("Product not in cart: {0}")]
    LineNotFound(ProductId),
}

/// Combine a successful remote read with the local cart.
#[must_use]
pub fn reconcile(policy: MergePolicy, local: &Cart, remote: Cart) -> Reconciled {
    match policy {
        MergePolicy::Overwrite => Reconciled {
            cart: remote,
            source: CartSource::Remote,
        },
        MergePolicy::PreserveUnsynced => {
            let pending: Vec<CartLine> = local
                .lines()
                .iter()
                .filter(|l| l.remote_line_id.is_none() && !remote.contains(&l.product_id))
                .cloned()
                .collect();
            if pending.is_empty() {
                return Reconciled {
                    cart: remote,
                    source: CartSource::Remote,
                };
            }
            let mut lines = remote.into_lines();
            lines.extend(pending);
            Reconciled {
                cart: Cart::from_lines(lines),
                source: CartSource::Merged,
            }
        }
    }
}

/// Remote call matching a local mutation.
#[derive(Debug)]
enum RemoteOp {
    Add(ProductId, Quantity),
    Update(CartLineId, Quantity),
    Remove(CartLineId),
    Clear,
}

/// Keeps the local slot and the remote cart approximately consistent.
pub struct CartReconciler<R> {
    local: LocalCartStore,
    remote: R,
    auth: AuthContext,
    policy: MergePolicy,
    events: CartEvents,
}

impl<R: CartRemote> CartReconciler<R> {
    /// Create a reconciler using [`MergePolicy::Overwrite`].
    #[must_use]
    pub fn new(local: LocalCartStore, remote: R, auth: AuthContext, events: CartEvents) -> Self {
        Self {
            local,
            remote,
            auth,
            policy: MergePolicy::default(),
            events,
        }
    }

    #[must_use]
    pub const fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn local(&self) -> &LocalCartStore {
        &self.local
    }

    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthContext {
        &self.auth
    }

    #[must_use]
    pub const fn events(&self) -> &CartEvents {
        &self.events
    }

    #[must_use]
    pub const fn merge_policy(&self) -> MergePolicy {
        self.policy
    }

    /// Read the authoritative cart.
    ///
    /// Signed in: the remote cart, written through to the local slot; if the
    /// remote read fails, the local slot. Anonymous: the local slot, without
    /// any network call.
    #[instrument(skip(self), fields(authenticated = self.auth.is_authenticated()))]
    pub async fn load(&self) -> Reconciled {
        if !self.auth.is_authenticated() {
            return self.load_local();
        }

        match self.remote.get_cart().await {
            Ok(remote) => {
                let local = self.local.read();
                let reconciled = reconcile(self.policy, &local, remote);
                if let Err(e) = self.store(&reconciled.cart) {
                    warn!(error = %e, "Failed to mirror remote cart locally");
                }
                debug!(
                    lines = reconciled.cart.len(),
                    source = ?reconciled.source,
                    "Loaded remote cart"
                );
                reconciled
            }
            Err(e) => {
                warn!(error = %e, "Remote cart unavailable, using local cart");
                self.load_local()
            }
        }
    }

    fn load_local(&self) -> Reconciled {
        Reconciled {
            cart: self.local.read(),
            source: CartSource::Local,
        }
    }

    /// Add units of a product.
    ///
    /// Locally an existing line is incremented. When signed in the add is
    /// forwarded by product id, and the cart is then reloaded so the remote
    /// cart's own merge result is what ends up stored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the local slot cannot be written.
    #[instrument(skip_all, fields(product_id = %line.product_id, quantity = %quantity))]
    pub async fn add_to_cart(
        &self,
        line: CartLine,
        quantity: Quantity,
    ) -> Result<CartUpdate, CartError> {
        let snapshot = self.local.read();
        let mut updated = snapshot.clone();
        let product_id = line.product_id.clone();
        updated.add(line, quantity);
        self.commit(snapshot, updated, Some(RemoteOp::Add(product_id, quantity))).await
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the product is not in the cart, or
    /// `CartError::Storage` if the local slot cannot be written.
    #[instrument(skip_all, fields(product_id = %product_id, quantity = quantity))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartUpdate, CartError> {
        let snapshot = self.local.read();
        let remote_id = self.remote_line_id(&snapshot, product_id)?;
        let mut updated = snapshot.clone();
        updated.set_quantity(product_id, quantity);

        let op = remote_id.map(|id| match Quantity::new(quantity) {
            Some(q) => RemoteOp::Update(id, q),
            None => RemoteOp::Remove(id),
        });
        self.commit(snapshot, updated, op).await
    }

    /// Raise a line's quantity by one.
    ///
    /// # Errors
    ///
    /// See [`Self::update_quantity`].
    pub async fn increment(&self, product_id: &ProductId) -> Result<CartUpdate, CartError> {
        let current = self.current_quantity(product_id)?;
        self.update_quantity(product_id, current.saturating_add(1)).await
    }

    /// Lower a line's quantity by one, removing it below 1.
    ///
    /// # Errors
    ///
    /// See [`Self::update_quantity`].
    pub async fn decrement(&self, product_id: &ProductId) -> Result<CartUpdate, CartError> {
        let current = self.current_quantity(product_id)?;
        self.update_quantity(product_id, current - 1).await
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the product is not in the cart, or
    /// `CartError::Storage` if the local slot cannot be written.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<CartUpdate, CartError> {
        let snapshot = self.local.read();
        let remote_id = self.remote_line_id(&snapshot, product_id)?;
        let mut updated = snapshot.clone();
        updated.remove(product_id);
        self.commit(snapshot, updated, remote_id.map(RemoteOp::Remove)).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the local slot cannot be modified.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartUpdate, CartError> {
        let snapshot = self.local.read();
        self.commit(snapshot, Cart::new(), Some(RemoteOp::Clear)).await
    }

    fn current_quantity(&self, product_id: &ProductId) -> Result<u32, CartError> {
        self.local
            .read()
            .line(product_id)
            .map(|l| l.quantity.get())
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))
    }

    fn remote_line_id(
        &self,
        cart: &Cart,
        product_id: &ProductId,
    ) -> Result<Option<CartLineId>, CartError> {
        cart.line(product_id)
            .map(|l| l.remote_line_id.clone())
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))
    }

    /// Persist `cart` locally; an empty cart removes the slot.
    fn store(&self, cart: &Cart) -> Result<(), StorageError> {
        if cart.is_empty() {
            self.local.clear()
        } else {
            self.local.write(cart)
        }
    }

    /// Write the optimistic local state, forward the remote call if any, and
    /// broadcast the outcome.
    async fn commit(
        &self,
        snapshot: Cart,
        updated: Cart,
        op: Option<RemoteOp>,
    ) -> Result<CartUpdate, CartError> {
        self.store(&updated)?;

        let update = match op {
            Some(op) if self.auth.is_authenticated() => match self.forward(op).await {
                Ok(()) => {
                    let reloaded = self.load().await;
                    CartUpdate {
                        cart: reloaded.cart,
                        source: reloaded.source,
                        sync: SyncStatus::Synced,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Remote cart update failed, discarding local change");
                    if let Err(restore) = self.store(&snapshot) {
                        warn!(error = %restore, "Failed to restore local cart");
                    }
                    let reloaded = self.load().await;
                    CartUpdate {
                        cart: reloaded.cart,
                        source: reloaded.source,
                        sync: SyncStatus::Failed(e.user_message()),
                    }
                }
            },
            _ => CartUpdate {
                cart: updated,
                source: CartSource::Local,
                sync: SyncStatus::LocalOnly,
            },
        };

        self.events.notify(CartEvent::Changed {
            source: update.source,
            item_count: update.cart.item_count(),
        });
        Ok(update)
    }

    async fn forward(&self, op: RemoteOp) -> Result<(), ApiError> {
        debug!(?op, "Forwarding cart change");
        match op {
            RemoteOp::Add(product_id, quantity) => {
                self.remote.add_to_cart(&product_id, quantity).await
            }
            RemoteOp::Update(line_id, quantity) => {
                self.remote.update_cart_item(&line_id, quantity).await
            }
            RemoteOp::Remove(line_id) => self.remote.remove_from_cart(&line_id).await,
            RemoteOp::Clear => self.remote.clear_cart().await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    /// In-memory remote cart that records calls and can be switched to fail.
    #[derive(Default)]
    struct FakeRemote {
        lines: Mutex<Vec<CartLine>>,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        get_calls: AtomicUsize,
        write_calls: AtomicUsize,
        next_line: AtomicUsize,
    }

    impl FakeRemote {
        fn with_lines(lines: Vec<CartLine>) -> Self {
            Self {
                lines: Mutex::new(lines),
                ..Self::default()
            }
        }

        fn check_write(&self) -> Result<(), ApiError> {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(ApiError::Api {
                    status: 500,
                    message: "Server error".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl CartRemote for FakeRemote {
        async fn get_cart(&self) -> Result<Cart, ApiError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(ApiError::Rejected("down".to_string()));
            }
            Ok(Cart::from_lines(self.lines.lock().unwrap().clone()))
        }

        async fn add_to_cart(
            &self,
            product_id: &ProductId,
            quantity: Quantity,
        ) -> Result<(), ApiError> {
            self.check_write()?;
            let mut lines = self.lines.lock().unwrap();
            if let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) {
                line.quantity = line.quantity.saturating_add(quantity);
            } else {
                let n = self.next_line.fetch_add(1, Ordering::SeqCst);
                lines.push(
                    line_for(product_id.as_str())
                        .with_quantity(quantity)
                        .with_remote_line_id(CartLineId::new(format!("r{n}"))),
                );
            }
            Ok(())
        }

        async fn update_cart_item(
            &self,
            line_id: &CartLineId,
            quantity: Quantity,
        ) -> Result<(), ApiError> {
            self.check_write()?;
            let mut lines = self.lines.lock().unwrap();
            let found = lines
                .iter_mut()
                .find(|l| l.remote_line_id.as_ref() == Some(line_id));
            if let Some(line) = found {
                line.quantity = quantity;
            }
            Ok(())
        }

        async fn remove_from_cart(&self, line_id: &CartLineId) -> Result<(), ApiError> {
            self.check_write()?;
            self.lines
                .lock()
                .unwrap()
                .retain(|l| l.remote_line_id.as_ref() != Some(line_id));
            Ok(())
        }

        async fn clear_cart(&self) -> Result<(), ApiError> {
            self.check_write()?;
            self.lines.lock().unwrap().clear();
            Ok(())
        }
    }

    fn line_for(id: &str) -> CartLine {
        CartLine::new(ProductId::new(id), format!("Product {id}"), Decimal::new(2500, 2))
    }

    fn remote_line(id: &str, qty: u32) -> CartLine {
        line_for(id)
            .with_quantity(Quantity::new(qty).unwrap())
            .with_remote_line_id(CartLineId::new(format!("r-{id}")))
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn reconciler(
        local_lines: Vec<CartLine>,
        remote: FakeRemote,
        auth: AuthContext,
    ) -> CartReconciler<FakeRemote> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        reconciler_over(storage, local_lines, remote, auth)
    }

    fn reconciler_over(
        storage: Arc<dyn KeyValueStore>,
        local_lines: Vec<CartLine>,
        remote: FakeRemote,
        auth: AuthContext,
    ) -> CartReconciler<FakeRemote> {
        let local = LocalCartStore::new(storage, "cart");
        if !local_lines.is_empty() {
            local.write(&Cart::from_lines(local_lines)).unwrap();
        }
        CartReconciler::new(local, remote, auth, CartEvents::new())
    }

    fn quantities(cart: &Cart) -> Vec<(String, u32)> {
        cart.lines()
            .iter()
            .map(|l| (l.product_id.to_string(), l.quantity.get()))
            .collect()
    }

    #[tokio::test]
    async fn test_anonymous_load_never_calls_remote() {
        let remote = FakeRemote::default();
        let r = reconciler(vec![line_for("1")], remote, AuthContext::anonymous());

        let loaded = r.load().await;

        assert_eq!(loaded.source, CartSource::Local);
        assert_eq!(loaded.cart.len(), 1);
        assert_eq!(r.remote().get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authenticated_load_mirrors_remote_exactly() {
        let remote = FakeRemote::with_lines(vec![remote_line("9", 4)]);
        let local = vec![line_for("1"), line_for("2")];
        let r = reconciler(local, remote, AuthContext::with_token("t"));

        let loaded = r.load().await;

        assert_eq!(loaded.source, CartSource::Remote);
        assert_eq!(r.local().read(), loaded.cart);
        assert_eq!(quantities(&r.local().read()), [("9".to_string(), 4)]);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_prior_local() {
        let remote = FakeRemote::with_lines(vec![remote_line("9", 4)]);
        remote.fail_reads.store(true, Ordering::SeqCst);
        let prior = vec![line_for("1").with_quantity(qty(2))];
        let r = reconciler(prior.clone(), remote, AuthContext::with_token("t"));

        let loaded = r.load().await;

        assert_eq!(loaded.source, CartSource::Local);
        assert_eq!(loaded.cart, Cart::from_lines(prior));
    }

    #[tokio::test]
    async fn test_preserve_unsynced_merges_local_only_lines() {
        let remote = FakeRemote::with_lines(vec![remote_line("9", 1)]);
        let local = vec![
            line_for("1"),
            remote_line("8", 1), // synced before, gone remotely: dropped
            line_for("9"),       // already in the remote cart: remote wins
        ];
        let r = reconciler(local, remote, AuthContext::with_token("t"))
            .with_merge_policy(MergePolicy::PreserveUnsynced);

        let loaded = r.load().await;

        assert_eq!(loaded.source, CartSource::Merged);
        assert_eq!(
            quantities(&loaded.cart),
            [("9".to_string(), 1), ("1".to_string(), 1)]
        );
        assert_eq!(r.local().read(), loaded.cart);
    }

    #[tokio::test]
    async fn test_local_add_increments_existing_line() {
        let r = reconciler(
            vec![line_for("1").with_quantity(qty(2))],
            FakeRemote::default(),
            AuthContext::anonymous(),
        );

        let update = r.add_to_cart(line_for("1"), qty(1)).await.unwrap();

        assert_eq!(update.sync, SyncStatus::LocalOnly);
        assert_eq!(quantities(&update.cart), [("1".to_string(), 3)]);
        assert_eq!(quantities(&r.local().read()), [("1".to_string(), 3)]);
    }

    #[tokio::test]
    async fn test_remote_add_stores_remote_merge_result() {
        let remote = FakeRemote::with_lines(vec![remote_line("1", 5)]);
        let r = reconciler(
            vec![line_for("1").with_quantity(qty(2))],
            remote,
            AuthContext::with_token("t"),
        );

        let update = r.add_to_cart(line_for("1"), qty(1)).await.unwrap();

        assert_eq!(update.sync, SyncStatus::Synced);
        assert_eq!(update.source, CartSource::Remote);
        assert_eq!(quantities(&update.cart), [("1".to_string(), 6)]);
        assert_eq!(r.local().read(), update.cart);
    }

    #[tokio::test]
    async fn test_failed_remote_mutation_discards_optimistic_change() {
        let remote = FakeRemote::with_lines(vec![remote_line("1", 2)]);
        remote.fail_writes.store(true, Ordering::SeqCst);
        remote.fail_reads.store(true, Ordering::SeqCst);
        let prior = vec![remote_line("1", 2)];
        let r = reconciler(prior.clone(), remote, AuthContext::with_token("t"));

        let update = r.update_quantity(&ProductId::new("1"), 7).await.unwrap();

        assert_eq!(update.sync, SyncStatus::Failed("Server error".to_string()));
        assert_eq!(update.source, CartSource::Local);
        assert_eq!(update.cart, Cart::from_lines(prior.clone()));
        assert_eq!(r.local().read(), Cart::from_lines(prior));
    }

    #[tokio::test]
    async fn test_failed_remote_mutation_reloads_remote_when_readable() {
        let remote = FakeRemote::with_lines(vec![remote_line("1", 2), remote_line("2", 1)]);
        remote.fail_writes.store(true, Ordering::SeqCst);
        let r = reconciler(vec![remote_line("1", 2)], remote, AuthContext::with_token("t"));

        let update = r.remove(&ProductId::new("1")).await.unwrap();

        assert!(matches!(update.sync, SyncStatus::Failed(_)));
        assert_eq!(update.source, CartSource::Remote);
        assert_eq!(
            quantities(&update.cart),
            [("1".to_string(), 2), ("2".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_rollback_to_empty_cart_removes_slot() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let remote = FakeRemote::default();
        remote.fail_writes.store(true, Ordering::SeqCst);
        remote.fail_reads.store(true, Ordering::SeqCst);
        let r = reconciler_over(
            Arc::clone(&storage),
            Vec::new(),
            remote,
            AuthContext::with_token("t"),
        );

        let update = r.add_to_cart(line_for("1"), qty(1)).await.unwrap();

        assert!(matches!(update.sync, SyncStatus::Failed(_)));
        assert!(update.cart.is_empty());
        assert_eq!(storage.get("cart").unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_remote_cart_removes_slot() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let r = reconciler_over(
            Arc::clone(&storage),
            vec![remote_line("1", 1)],
            FakeRemote::default(),
            AuthContext::with_token("t"),
        );

        let loaded = r.load().await;

        assert!(loaded.cart.is_empty());
        assert_eq!(storage.get("cart").unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_without_remote_id_stays_local_when_signed_in() {
        let remote = FakeRemote::default();
        let local = vec![line_for("1").with_quantity(qty(3))];
        let r = reconciler(local, remote, AuthContext::with_token("t"));

        let update = r.decrement(&ProductId::new("1")).await.unwrap();

        assert_eq!(update.sync, SyncStatus::LocalOnly);
        assert_eq!(quantities(&update.cart), [("1".to_string(), 2)]);
        assert_eq!(r.remote().write_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_quantity_zero_removes_remotely() {
        let remote = FakeRemote::with_lines(vec![remote_line("1", 1), remote_line("2", 1)]);
        let r = reconciler(
            vec![remote_line("1", 1), remote_line("2", 1)],
            remote,
            AuthContext::with_token("t"),
        );

        let update = r.decrement(&ProductId::new("1")).await.unwrap();

        assert_eq!(update.sync, SyncStatus::Synced);
        assert_eq!(quantities(&update.cart), [("2".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_increment_and_unknown_product() {
        let remote = FakeRemote::default();
        let r = reconciler(vec![line_for("1")], remote, AuthContext::anonymous());

        let update = r.increment(&ProductId::new("1")).await.unwrap();
        assert_eq!(quantities(&update.cart), [("1".to_string(), 2)]);

        let err = r.remove(&ProductId::new("missing")).await.unwrap_err();
        assert!(matches!(err, CartError::LineNotFound(ref id) if id.as_str() == "missing"));
    }

    #[tokio::test]
    async fn test_clear_empties_both_tiers() {
        let remote = FakeRemote::with_lines(vec![remote_line("1", 1)]);
        let r = reconciler(vec![remote_line("1", 1)], remote, AuthContext::with_token("t"));

        let update = r.clear().await.unwrap();

        assert_eq!(update.sync, SyncStatus::Synced);
        assert!(update.cart.is_empty());
        assert!(r.remote().lines.lock().unwrap().is_empty());
        assert!(r.local().read().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_broadcast_changes() {
        let r = reconciler(Vec::new(), FakeRemote::default(), AuthContext::anonymous());
        let mut sub = r.events().subscribe();

        r.add_to_cart(line_for("1"), qty(2)).await.unwrap();

        assert_eq!(
            sub.changed().await,
            Some(CartEvent::Changed {
                source: CartSource::Local,
                item_count: 2
            })
        );
    }

    #[test]
    fn test_merge_policy_parse() {
        assert_eq!("Overwrite".parse::<MergePolicy>(), Ok(MergePolicy::Overwrite));
        assert_eq!(
            "preserve-unsynced".parse::<MergePolicy>(),
            Ok(MergePolicy::PreserveUnsynced)
        );
        assert!("sometimes".parse::<MergePolicy>().is_err());
        assert_eq!(MergePolicy::PreserveUnsynced.to_string(), "preserve-unsynced");
    }
}
