//! End-to-end cart reconciliation tests.
//!
//! A [`Storefront`] session is wired to the in-process backend, so every
//! mutation goes through the local slot, the HTTP client, and the reload that
//! follows it.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use bazaar_core::{CartLine, CurrencyCode, ProductId, Quantity};
use bazaar_integration_tests::{TEST_TOKEN, TestBackend, TestProduct};
use bazaar_storefront::Storefront;
use bazaar_storefront::cart::{CartEvent, CartSource, MergePolicy, SyncStatus};
use bazaar_storefront::config::{ApiConfig, StorefrontConfig};
use bazaar_storefront::storage::{KeyValueStore, MemoryStore};
use bazaar_storefront::views::CartBadge;
use rust_decimal::Decimal;
use secrecy::SecretString;

fn config(backend: &TestBackend, storage_dir: &std::path::Path) -> StorefrontConfig {
    StorefrontConfig {
        api: ApiConfig::new(backend.base_url()).unwrap(),
        storage_dir: storage_dir.to_path_buf(),
        cart_key: "cart".to_string(),
        merge_policy: MergePolicy::Overwrite,
        currency: CurrencyCode::INR,
    }
}

async fn backend() -> TestBackend {
    let backend = TestBackend::start().await;
    backend.add_product(TestProduct::new("p-lamp", "Brass Lamp", Decimal::new(89_900, 2)));
    backend.add_product(TestProduct::new("p-rug", "Kilim Rug", Decimal::new(450_000, 2)));
    backend
}

fn signed_in(backend: &TestBackend) -> (Storefront, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_slots([("authToken", TEST_TOKEN)]));
    let storefront =
        Storefront::with_storage(config(backend, std::path::Path::new(".")), store.clone())
            .unwrap();
    (storefront, store)
}

fn anonymous(backend: &TestBackend) -> (Storefront, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let storefront =
        Storefront::with_storage(config(backend, std::path::Path::new(".")), store.clone())
            .unwrap();
    (storefront, store)
}

fn lamp() -> ProductId {
    ProductId::new("p-lamp")
}

// =============================================================================
// Anonymous Sessions
// =============================================================================

#[tokio::test]
async fn test_anonymous_add_stays_local() {
    let backend = backend().await;
    let (storefront, store) = anonymous(&backend);

    let update = storefront.add_product(&lamp(), Quantity::new(2).unwrap()).await.unwrap();

    assert_eq!(update.sync, SyncStatus::LocalOnly);
    assert_eq!(update.source, CartSource::Local);
    assert_eq!(update.cart.item_count(), 2);
    assert!(store.get("cart").unwrap().is_some());
    assert_eq!(backend.cart_requests(), 0);
    assert!(backend.lines().is_empty());
}

#[tokio::test]
async fn test_anonymous_cart_survives_restart() {
    let backend = backend().await;
    let dir = tempfile::tempdir().unwrap();

    let first = Storefront::open(config(&backend, dir.path())).unwrap();
    first.add_product(&lamp(), Quantity::ONE).await.unwrap();
    first.add_product(&lamp(), Quantity::ONE).await.unwrap();
    drop(first);

    let second = Storefront::open(config(&backend, dir.path())).unwrap();
    let view = second.cart_view().await;

    assert_eq!(view.source, CartSource::Local);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 2);
    assert_eq!(view.subtotal, "₹1798.00");
}

// =============================================================================
// Signed-in Sessions
// =============================================================================

#[tokio::test]
async fn test_cookie_token_authenticates() {
    let backend = backend().await;
    backend.seed_line("p-rug", 1);
    let mut config = config(&backend, std::path::Path::new("."));
    config.api.cookies = Some(SecretString::from(format!("isLoggedIn=true; token={TEST_TOKEN}")));

    let storefront = Storefront::with_storage(config, Arc::new(MemoryStore::new())).unwrap();
    let view = storefront.cart_view().await;

    assert_eq!(view.source, CartSource::Remote);
    assert_eq!(view.items[0].title, "Kilim Rug");
}

#[tokio::test]
async fn test_signed_in_add_reloads_remote_merge() {
    let backend = backend().await;
    backend.seed_line("p-lamp", 3);
    let (storefront, store) = signed_in(&backend);

    let update = storefront.add_product(&lamp(), Quantity::ONE).await.unwrap();

    assert_eq!(update.sync, SyncStatus::Synced);
    assert_eq!(update.source, CartSource::Remote);
    let line = update.cart.line(&lamp()).unwrap();
    assert_eq!(line.quantity.get(), 4);
    assert!(line.remote_line_id.is_some());

    // The local slot mirrors what the server reported.
    let stored = storefront.cart().local().read();
    assert_eq!(stored, update.cart);
    assert!(store.get("cart").unwrap().is_some());
}

#[tokio::test]
async fn test_remote_failure_rolls_back_local_change() {
    let backend = backend().await;
    backend.seed_line("p-rug", 1);
    let (storefront, _store) = signed_in(&backend);
    storefront.cart().load().await;
    backend.fail_writes(true);

    let update = storefront.add_product(&lamp(), Quantity::ONE).await.unwrap();

    assert_eq!(
        update.sync,
        SyncStatus::Failed("Cart service unavailable".to_string())
    );
    assert!(!update.cart.contains(&lamp()));
    assert!(!storefront.cart().local().read().contains(&lamp()));
    assert_eq!(backend.lines().len(), 1);
}

#[tokio::test]
async fn test_update_and_remove_forward_line_ids() {
    let backend = backend().await;
    backend.seed_line("p-lamp", 1);
    backend.seed_line("p-rug", 1);
    let (storefront, _store) = signed_in(&backend);
    storefront.cart().load().await;

    let update = storefront.cart().update_quantity(&lamp(), 5).await.unwrap();
    assert_eq!(update.sync, SyncStatus::Synced);
    assert_eq!(update.cart.line(&lamp()).unwrap().quantity.get(), 5);

    let update = storefront.cart().update_quantity(&lamp(), 0).await.unwrap();
    assert!(!update.cart.contains(&lamp()));

    let update = storefront.cart().remove(&ProductId::new("p-rug")).await.unwrap();
    assert_eq!(update.sync, SyncStatus::Synced);
    assert!(update.cart.is_empty());
    assert!(backend.lines().is_empty());
}

#[tokio::test]
async fn test_clear_empties_both_sides() {
    let backend = backend().await;
    backend.seed_line("p-lamp", 2);
    let (storefront, _store) = signed_in(&backend);
    storefront.cart().load().await;

    let update = storefront.cart().clear().await.unwrap();

    assert_eq!(update.sync, SyncStatus::Synced);
    assert!(update.cart.is_empty());
    assert!(backend.lines().is_empty());
    assert!(storefront.cart().local().read().is_empty());
}

#[tokio::test]
async fn test_load_falls_back_to_local_when_remote_is_down() {
    let backend = backend().await;
    backend.seed_line("p-rug", 1);
    let (storefront, _store) = signed_in(&backend);
    storefront.cart().load().await;
    backend.fail_reads(true);

    let loaded = storefront.cart().load().await;

    assert_eq!(loaded.source, CartSource::Local);
    assert!(loaded.cart.contains(&ProductId::new("p-rug")));
}

#[tokio::test]
async fn test_preserve_unsynced_keeps_local_only_lines() {
    let backend = backend().await;
    backend.seed_line("p-rug", 1);
    let store = Arc::new(MemoryStore::with_slots([("token", TEST_TOKEN)]));
    let mut config = config(&backend, std::path::Path::new("."));
    config.merge_policy = MergePolicy::PreserveUnsynced;
    let storefront = Storefront::with_storage(config, store).unwrap();

    // A line added before sign-in has no remote identity.
    let pending = CartLine::new(lamp(), "Brass Lamp", Decimal::new(89_900, 2));
    storefront
        .cart()
        .local()
        .write(&std::iter::once(pending).collect())
        .unwrap();

    let loaded = storefront.cart().load().await;

    assert_eq!(loaded.source, CartSource::Merged);
    assert_eq!(loaded.cart.len(), 2);
    assert!(loaded.cart.contains(&lamp()));
}

// =============================================================================
// Change Notifications
// =============================================================================

#[tokio::test]
async fn test_mutations_broadcast_cart_changed() {
    let backend = backend().await;
    let (storefront, _store) = signed_in(&backend);
    let mut subscription = storefront.events().subscribe();

    storefront
        .add_product(&lamp(), Quantity::new(3).unwrap())
        .await
        .unwrap();

    let event = subscription.changed().await.unwrap();
    assert_eq!(
        event,
        CartEvent::Changed {
            source: CartSource::Remote,
            item_count: 3,
        }
    );

    backend.fail_writes(true);
    storefront.cart().clear().await.unwrap();
    let event = subscription.latest().unwrap();
    assert_eq!(
        event,
        CartEvent::Changed {
            source: CartSource::Remote,
            item_count: 3,
        }
    );
}

#[tokio::test]
async fn test_badge_on_another_handle_sees_remote_count() {
    let backend = backend().await;
    let (storefront, _store) = signed_in(&backend);
    let header = storefront.clone();
    let mut subscription = header.events().subscribe();

    let mut badge = CartBadge::default();
    assert_eq!(badge.refresh(header.cart()).await, 0);

    let follower = tokio::spawn(async move {
        let followed = badge.follow(&mut subscription, header.cart()).await;
        (followed, badge.count())
    });

    storefront
        .add_product(&lamp(), Quantity::new(2).unwrap())
        .await
        .unwrap();

    assert_eq!(follower.await.unwrap(), (Some(2), 2));
    assert_eq!(backend.lines().len(), 1);
}
