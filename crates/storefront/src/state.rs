//! Session state shared by every cart consumer.

use std::sync::Arc;

use bazaar_core::{CurrencyCode, ProductId, Quantity};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{ApiClient, ApiError, CatalogClient, RemoteCartClient};
use crate::auth::AuthContext;
use crate::cart::{CartError, CartEvents, CartReconciler, CartUpdate, LocalCartStore};
use crate::config::StorefrontConfig;
use crate::storage::{FileStore, KeyValueStore, StorageError};
use crate::views::CartView;

/// Error building the session state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("api client error: {0}")]
    Api(#[from] ApiError),
}

/// Error adding a catalog product to the cart.
#[derive(Debug, Error)]
pub enum AddProductError {
    #[error("product lookup failed: {0}")]
    Lookup(#[from] ApiError),
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Cart session for one storefront user.
///
/// This struct is cheaply cloneable via `Arc`. Auth is resolved once at
/// construction and every component shares the same [`AuthContext`].
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    cart: CartReconciler<RemoteCartClient>,
}

impl Storefront {
    /// Open the session: local storage under `config.storage_dir`, auth from
    /// the configured cookie header and the storage slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created or the
    /// HTTP client fails to build.
    pub fn open(config: StorefrontConfig) -> Result<Self, StateError> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.storage_dir)?);
        Self::with_storage(config, storage)
    }

    /// Build the session over an existing key-value store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    #[instrument(skip_all, fields(base_url = %config.api.base_url))]
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, StateError> {
        let cookies = config.api.cookies.as_ref().map(|c| c.expose_secret().to_owned());
        let auth = AuthContext::resolve(cookies.as_deref(), storage.as_ref());
        info!(authenticated = auth.is_authenticated(), "Opened storefront session");

        let api = ApiClient::new(&config.api, auth.clone())?;
        let catalog = CatalogClient::new(api.clone(), config.api.catalog_cache_ttl);
        let cart = CartReconciler::new(
            LocalCartStore::new(storage, config.cart_key.clone()),
            RemoteCartClient::new(api),
            auth,
            CartEvents::new(),
        )
        .with_merge_policy(config.merge_policy);

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                catalog,
                cart,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn auth(&self) -> &AuthContext {
        self.inner.cart.auth()
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartReconciler<RemoteCartClient> {
        &self.inner.cart
    }

    #[must_use]
    pub fn events(&self) -> &CartEvents {
        self.inner.cart.events()
    }

    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.config.currency
    }

    /// Load the cart and render it.
    pub async fn cart_view(&self) -> CartView {
        let loaded = self.inner.cart.load().await;
        CartView::new(&loaded.cart, loaded.source, self.currency())
    }

    /// Look a product up in the catalog and add `quantity` of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the product lookup fails or the local cart cannot
    /// be written.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<CartUpdate, AddProductError> {
        let product = self.inner.catalog.get_product(product_id).await?;
        Ok(self
            .inner
            .cart
            .add_to_cart(product.to_cart_line(), quantity)
            .await?)
    }
}
