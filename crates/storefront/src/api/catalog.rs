//! Product catalog lookups.
//!
//! Only what add-to-cart needs: a product's display snapshot. Results are
//! cached in memory so that repeated adds of the same product don't hit the
//! backend.

use std::time::Duration;

use bazaar_core::{CartLine, ProductId};
use moka::future::Cache;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::cart::{ProductFields, WireProduct};
use super::{ApiClient, ApiError};

const CACHE_CAPACITY: u64 = 1000;

/// Product fields needed to build a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub seller_name: String,
    pub sku: String,
    pub thumbnail_url: Option<String>,
}

impl ProductSummary {
    /// Snapshot this product into a single-unit local cart line.
    #[must_use]
    pub fn to_cart_line(&self) -> CartLine {
        let line = CartLine::new(self.id.clone(), self.title.clone(), self.price)
            .with_seller(self.seller_name.clone())
            .with_sku(self.sku.clone());
        match &self.thumbnail_url {
            Some(url) => line.with_thumbnail(url.clone()),
            None => line,
        }
    }
}

impl From<ProductFields> for ProductSummary {
    fn from(fields: ProductFields) -> Self {
        Self {
            id: fields.id,
            title: fields.title.unwrap_or_default(),
            price: fields.price.unwrap_or(Decimal::ZERO),
            seller_name: fields.seller_name.unwrap_or_default(),
            sku: fields.sku.unwrap_or_default(),
            thumbnail_url: fields.thumbnail,
        }
    }
}

/// `data` of a product response: the product itself or `{ product }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductPayload {
    Wrapped { product: Box<WireProduct> },
    Bare(Box<WireProduct>),
}

/// Client for catalog product lookups.
#[derive(Clone)]
pub struct CatalogClient {
    api: ApiClient,
    cache: Cache<ProductId, ProductSummary>,
}

impl CatalogClient {
    /// Create a catalog client whose lookups live for `ttl`.
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { api, cache }
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the product is missing from the
    /// response, or the body cannot be parsed.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<ProductSummary, ApiError> {
        if let Some(product) = self.cache.get(product_id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let path = format!("products/{}", urlencoding::encode(product_id.as_str()));
        let envelope = self
            .api
            .execute::<ProductPayload>(Method::GET, &path, None, false)
            .await?;

        let wire = match envelope.data {
            Some(ProductPayload::Wrapped { product } | ProductPayload::Bare(product)) => *product,
            None => {
                return Err(ApiError::Api {
                    status: 404,
                    message: format!("Product not found: {product_id}"),
                });
            }
        };

        let product = ProductSummary::from(ProductFields::from(wire));
        self.cache.insert(product_id.clone(), product.clone()).await;
        Ok(product)
    }

    /// Drop all cached products.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
