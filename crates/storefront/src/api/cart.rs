//! Remote cart resource client.
//!
//! Each operation is one independent request; nothing is batched or retried.
//! The backend is loose about where it puts the cart inside `data`, so reads
//! go through [`normalize_cart_payload`] before anything sees them.

use std::future::Future;

use bazaar_core::{Cart, CartLine, CartLineId, ProductId, Quantity, SellerId};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{ApiClient, ApiError};

/// Path of the cart resource, relative to the API base URL.
const CART_PATH: &str = "cart";

/// Operations against the authenticated user's remote cart.
pub trait CartRemote: Send + Sync {
    /// Fetch the server's current cart lines.
    fn get_cart(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// Add units of a product. The server applies its own merge rules.
    fn add_to_cart(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Set the quantity of a remote line.
    fn update_cart_item(
        &self,
        line_id: &CartLineId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Delete a remote line.
    fn remove_from_cart(
        &self,
        line_id: &CartLineId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Delete the whole remote cart.
    fn clear_cart(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// HTTP implementation of [`CartRemote`].
#[derive(Clone)]
pub struct RemoteCartClient {
    api: ApiClient,
}

impl RemoteCartClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn line_path(line_id: &CartLineId) -> String {
        format!("{CART_PATH}/{}", urlencoding::encode(line_id.as_str()))
    }
}

impl CartRemote for RemoteCartClient {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<Cart, ApiError> {
        let envelope = self
            .api
            .execute::<serde_json::Value>(Method::GET, CART_PATH, None, true)
            .await?;
        Ok(normalize_cart_payload(envelope.data.unwrap_or_default()))
    }

    #[instrument(skip_all, fields(product_id = %product_id, quantity = %quantity))]
    async fn add_to_cart(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "productId": product_id,
            "quantity": quantity,
        });
        self.api
            .execute::<serde_json::Value>(Method::POST, CART_PATH, Some(&body), true)
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(line_id = %line_id, quantity = %quantity))]
    async fn update_cart_item(
        &self,
        line_id: &CartLineId,
        quantity: Quantity,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "quantity": quantity });
        let path = Self::line_path(line_id);
        self.api
            .execute::<serde_json::Value>(Method::PUT, &path, Some(&body), true)
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(line_id = %line_id))]
    async fn remove_from_cart(&self, line_id: &CartLineId) -> Result<(), ApiError> {
        let path = Self::line_path(line_id);
        self.api
            .execute::<serde_json::Value>(Method::DELETE, &path, None, true)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.api
            .execute::<serde_json::Value>(Method::DELETE, CART_PATH, None, true)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Payload Normalization
// =============================================================================

/// Turn the `data` of a cart response into a [`Cart`].
///
/// Accepted shapes: a bare array of items, `{ items: [...] }`,
/// `{ cart: [...] }`, `{ cart: { items: [...] } }`, or `null`. Items that
/// cannot be turned into a line are skipped.
#[must_use]
pub fn normalize_cart_payload(data: serde_json::Value) -> Cart {
    let items = match data {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("items") {
            Some(serde_json::Value::Array(items)) => items,
            _ => match map.remove("cart") {
                Some(serde_json::Value::Array(items)) => items,
                Some(serde_json::Value::Object(mut cart)) => match cart.remove("items") {
                    Some(serde_json::Value::Array(items)) => items,
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            },
        },
        serde_json::Value::Null => Vec::new(),
        other => {
            warn!(kind = json_kind(&other), "Unexpected cart payload shape");
            Vec::new()
        }
    };

    items.into_iter().filter_map(normalize_item).collect()
}

fn normalize_item(raw: serde_json::Value) -> Option<CartLine> {
    let item: WireCartItem = match serde_json::from_value(raw) {
        Ok(item) => item,
        Err(e) => {
            warn!(error = %e, "Skipping malformed cart item");
            return None;
        }
    };

    let Some(quantity) = Quantity::new(item.quantity) else {
        warn!(line_id = ?item.id, "Skipping cart item with zero quantity");
        return None;
    };

    // Prefer whichever product reference carries details.
    let product = match (item.product, item.product_id) {
        (Some(WireProductRef::Details(p)), _) | (_, Some(WireProductRef::Details(p))) => {
            ProductFields::from(*p)
        }
        (Some(WireProductRef::Id(id)), _) | (None, Some(WireProductRef::Id(id))) => {
            ProductFields::bare(id)
        }
        (None, None) => {
            warn!(line_id = ?item.id, "Skipping cart item without a product");
            return None;
        }
    };

    let product_id = product.id;
    // Some responses address lines by product id alone.
    let remote_line_id = item
        .id
        .unwrap_or_else(|| CartLineId::new(product_id.as_str()));

    let mut line = CartLine::new(
        product_id,
        item.title.or(product.title).unwrap_or_default(),
        item.price.or(product.price).unwrap_or(Decimal::ZERO),
    )
    .with_quantity(quantity)
    .with_seller(item.seller_name.or(product.seller_name).unwrap_or_default())
    .with_sku(item.sku.or(product.sku).unwrap_or_default())
    .with_remote_line_id(remote_line_id);

    if let Some(url) = item.image.or(product.thumbnail) {
        line = line.with_thumbnail(url);
    }
    Some(line)
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Cart item as sent by the backend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCartItem {
    #[serde(default, alias = "_id")]
    id: Option<CartLineId>,
    #[serde(default)]
    product: Option<WireProductRef>,
    #[serde(default)]
    product_id: Option<WireProductRef>,
    quantity: u32,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    seller_name: Option<String>,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

/// A product reference: either a bare id or the populated document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireProductRef {
    Id(ProductId),
    Details(Box<WireProduct>),
}

/// Product document as embedded in cart items and catalog responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProduct {
    #[serde(alias = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub seller: Option<WireSeller>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub images: Vec<WireImage>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireSeller {
    Id(SellerId),
    Details {
        #[serde(default, rename = "storeName")]
        store_name: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireImage {
    Url(String),
    Object { url: String },
}

/// Product fields after resolving aliases and nesting.
pub(crate) struct ProductFields {
    pub id: ProductId,
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub sku: Option<String>,
    pub seller_name: Option<String>,
    pub thumbnail: Option<String>,
}

impl ProductFields {
    const fn bare(id: ProductId) -> Self {
        Self {
            id,
            title: None,
            price: None,
            sku: None,
            seller_name: None,
            thumbnail: None,
        }
    }
}

impl From<WireProduct> for ProductFields {
    fn from(p: WireProduct) -> Self {
        let seller_name = p.seller_name.or_else(|| match p.seller {
            Some(WireSeller::Details { store_name, name }) => store_name.or(name),
            Some(WireSeller::Id(_)) | None => None,
        });
        let thumbnail = p.thumbnail.or_else(|| {
            p.images.into_iter().next().map(|img| match img {
                WireImage::Url(url) | WireImage::Object { url } => url,
            })
        });
        Self {
            id: p.id,
            title: p.title.or(p.name),
            price: p.price,
            sku: p.sku,
            seller_name,
            thumbnail,
        }
    }
}
