//! Integration tests for the Bazaar storefront cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! The tests run the real HTTP clients against [`TestBackend`], an in-process
//! marketplace API serving the cart and product endpoints on a random local
//! port. No external services are needed.
//!
//! # Test Categories
//!
//! - `remote_cart_client` - wire format and error mapping of the REST clients
//! - `cart_reconciliation` - local/remote consistency through the reconciler

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

/// Token accepted by the backend unless overridden.
pub const TEST_TOKEN: &str = "test-token";

/// A product known to the backend's catalog.
#[derive(Debug, Clone)]
pub struct TestProduct {
    pub id: String,
    pub title: String,
    pub price: Decimal,
    pub seller: String,
    pub sku: String,
}

impl TestProduct {
    #[must_use]
    pub fn new(id: &str, title: &str, price: Decimal) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            price,
            seller: "Jaipur Handlooms".to_string(),
            sku: format!("SKU-{id}"),
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "_id": self.id,
            "title": self.title,
            "price": self.price.to_string(),
            "sku": self.sku,
            "seller": { "_id": "s1", "storeName": self.seller },
            "images": [{ "url": format!("https://cdn.test/{}.jpg", self.id) }],
        })
    }
}

/// A line in the backend's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLine {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Default)]
struct BackendState {
    token: String,
    products: Mutex<HashMap<String, TestProduct>>,
    lines: Mutex<Vec<ServerLine>>,
    next_line: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    product_requests: AtomicUsize,
    cart_requests: AtomicUsize,
}

/// In-process marketplace API.
///
/// Serves `GET|POST|DELETE /api/cart`, `PUT|DELETE /api/cart/{id}` and
/// `GET /api/products/{id}` with the `{ success, message, data }` envelope.
/// Cart routes require `Authorization: Bearer <token>`. The server task is
/// aborted when the backend is dropped.
pub struct TestBackend {
    state: Arc<BackendState>,
    base_url: String,
    server: tokio::task::JoinHandle<()>,
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl TestBackend {
    /// Start a backend accepting [`TEST_TOKEN`].
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        Self::start_with_token(TEST_TOKEN).await
    }

    /// Start a backend accepting `token`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start_with_token(token: &str) -> Self {
        let state = Arc::new(BackendState {
            token: token.to_string(),
            ..BackendState::default()
        });

        let app = Router::new()
            .route("/api/cart", get(get_cart).post(add_item).delete(clear_cart))
            .route("/api/cart/{id}", axum::routing::put(update_item).delete(remove_item))
            .route("/api/products/{id}", get(get_product))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test backend");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            state,
            base_url: format!("http://{addr}/api/"),
            server,
        }
    }

    /// API base URL, ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a product available in the catalog.
    pub fn add_product(&self, product: TestProduct) {
        lock(&self.state.products).insert(product.id.clone(), product);
    }

    /// Put a line straight into the server cart.
    pub fn seed_line(&self, product_id: &str, quantity: u32) -> String {
        let id = next_line_id(&self.state);
        lock(&self.state.lines).push(ServerLine {
            id: id.clone(),
            product_id: product_id.to_string(),
            quantity,
        });
        id
    }

    /// Current server cart.
    #[must_use]
    pub fn lines(&self) -> Vec<ServerLine> {
        lock(&self.state.lines).clone()
    }

    /// Make `GET /api/cart` answer 500.
    pub fn fail_reads(&self, fail: bool) {
        self.state.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make cart mutations answer 500.
    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of product lookups served.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state.product_requests.load(Ordering::SeqCst)
    }

    /// Number of cart requests served, including rejected ones.
    #[must_use]
    pub fn cart_requests(&self) -> usize {
        self.state.cart_requests.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Handlers
// =============================================================================

type Shared = State<Arc<BackendState>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBody {
    product_id: String,
    quantity: u32,
}

#[derive(Deserialize)]
struct UpdateBody {
    quantity: u32,
}

async fn get_cart(State(state): Shared, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    if state.fail_reads.load(Ordering::SeqCst) {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Cart service unavailable");
    }
    let products = lock(&state.products).clone();
    let items: Vec<Value> = lock(&state.lines)
        .iter()
        .map(|line| {
            let product = products
                .get(&line.product_id)
                .map_or_else(|| json!(line.product_id), TestProduct::to_json);
            json!({ "_id": line.id, "product": product, "quantity": line.quantity })
        })
        .collect();
    success(json!({ "cart": { "items": items } }))
}

async fn add_item(State(state): Shared, headers: HeaderMap, Json(body): Json<AddBody>) -> Response {
    if let Err(rejection) = authorize_write(&state, &headers) {
        return rejection;
    }
    if body.quantity == 0 {
        return failure(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }
    if !lock(&state.products).contains_key(&body.product_id) {
        return failure(StatusCode::NOT_FOUND, "Product not found");
    }

    let mut lines = lock(&state.lines);
    if let Some(line) = lines.iter_mut().find(|l| l.product_id == body.product_id) {
        line.quantity += body.quantity;
    } else {
        let id = next_line_id(&state);
        lines.push(ServerLine {
            id,
            product_id: body.product_id,
            quantity: body.quantity,
        });
    }
    drop(lines);
    message("Added to cart")
}

async fn update_item(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateBody>,
) -> Response {
    if let Err(rejection) = authorize_write(&state, &headers) {
        return rejection;
    }
    let mut lines = lock(&state.lines);
    match lines.iter_mut().find(|l| l.id == id) {
        Some(line) => {
            line.quantity = body.quantity;
            drop(lines);
            message("Cart updated")
        }
        None => failure(StatusCode::NOT_FOUND, "Cart item not found"),
    }
}

async fn remove_item(State(state): Shared, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(rejection) = authorize_write(&state, &headers) {
        return rejection;
    }
    let mut lines = lock(&state.lines);
    let before = lines.len();
    lines.retain(|l| l.id != id);
    if lines.len() == before {
        return failure(StatusCode::NOT_FOUND, "Cart item not found");
    }
    drop(lines);
    message("Removed from cart")
}

async fn clear_cart(State(state): Shared, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize_write(&state, &headers) {
        return rejection;
    }
    lock(&state.lines).clear();
    message("Cart cleared")
}

async fn get_product(State(state): Shared, Path(id): Path<String>) -> Response {
    state.product_requests.fetch_add(1, Ordering::SeqCst);
    let product = lock(&state.products).get(&id).cloned();
    match product {
        Some(product) => success(json!({ "product": product.to_json() })),
        None => failure(StatusCode::NOT_FOUND, "Product not found"),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn authorize(state: &BackendState, headers: &HeaderMap) -> Result<(), Response> {
    state.cart_requests.fetch_add(1, Ordering::SeqCst);
    let expected = format!("Bearer {}", state.token);
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok());
    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(failure(StatusCode::UNAUTHORIZED, "Not authorized"))
    }
}

fn authorize_write(state: &BackendState, headers: &HeaderMap) -> Result<(), Response> {
    authorize(state, headers)?;
    if state.fail_writes.load(Ordering::SeqCst) {
        return Err(failure(StatusCode::INTERNAL_SERVER_ERROR, "Cart service unavailable"));
    }
    Ok(())
}

fn success(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn message(text: &str) -> Response {
    Json(json!({ "success": true, "message": text })).into_response()
}

fn failure(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "success": false, "message": text }))).into_response()
}

fn next_line_id(state: &BackendState) -> String {
    format!("line-{}", state.next_line.fetch_add(1, Ordering::SeqCst) + 1)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
