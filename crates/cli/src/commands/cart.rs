//! Cart commands.
//!
//! Every mutation prints the resulting cart. Remote sync failures are shown
//! as a notice rather than failing the command, since the cart has already
//! been restored to a consistent state.

#![allow(clippy::print_stdout)]

use bazaar_core::{ProductId, Quantity};
use bazaar_storefront::Storefront;
use bazaar_storefront::cart::{CartSource, CartUpdate, SyncStatus};
use bazaar_storefront::views::{CartView, CheckoutSelection, CheckoutSummary};
use tracing::info;

/// Print the current cart.
pub async fn show(storefront: &Storefront) {
    print_cart(&storefront.cart_view().await);
}

/// Add a catalog product.
///
/// # Errors
///
/// Returns an error if the product lookup fails or the local cart cannot be
/// written.
pub async fn add(
    storefront: &Storefront,
    product_id: &ProductId,
    quantity: Quantity,
) -> Result<(), Box<dyn std::error::Error>> {
    let update = storefront.add_product(product_id, quantity).await?;
    info!(product_id = %product_id, quantity = %quantity, "Added to cart");
    report(storefront, &update);
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the local cart
/// cannot be written.
pub async fn set(
    storefront: &Storefront,
    product_id: &ProductId,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let update = storefront.cart().update_quantity(product_id, quantity).await?;
    report(storefront, &update);
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the local cart
/// cannot be written.
pub async fn remove(
    storefront: &Storefront,
    product_id: &ProductId,
) -> Result<(), Box<dyn std::error::Error>> {
    let update = storefront.cart().remove(product_id).await?;
    report(storefront, &update);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the local cart cannot be cleared.
pub async fn clear(storefront: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    let update = storefront.cart().clear().await?;
    report(storefront, &update);
    Ok(())
}

/// Print a checkout summary of every line except `exclude`.
pub async fn checkout(storefront: &Storefront, exclude: &[ProductId]) {
    let loaded = storefront.cart().load().await;
    let mut selection = CheckoutSelection::from_cart(&loaded.cart, true);
    for product_id in exclude {
        selection.set(product_id, false);
    }

    let summary = CheckoutSummary::from_selection(&loaded.cart, &selection, storefront.currency());
    if summary.is_empty() {
        println!("Nothing selected for checkout.");
        return;
    }

    println!("Checkout ({} of {} lines)", summary.lines.len(), loaded.cart.len());
    for line in &summary.lines {
        println!("  {} x{}  {}", line.title, line.quantity, line.product_id);
    }
    println!("Items:    {}", summary.item_count);
    println!("Subtotal: {}", summary.subtotal.display());
}

// =============================================================================
// Helper Functions
// =============================================================================

fn report(storefront: &Storefront, update: &CartUpdate) {
    match &update.sync {
        SyncStatus::Synced => {}
        SyncStatus::LocalOnly if storefront.auth().is_authenticated() => {
            println!("(saved locally; not yet on your account)");
        }
        SyncStatus::LocalOnly => println!("(saved locally; sign in to sync)"),
        SyncStatus::Failed(message) => println!("Sync failed: {message}"),
    }
    print_cart(&CartView::new(&update.cart, update.source, storefront.currency()));
}

fn print_cart(view: &CartView) {
    if view.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    let source = match view.source {
        CartSource::Local => "local",
        CartSource::Remote => "account",
        CartSource::Merged => "account + local",
    };
    println!("Cart ({source}, {} items)", view.item_count);
    for item in &view.items {
        let seller = item.seller_name.as_deref().unwrap_or("-");
        println!(
            "  {:<32} x{:<3} {:>12}  {} [{}]",
            item.title, item.quantity, item.line_price, seller, item.product_id
        );
    }
    println!("Subtotal: {}", view.subtotal);
}
