//! Bazaar cart CLI - inspect and edit the storefront cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart (remote when signed in, local otherwise)
//! bz-cart show
//!
//! # Add two of a product
//! bz-cart add 64f1c0ffee -q 2
//!
//! # Change or drop a line
//! bz-cart set 64f1c0ffee 5
//! bz-cart remove 64f1c0ffee
//!
//! # Summarize everything except one line for checkout
//! bz-cart checkout --exclude 64f1c0ffee
//! ```
//!
//! Configuration comes from `BAZAAR_*` environment variables (or `.env`).
//! Set `BAZAAR_LOG_FORMAT=json` for JSON logs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use bazaar_core::{ProductId, Quantity};
use bazaar_storefront::Storefront;
use bazaar_storefront::config::StorefrontConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "bz-cart")]
#[command(author, version, about = "Bazaar storefront cart client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: String,

        /// Number of units to add
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        /// Product ID
        product_id: String,

        /// New quantity
        quantity: u32,
    },
    /// Remove a line from the cart
    Remove {
        /// Product ID
        product_id: String,
    },
    /// Empty the cart
    Clear,
    /// Summarize the lines selected for checkout
    Checkout {
        /// Product IDs to leave out of the order
        #[arg(short, long)]
        exclude: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_storefront=info,bazaar_cli=info".into());

    let json = std::env::var("BAZAAR_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let storefront = Storefront::open(config)?;

    match cli.command {
        Commands::Show => commands::cart::show(&storefront).await,
        Commands::Add {
            product_id,
            quantity,
        } => {
            let quantity = Quantity::new(quantity).ok_or("quantity must be at least 1")?;
            commands::cart::add(&storefront, &ProductId::new(product_id), quantity).await?;
        }
        Commands::Set {
            product_id,
            quantity,
        } => commands::cart::set(&storefront, &ProductId::new(product_id), quantity).await?,
        Commands::Remove { product_id } => {
            commands::cart::remove(&storefront, &ProductId::new(product_id)).await?;
        }
        Commands::Clear => commands::cart::clear(&storefront).await?,
        Commands::Checkout { exclude } => {
            let exclude: Vec<ProductId> = exclude.into_iter().map(ProductId::new).collect();
            commands::cart::checkout(&storefront, &exclude).await;
        }
    }
    Ok(())
}
