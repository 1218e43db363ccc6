//! TJS CLI - Saved cart inspection and editing.
//!
//! # Usage
//!
//! ```bash
//! # Show the saved cart with its order summary
//! tjs-cli cart show
//!
//! # Add two cold therapy wraps
//! tjs-cli cart add --id p1 --kind product --name "Cold Therapy Wrap" --price 49.00 -q 2
//!
//! # Set a recovery kit's quantity (0 removes it)
//! tjs-cli cart update --id k1 --kind bundle -q 3
//!
//! # Remove a line, or everything
//! tjs-cli cart remove --id p1 --kind product
//! tjs-cli cart clear
//! ```
//!
//! The cart file lives in `--storage-dir`, falling back to
//! `STOREFRONT_CART_DIR` and then the current directory. The storefront reads
//! that file only at startup and overwrites it on every change, so stop the
//! storefront before editing its cart here.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use tjs_core::LineKind;
use tjs_storefront::cart::{CartStore, JsonFileCartStorage};
use tjs_storefront::config::StorefrontConfig;

mod commands;

#[derive(Parser)]
#[command(name = "tjs-cli")]
#[command(author, version, about = "TJS recovery store CLI tools")]
struct Cli {
    /// Directory holding the saved cart
    #[arg(long, global = true, env = "STOREFRONT_CART_DIR")]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or edit the saved cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print line items and the order summary
    Show,
    /// Add units of a product or recovery kit
    Add(AddArgs),
    /// Set the absolute quantity of a line (0 or below removes it)
    Update {
        #[command(flatten)]
        line: LineArgs,

        /// New quantity
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove(LineArgs),
    /// Remove every line
    Clear,
}

#[derive(Args)]
struct LineArgs {
    /// Catalog ID
    #[arg(long)]
    id: String,

    /// Line kind (`product` or `bundle`)
    #[arg(long, default_value = "product")]
    kind: LineKind,
}

#[derive(Args)]
struct AddArgs {
    #[command(flatten)]
    line: LineArgs,

    /// Display name
    #[arg(long)]
    name: String,

    /// Unit price, e.g. 49.00
    #[arg(long)]
    price: Decimal,

    /// Stock keeping unit
    #[arg(long)]
    sku: Option<String>,

    /// Image reference
    #[arg(long)]
    image_url: Option<String>,

    /// Units to add
    #[arg(short, long, default_value_t = 1)]
    quantity: u32,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let dir = cli.storage_dir.unwrap_or_else(|| config.cart_dir.clone());
    let storage = JsonFileCartStorage::new(&dir);
    tracing::debug!(path = %storage.path().display(), "Opening saved cart");

    let store = CartStore::open(Arc::new(storage));
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&store, &config.pricing, &mut out)?,
            CartAction::Add(args) => {
                let entry = commands::cart::NewLine {
                    id: args.line.id,
                    kind: args.line.kind,
                    name: args.name,
                    sku: args.sku,
                    price: args.price,
                    image_url: args.image_url,
                };
                commands::cart::add(&store, entry, args.quantity, &mut out)?;
            }
            CartAction::Update { line, quantity } => {
                commands::cart::update(&store, &line.id, line.kind, quantity, &mut out)?;
            }
            CartAction::Remove(line) => {
                commands::cart::remove(&store, &line.id, line.kind, &mut out)?;
            }
            CartAction::Clear => commands::cart::clear(&store, &mut out)?,
        },
    }
    Ok(())
}
