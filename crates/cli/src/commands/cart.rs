//! Saved cart commands.
//!
//! Every command goes through [`CartStore`], so edits made here follow the
//! same merge and removal rules as the storefront and are saved the same way.

use std::io::{self, Write};

use rust_decimal::Decimal;
use thiserror::Error;

use tjs_core::{LineKey, LineKind, NewCartItem, Price, PricingPolicy};
use tjs_storefront::cart::CartStore;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Price was negative.
    #[error("Invalid price: {0} (must not be negative)")]
    NegativePrice(Decimal),

    /// Quantity to add was zero.
    #[error("Quantity must be at least 1")]
    ZeroQuantity,

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// Fields for a new cart line, as given on the command line.
#[derive(Debug, Clone)]
pub struct NewLine {
    pub id: String,
    pub kind: LineKind,
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// Print the cart and its order summary.
///
/// # Errors
///
/// Returns `CartCommandError::Io` if writing fails.
pub fn show(
    store: &CartStore,
    policy: &PricingPolicy,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    let cart = store.snapshot();
    if cart.is_empty() {
        writeln!(out, "Your cart is empty.")?;
        return Ok(());
    }

    for line in cart.items() {
        writeln!(
            out,
            "{:<8} {:<12} {:<32} {:>4} x {:>10} = {:>10}",
            line.kind(),
            line.id(),
            line.name(),
            line.quantity(),
            line.price().display(),
            Price::usd(line.line_total()).display(),
        )?;
    }

    let summary = policy.summarize(cart.subtotal());
    writeln!(out)?;
    writeln!(out, "Items:     {}", cart.item_count())?;
    writeln!(out, "Subtotal:  {}", Price::usd(summary.subtotal))?;
    if summary.ships_free() {
        writeln!(out, "Shipping:  FREE")?;
    } else {
        writeln!(out, "Shipping:  {}", Price::usd(summary.shipping))?;
    }
    writeln!(out, "Tax:       {}", Price::usd(summary.tax))?;
    writeln!(out, "Total:     {}", Price::usd(summary.total))?;
    if let Some(remaining) = summary.free_shipping_remaining {
        writeln!(
            out,
            "Add {} more for free shipping!",
            Price::usd(remaining)
        )?;
    }
    Ok(())
}

/// Add units of a line.
///
/// # Errors
///
/// Returns `CartCommandError` for a negative price or zero quantity.
pub fn add(
    store: &CartStore,
    line: NewLine,
    quantity: u32,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    if line.price < Decimal::ZERO {
        return Err(CartCommandError::NegativePrice(line.price));
    }
    if quantity == 0 {
        return Err(CartCommandError::ZeroQuantity);
    }

    let mut entry = NewCartItem::new(line.id, line.kind, line.name, line.price);
    if let Some(sku) = line.sku {
        entry = entry.with_sku(sku);
    }
    if let Some(url) = line.image_url {
        entry = entry.with_image_url(url);
    }

    let key = entry.key();
    store.add_item(entry, quantity);
    let now = store
        .snapshot()
        .get(&key)
        .map_or(0, tjs_core::CartLineItem::quantity);
    writeln!(out, "{key}: {now} in cart ({} items total)", store.item_count())?;
    Ok(())
}

/// Set the quantity of a line.
///
/// # Errors
///
/// Returns `CartCommandError::Io` if writing fails.
pub fn update(
    store: &CartStore,
    id: &str,
    kind: LineKind,
    quantity: i64,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    let key = LineKey::new(id, kind);
    if store.snapshot().get(&key).is_none() {
        writeln!(out, "{key} is not in the cart")?;
        return Ok(());
    }

    store.update_quantity(&key, quantity);
    if quantity <= 0 {
        writeln!(out, "{key}: removed")?;
    } else {
        writeln!(out, "{key}: quantity set to {quantity}")?;
    }
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns `CartCommandError::Io` if writing fails.
pub fn remove(
    store: &CartStore,
    id: &str,
    kind: LineKind,
    out: &mut impl Write,
) -> Result<(), CartCommandError> {
    let key = LineKey::new(id, kind);
    let present = store.snapshot().get(&key).is_some();
    store.remove_item(&key);
    if present {
        writeln!(out, "{key}: removed")?;
    } else {
        writeln!(out, "{key} is not in the cart")?;
    }
    Ok(())
}

/// Remove every line.
///
/// # Errors
///
/// Returns `CartCommandError::Io` if writing fails.
pub fn clear(store: &CartStore, out: &mut impl Write) -> Result<(), CartCommandError> {
    store.clear_cart();
    writeln!(out, "Cart cleared")?;
    Ok(())
}
