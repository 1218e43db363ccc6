//! Cart route handlers.
//!
//! Cart pages and the header badge talk to the shared [`CartStore`] through
//! these JSON endpoints. Mutations return the state the caller needs to
//! re-render: the add button gets the new count, the cart page gets the full
//! view.
//!
//! [`CartStore`]: crate::cart::CartStore

use std::convert::Infallible;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{
        IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};
use tracing::instrument;

use tjs_core::{Cart, CartLineItem, CartSummary, LineKey, LineKind, NewCartItem, Price};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Cart item display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemView {
    pub id: String,
    pub kind: LineKind,
    pub kind_label: String,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

/// Cart display data, including the order summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub is_empty: bool,
    pub subtotal: String,
    pub shipping: String,
    pub ships_free: bool,
    pub tax: String,
    pub total: String,
    /// e.g. "$45.00" more to spend for free shipping.
    pub free_shipping_remaining: Option<String>,
}

/// Cart count badge data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCount {
    pub count: u64,
}

// =============================================================================
// Type Conversions
// =============================================================================

fn format_price(amount: Decimal) -> String {
    Price::usd(amount).display()
}

impl From<&CartLineItem> for CartItemView {
    fn from(line: &CartLineItem) -> Self {
        Self {
            id: line.id().to_string(),
            kind: line.kind(),
            kind_label: line.kind().label().to_string(),
            name: line.name().to_string(),
            sku: line.sku().map(String::from),
            quantity: line.quantity(),
            price: line.price().display(),
            line_price: format_price(line.line_total()),
            image_url: line.image_url().map(String::from),
        }
    }
}

impl CartView {
    /// Build the view for a cart and its order summary.
    #[must_use]
    pub fn new(cart: &Cart, summary: &CartSummary) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            item_count: cart.item_count(),
            is_empty: cart.is_empty(),
            subtotal: format_price(summary.subtotal),
            shipping: format_price(summary.shipping),
            ships_free: summary.ships_free(),
            tax: format_price(summary.tax),
            total: format_price(summary.total),
            free_shipping_remaining: summary.free_shipping_remaining.map(format_price),
        }
    }
}

fn current_view(state: &AppState) -> CartView {
    let cart = state.cart().snapshot();
    let summary = state.pricing().summarize(cart.subtotal());
    CartView::new(&cart, &summary)
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub id: String,
    pub kind: LineKind,
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub quantity: Option<u32>,
}

impl AddToCartForm {
    fn into_entry(self) -> (NewCartItem, u32) {
        let quantity = self.quantity.unwrap_or(1);
        let entry = NewCartItem {
            id: self.id.into(),
            kind: self.kind,
            name: self.name,
            sku: self.sku.filter(|sku| !sku.is_empty()),
            unit_price: self.price,
            image_url: self.image_url.filter(|url| !url.is_empty()),
        };
        (entry, quantity)
    }
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: String,
    pub kind: LineKind,
    pub quantity: i64,
}

/// Remove line request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: String,
    pub kind: LineKind,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    Json(current_view(&state))
}

/// Add item to cart.
///
/// Returns the new badge count.
#[instrument(skip(state, payload))]
pub async fn add(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddToCartForm>, JsonRejection>,
) -> Result<Json<CartCount>> {
    let Json(form) = payload?;
    if form.price < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "price must not be negative".to_string(),
        ));
    }

    let (entry, quantity) = form.into_entry();
    tracing::info!(key = %entry.key(), quantity, "Adding to cart");
    state.cart().add_item(entry, quantity);

    Ok(Json(CartCount {
        count: state.cart().item_count(),
    }))
}

/// Update cart item quantity.
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdateCartForm>, JsonRejection>,
) -> Result<Json<CartView>> {
    let Json(form) = payload?;
    let key = LineKey::new(form.id, form.kind);
    state.cart().update_quantity(&key, form.quantity);
    Ok(Json(current_view(&state)))
}

/// Remove item from cart.
#[instrument(skip(state, payload))]
pub async fn remove(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RemoveFromCartForm>, JsonRejection>,
) -> Result<Json<CartView>> {
    let Json(form) = payload?;
    let key = LineKey::new(form.id, form.kind);
    state.cart().remove_item(&key);
    Ok(Json(current_view(&state)))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Json<CartView> {
    state.cart().clear_cart();
    Json(current_view(&state))
}

/// Get cart count badge.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CartCount> {
    Json(CartCount {
        count: state.cart().item_count(),
    })
}

/// Stream badge counts as server-sent events.
///
/// Emits the current count immediately, then one `cart-updated` event per
/// cart change.
#[instrument(skip(state))]
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.cart().subscribe()).map(|cart| {
        Ok(Event::default()
            .event("cart-updated")
            .data(cart.item_count().to_string()))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Checkout is not available yet; send shoppers back to their cart.
#[instrument(skip(state))]
pub async fn checkout(State(state): State<AppState>) -> Response {
    tracing::info!(
        item_count = state.cart().item_count(),
        "Checkout requested but not available"
    );
    Redirect::to("/cart").into_response()
}
