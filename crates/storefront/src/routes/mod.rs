//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (cart storage readable)
//!
//! # Cart (JSON)
//! GET  /cart                   - Cart view with order summary
//! POST /cart/add               - Add to cart (returns badge count)
//! POST /cart/update            - Set quantity (returns cart view)
//! POST /cart/remove            - Remove line (returns cart view)
//! POST /cart/clear             - Empty cart (returns cart view)
//! GET  /cart/count             - Cart count badge
//! GET  /cart/events            - Badge count stream (server-sent events)
//!
//! # Checkout
//! GET  /checkout               - Redirects back to the cart
//! ```

pub mod cart;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri},
    routing::{get, post},
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
        .route("/events", get(cart::events))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout redirect
        .route("/checkout", get(cart::checkout))
        .fallback(not_found)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the saved cart can still be read.
async fn readiness(State(state): State<AppState>) -> Result<StatusCode> {
    state
        .storage()
        .load()
        .map(|_| StatusCode::OK)
        .map_err(|e| AppError::Internal(format!("cart storage unreadable: {e}")))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
