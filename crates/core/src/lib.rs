//! TJS Core - Shared types and cart algebra.
//!
//! This crate provides common types used across all TJS store components:
//! - `storefront` - Public-facing store and cart API
//! - `cli` - Command-line tools for inspecting and editing a saved cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage, no
//! HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for catalog IDs, prices and line kinds
//! - [`cart`] - Cart line items and the add/remove/update/clear algebra
//! - [`catalog`] - Product and recovery kit records
//! - [`pricing`] - Shipping and tax rules for the order summary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartLineItem, LineKey, NewCartItem};
pub use catalog::{CatalogProduct, IncludedItem};
pub use pricing::{CartSummary, PricingPolicy};
pub use types::*;
