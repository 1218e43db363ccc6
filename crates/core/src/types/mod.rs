//! Core types for the TJS store.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod kind;
pub mod price;

pub use id::*;
pub use kind::{LineKind, ParseLineKindError};
pub use price::{CurrencyCode, Price, round_cents};
