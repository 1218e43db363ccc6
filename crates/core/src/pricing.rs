//! Order summary arithmetic shown beside the cart.
//!
//! Shipping is a flat fee waived once the subtotal reaches a threshold, and tax
//! is a fixed rate applied to the subtotal only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::round_cents;

/// Shipping and tax rules for the order summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Decimal,
    /// Flat shipping fee below the threshold.
    pub shipping_fee: Decimal,
    /// Tax rate applied to the subtotal (0.08 = 8%).
    pub tax_rate: Decimal,
}

impl PricingPolicy {
    /// $75.00 free shipping threshold.
    pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(75, 0, 0, false, 0);
    /// $9.99 flat shipping.
    pub const DEFAULT_SHIPPING_FEE: Decimal = Decimal::from_parts(999, 0, 0, false, 2);
    /// 8% estimated tax.
    pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

    /// Compute the order summary for a cart subtotal.
    ///
    /// An empty subtotal has nothing to ship, so shipping is zero. Tax is
    /// rounded to cents before it is added, so the displayed lines always sum
    /// to the displayed total. Amounts saturate at [`Decimal::MAX`].
    #[must_use]
    pub fn summarize(&self, subtotal: Decimal) -> CartSummary {
        let qualifies = subtotal >= self.free_shipping_threshold;
        let shipping = if qualifies || subtotal.is_zero() {
            Decimal::ZERO
        } else {
            self.shipping_fee
        };
        let tax = round_cents(subtotal.saturating_mul(self.tax_rate));
        let free_shipping_remaining = if qualifies || subtotal.is_zero() {
            None
        } else {
            Some(self.free_shipping_threshold - subtotal)
        };

        CartSummary {
            subtotal,
            shipping,
            tax,
            total: subtotal.saturating_add(shipping).saturating_add(tax),
            free_shipping_remaining,
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Self::DEFAULT_FREE_SHIPPING_THRESHOLD,
            shipping_fee: Self::DEFAULT_SHIPPING_FEE,
            tax_rate: Self::DEFAULT_TAX_RATE,
        }
    }
}

/// Derived totals for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// How much more the customer must spend for free shipping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_shipping_remaining: Option<Decimal>,
}

impl CartSummary {
    #[must_use]
    pub fn ships_free(&self) -> bool {
        self.shipping.is_zero()
    }
}
