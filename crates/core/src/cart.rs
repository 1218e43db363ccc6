//! Shopping cart contents and the mutation algebra over them.
//!
//! [`Cart`] is a plain value: an ordered list of line items with no I/O and
//! no sharing. The storefront wraps it in a shared store that adds
//! subscriptions and persistence.
//!
//! # Invariants
//!
//! - Line items keep the order in which they were first added.
//! - The pair `(id, kind)` is unique within a cart.
//! - Every line item has a quantity of at least 1.
//! - Name, SKU, unit price and image are fixed when a line is first added.
//!
//! Every mutation is total and returns `true` only when the cart actually
//! changed, which lets callers skip redundant notifications and writes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CatalogId, LineKind, Price};

/// Identity of a line item: a catalog ID scoped by its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    pub id: CatalogId,
    pub kind: LineKind,
}

impl LineKey {
    #[must_use]
    pub fn new(id: impl Into<CatalogId>, kind: LineKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Key for a single product.
    #[must_use]
    pub fn product(id: impl Into<CatalogId>) -> Self {
        Self::new(id, LineKind::Product)
    }

    /// Key for a recovery kit.
    #[must_use]
    pub fn bundle(id: impl Into<CatalogId>) -> Self {
        Self::new(id, LineKind::Bundle)
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// An entry to add to the cart, captured from a catalog record.
///
/// Carries everything a line item needs except the quantity, which is
/// supplied separately to [`Cart::add_item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub id: CatalogId,
    #[serde(rename = "type")]
    pub kind: LineKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewCartItem {
    /// Create an entry without SKU or image.
    #[must_use]
    pub fn new(
        id: impl Into<CatalogId>,
        kind: LineKind,
        name: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            sku: None,
            unit_price,
            image_url: None,
        }
    }

    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.id.clone(), self.kind)
    }

    fn into_line(self, quantity: u32) -> CartLineItem {
        CartLineItem {
            id: self.id,
            kind: self.kind,
            name: self.name,
            sku: self.sku,
            unit_price: self.unit_price,
            quantity,
            image_url: self.image_url,
        }
    }
}

/// One row in the cart.
///
/// The persisted JSON shape uses `type` for the kind and `price` for the unit
/// price; optional fields are omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    id: CatalogId,
    #[serde(rename = "type")]
    kind: LineKind,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sku: Option<String>,
    #[serde(rename = "price")]
    unit_price: Decimal,
    quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl CartLineItem {
    #[must_use]
    pub const fn id(&self) -> &CatalogId {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> LineKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    /// Price per unit, as captured when the line was first added.
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.id.clone(), self.kind)
    }

    /// `unit_price * quantity`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Unit price as a displayable USD [`Price`].
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::usd(self.unit_price)
    }

    fn matches(&self, key: &LineKey) -> bool {
        self.kind == key.kind && self.id == key.id
    }
}

/// An ordered collection of cart line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLineItem>", into = "Vec<CartLineItem>")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Rebuild a cart from a previously persisted sequence.
    ///
    /// Lines with a zero quantity or a negative price are dropped, repeated
    /// keys are merged into their first occurrence, and lines that would push
    /// the subtotal past [`Decimal::MAX`] are skipped. The result always
    /// satisfies the cart invariants even if the input did not.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartLineItem>) -> Self {
        let mut cart = Self::new();
        for line in items {
            if line.quantity == 0 || line.unit_price < Decimal::ZERO {
                continue;
            }
            let key = line.key();
            match cart.position(&key) {
                Some(index) => {
                    let Some(existing) = cart.items.get(index) else {
                        continue;
                    };
                    let (unit_price, quantity) = (
                        existing.unit_price,
                        existing.quantity.saturating_add(line.quantity),
                    );
                    if !cart.fits(&key, unit_price, quantity) {
                        continue;
                    }
                    if let Some(existing) = cart.items.get_mut(index) {
                        existing.quantity = quantity;
                    }
                }
                None => {
                    if cart.fits(&key, line.unit_price, line.quantity) {
                        cart.items.push(line);
                    }
                }
            }
        }
        cart
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up a line by key.
    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartLineItem> {
        self.items.iter().find(|line| line.matches(key))
    }

    /// Number of distinct lines (not units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` units of `entry`.
    ///
    /// An existing line with the same `(id, kind)` has its quantity increased
    /// and keeps its original name, SKU, price and image. Otherwise a new line
    /// is appended. A zero quantity, a negative unit price, or a change that
    /// would overflow the subtotal changes nothing.
    pub fn add_item(&mut self, entry: NewCartItem, quantity: u32) -> bool {
        if quantity == 0 || entry.unit_price < Decimal::ZERO {
            return false;
        }

        let key = entry.key();
        if let Some(index) = self.position(&key) {
            let Some(line) = self.items.get(index) else {
                return false;
            };
            let (unit_price, current) = (line.unit_price, line.quantity);
            let updated = current.saturating_add(quantity);
            if updated == current || !self.fits(&key, unit_price, updated) {
                return false;
            }
            if let Some(line) = self.items.get_mut(index) {
                line.quantity = updated;
            }
            return true;
        }

        if !self.fits(&key, entry.unit_price, quantity) {
            return false;
        }
        self.items.push(entry.into_line(quantity));
        true
    }

    /// Remove the line with the given key. Absent keys are ignored.
    pub fn remove_item(&mut self, key: &LineKey) -> bool {
        let before = self.items.len();
        self.items.retain(|line| !line.matches(key));
        self.items.len() != before
    }

    /// Set the absolute quantity of a line.
    ///
    /// A quantity of zero or below removes the line. Quantities beyond
    /// `u32::MAX` are clamped. A quantity that would overflow the subtotal
    /// changes nothing.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> bool {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if quantity == 0 {
            return self.remove_item(key);
        }

        let Some(index) = self.position(key) else {
            return false;
        };
        let Some(unit_price) = self
            .items
            .get(index)
            .filter(|line| line.quantity != quantity)
            .map(|line| line.unit_price)
        else {
            return false;
        };
        if !self.fits(key, unit_price, quantity) {
            return false;
        }
        if let Some(line) = self.items.get_mut(index) {
            line.quantity = quantity;
        }
        true
    }

    /// Remove every line.
    pub fn clear(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        changed
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` across all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |sum, line| sum.saturating_add(line.line_total()))
    }

    fn position(&self, key: &LineKey) -> Option<usize> {
        self.items.iter().position(|line| line.matches(key))
    }

    /// Whether the subtotal stays representable with the line at `key` set to
    /// `quantity` units of `unit_price`.
    fn fits(&self, key: &LineKey, unit_price: Decimal, quantity: u32) -> bool {
        let Some(line_total) = unit_price.checked_mul(Decimal::from(quantity)) else {
            return false;
        };
        self.items
            .iter()
            .filter(|line| !line.matches(key))
            .try_fold(line_total, |sum, line| {
                line.unit_price
                    .checked_mul(Decimal::from(line.quantity))
                    .and_then(|total| sum.checked_add(total))
            })
            .is_some()
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartLineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
