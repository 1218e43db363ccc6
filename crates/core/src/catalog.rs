//! Catalog records read from the remote data store.
//!
//! The storefront never writes these; catalog pages fetch them and turn the
//! ones a shopper picks into [`NewCartItem`]s.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::NewCartItem;
use crate::types::{CatalogId, LineKind};

/// A product or recovery kit row from the `tjs_products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: CatalogId,
    pub sku: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price: Decimal,
    /// Manufacturer's suggested retail price, shown struck through when higher.
    #[serde(default)]
    pub msrp: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Absent in older rows, which are all single products.
    #[serde(default)]
    pub product_type: Option<LineKind>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    /// Contents of a recovery kit.
    #[serde(default)]
    pub included_items: Option<Vec<IncludedItem>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One component listed inside a recovery kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedItem {
    pub name: String,
}

const fn default_true() -> bool {
    true
}

impl CatalogProduct {
    /// Whether this row is a product or a recovery kit.
    #[must_use]
    pub fn kind(&self) -> LineKind {
        self.product_type.unwrap_or_default()
    }

    /// In stock means at least one unit on hand; otherwise it is backordered.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    #[must_use]
    pub fn is_featured(&self) -> bool {
        self.is_featured.unwrap_or(false)
    }

    /// Amount below MSRP, when the sale price is lower.
    #[must_use]
    pub fn markdown(&self) -> Option<Decimal> {
        self.msrp
            .filter(|msrp| *msrp > self.unit_price)
            .map(|msrp| msrp - self.unit_price)
    }

    /// Number of components in a recovery kit (zero for plain products).
    #[must_use]
    pub fn included_item_count(&self) -> usize {
        self.included_items.as_ref().map_or(0, Vec::len)
    }

    /// Build the cart entry for this record at its current price.
    #[must_use]
    pub fn to_cart_entry(&self) -> NewCartItem {
        let mut entry = NewCartItem::new(
            self.id.clone(),
            self.kind(),
            self.name.clone(),
            self.unit_price,
        );
        if !self.sku.is_empty() {
            entry = entry.with_sku(self.sku.clone());
        }
        if let Some(url) = &self.image_url {
            entry = entry.with_image_url(url.clone());
        }
        entry
    }
}

impl From<&CatalogProduct> for NewCartItem {
    fn from(product: &CatalogProduct) -> Self {
        product.to_cart_entry()
    }
}
