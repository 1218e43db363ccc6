//! Catalog entry kinds.

use serde::{Deserialize, Serialize};

/// Distinguishes an individually sold item from a multi-item recovery kit.
///
/// A product and a bundle may share the same catalog ID; the kind keeps
/// them apart everywhere an ID alone would be ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// A single catalog product.
    #[default]
    Product,
    /// A curated recovery kit sold as one unit.
    Bundle,
}

impl LineKind {
    /// Customer-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Bundle => "Recovery Kit",
        }
    }

    /// Whether this is a bundle.
    #[must_use]
    pub const fn is_bundle(&self) -> bool {
        matches!(self, Self::Bundle)
    }
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Bundle => write!(f, "bundle"),
        }
    }
}

/// Error returned when a string does not name a [`LineKind`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid line kind: {0}")]
pub struct ParseLineKindError(pub String);

impl std::str::FromStr for LineKind {
    type Err = ParseLineKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(Self::Product),
            "bundle" => Ok(Self::Bundle),
            _ => Err(ParseLineKindError(s.to_owned())),
        }
    }
}
