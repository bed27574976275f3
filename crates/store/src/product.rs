//! The product catalog entity.

use common::Money;
use serde::{Deserialize, Serialize};

/// A sellable product. Cart lines are resolved against the available set
/// at submission time, never against a cached copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product name; order items snapshot it.
    pub name: String,

    /// Category the product is listed under.
    pub category: String,

    /// Current unit price.
    pub unit_price: Money,

    /// Unavailable products are hidden from the catalog and fail resolution.
    pub is_available: bool,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        unit_price: Money,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            unit_price,
            is_available: true,
        }
    }
}
