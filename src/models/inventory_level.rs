use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current on-hand quantity for one SKU, maintained by an external system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryLevel {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub on_hand: Option<Decimal>,
    /// Passed through to reports untouched, whatever format the source uses
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl InventoryLevel {
    pub fn new(sku: impl Into<String>, on_hand: Decimal) -> Self {
        Self {
            sku: Some(sku.into()),
            on_hand: Some(on_hand),
            updated_at: None,
        }
    }

    pub fn with_updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }

    /// The join key, if this row has a usable one
    pub fn key(&self) -> Option<&str> {
        self.sku.as_deref().filter(|sku| !sku.is_empty())
    }
}
