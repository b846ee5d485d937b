use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One inbound webhook body.
///
/// Bodies that are not JSON are kept as text so they can still be logged
/// and audited; they never produce line items.
#[derive(Debug, Clone, PartialEq)]
pub enum SaleEvent {
    Structured(Value),
    Raw(String),
}

impl SaleEvent {
    /// Parses a webhook body, falling back to the raw text.
    pub fn parse(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => SaleEvent::Structured(value),
            Err(_) => SaleEvent::Raw(String::from_utf8_lossy(body).into_owned()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, SaleEvent::Structured(_))
    }

    /// The payload stored alongside ledger rows: the parsed event, or
    /// `{"raw": "<body>"}` for unparseable bodies.
    pub fn payload(&self) -> Value {
        match self {
            SaleEvent::Structured(value) => value.clone(),
            SaleEvent::Raw(text) => json!({ "raw": text }),
        }
    }
}

/// A line item mapped onto the canonical shape.
///
/// `sku` is never empty and `qty` is always positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLine {
    pub sku: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub qty: Decimal,
    pub name: Option<String>,
    pub vendor: Option<String>,
}

impl NormalizedLine {
    /// Lines carrying catalog data worth merging into `products`.
    pub fn has_catalog_data(&self) -> bool {
        self.name.is_some() || self.vendor.is_some()
    }
}

/// Result of normalizing one sale event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedSale {
    pub sale_id: String,
    pub lines: Vec<NormalizedLine>,
    /// Line items dropped for a missing sku or non-positive quantity
    pub rejected: usize,
}

impl NormalizedSale {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
