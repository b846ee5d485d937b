use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product master data, keyed by SKU.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub cost: Option<Decimal>,
}

impl ProductRecord {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: Some(sku.into()),
            ..Default::default()
        }
    }

    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.sku.as_deref().filter(|sku| !sku.is_empty())
    }
}

/// Partial product row merged into the catalog on ingestion.
///
/// Absent fields are left out of the serialized row so the store keeps
/// whatever it already holds for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpsert {
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

impl ProductUpsert {
    /// Which optional columns this row carries, as `(name, vendor)`.
    pub fn columns(&self) -> (bool, bool) {
        (self.name.is_some(), self.vendor.is_some())
    }

    /// Applies this row onto an existing record: present fields overwrite,
    /// absent ones are left alone.
    pub fn merge_into(&self, record: &mut ProductRecord) {
        if let Some(name) = &self.name {
            record.name = Some(name.clone());
        }
        if let Some(vendor) = &self.vendor {
            record.vendor = Some(vendor.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn absent_fields_are_not_serialized() {
        let row = ProductUpsert {
            sku: "A".into(),
            name: Some("Blue Dream 3.5g".into()),
            vendor: None,
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"sku": "A", "name": "Blue Dream 3.5g"})
        );
    }

    #[test]
    fn merge_keeps_cost_and_missing_fields() {
        let mut record = ProductRecord {
            sku: Some("A".into()),
            name: Some("Old".into()),
            vendor: Some("Acme".into()),
            cost: Some(dec!(4.25)),
        };
        ProductUpsert {
            sku: "A".into(),
            name: Some("New".into()),
            vendor: None,
        }
        .merge_into(&mut record);

        assert_eq!(record.name.as_deref(), Some("New"));
        assert_eq!(record.vendor.as_deref(), Some("Acme"));
        assert_eq!(record.cost, Some(dec!(4.25)));
    }
}
