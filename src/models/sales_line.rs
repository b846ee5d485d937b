use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Append-only ledger row, one per accepted line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Sale identifier as sent by the POS (may be empty)
    #[serde(rename = "posabit_sale_id")]
    pub sale_id: String,
    pub sku: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub qty: Decimal,
    /// Ingestion time, identical for every line of one event
    pub ts: DateTime<Utc>,
    /// Full original event, kept for audit and mapping fixes
    pub raw: Value,
}

/// Projection of `sales_lines` read back for demand aggregation.
///
/// Both columns are optional so that a malformed row degrades to "no
/// contribution" instead of failing the whole report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesLine {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub qty: Option<Decimal>,
}

impl From<&LedgerRow> for SalesLine {
    fn from(row: &LedgerRow) -> Self {
        Self {
            sku: Some(row.sku.clone()),
            qty: Some(row.qty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn ledger_row_uses_store_column_names() {
        let row = LedgerRow {
            sale_id: "S-1".into(),
            sku: "A".into(),
            qty: dec!(2.5),
            ts: "2024-05-01T12:00:00Z".parse().unwrap(),
            raw: json!({"id": "S-1"}),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["posabit_sale_id"], "S-1");
        assert_eq!(value["qty"], json!(2.5));
        assert!(value.get("sale_id").is_none());
    }

    #[test]
    fn sales_line_tolerates_nulls_and_numbers() {
        let rows: Vec<SalesLine> =
            serde_json::from_value(json!([{"sku": "A", "qty": 3}, {"sku": null, "qty": null}, {}]))
                .unwrap();
        assert_eq!(rows[0].qty, Some(dec!(3)));
        assert_eq!(rows[1], SalesLine::default());
        assert_eq!(rows[2], SalesLine::default());
    }
}
