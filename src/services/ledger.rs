use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    errors::ServiceError,
    models::{LedgerRow, NormalizedLine, ProductUpsert},
    store::Store,
};

/// Persists accepted sale lines: catalog data first, then the ledger.
#[derive(Clone)]
pub struct LedgerWriter {
    store: Arc<dyn Store>,
}

impl LedgerWriter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records one normalized sale and returns the number of ledger rows
    /// written.
    ///
    /// The catalog upsert runs before the append and a failed upsert skips
    /// the append, so a sale is never half-recorded in the ledger. An empty
    /// sale performs no writes at all.
    #[instrument(skip(self, raw, lines), fields(lines = lines.len()))]
    pub async fn record(
        &self,
        sale_id: &str,
        ts: DateTime<Utc>,
        raw: &Value,
        lines: &[NormalizedLine],
    ) -> Result<usize, ServiceError> {
        if lines.is_empty() {
            return Ok(0);
        }

        let updates = catalog_updates(lines);
        if !updates.is_empty() {
            debug!(products = updates.len(), "merging catalog updates");
            self.store
                .upsert_products(&updates)
                .await
                .map_err(ServiceError::StoreWrite)?;
        }

        let rows = ledger_rows(sale_id, ts, raw, lines);
        self.store
            .append_sales_lines(&rows)
            .await
            .map_err(ServiceError::StoreWrite)?;

        Ok(rows.len())
    }
}

/// Catalog rows for lines that carry a name or vendor.
///
/// Collapsed to one row per SKU in first-appearance order, later lines
/// overriding the fields they carry. A bulk upsert may touch each key once.
pub fn catalog_updates(lines: &[NormalizedLine]) -> Vec<ProductUpsert> {
    let mut updates: Vec<ProductUpsert> = Vec::new();
    for line in lines.iter().filter(|line| line.has_catalog_data()) {
        match updates.iter_mut().find(|row| row.sku == line.sku) {
            Some(existing) => {
                if line.name.is_some() {
                    existing.name = line.name.clone();
                }
                if line.vendor.is_some() {
                    existing.vendor = line.vendor.clone();
                }
            }
            None => updates.push(ProductUpsert {
                sku: line.sku.clone(),
                name: line.name.clone(),
                vendor: line.vendor.clone(),
            }),
        }
    }
    updates
}

/// One ledger row per line, in line order, all sharing `ts` and `raw`.
pub fn ledger_rows(
    sale_id: &str,
    ts: DateTime<Utc>,
    raw: &Value,
    lines: &[NormalizedLine],
) -> Vec<LedgerRow> {
    lines
        .iter()
        .map(|line| LedgerRow {
            sale_id: sale_id.to_string(),
            sku: line.sku.clone(),
            qty: line.qty,
            ts,
            raw: raw.clone(),
        })
        .collect()
}
