use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{errors::StoreError, models::SalesLine, store::Store};

/// Units sold per SKU over a window.
pub type Demand = BTreeMap<String, Decimal>;

/// Sums quantities per SKU. Rows without a SKU are ignored and a missing
/// quantity counts as zero.
pub fn aggregate_demand<'a, I>(rows: I) -> Demand
where
    I: IntoIterator<Item = &'a SalesLine>,
{
    let mut demand = Demand::new();
    for row in rows {
        let Some(sku) = row.sku.as_deref().filter(|sku| !sku.is_empty()) else {
            continue;
        };
        let qty = row.qty.unwrap_or(Decimal::ZERO);
        let total = demand.entry(sku.to_string()).or_insert(Decimal::ZERO);
        *total = total.saturating_add(qty);
    }
    demand
}

/// Start of a lookback window ending at `now`.
pub fn window_start(now: DateTime<Utc>, lookback_days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Reads the sales ledger and folds it into per-SKU demand.
#[derive(Clone)]
pub struct DemandAggregator {
    store: Arc<dyn Store>,
}

impl DemandAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Demand over the `lookback_days` days ending at `now`.
    #[instrument(skip(self))]
    pub async fn demand_for(
        &self,
        lookback_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Demand, StoreError> {
        let rows = self
            .store
            .sales_since(window_start(now, lookback_days))
            .await?;
        let demand = aggregate_demand(&rows);
        debug!(rows = rows.len(), skus = demand.len(), "aggregated demand");
        Ok(demand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LedgerRow;
    use crate::store::InMemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sales_line(sku: Option<&str>, qty: Option<Decimal>) -> SalesLine {
        SalesLine {
            sku: sku.map(Into::into),
            qty,
        }
    }

    #[test]
    fn sums_per_sku() {
        let rows = vec![
            sales_line(Some("A"), Some(dec!(2))),
            sales_line(Some("B"), Some(dec!(1.5))),
            sales_line(Some("A"), Some(dec!(3))),
        ];
        let demand = aggregate_demand(&rows);
        assert_eq!(demand.get("A"), Some(&dec!(5)));
        assert_eq!(demand.get("B"), Some(&dec!(1.5)));
    }

    #[test]
    fn malformed_rows_do_not_contribute() {
        let rows = vec![
            sales_line(None, Some(dec!(4))),
            sales_line(Some(""), Some(dec!(4))),
            sales_line(Some("A"), None),
        ];
        let demand = aggregate_demand(&rows);
        assert_eq!(demand.len(), 1);
        assert_eq!(demand.get("A"), Some(&Decimal::ZERO));
    }

    #[test]
    fn window_start_saturates() {
        let now = Utc::now();
        assert_eq!(window_start(now, 14), now - Duration::days(14));
        assert_eq!(window_start(now, u32::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(
            window_start(DateTime::<Utc>::MIN_UTC, 1),
            DateTime::<Utc>::MIN_UTC
        );
    }

    #[tokio::test]
    async fn demand_for_reads_only_the_window() {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let row = |sku: &str, qty: Decimal, age_days: i64| LedgerRow {
            sale_id: "S".into(),
            sku: sku.into(),
            qty,
            ts: now - Duration::days(age_days),
            raw: json!({}),
        };
        store
            .seed_sales(vec![
                row("A", dec!(10), 1),
                row("A", dec!(5), 13),
                row("A", dec!(100), 20),
                row("B", dec!(1), 30),
            ])
            .await;

        let demand = DemandAggregator::new(store).demand_for(14, now).await.unwrap();
        assert_eq!(demand.get("A"), Some(&dec!(15)));
        assert!(demand.get("B").is_none());
    }
}
