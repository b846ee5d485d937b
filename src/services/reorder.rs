//! Reorder recommendations.
//!
//! Demand over the lookback window becomes a daily rate; the reorder point
//! (lead time plus safety buffer, in days) turns the rate into a stock
//! target. All arithmetic runs on exact decimals and the results are rounded
//! half away from zero. Derived values that would overflow saturate instead.

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, instrument};

use super::demand::{Demand, DemandAggregator};
use super::ranking::rank;
use crate::{
    errors::ServiceError,
    models::{InventoryLevel, ProductRecord, ReorderParams, ReorderReport, ReorderRow},
    store::Store,
};

const RATE_DP: u32 = 3;
const SUPPLY_DP: u32 = 1;
const COST_DP: u32 = 2;

fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn ceil_to_i64(value: Decimal) -> i64 {
    let ceiled = value.ceil();
    ceiled.to_i64().unwrap_or(if ceiled.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Builds the row for one SKU.
///
/// The stock requirement is `total_qty * reorder_point_days / lookback_days`,
/// multiplied before dividing so whole-number results stay exact.
pub fn reorder_row(
    sku: &str,
    total_qty: Decimal,
    inventory: Option<&InventoryLevel>,
    product: Option<&ProductRecord>,
    params: &ReorderParams,
) -> ReorderRow {
    let lookback = Decimal::from(params.lookback_days.max(1));
    let reorder_point_days = params.reorder_point_days();

    let daily_rate = total_qty.checked_div(lookback).unwrap_or(Decimal::ZERO);
    let requirement = total_qty
        .saturating_mul(Decimal::from(reorder_point_days))
        .checked_div(lookback)
        .unwrap_or(Decimal::ZERO);

    let on_hand = inventory
        .and_then(|level| level.on_hand)
        .unwrap_or(Decimal::ZERO);

    let target_stock = ceil_to_i64(requirement);
    let order_qty = ceil_to_i64(requirement.saturating_sub(on_hand)).max(0);

    let days_of_supply = if daily_rate > Decimal::ZERO {
        on_hand
            .saturating_mul(lookback)
            .checked_div(total_qty)
            .map(|days| round_half_away(days, SUPPLY_DP))
    } else {
        None
    };

    let unit_cost = product.and_then(|p| p.cost);
    let est_cost = unit_cost
        .map(|cost| round_half_away(cost.saturating_mul(Decimal::from(order_qty)), COST_DP));

    ReorderRow {
        sku: sku.to_string(),
        name: product.and_then(|p| p.name.clone()),
        vendor: product.and_then(|p| p.vendor.clone()),
        on_hand,
        daily_rate: round_half_away(daily_rate, RATE_DP),
        days_of_supply,
        reorder_point_days,
        target_stock,
        order_qty,
        unit_cost,
        est_cost,
        last_inventory_update: inventory.and_then(|level| level.updated_at.clone()),
    }
}

/// Joins demand, inventory and catalog into one row per SKU that either sold
/// in the window or has an inventory record, in SKU order. Catalog-only SKUs
/// are left out. Later rows win when a source repeats a SKU.
pub fn compute_reorder_rows(
    demand: &Demand,
    inventory: &[InventoryLevel],
    products: &[ProductRecord],
    params: &ReorderParams,
) -> Vec<ReorderRow> {
    let inventory_by_sku: BTreeMap<&str, &InventoryLevel> = inventory
        .iter()
        .filter_map(|level| level.key().map(|sku| (sku, level)))
        .collect();
    let products_by_sku: BTreeMap<&str, &ProductRecord> = products
        .iter()
        .filter_map(|product| product.key().map(|sku| (sku, product)))
        .collect();

    let universe: BTreeSet<&str> = demand
        .keys()
        .map(String::as_str)
        .chain(inventory_by_sku.keys().copied())
        .collect();

    universe
        .into_iter()
        .map(|sku| {
            reorder_row(
                sku,
                demand.get(sku).copied().unwrap_or(Decimal::ZERO),
                inventory_by_sku.get(sku).copied(),
                products_by_sku.get(sku).copied(),
                params,
            )
        })
        .collect()
}

/// Produces ranked reorder reports from the store.
#[derive(Clone)]
pub struct ReorderService {
    store: Arc<dyn Store>,
    demand: DemandAggregator,
}

impl ReorderService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            demand: DemandAggregator::new(store.clone()),
            store,
        }
    }

    /// Builds the report as of `now`. The three reads run concurrently and
    /// any failure fails the report.
    #[instrument(skip(self))]
    pub async fn report(
        &self,
        params: ReorderParams,
        now: DateTime<Utc>,
    ) -> Result<ReorderReport, ServiceError> {
        let (demand, inventory, products) = tokio::try_join!(
            async {
                self.demand
                    .demand_for(params.lookback_days, now)
                    .await
                    .map_err(ServiceError::StoreRead)
            },
            async {
                self.store
                    .inventory_levels()
                    .await
                    .map_err(ServiceError::StoreRead)
            },
            async {
                self.store
                    .products()
                    .await
                    .map_err(ServiceError::StoreRead)
            },
        )?;

        let mut rows = compute_reorder_rows(&demand, &inventory, &products, &params);
        rank(&mut rows);

        let to_order = rows.iter().filter(|row| row.order_qty > 0).count();
        counter!("reorder.reports.generated", 1);
        histogram!("reorder.reports.rows", rows.len() as f64);
        info!(rows = rows.len(), to_order, "reorder report computed");

        Ok(ReorderReport::new(params, rows))
    }
}
