use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 14;
pub const DEFAULT_LEAD_TIME_DAYS: u32 = 7;
pub const DEFAULT_SAFETY_DAYS: u32 = 3;

/// Tunables of one reorder report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReorderParams {
    /// Days of sales history used for the daily rate (>= 1)
    pub lookback_days: u32,
    /// Supplier lead time in days (>= 0)
    pub lead_time_days: u32,
    /// Safety buffer in days (>= 0)
    pub safety_days: u32,
}

impl Default for ReorderParams {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            lead_time_days: DEFAULT_LEAD_TIME_DAYS,
            safety_days: DEFAULT_SAFETY_DAYS,
        }
    }
}

impl ReorderParams {
    /// Builds parameters from caller input, clamping out-of-range values
    /// instead of rejecting them.
    pub fn clamped(lookback_days: i64, lead_time_days: i64, safety_days: i64) -> Self {
        Self {
            lookback_days: clamp_days(lookback_days, 1),
            lead_time_days: clamp_days(lead_time_days, 0),
            safety_days: clamp_days(safety_days, 0),
        }
    }

    pub fn reorder_point_days(&self) -> u32 {
        self.lead_time_days.saturating_add(self.safety_days)
    }
}

fn clamp_days(value: i64, min: u32) -> u32 {
    u32::try_from(value.max(i64::from(min))).unwrap_or(u32::MAX)
}

/// Reorder recommendation for one SKU. Computed per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReorderRow {
    pub sku: String,
    pub name: Option<String>,
    pub vendor: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub on_hand: Decimal,
    /// Units sold per day over the lookback window, rounded to 3 decimals
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub daily_rate: Decimal,
    /// `null` when nothing sold in the window
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub days_of_supply: Option<Decimal>,
    pub reorder_point_days: u32,
    pub target_stock: i64,
    pub order_qty: i64,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub unit_cost: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub est_cost: Option<Decimal>,
    pub last_inventory_update: Option<String>,
}

/// Report body: the effective parameters followed by the ranked rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReorderReport {
    pub lookback: u32,
    pub lead: u32,
    pub safety: u32,
    pub rows: Vec<ReorderRow>,
}

impl ReorderReport {
    pub fn new(params: ReorderParams, rows: Vec<ReorderRow>) -> Self {
        Self {
            lookback: params.lookback_days,
            lead: params.lead_time_days,
            safety: params.safety_days,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(14, 7, 3, (14, 7, 3))]
    #[case(0, -2, -1, (1, 0, 0))]
    #[case(-30, 0, 0, (1, 0, 0))]
    #[case(i64::MAX, 1, 1, (u32::MAX, 1, 1))]
    fn params_are_clamped(
        #[case] lookback: i64,
        #[case] lead: i64,
        #[case] safety: i64,
        #[case] expected: (u32, u32, u32),
    ) {
        let params = ReorderParams::clamped(lookback, lead, safety);
        assert_eq!(
            (params.lookback_days, params.lead_time_days, params.safety_days),
            expected
        );
    }

    #[test]
    fn reorder_point_is_lead_plus_safety() {
        assert_eq!(ReorderParams::default().reorder_point_days(), 10);
    }
}
