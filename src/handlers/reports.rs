use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;
use utoipa::IntoParams;

use super::common::{parse_int_param, success_response};
use crate::{errors::ServiceError, handlers::AppState, models::ReorderParams};

/// Query parameters of the low-stock report
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    /// Days of sales history (clamped to >= 1)
    #[param(value_type = Option<i64>, example = 14)]
    pub lookback: Option<String>,
    /// Supplier lead time in days (clamped to >= 0)
    #[param(value_type = Option<i64>, example = 7)]
    pub lead: Option<String>,
    /// Safety buffer in days (clamped to >= 0)
    #[param(value_type = Option<i64>, example = 3)]
    pub safety: Option<String>,
}

impl LowStockQuery {
    /// Resolves the effective parameters, defaults taken from configuration.
    pub fn params(&self, defaults: ReorderParams) -> Result<ReorderParams, ServiceError> {
        let lookback = parse_int_param(
            "lookback",
            self.lookback.as_deref(),
            i64::from(defaults.lookback_days),
        )?;
        let lead = parse_int_param(
            "lead",
            self.lead.as_deref(),
            i64::from(defaults.lead_time_days),
        )?;
        let safety = parse_int_param(
            "safety",
            self.safety.as_deref(),
            i64::from(defaults.safety_days),
        )?;
        Ok(ReorderParams::clamped(lookback, lead, safety))
    }
}

/// Ranked reorder recommendations for every SKU that sold recently or has
/// an inventory record.
#[utoipa::path(
    get,
    path = "/api/v1/reports/low-stock",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Reorder report, most urgent SKU first", body = crate::models::ReorderReport,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Non-integer parameter", body = crate::errors::ErrorResponse),
        (status = 500, description = "Store read failed", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
#[instrument(skip(state))]
pub async fn low_stock_report(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let params = query.params(state.config.report_defaults())?;
    let report = state.services.reorder.report(params, Utc::now()).await?;
    Ok(success_response(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(lookback: Option<&str>, lead: Option<&str>, safety: Option<&str>) -> LowStockQuery {
        LowStockQuery {
            lookback: lookback.map(Into::into),
            lead: lead.map(Into::into),
            safety: safety.map(Into::into),
        }
    }

    #[test]
    fn missing_values_use_defaults() {
        let params = LowStockQuery::default()
            .params(ReorderParams::clamped(30, 5, 2))
            .unwrap();
        assert_eq!(params, ReorderParams::clamped(30, 5, 2));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let params = query(Some("0"), Some("-4"), Some("-1"))
            .params(ReorderParams::default())
            .unwrap();
        assert_eq!(
            (params.lookback_days, params.lead_time_days, params.safety_days),
            (1, 0, 0)
        );
    }

    #[test]
    fn non_integer_is_rejected() {
        let err = query(None, Some("soon"), None)
            .params(ReorderParams::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }
}
