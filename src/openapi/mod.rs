use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "POSaBIT Reorder API",
        version = "0.1.0",
        description = r#"
# POSaBIT Reorder API

Turns point-of-sale activity into purchasing guidance.

## Webhook ingestion

POSaBIT posts each completed sale to `/api/v1/posabit/webhook`. Line items are
mapped onto `{sku, qty, name, vendor}`, catalog data is merged into the product
table and one ledger row per line is appended. The endpoint always answers
`200`; the `ok` flag of the acknowledgment tells whether the sale was stored.

## Low-stock report

`/api/v1/reports/low-stock` combines recent sales, current inventory and the
catalog into one row per SKU, most urgent first:

- `daily_rate = units sold / lookback`
- `target_stock = ceil(daily_rate * (lead + safety))`
- `order_qty = max(0, ceil(daily_rate * (lead + safety) - on_hand))`
- `days_of_supply = on_hand / daily_rate`, `null` without sales

## Error Handling

Failures use one body shape:

```json
{
  "error": "Internal Server Error",
  "message": "Store read failed: store responded with 503: upstream unavailable",
  "request_id": "req-abc123xyz",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "posabit", description = "POSaBIT webhook ingestion"),
        (name = "reports", description = "Reorder reporting"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::webhooks::posabit_webhook,
        crate::handlers::reports::low_stock_report,
        crate::handlers::health::liveness_check,
    ),
    components(
        schemas(
            crate::services::ingest::IngestAck,
            crate::models::ReorderReport,
            crate::models::ReorderRow,
            crate::models::ReorderParams,
            crate::handlers::health::HealthResponse,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
