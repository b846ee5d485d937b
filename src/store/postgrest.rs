use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header::HeaderValue, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::Store;
use crate::{
    config::AppConfig,
    errors::StoreError,
    models::{InventoryLevel, LedgerRow, ProductRecord, ProductUpsert, SalesLine},
};

const PREFER_INSERT: &str = "return=minimal";
const PREFER_MERGE_UPSERT: &str = "resolution=merge-duplicates,return=minimal";

/// Connection settings for a PostgREST (Supabase REST) endpoint.
#[derive(Clone)]
pub struct PostgrestConfig {
    /// Project base URL, without the `/rest/v1` suffix
    pub base_url: String,
    pub service_key: String,
    pub timeout: Duration,
    pub sales_table: String,
    pub inventory_table: String,
    pub products_table: String,
}

impl std::fmt::Debug for PostgrestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestConfig")
            .field("base_url", &self.base_url)
            .field("service_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("sales_table", &self.sales_table)
            .field("inventory_table", &self.inventory_table)
            .field("products_table", &self.products_table)
            .finish()
    }
}

impl PostgrestConfig {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            timeout: Duration::from_secs(15),
            sales_table: "sales_lines".to_string(),
            inventory_table: "inventory_levels".to_string(),
            products_table: "products".to_string(),
        }
    }

    pub fn from_app_config(cfg: &AppConfig) -> Result<Self, StoreError> {
        let base_url = cfg
            .store_url
            .clone()
            .ok_or_else(|| StoreError::Unavailable("store_url is not configured".into()))?;
        let service_key = cfg
            .store_service_key
            .clone()
            .ok_or_else(|| StoreError::Unavailable("store_service_key is not configured".into()))?;

        Ok(Self {
            base_url,
            service_key,
            timeout: cfg.store_timeout(),
            sales_table: cfg.sales_table.clone(),
            inventory_table: cfg.inventory_table.clone(),
            products_table: cfg.products_table.clone(),
        })
    }
}

/// Store backed by a PostgREST HTTP API.
#[derive(Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    config: PostgrestConfig,
}

impl PostgrestStore {
    pub fn new(config: PostgrestConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.config.service_key.as_str())
            .bearer_auth(&self.config.service_key)
    }

    /// `GET /rest/v1/{table}?{query}`
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let request = self
            .authorized(self.client.get(self.table_url(table)))
            .query(query);
        let response = ensure_success(request.send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("select {}: {}", table, e)))
    }

    /// `POST /rest/v1/{table}`
    async fn insert<T: Serialize + Sync>(&self, table: &str, rows: &[T]) -> Result<(), StoreError> {
        let request = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", HeaderValue::from_static(PREFER_INSERT))
            .json(rows);
        ensure_success(request.send().await?).await?;
        Ok(())
    }

    /// `POST /rest/v1/{table}?on_conflict={key}` with merge-duplicates resolution
    async fn merge_upsert<T: Serialize + Sync>(
        &self,
        table: &str,
        rows: &[T],
        on_conflict: &str,
    ) -> Result<(), StoreError> {
        let request = self
            .authorized(self.client.post(self.table_url(table)))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", HeaderValue::from_static(PREFER_MERGE_UPSERT))
            .json(rows);
        ensure_success(request.send().await?).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Request {
        status: status.as_u16(),
        body,
    })
}

/// Splits upsert rows into batches that each carry the same column set.
///
/// PostgREST derives the column list of a bulk insert from the payload, so a
/// row without `vendor` batched next to one with it would null the vendor out.
fn batches_by_columns(rows: &[ProductUpsert]) -> Vec<Vec<&ProductUpsert>> {
    let mut batches: BTreeMap<(bool, bool), Vec<&ProductUpsert>> = BTreeMap::new();
    for row in rows {
        batches.entry(row.columns()).or_default().push(row);
    }
    batches.into_values().collect()
}

#[async_trait]
impl Store for PostgrestStore {
    #[instrument(skip(self))]
    async fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SalesLine>, StoreError> {
        let since = since.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.select(
            &self.config.sales_table,
            &[
                ("select", "sku,qty".to_string()),
                ("ts", format!("gte.{}", since)),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn inventory_levels(&self) -> Result<Vec<InventoryLevel>, StoreError> {
        self.select(
            &self.config.inventory_table,
            &[("select", "sku,on_hand,updated_at".to_string())],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<ProductRecord>, StoreError> {
        self.select(
            &self.config.products_table,
            &[("select", "sku,name,vendor,cost".to_string())],
        )
        .await
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn append_sales_lines(&self, rows: &[LedgerRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.insert(&self.config.sales_table, rows).await
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn upsert_products(&self, rows: &[ProductUpsert]) -> Result<(), StoreError> {
        for batch in batches_by_columns(rows) {
            debug!(batch = batch.len(), "merging product batch");
            self.merge_upsert(&self.config.products_table, &batch, "sku")
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(sku: &str, name: Option<&str>, vendor: Option<&str>) -> ProductUpsert {
        ProductUpsert {
            sku: sku.into(),
            name: name.map(Into::into),
            vendor: vendor.map(Into::into),
        }
    }

    #[test]
    fn batches_group_rows_by_column_set() {
        let rows = vec![
            upsert("A", Some("a"), None),
            upsert("B", Some("b"), Some("vb")),
            upsert("C", Some("c"), None),
            upsert("D", None, Some("vd")),
        ];

        let batches = batches_by_columns(&rows);
        assert_eq!(batches.len(), 3);
        for batch in &batches {
            let shape = batch[0].columns();
            assert!(batch.iter().all(|row| row.columns() == shape));
        }
        let total: usize = batches.iter().map(Vec::len).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn table_url_tolerates_trailing_slash() {
        let store =
            PostgrestStore::new(PostgrestConfig::new("https://x.supabase.co/", "key")).unwrap();
        assert_eq!(
            store.table_url("products"),
            "https://x.supabase.co/rest/v1/products"
        );
    }

    #[test]
    fn debug_output_redacts_key() {
        let cfg = PostgrestConfig::new("https://x.supabase.co", "very-secret");
        assert!(!format!("{:?}", cfg).contains("very-secret"));
    }
}
