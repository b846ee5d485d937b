//! Persistence boundary.
//!
//! The service never owns its data: sales history, inventory snapshots and
//! the product catalog live in an external store. Everything here is a
//! network call that can fail; failures come back as [`StoreError`] and the
//! callers decide whether they are reads or writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    config::AppConfig,
    errors::StoreError,
    models::{InventoryLevel, LedgerRow, ProductRecord, ProductUpsert, SalesLine},
};

pub mod memory;
pub mod postgrest;

pub use memory::InMemoryStore;
pub use postgrest::{PostgrestConfig, PostgrestStore};

#[async_trait]
pub trait Store: Send + Sync {
    /// Ledger rows with `ts >= since`.
    async fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SalesLine>, StoreError>;

    /// Every inventory snapshot row.
    async fn inventory_levels(&self) -> Result<Vec<InventoryLevel>, StoreError>;

    /// Every catalog row.
    async fn products(&self) -> Result<Vec<ProductRecord>, StoreError>;

    /// Appends rows to the ledger. Rows are never updated afterwards.
    async fn append_sales_lines(&self, rows: &[LedgerRow]) -> Result<(), StoreError>;

    /// Merge-upserts catalog rows keyed by SKU.
    async fn upsert_products(&self, rows: &[ProductUpsert]) -> Result<(), StoreError>;
}

/// Builds the store selected by configuration.
pub fn build_store(cfg: &AppConfig) -> Result<Arc<dyn Store>, StoreError> {
    if cfg.uses_in_memory_store() {
        tracing::warn!("Using in-memory store; writes are lost on restart");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let store = PostgrestStore::new(PostgrestConfig::from_app_config(cfg)?)?;
    Ok(Arc::new(store))
}
