use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::Store;
use crate::{
    errors::StoreError,
    models::{InventoryLevel, LedgerRow, ProductRecord, ProductUpsert, SalesLine},
};

#[derive(Debug, Default)]
struct Tables {
    ledger: Vec<LedgerRow>,
    inventory: BTreeMap<String, InventoryLevel>,
    products: BTreeMap<String, ProductRecord>,
}

/// Process-local store for development, the CLI dry runs and tests.
///
/// Reads and writes can be switched to fail, to exercise the error paths of
/// the ingestion and reporting boundaries.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of write operations attempted, failed ones included
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub async fn put_inventory(&self, level: InventoryLevel) {
        if let Some(sku) = level.key().map(str::to_string) {
            self.tables.write().await.inventory.insert(sku, level);
        }
    }

    pub async fn put_product(&self, record: ProductRecord) {
        if let Some(sku) = record.key().map(str::to_string) {
            self.tables.write().await.products.insert(sku, record);
        }
    }

    /// Inserts ledger rows directly, bypassing write accounting
    pub async fn seed_sales(&self, rows: impl IntoIterator<Item = LedgerRow>) {
        self.tables.write().await.ledger.extend(rows);
    }

    pub async fn ledger(&self) -> Vec<LedgerRow> {
        self.tables.read().await.ledger.clone()
    }

    pub async fn product(&self, sku: &str) -> Option<ProductRecord> {
        self.tables.read().await.products.get(sku).cloned()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is failing reads".into(),
            ));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is failing writes".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SalesLine>, StoreError> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        Ok(tables
            .ledger
            .iter()
            .filter(|row| row.ts >= since)
            .map(SalesLine::from)
            .collect())
    }

    async fn inventory_levels(&self) -> Result<Vec<InventoryLevel>, StoreError> {
        self.check_reads()?;
        Ok(self.tables.read().await.inventory.values().cloned().collect())
    }

    async fn products(&self) -> Result<Vec<ProductRecord>, StoreError> {
        self.check_reads()?;
        Ok(self.tables.read().await.products.values().cloned().collect())
    }

    async fn append_sales_lines(&self, rows: &[LedgerRow]) -> Result<(), StoreError> {
        self.check_writes()?;
        self.tables.write().await.ledger.extend_from_slice(rows);
        Ok(())
    }

    async fn upsert_products(&self, rows: &[ProductUpsert]) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut tables = self.tables.write().await;
        for row in rows {
            let record = tables
                .products
                .entry(row.sku.clone())
                .or_insert_with(|| ProductRecord::new(row.sku.clone()));
            row.merge_into(record);
        }
        Ok(())
    }
}
