//! Row and payload types shared by the ingestion and reporting paths.

pub mod inventory_level;
pub mod product;
pub mod reorder;
pub mod sale;
pub mod sales_line;

pub use inventory_level::InventoryLevel;
pub use product::{ProductRecord, ProductUpsert};
pub use reorder::{ReorderParams, ReorderReport, ReorderRow};
pub use sale::{NormalizedLine, NormalizedSale, SaleEvent};
pub use sales_line::{LedgerRow, SalesLine};
