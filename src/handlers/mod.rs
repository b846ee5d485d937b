pub mod common;
pub mod health;
pub mod reports;
pub mod webhooks;

use std::sync::Arc;

use crate::services::{ingest::IngestService, reorder::ReorderService};
use crate::store::Store;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by the HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub ingest: Arc<IngestService>,
    pub reorder: Arc<ReorderService>,
}

impl AppServices {
    /// Builds every service over one shared store handle
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            ingest: Arc::new(IngestService::new(store.clone())),
            reorder: Arc::new(ReorderService::new(store)),
        }
    }
}
