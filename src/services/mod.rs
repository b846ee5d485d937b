// Ingestion path
pub mod ingest;
pub mod ledger;
pub mod normalizer;

// Reporting path
pub mod demand;
pub mod ranking;
pub mod reorder;
