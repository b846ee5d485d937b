use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::{ledger::LedgerWriter, normalizer};
use crate::{
    errors::ServiceError,
    models::SaleEvent,
    store::Store,
    tracing::{log_error, ErrorKind},
};

/// Message returned to the sender when persisting failed. Details stay in
/// the logs.
pub const WRITE_FAILED_MESSAGE: &str = "insert failed; check logs";

/// What happened to one webhook delivery.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Nothing usable in the body; no store calls were made.
    NoLines { sale_id: String, rejected: usize },
    /// Catalog merged and ledger rows appended.
    Stored {
        sale_id: String,
        inserted: usize,
        rejected: usize,
    },
    /// A store write failed.
    WriteFailed {
        sale_id: String,
        error: ServiceError,
    },
}

impl IngestOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, IngestOutcome::WriteFailed { .. })
    }

    pub fn ack(&self) -> IngestAck {
        match self {
            IngestOutcome::NoLines { .. } => IngestAck::received_nothing(),
            IngestOutcome::Stored { inserted, .. } => IngestAck::inserted(*inserted),
            IngestOutcome::WriteFailed { .. } => IngestAck::failed(),
        }
    }
}

/// Acknowledgment body of the webhook endpoint.
///
/// The endpoint always answers 200 so the POS does not retry; `ok` carries
/// the actual result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"ok": true, "inserted": 2}))]
pub struct IngestAck {
    pub ok: bool,
    /// Present (and 0) when the event had no usable line items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<usize>,
    /// Number of ledger rows written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestAck {
    pub fn received_nothing() -> Self {
        Self {
            ok: true,
            received: Some(0),
            inserted: None,
            error: None,
        }
    }

    pub fn inserted(count: usize) -> Self {
        Self {
            ok: true,
            received: None,
            inserted: Some(count),
            error: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            ok: false,
            received: None,
            inserted: None,
            error: Some(WRITE_FAILED_MESSAGE.to_string()),
        }
    }
}

/// Webhook ingestion: parse, normalize, persist.
#[derive(Clone)]
pub struct IngestService {
    writer: LedgerWriter,
}

impl IngestService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            writer: LedgerWriter::new(store),
        }
    }

    /// Ingests a webhook body, stamping every line with the current time.
    pub async fn ingest(&self, body: &[u8]) -> IngestOutcome {
        self.ingest_at(body, Utc::now()).await
    }

    /// Ingests a webhook body with an explicit ingestion timestamp. Never
    /// fails; store errors are logged and reported in the outcome.
    #[instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn ingest_at(&self, body: &[u8], ts: DateTime<Utc>) -> IngestOutcome {
        let event = SaleEvent::parse(body);
        if !event.is_structured() {
            warn!("webhook body is not JSON; nothing to ingest");
        }

        let sale = normalizer::normalize(&event);
        counter!("posabit.lines.accepted", sale.lines.len() as u64);
        counter!("posabit.lines.rejected", sale.rejected as u64);

        if sale.is_empty() {
            info!(sale_id = %sale.sale_id, rejected = sale.rejected, "no usable line items");
            return IngestOutcome::NoLines {
                sale_id: sale.sale_id,
                rejected: sale.rejected,
            };
        }

        let raw = event.payload();
        match self
            .writer
            .record(&sale.sale_id, ts, &raw, &sale.lines)
            .await
        {
            Ok(inserted) => {
                counter!("posabit.sales.ingested", 1);
                info!(sale_id = %sale.sale_id, inserted, rejected = sale.rejected, "sale recorded");
                IngestOutcome::Stored {
                    sale_id: sale.sale_id,
                    inserted,
                    rejected: sale.rejected,
                }
            }
            Err(error) => {
                counter!("posabit.sales.write_failures", 1);
                log_error(&error, ErrorKind::Store, Some(&sale.sale_id));
                IngestOutcome::WriteFailed {
                    sale_id: sale.sale_id,
                    error,
                }
            }
        }
    }
}
