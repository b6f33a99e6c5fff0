//! The ingestion pipeline: a single sequential parse loop interleaved
//! with concurrent, bounded-parallel bulk-write dispatch. Parsing only
//! suspends when the in-flight-write cap is reached; that wait is the
//! sole backpressure protecting the store from write amplification.

use crate::config::IngestConfig;
use crate::error::{AppError, Result};
use crate::ingest::reader::{is_blank_record, CsvRecordReader};
use crate::ingest::validator::{self, UploadMeta};
use crate::ingest::{normalize, UploadSpool};
use crate::models::{IngestReport, UpsertOp};
use crate::store::ProductStore;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::task::JoinSet;

/// Converts a validated upload into batched upserts
pub struct IngestPipeline {
    store: Arc<dyn ProductStore>,
    batch_size: usize,
    max_inflight: usize,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn ProductStore>, config: &IngestConfig) -> Self {
        Self {
            store,
            batch_size: config.batch_size.max(1),
            max_inflight: config.max_inflight_writes.max(1),
        }
    }

    /// Validate and ingest an upload. The spool is consumed and its
    /// temporary storage released on every exit path, success or not.
    pub async fn ingest(&self, spool: UploadSpool, meta: &UploadMeta) -> Result<IngestReport> {
        let result = self.run(&spool, meta).await;
        drop(spool);
        result
    }

    async fn run(&self, spool: &UploadSpool, meta: &UploadMeta) -> Result<IngestReport> {
        let format = validator::validate(spool, meta).await?;

        let mut reader = CsvRecordReader::new(BufReader::new(spool.open()?), format.delimiter);

        // First non-blank record is the header row the validator sniffed
        let header_record = loop {
            match reader.next_record().await? {
                Some(record) if is_blank_record(&record) => continue,
                Some(record) => break record,
                None => {
                    return Err(AppError::Processing(
                        "CSV stream ended before the header row".to_string(),
                    ))
                }
            }
        };
        let headers = normalize::HeaderMap::new(&strip_bom(header_record));

        let mut inflight: JoinSet<Result<()>> = JoinSet::new();
        let mut buffer: Vec<UpsertOp> = Vec::with_capacity(self.batch_size);
        let mut total_indexed: u64 = 0;
        let mut first_error: Option<AppError> = None;

        loop {
            let record = match reader.next_record().await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) => {
                    first_error = Some(e);
                    break;
                }
            };
            if is_blank_record(&record) {
                continue;
            }

            let patch = normalize::normalize_row(&headers, &record);
            if patch.is_empty() {
                continue;
            }
            let Some(filter) = patch.identity() else {
                // No viable identity: dropped, not counted, not an error
                continue;
            };

            buffer.push(UpsertOp { filter, patch });
            total_indexed += 1;

            if buffer.len() >= self.batch_size {
                if let Err(e) = self.dispatch(&mut inflight, &mut buffer).await {
                    first_error = Some(e);
                    break;
                }
            }
        }

        // Final partial batch, unless we are already failing
        if first_error.is_none() && !buffer.is_empty() {
            if let Err(e) = self.dispatch(&mut inflight, &mut buffer).await {
                first_error = Some(e);
            }
        }

        // Always settle every dispatched write, even on the error path;
        // the pipeline never leaves unresolved writes behind.
        while let Some(joined) = inflight.join_next().await {
            match flatten_join(joined) {
                Ok(()) => {}
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => {
                    tracing::warn!(error = %e, "additional bulk write failed while draining")
                }
            }
        }

        match first_error {
            Some(e) => Err(AppError::Processing(format!("CSV ingestion failed: {}", e))),
            None => {
                tracing::info!(total_indexed, "CSV ingestion complete");
                Ok(IngestReport {
                    ok: true,
                    total_indexed,
                })
            }
        }
    }

    /// Drain the accumulator into one unordered bulk write, waiting for
    /// a slot first when the in-flight cap is reached
    async fn dispatch(
        &self,
        inflight: &mut JoinSet<Result<()>>,
        buffer: &mut Vec<UpsertOp>,
    ) -> Result<()> {
        if inflight.len() >= self.max_inflight {
            if let Some(joined) = inflight.join_next().await {
                flatten_join(joined)?;
            }
        }

        let ops = std::mem::replace(buffer, Vec::with_capacity(self.batch_size));
        let store = Arc::clone(&self.store);
        inflight.spawn(async move { store.bulk_upsert(ops).await });
        Ok(())
    }
}

fn strip_bom(mut headers: Vec<String>) -> Vec<String> {
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    headers
}

fn flatten_join(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(AppError::Internal(format!("bulk write task failed: {}", e))),
    }
}
