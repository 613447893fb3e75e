// src/upload/mod.rs

pub mod transport;

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::parse::{self, plan};
use serde::Serialize;
use std::fmt;
use tokio::time::sleep;
use tracing::{error, info};
use transport::{ChunkResponse, ChunkTransport};

/// One ingestion error, attributed to the chunk (and, when the backend says
/// so, the row) it came from. Rendering to a display string happens in
/// [`fmt::Display`]; everything upstream stays structured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadError {
    /// 1-based chunk ordinal; `None` for file-level (single-shot) errors.
    pub chunk: Option<u32>,
    /// 1-based row in the original file, when the backend attributed one.
    pub row: Option<u32>,
    pub message: String,
    /// True when the whole chunk failed in transit rather than the backend
    /// rejecting individual rows.
    pub failed: bool,
}

impl UploadError {
    /// A row-level error the backend reported for a chunk that uploaded.
    fn reported(chunk: u32, message: String) -> Self {
        Self {
            chunk: Some(chunk),
            row: None,
            message,
            failed: false,
        }
    }

    /// A whole chunk that never made it (timeout, rejection, transport).
    fn chunk_failed(chunk: u32, err: &IngestError) -> Self {
        Self {
            chunk: Some(chunk),
            row: None,
            message: err.to_string(),
            failed: true,
        }
    }

    /// A file-level error from the single-shot path.
    fn file_level(message: String) -> Self {
        Self {
            chunk: None,
            row: None,
            message,
            failed: false,
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.chunk, self.failed) {
            (Some(n), true) => write!(f, "Chunk {} failed: {}", n, self.message),
            (Some(n), false) => write!(f, "Chunk {}: {}", n, self.message),
            (None, _) => write!(f, "{}", self.message),
        }
    }
}

/// Final aggregate of one ingestion run.
///
/// `error_count` counts every error produced; `errors` holds at most the
/// configured cap so a pathological file cannot flood the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub created_count: u64,
    pub error_count: u64,
    pub errors: Vec<UploadError>,
    pub success: bool,
    pub message: String,
}

/// Emitted once per completed chunk, success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// 1-based ordinal of the chunk that just finished.
    pub chunk: u32,
    pub total_chunks: u32,
    pub percent: u8,
}

/// Parse `csv_text`, decide the upload strategy, and drive it to a single
/// [`UploadSummary`].
///
/// Small files go up in one multipart request; a timeout or rejection there
/// fails the whole operation. Large files are chunked and uploaded strictly
/// in order, one request in flight at a time; a failed chunk is recorded and
/// the loop moves on, so one bad chunk never discards rows the backend
/// already accepted. `on_progress` fires after every chunk.
///
/// Whatever the outcome, callers should re-fetch their collection from the
/// backend afterwards; the summary reports counts, not entities.
pub async fn run<T>(
    transport: &T,
    csv_text: &str,
    required_columns: &[&str],
    cfg: &IngestConfig,
    mut on_progress: impl FnMut(ProgressEvent),
) -> Result<UploadSummary>
where
    T: ChunkTransport + ?Sized,
{
    let doc = parse::parse(csv_text)?;
    let upload_plan = plan::plan(
        &doc,
        required_columns,
        cfg.single_shot_threshold,
        cfg.chunk_size,
    )?;

    let chunks = match upload_plan {
        plan::UploadPlan::SingleShot => {
            info!(rows = doc.rows.len(), "uploading as a single file");
            let resp = transport.upload_file(csv_text).await?;
            return Ok(single_shot_summary(resp, cfg.max_errors));
        }
        plan::UploadPlan::Chunked(chunks) => chunks,
    };

    let total = chunks.len() as u32;
    info!(rows = doc.rows.len(), chunks = total, "uploading in chunks");

    let mut total_created = 0u64;
    let mut all_errors: Vec<UploadError> = Vec::new();

    for (idx, chunk) in chunks.iter().enumerate() {
        let ordinal = idx as u32 + 1;

        match transport.upload_chunk(chunk).await {
            Ok(resp) => {
                total_created += resp.created_count;
                for msg in resp.errors {
                    all_errors.push(UploadError::reported(ordinal, msg));
                }
                info!(
                    chunk = ordinal,
                    total,
                    created = resp.created_count,
                    "chunk uploaded"
                );
            }
            Err(err) => {
                error!(chunk = ordinal, total, %err, "chunk failed");
                all_errors.push(UploadError::chunk_failed(ordinal, &err));
            }
        }

        on_progress(ProgressEvent {
            chunk: ordinal,
            total_chunks: total,
            percent: (100.0 * f64::from(ordinal) / f64::from(total)).round() as u8,
        });

        // Breathing room for the backend between chunks, skipped after the
        // last one.
        if idx + 1 < chunks.len() {
            sleep(cfg.chunk_delay()).await;
        }
    }

    let error_count = all_errors.len() as u64;
    let mut errors = all_errors;
    errors.truncate(cfg.max_errors);

    Ok(UploadSummary {
        created_count: total_created,
        error_count,
        errors,
        success: total_created > 0,
        message: format!(
            "Processed {total} chunk(s): {total_created} created, {error_count} error(s)"
        ),
    })
}

fn single_shot_summary(resp: ChunkResponse, max_errors: usize) -> UploadSummary {
    let message = if resp.message.is_empty() {
        format!(
            "{} created, {} error(s)",
            resp.created_count, resp.error_count
        )
    } else {
        resp.message
    };

    let mut errors: Vec<UploadError> = resp
        .errors
        .into_iter()
        .map(UploadError::file_level)
        .collect();
    errors.truncate(max_errors);

    UploadSummary {
        created_count: resp.created_count,
        error_count: resp.error_count,
        errors,
        success: resp.created_count > 0,
        message,
    }
}
