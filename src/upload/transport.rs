// src/upload/transport.rs

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::parse::plan::Chunk;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// What the bulk-upload endpoints return on success. Every field is
/// optional on the wire; absent numerics read as 0 and absent lists as
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChunkResponse {
    #[serde(default)]
    pub created_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub message: String,
}

/// One upload request to the backend. No retries here: a failed call is
/// reported to the orchestrator, which decides whether to keep going.
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    /// Send the whole file as one multipart upload (small-file path).
    async fn upload_file(&self, csv: &str) -> Result<ChunkResponse>;

    /// Send one chunk of rows as a JSON body.
    async fn upload_chunk(&self, chunk: &Chunk) -> Result<ChunkResponse>;
}

/// [`ChunkTransport`] over the CDM catalog REST API.
pub struct HttpTransport {
    client: Client,
    file_url: Url,
    chunk_url: Url,
    file_timeout: Duration,
    chunk_timeout: Duration,
}

impl HttpTransport {
    pub fn new(client: Client, cfg: &IngestConfig) -> Result<Self> {
        let base = cfg.api_base.trim_end_matches('/');
        Ok(Self {
            client,
            file_url: Url::parse(&format!("{base}/variables/bulk-upload"))?,
            chunk_url: Url::parse(&format!("{base}/variables/bulk-upload-chunk"))?,
            file_timeout: cfg.file_timeout(),
            chunk_timeout: cfg.chunk_timeout(),
        })
    }
}

#[async_trait]
impl ChunkTransport for HttpTransport {
    async fn upload_file(&self, csv: &str) -> Result<ChunkResponse> {
        debug!(url = %self.file_url, bytes = csv.len(), "uploading file");
        let part = Part::text(csv.to_string())
            .file_name("variables.csv")
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.file_url.clone())
            .multipart(form)
            .timeout(self.file_timeout)
            .send()
            .await
            .map_err(map_transport_err)?;
        read_response(resp).await
    }

    async fn upload_chunk(&self, chunk: &Chunk) -> Result<ChunkResponse> {
        debug!(
            url = %self.chunk_url,
            rows = chunk.rows.len(),
            start_row_index = chunk.start_row_index,
            "uploading chunk"
        );
        let resp = self
            .client
            .post(self.chunk_url.clone())
            .json(chunk)
            .timeout(self.chunk_timeout)
            .send()
            .await
            .map_err(map_transport_err)?;
        read_response(resp).await
    }
}

fn map_transport_err(err: reqwest::Error) -> IngestError {
    if err.is_timeout() {
        IngestError::UploadTimeout
    } else {
        IngestError::Http(err)
    }
}

/// Turn an HTTP response into a [`ChunkResponse`] or an
/// [`IngestError::UploadRejected`] carrying the backend's own message when
/// it sent one.
async fn read_response(resp: Response) -> Result<ChunkResponse> {
    let status = resp.status();
    if status.is_success() {
        return resp.json().await.map_err(map_transport_err);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(IngestError::UploadRejected(rejection_message(status, &body)))
}

/// Backend errors carry `{"detail": "..."}`; surface that verbatim, else
/// fall back to the HTTP status line.
fn rejection_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) => format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        ),
    }
}
