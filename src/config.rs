// src/config.rs

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Tunables for the ingestion pipeline.
///
/// The thresholds, delay, and timeouts default to the values the backend was
/// tuned against; override them from a YAML file when the deployment needs
/// different limits.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Base URL of the CDM catalog API, e.g. `https://cdm.example.org/api`.
    pub api_base: String,

    /// Row count at or below which the whole file is sent as one upload.
    #[serde(default = "default_single_shot_threshold")]
    pub single_shot_threshold: usize,

    /// Maximum rows per chunk on the chunked path.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between consecutive chunk uploads, in milliseconds.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    /// Request timeout for the single-shot file upload, in seconds.
    #[serde(default = "default_file_timeout_secs")]
    pub file_timeout_secs: u64,

    /// Request timeout for one chunk upload, in seconds.
    #[serde(default = "default_chunk_timeout_secs")]
    pub chunk_timeout_secs: u64,

    /// Cap on the number of errors kept in the final summary.
    #[serde(default = "default_max_errors")]
    pub max_errors: usize,
}

fn default_single_shot_threshold() -> usize {
    80
}

fn default_chunk_size() -> usize {
    80
}

fn default_chunk_delay_ms() -> u64 {
    1000
}

fn default_file_timeout_secs() -> u64 {
    300
}

fn default_chunk_timeout_secs() -> u64 {
    120
}

fn default_max_errors() -> usize {
    50
}

impl IngestConfig {
    /// Default configuration pointed at `api_base`.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            single_shot_threshold: default_single_shot_threshold(),
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            file_timeout_secs: default_file_timeout_secs(),
            chunk_timeout_secs: default_chunk_timeout_secs(),
            max_errors: default_max_errors(),
        }
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_timeout_secs)
    }

    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_tuned_values() {
        let cfg = IngestConfig::new("http://localhost:8000/api");
        assert_eq!(cfg.single_shot_threshold, 80);
        assert_eq!(cfg.chunk_size, 80);
        assert_eq!(cfg.chunk_delay_ms, 1000);
        assert_eq!(cfg.file_timeout_secs, 300);
        assert_eq!(cfg.chunk_timeout_secs, 120);
        assert_eq!(cfg.max_errors, 50);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "api_base: http://cdm.test/api").unwrap();
        writeln!(f, "chunk_size: 25").unwrap();

        let cfg = IngestConfig::load(f.path()).unwrap();
        assert_eq!(cfg.api_base, "http://cdm.test/api");
        assert_eq!(cfg.chunk_size, 25);
        assert_eq!(cfg.single_shot_threshold, 80);
        assert_eq!(cfg.max_errors, 50);
    }

    #[test]
    fn missing_api_base_is_an_error() {
        let err = serde_yaml::from_str::<IngestConfig>("chunk_size: 10");
        assert!(err.is_err());
    }
}
