// src/lib.rs

pub mod config;
pub mod error;
pub mod parse;
pub mod upload;

pub use config::IngestConfig;
pub use error::{IngestError, Result};
pub use upload::{ProgressEvent, UploadError, UploadSummary};
