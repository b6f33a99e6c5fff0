//! Bulk CSV ingestion: upload validation, streaming row normalization,
//! and bounded-concurrency batched upserts into the product store.

pub mod normalize;
pub mod pipeline;
pub mod reader;
pub mod validator;

pub use pipeline::IngestPipeline;
pub use validator::{CsvFormat, UploadMeta};

use crate::error::Result;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Temporary storage backing an upload. The spool owns its temp file;
/// dropping it releases the storage, so every exit path of the pipeline
/// cleans up exactly once.
pub struct UploadSpool {
    file: NamedTempFile,
}

impl UploadSpool {
    /// Spool an in-memory payload (test and small-upload path)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    /// Spool an incoming byte stream without buffering it whole
    pub async fn from_reader<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self> {
        let file = NamedTempFile::new()?;
        let mut sink = tokio::fs::File::from_std(file.reopen()?);
        tokio::io::copy(reader, &mut sink).await?;
        sink.flush().await?;
        Ok(Self { file })
    }

    /// Spooled size in bytes
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.as_file().metadata()?.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len().map(|n| n == 0).unwrap_or(true)
    }

    /// Fresh read handle positioned at the start of the upload
    pub(crate) fn open(&self) -> Result<tokio::fs::File> {
        Ok(tokio::fs::File::from_std(self.file.reopen()?))
    }
}
