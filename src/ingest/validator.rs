//! Upload validation: sniffs and rejects malformed or incompatible
//! uploads before a single row is parsed or written.

use crate::error::{Result, ValidationError};
use crate::ingest::{reader, UploadSpool};
use crate::models::REQUIRED_COLUMNS;
use tokio::io::AsyncReadExt;

/// Bytes sampled from the head of the upload
pub const PREVIEW_LIMIT: usize = 32 * 1024;

/// Share of non-text bytes in the preview beyond which the upload is
/// treated as binary
const BINARY_RATIO_LIMIT: f64 = 0.10;

/// Content types accepted outright; anything else must carry a `text/`
/// prefix
const CSV_MEDIA_TYPES: [&str; 3] = ["text/csv", "application/csv", "application/vnd.ms-excel"];

/// What the caller declared about the upload
#[derive(Debug, Clone, Default)]
pub struct UploadMeta {
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

/// Sniffed shape of a validated upload, consumed by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub headers: Vec<String>,
}

/// Run the full validation contract. Completes before any row is
/// parsed; validation failure means no partial writes occurred.
pub async fn validate(spool: &UploadSpool, meta: &UploadMeta) -> Result<CsvFormat> {
    if meta.size == Some(0) || spool.len()? == 0 {
        return Err(ValidationError::EmptyFile.into());
    }

    if let Some(content_type) = &meta.content_type {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if !CSV_MEDIA_TYPES.contains(&essence.as_str()) && !essence.starts_with("text/") {
            return Err(ValidationError::InvalidMediaType(essence).into());
        }
    }

    let preview = read_preview(spool).await?;

    if preview.contains(&0) {
        return Err(ValidationError::BinaryContent.into());
    }
    let non_text = preview.iter().filter(|b| !is_text_byte(**b)).count();
    if !preview.is_empty() && non_text as f64 / preview.len() as f64 > BINARY_RATIO_LIMIT {
        return Err(ValidationError::BinaryContent.into());
    }

    let text = String::from_utf8_lossy(&preview);
    let text: &str = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let header_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or(ValidationError::NoHeaders)?;

    let delimiter = detect_delimiter(header_line);

    let headers: Vec<String> = reader::split_record(header_line, delimiter)
        .into_iter()
        .map(|field| field.trim().to_string())
        .filter(|field| !field.is_empty())
        .collect();
    if headers.is_empty() {
        return Err(ValidationError::NoHeaders.into());
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h.eq_ignore_ascii_case(required)))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns(missing).into());
    }

    Ok(CsvFormat { delimiter, headers })
}

/// `;` wins only on a strict majority over `,` in the header line
fn detect_delimiter(line: &str) -> u8 {
    let semicolons = line.bytes().filter(|b| *b == b';').count();
    let commas = line.bytes().filter(|b| *b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn is_text_byte(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte) || byte == b'\n' || byte == b'\r' || byte == b'\t'
}

async fn read_preview(spool: &UploadSpool) -> Result<Vec<u8>> {
    let mut preview = Vec::with_capacity(PREVIEW_LIMIT.min(4096));
    spool
        .open()?
        .take(PREVIEW_LIMIT as u64)
        .read_to_end(&mut preview)
        .await?;
    Ok(preview)
}
