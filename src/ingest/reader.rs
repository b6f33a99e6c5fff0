//! Streaming, quote-aware CSV record reader. Pulls one record at a time
//! from a buffered byte stream so ingestion never holds the whole file
//! in memory beyond the validator's preview.

use crate::error::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads delimiter-separated records from an async byte stream.
/// Quoted fields may span physical lines and escape quotes as `""`.
pub struct CsvRecordReader<R> {
    reader: R,
    delimiter: u8,
}

impl<R: AsyncBufRead + Unpin> CsvRecordReader<R> {
    pub fn new(reader: R, delimiter: u8) -> Self {
        Self { reader, delimiter }
    }

    /// Next record, or `None` at end of stream. A record is complete
    /// once its quotes balance, so embedded newlines survive.
    pub async fn next_record(&mut self) -> Result<Option<Vec<String>>> {
        let mut raw = String::new();
        loop {
            let read = self.reader.read_line(&mut raw).await?;
            if read == 0 {
                if raw.is_empty() {
                    return Ok(None);
                }
                break;
            }
            if quotes_balanced(&raw) {
                break;
            }
        }

        let line = raw.trim_end_matches(['\r', '\n']);
        Ok(Some(split_record(line, self.delimiter)))
    }
}

/// Whether every record field is blank (an ignorable line)
pub fn is_blank_record(record: &[String]) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

/// Split one complete record on the delimiter, honoring quoting
pub fn split_record(line: &str, delimiter: u8) -> Vec<String> {
    let delimiter = delimiter as char;
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }
    fields.push(field);
    fields
}

fn quotes_balanced(s: &str) -> bool {
    s.bytes().filter(|b| *b == b'"').count() % 2 == 0
}
