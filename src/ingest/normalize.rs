//! Per-row normalization: header-driven field extraction and the
//! silent-degradation parsing rules. An unparseable field becomes
//! absent; it is never an error and never written as null or zero.

use crate::models::Product;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

/// Case-insensitive column-name to record-index mapping
pub struct HeaderMap {
    indices: HashMap<String, usize>,
}

impl HeaderMap {
    /// First occurrence wins when a header repeats
    pub fn new(headers: &[String]) -> Self {
        let mut indices = HashMap::with_capacity(headers.len());
        for (index, header) in headers.iter().enumerate() {
            indices
                .entry(header.trim().to_ascii_lowercase())
                .or_insert(index);
        }
        Self { indices }
    }

    fn field<'a>(&self, record: &'a [String], name: &str) -> Option<&'a str> {
        self.indices
            .get(name)
            .and_then(|index| record.get(*index))
            .map(String::as_str)
    }
}

/// Normalize one raw record into a patch of present fields
pub fn normalize_row(headers: &HeaderMap, record: &[String]) -> Product {
    Product {
        title: clean(headers.field(record, "title")),
        brand: clean(headers.field(record, "brand")),
        category: clean(headers.field(record, "category")),
        product_type: clean(headers.field(record, "product_type")),
        description: clean(headers.field(record, "description")),
        price: parse_float(headers.field(record, "price")),
        currency: clean(headers.field(record, "currency")),
        stock: parse_int(headers.field(record, "stock")),
        sku: clean(headers.field(record, "sku")),
        rating: parse_float(headers.field(record, "rating")),
        created_at: parse_timestamp(headers.field(record, "created_at")),
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Locale-neutral decimal parse, rejecting NaN and infinities
fn parse_float(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_int(value: Option<&str>) -> Option<i64> {
    value.map(str::trim).and_then(|v| v.parse::<i64>().ok())
}

/// ISO-8601-like timestamps: RFC 3339 first, then the common
/// date-time and date-only forms
fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(parsed.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
