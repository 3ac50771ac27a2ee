use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{CompareError, Result};
use crate::range::parse_calendar_date;

pub const REQUIRED_COLUMNS: [&str; 9] = [
    "date",
    "page",
    "query",
    "country",
    "device",
    "clicks",
    "impressions",
    "ctr",
    "position",
];

/// One CSV row before type coercion. Unknown columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    pub date: String,
    pub page: String,
    pub query: String,
    pub country: String,
    pub device: String,
    pub clicks: String,
    pub impressions: String,
    pub ctr: String,
    pub position: String,
}

/// Grouping key: (page, query, country, device).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DimensionKey {
    pub page: String,
    pub query: String,
    pub country: String,
    pub device: String,
}

impl DimensionKey {
    pub fn new(
        page: impl Into<String>,
        query: impl Into<String>,
        country: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            page: page.into(),
            query: query.into(),
            country: country.into(),
            device: device.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub key: DimensionKey,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

impl Record {
    /// Coerces a raw row. `row` is the 1-based data row number used in errors.
    pub fn try_from_raw(row: usize, raw: &RawRecord) -> Result<Self> {
        let date = parse_calendar_date(&raw.date).ok_or_else(|| CompareError::MalformedDate {
            row,
            value: raw.date.clone(),
        })?;

        Ok(Self {
            date,
            key: DimensionKey::new(
                raw.page.as_str(),
                raw.query.as_str(),
                raw.country.as_str(),
                raw.device.as_str(),
            ),
            clicks: parse_count(row, "clicks", &raw.clicks)?,
            impressions: parse_count(row, "impressions", &raw.impressions)?,
            ctr: parse_real(row, "ctr", &raw.ctr)?,
            position: parse_real(row, "position", &raw.position)?,
        })
    }
}

fn malformed(row: usize, column: &'static str, value: &str) -> CompareError {
    CompareError::MalformedMetric {
        row,
        column,
        value: value.to_string(),
    }
}

/// Non-negative integer; integral floats such as `12.0` are accepted.
fn parse_count(row: usize, column: &'static str, value: &str) -> Result<u64> {
    let trimmed = value.trim();
    if let Ok(count) = trimmed.parse::<u64>() {
        return Ok(count);
    }

    match trimmed.parse::<f64>() {
        Ok(real)
            if real.is_finite() && real >= 0.0 && real.fract() == 0.0 && real <= u64::MAX as f64 =>
        {
            Ok(real as u64)
        }
        _ => Err(malformed(row, column, value)),
    }
}

fn parse_real(row: usize, column: &'static str, value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(real) if real.is_finite() => Ok(real),
        _ => Err(malformed(row, column, value)),
    }
}
