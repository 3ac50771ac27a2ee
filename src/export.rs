use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::compare::{Comparison, ComparisonRow};
use crate::error::Result;

pub const OUTPUT_HEADER: [&str; 16] = [
    "page",
    "query",
    "country",
    "device",
    "clicks_1st_range",
    "imp_1st_range",
    "ctr_1st_range",
    "position_1st_range",
    "clicks_2nd_range",
    "imp_2nd_range",
    "ctr_2nd_range",
    "position_2nd_range",
    "Clicks Diff",
    "Imp. Diff",
    "ctr Diff",
    "position Diff",
];

/// Flat CSV shape of a [`ComparisonRow`]; `None` serialises as an empty cell.
#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    page: &'a str,
    query: &'a str,
    country: &'a str,
    device: &'a str,
    clicks_1st_range: Option<u64>,
    imp_1st_range: Option<u64>,
    ctr_1st_range: Option<f64>,
    position_1st_range: Option<f64>,
    clicks_2nd_range: Option<u64>,
    imp_2nd_range: Option<u64>,
    ctr_2nd_range: Option<f64>,
    position_2nd_range: Option<f64>,
    clicks_diff: Option<i64>,
    imp_diff: Option<i64>,
    ctr_diff: Option<f64>,
    position_diff: Option<f64>,
}

impl<'a> From<&'a ComparisonRow> for OutputRow<'a> {
    fn from(row: &'a ComparisonRow) -> Self {
        Self {
            page: &row.key.page,
            query: &row.key.query,
            country: &row.key.country,
            device: &row.key.device,
            clicks_1st_range: row.first.map(|a| a.clicks),
            imp_1st_range: row.first.map(|a| a.impressions),
            ctr_1st_range: row.first.map(|a| a.ctr),
            position_1st_range: row.first.map(|a| a.position),
            clicks_2nd_range: row.second.map(|a| a.clicks),
            imp_2nd_range: row.second.map(|a| a.impressions),
            ctr_2nd_range: row.second.map(|a| a.ctr),
            position_2nd_range: row.second.map(|a| a.position),
            clicks_diff: row.clicks_diff,
            imp_diff: row.impressions_diff,
            ctr_diff: row.ctr_diff,
            position_diff: row.position_diff,
        }
    }
}

/// Writes the header and every row. The header is written for an empty table too.
pub fn write_comparison<W: Write>(writer: W, comparison: &Comparison) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(OUTPUT_HEADER)?;
    for row in &comparison.rows {
        wtr.serialize(OutputRow::from(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes to `path`, or to stdout when `path` is `-`.
pub fn export_comparison(path: &Path, comparison: &Comparison) -> Result<()> {
    let start_time = Instant::now();

    if path == Path::new("-") {
        write_comparison(io::stdout().lock(), comparison)?;
    } else {
        write_comparison(File::create(path)?, comparison)?;
    }

    info!(
        action = "complete",
        component = "csv_export",
        path = ?path,
        row_count = comparison.rows.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Comparison written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::range::DateRange;
    use crate::record::{DimensionKey, Record};
    use chrono::NaiveDate;

    fn record(day: u32, page: &str, clicks: u64, impressions: u64, ctr: f64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            key: DimensionKey::new(page, "rust csv", "usa", "DESKTOP"),
            clicks,
            impressions,
            ctr,
            position: 2.0,
        }
    }

    fn render(comparison: &Comparison) -> String {
        let mut buf = Vec::new();
        write_comparison(&mut buf, comparison).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn ranges() -> (DateRange, DateRange) {
        (
            DateRange::new(
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 1, 10).unwrap(),
            ),
            DateRange::new(
                NaiveDate::from_ymd_opt(2023, 1, 11).unwrap(),
                NaiveDate::from_ymd_opt(2023, 1, 20).unwrap(),
            ),
        )
    }

    #[test]
    fn empty_table_still_has_header() {
        let (first, second) = ranges();
        let out = render(&compare(&[], &first, &second));
        assert_eq!(
            out,
            "page,query,country,device,clicks_1st_range,imp_1st_range,ctr_1st_range,\
             position_1st_range,clicks_2nd_range,imp_2nd_range,ctr_2nd_range,\
             position_2nd_range,Clicks Diff,Imp. Diff,ctr Diff,position Diff\n"
        );
    }

    #[test]
    fn missing_side_is_blank() {
        let (first, second) = ranges();
        let records = vec![record(2, "/a", 3, 10, 0.5), record(3, "/a", 5, 20, 0.25)];
        let out = render(&compare(&records, &first, &second));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "/a,rust csv,usa,DESKTOP,8,30,0.375,2.0,,,,,,,,");
    }

    #[test]
    fn joined_row_carries_diffs() {
        let (first, second) = ranges();
        let records = vec![record(2, "/a", 3, 10, 0.5), record(12, "/a", 1, 40, 0.25)];
        let out = render(&compare(&records, &first, &second));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[1],
            "/a,rust csv,usa,DESKTOP,3,10,0.5,2.0,1,40,0.25,2.0,-2,30,-0.25,0.0"
        );
    }
}
