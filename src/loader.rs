use chrono::NaiveDate;
use rayon::prelude::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{CompareError, Result};
use crate::record::{RawRecord, Record, REQUIRED_COLUMNS};

pub fn default_workers() -> usize {
    std::cmp::min(num_cpus::get(), 8)
}

pub fn load_records(path: &Path, max_workers: Option<usize>) -> Result<Vec<Record>> {
    info!(action = "open", component = "csv_loader", path = ?path, "Opening input CSV");
    let file = File::open(path)?;
    read_records(file, max_workers)
}

/// Reads and coerces every row. The first malformed row (in file order)
/// fails the whole load.
pub fn read_records<R: Read>(reader: R, max_workers: Option<usize>) -> Result<Vec<Record>> {
    let start_time = Instant::now();
    info!(action = "start", component = "csv_loader", "Reading search analytics rows");

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(CompareError::MissingColumn(column));
        }
    }

    let raw_rows = rdr
        .deserialize::<RawRecord>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    let read_time = start_time.elapsed();
    info!(
        action = "read",
        component = "csv_loader",
        row_count = raw_rows.len(),
        duration_ms = read_time.as_millis(),
        "Read raw rows"
    );

    let workers = max_workers.unwrap_or_else(default_workers);
    info!(
        action = "configure",
        component = "csv_loader",
        worker_count = workers,
        "Using workers for row coercion"
    );

    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
    let coerced: Vec<Result<Record>> = pool.install(|| {
        raw_rows
            .par_iter()
            .enumerate()
            .map(|(i, raw)| Record::try_from_raw(i + 1, raw))
            .collect()
    });
    let records = coerced.into_iter().collect::<Result<Vec<_>>>()?;

    info!(
        action = "complete",
        component = "csv_loader",
        record_count = records.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Loaded records"
    );
    Ok(records)
}

/// Earliest and latest record date, or `None` for an empty dataset.
pub fn date_bounds(records: &[Record]) -> Option<(NaiveDate, NaiveDate)> {
    let earliest = records.iter().map(|r| r.date).min();
    let latest = records.iter().map(|r| r.date).max();

    match earliest.zip(latest) {
        Some((earliest, latest)) => {
            info!(
                action = "complete",
                component = "date_bounds",
                earliest_date = %earliest,
                latest_date = %latest,
                days_between = (latest - earliest).num_days(),
                "Dataset date bounds"
            );
            Some((earliest, latest))
        }
        None => {
            warn!(action = "complete", component = "date_bounds", "No records in dataset");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
date,page,query,country,device,clicks,impressions,ctr,position,extra
2023-01-02,/a,rust,usa,DESKTOP,3,10,0.3,2.5,ignored
2023-01-09,/b,csv,gbr,MOBILE,0,4,0,7.25,ignored
";

    #[test]
    fn reads_rows_and_ignores_extra_columns() {
        let records = read_records(SAMPLE.as_bytes(), Some(2)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key.page, "/a");
        assert_eq!(records[1].clicks, 0);
        assert_eq!(records[1].position, 7.25);
    }

    #[test]
    fn header_whitespace_is_tolerated() {
        let csv = "date, page, query, country, device, clicks, impressions, ctr, position\n\
                   2023-01-02,/a,q,usa,DESKTOP,1,2,0.5,1\n";
        let records = read_records(csv.as_bytes(), Some(1)).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn missing_column_fails_before_rows() {
        let csv = "date,page,query,country,clicks,impressions,ctr,position\n";
        let err = read_records(csv.as_bytes(), Some(1)).unwrap_err();
        assert!(matches!(err, CompareError::MissingColumn("device")));
    }

    #[test]
    fn reports_first_bad_row() {
        let csv = "date,page,query,country,device,clicks,impressions,ctr,position\n\
                   2023-01-02,/a,q,usa,DESKTOP,1,2,0.5,1\n\
                   bogus,/a,q,usa,DESKTOP,1,2,0.5,1\n\
                   2023-01-02,/a,q,usa,DESKTOP,x,2,0.5,1\n";
        let err = read_records(csv.as_bytes(), Some(4)).unwrap_err();
        assert!(matches!(err, CompareError::MalformedDate { row: 2, .. }));
    }

    #[test]
    fn header_only_file_is_empty() {
        let csv = "date,page,query,country,device,clicks,impressions,ctr,position\n";
        let records = read_records(csv.as_bytes(), None).unwrap();
        assert!(records.is_empty());
        assert_eq!(date_bounds(&records), None);
    }

    #[test]
    fn bounds_span_min_to_max() {
        let records = read_records(SAMPLE.as_bytes(), Some(1)).unwrap();
        let (earliest, latest) = date_bounds(&records).unwrap();
        assert_eq!(earliest, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(latest, NaiveDate::from_ymd_opt(2023, 1, 9).unwrap());
    }
}
