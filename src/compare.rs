//! Two-range comparison: filter, group by [`DimensionKey`], outer-join, diff.

use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{CompareWarning, Result};
use crate::range::DateRange;
use crate::record::{DimensionKey, RawRecord, Record};
use crate::stats::ComparisonSummary;

/// Per-key reduction of one range: summed counts, unweighted means of the ratios.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodAggregate {
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

#[derive(Debug, Default)]
struct Accumulator {
    clicks: u64,
    impressions: u64,
    ctr_sum: f64,
    position_sum: f64,
    rows: u64,
}

impl Accumulator {
    fn push(&mut self, record: &Record) {
        self.clicks = self.clicks.saturating_add(record.clicks);
        self.impressions = self.impressions.saturating_add(record.impressions);
        self.ctr_sum += record.ctr;
        self.position_sum += record.position;
        self.rows += 1;
    }

    fn finish(self) -> PeriodAggregate {
        // rows is never zero: an accumulator only exists once a record lands in it
        let rows = self.rows as f64;
        PeriodAggregate {
            clicks: self.clicks,
            impressions: self.impressions,
            ctr: self.ctr_sum / rows,
            position: self.position_sum / rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub key: DimensionKey,
    pub first: Option<PeriodAggregate>,
    pub second: Option<PeriodAggregate>,
    pub clicks_diff: Option<i64>,
    pub impressions_diff: Option<i64>,
    pub ctr_diff: Option<f64>,
    pub position_diff: Option<f64>,
}

impl ComparisonRow {
    fn join(
        key: DimensionKey,
        first: Option<PeriodAggregate>,
        second: Option<PeriodAggregate>,
    ) -> Self {
        let both = first.zip(second);
        Self {
            key,
            first,
            second,
            clicks_diff: both.map(|(a, b)| signed_diff(b.clicks, a.clicks)),
            impressions_diff: both.map(|(a, b)| signed_diff(b.impressions, a.impressions)),
            ctr_diff: both.map(|(a, b)| b.ctr - a.ctr),
            position_diff: both.map(|(a, b)| b.position - a.position),
        }
    }
}

/// `new - old` as i64, saturating at the i64 bounds.
fn signed_diff(new: u64, old: u64) -> i64 {
    let diff = i128::from(new) - i128::from(old);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}

#[derive(Debug, Clone)]
pub struct Comparison {
    pub first_range: DateRange,
    pub second_range: DateRange,
    /// Number of records that fell inside each range.
    pub first_records: usize,
    pub second_records: usize,
    pub rows: Vec<ComparisonRow>,
    pub warnings: Vec<CompareWarning>,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary::from_rows(&self.rows)
    }
}

fn aggregate(
    records: &[Record],
    range: &DateRange,
) -> (BTreeMap<DimensionKey, PeriodAggregate>, usize) {
    let mut groups: BTreeMap<&DimensionKey, Accumulator> = BTreeMap::new();
    let mut matched = 0;

    for record in records.iter().filter(|r| range.contains(r.date)) {
        groups.entry(&record.key).or_default().push(record);
        matched += 1;
    }

    let aggregates = groups
        .into_iter()
        .map(|(key, acc)| (key.clone(), acc.finish()))
        .collect();
    (aggregates, matched)
}

/// Compares `first` against `second` over `records`. Rows come out in
/// ascending key order; diffs are `second - first`.
pub fn compare(records: &[Record], first: &DateRange, second: &DateRange) -> Comparison {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "range_compare",
        record_count = records.len(),
        first_range = %first,
        second_range = %second,
        "Comparing date ranges"
    );

    for (label, range) in [("first", first), ("second", second)] {
        if range.is_inverted() {
            debug!(
                action = "filter",
                component = "range_compare",
                range = label,
                "Inverted range selects no records"
            );
        }
    }

    let (first_groups, first_records) = aggregate(records, first);
    let (mut second_groups, second_records) = aggregate(records, second);

    let mut rows = Vec::with_capacity(first_groups.len().max(second_groups.len()));
    for (key, first_agg) in first_groups {
        let second_agg = second_groups.remove(&key);
        rows.push(ComparisonRow::join(key, Some(first_agg), second_agg));
    }
    for (key, second_agg) in second_groups {
        rows.push(ComparisonRow::join(key, None, Some(second_agg)));
    }
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    let mut warnings = Vec::new();
    if first_records == 0 && second_records == 0 {
        warn!(
            action = "complete",
            component = "range_compare",
            first_range = %first,
            second_range = %second,
            "No records fall inside either date range"
        );
        warnings.push(CompareWarning::EmptyResult);
    }

    info!(
        action = "complete",
        component = "range_compare",
        first_records,
        second_records,
        row_count = rows.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Range comparison completed"
    );

    Comparison {
        first_range: *first,
        second_range: *second,
        first_records,
        second_records,
        rows,
        warnings,
    }
}

/// Coerces raw rows and range boundaries, then runs [`compare`]. Any
/// malformed value aborts the whole comparison.
pub fn compare_raw(
    rows: &[RawRecord],
    first: (&str, &str),
    second: (&str, &str),
) -> Result<Comparison> {
    let first = DateRange::parse(first.0, first.1)?;
    let second = DateRange::parse(second.0, second.1)?;
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, raw)| Record::try_from_raw(i + 1, raw))
        .collect::<Result<Vec<_>>>()?;
    Ok(compare(&records, &first, &second))
}
