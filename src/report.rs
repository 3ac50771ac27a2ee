use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::{self, Write};
use std::time::Instant;
use tracing::{info, warn};

use crate::compare::{compare, Comparison, ComparisonRow};
use crate::error::CompareError;
use crate::range::{parse_calendar_date, DateRange};
use crate::utils::{format_number, format_signed};
use crate::{export, loader, Args};

#[derive(Debug)]
pub struct ComparisonReport {
    pub dataset_bounds: Option<(NaiveDate, NaiveDate)>,
    pub comparison: Comparison,
}

fn resolve_bound(
    label: &str,
    value: Option<&str>,
    fallback: Option<NaiveDate>,
    bounds: Option<(NaiveDate, NaiveDate)>,
) -> crate::error::Result<NaiveDate> {
    let date = match value {
        Some(raw) => parse_calendar_date(raw).ok_or_else(|| CompareError::MalformedRange {
            value: raw.to_string(),
        })?,
        None => fallback.ok_or(CompareError::EmptyDataset)?,
    };

    if let Some((earliest, latest)) = bounds {
        if date < earliest || date > latest {
            warn!(
                action = "resolve",
                component = "range_bounds",
                bound = label,
                date = %date,
                earliest_date = %earliest,
                latest_date = %latest,
                "Range boundary lies outside the dataset"
            );
        }
    }
    Ok(date)
}

/// Fills unset boundaries from the dataset's date bounds.
pub fn resolve_ranges(
    args: &Args,
    bounds: Option<(NaiveDate, NaiveDate)>,
) -> crate::error::Result<(DateRange, DateRange)> {
    let earliest = bounds.map(|(earliest, _)| earliest);
    let latest = bounds.map(|(_, latest)| latest);

    let first = DateRange::new(
        resolve_bound("start1", args.start1.as_deref(), earliest, bounds)?,
        resolve_bound("end1", args.end1.as_deref(), latest, bounds)?,
    );
    let second = DateRange::new(
        resolve_bound("start2", args.start2.as_deref(), earliest, bounds)?,
        resolve_bound("end2", args.end2.as_deref(), latest, bounds)?,
    );

    info!(
        action = "resolve",
        component = "range_bounds",
        first_range = %first,
        second_range = %second,
        "Resolved comparison ranges"
    );
    Ok((first, second))
}

pub fn run_comparison(args: &Args) -> Result<ComparisonReport> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "comparison", "Starting range comparison");

    let records = loader::load_records(&args.input, args.workers)
        .with_context(|| format!("Failed to load {:?}", args.input))?;
    let dataset_bounds = loader::date_bounds(&records);

    let (first, second) = resolve_ranges(args, dataset_bounds)?;
    let comparison = compare(&records, &first, &second);

    export::export_comparison(&args.output, &comparison)
        .with_context(|| format!("Failed to write {:?}", args.output))?;

    info!(
        action = "complete",
        component = "comparison",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Comparison completed successfully"
    );

    Ok(ComparisonReport {
        dataset_bounds,
        comparison,
    })
}

fn describe(row: &ComparisonRow) -> String {
    format!(
        "{} | {} | {} | {}",
        row.key.page, row.key.query, row.key.country, row.key.device
    )
}

/// Writes the human-readable summary. The CSV itself goes through [`export`].
pub fn print_comparison_results<W: Write>(
    out: &mut W,
    report: &ComparisonReport,
    args: &Args,
) -> io::Result<()> {
    let comparison = &report.comparison;
    let summary = comparison.summary();

    writeln!(out, "\n--- Search Analytics Range Comparison ---")?;

    match report.dataset_bounds {
        Some((earliest, latest)) => writeln!(
            out,
            "Dataset: {} to {} ({} days)",
            earliest,
            latest,
            format_number((latest - earliest).num_days().unsigned_abs())
        )?,
        None => writeln!(out, "Dataset: no data available")?,
    }

    writeln!(
        out,
        "First range:  {} ({} records)",
        comparison.first_range,
        format_number(comparison.first_records as u64)
    )?;
    writeln!(
        out,
        "Second range: {} ({} records)",
        comparison.second_range,
        format_number(comparison.second_records as u64)
    )?;

    for warning in &comparison.warnings {
        writeln!(out, "Warning: {}", warning)?;
    }

    writeln!(
        out,
        "Compared groups: {} ({} in both, {} first only, {} second only)",
        format_number(summary.total_keys() as u64),
        format_number(summary.in_both as u64),
        format_number(summary.only_first as u64),
        format_number(summary.only_second as u64)
    )?;
    writeln!(
        out,
        "Clicks: {} -> {}",
        format_number(summary.first_clicks),
        format_number(summary.second_clicks)
    )?;
    writeln!(
        out,
        "Impressions: {} -> {}",
        format_number(summary.first_impressions),
        format_number(summary.second_impressions)
    )?;

    // Only groups present in both ranges have a clicks delta
    let mut gains: Vec<(&ComparisonRow, i64)> = comparison
        .rows
        .iter()
        .filter_map(|row| row.clicks_diff.map(|diff| (row, diff)))
        .collect();
    let mut losses: Vec<(&ComparisonRow, i64)> =
        gains.iter().copied().filter(|(_, diff)| *diff < 0).collect();
    gains.retain(|(_, diff)| *diff > 0);
    gains.sort_by(|a, b| b.1.cmp(&a.1));
    losses.sort_by(|a, b| a.1.cmp(&b.1));

    if let Some(top_count) = args.top {
        writeln!(
            out,
            "\nTop {} click gains:",
            std::cmp::min(top_count, gains.len())
        )?;
        for (row, diff) in gains.iter().take(top_count) {
            writeln!(out, "- {}: {} clicks", describe(row), format_signed(*diff))?;
        }
    }

    if let Some(bottom_count) = args.bottom {
        writeln!(
            out,
            "\nBottom {} click losses:",
            std::cmp::min(bottom_count, losses.len())
        )?;
        for (row, diff) in losses.iter().take(bottom_count) {
            writeln!(out, "- {}: {} clicks", describe(row), format_signed(*diff))?;
        }
    }

    if args.output.as_os_str() != "-" {
        writeln!(out, "\nWrote {:?}", args.output)?;
    }
    Ok(())
}
