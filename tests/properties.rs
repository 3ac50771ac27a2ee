use chrono::NaiveDate;
use proptest::prelude::*;
use rangediff::{compare, DateRange, DimensionKey, Record};
use std::collections::BTreeSet;

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Days::new(u64::from(offset))
}

// ctr and position are dyadic so float sums are exact in any order
fn record_strategy() -> impl Strategy<Value = Record> {
    (
        0u32..60,
        prop::sample::select(vec!["/", "/a", "/b"]),
        prop::sample::select(vec!["rust", "csv"]),
        prop::sample::select(vec!["usa", "gbr"]),
        prop::sample::select(vec!["DESKTOP", "MOBILE"]),
        0u64..500,
        0u64..5000,
        0u32..=8,
        4u32..200,
    )
        .prop_map(
            |(offset, page, query, country, device, clicks, impressions, ctr, position)| Record {
                date: day(offset),
                key: DimensionKey::new(page, query, country, device),
                clicks,
                impressions,
                ctr: f64::from(ctr) / 8.0,
                position: f64::from(position) / 4.0,
            },
        )
}

fn range_strategy() -> impl Strategy<Value = DateRange> {
    (0u32..60, 0u32..60).prop_map(|(a, b)| DateRange::new(day(a), day(b)))
}

fn keys_in(records: &[Record], range: &DateRange) -> BTreeSet<DimensionKey> {
    records
        .iter()
        .filter(|r| range.contains(r.date))
        .map(|r| r.key.clone())
        .collect()
}

proptest! {
    #[test]
    fn output_ignores_input_order(
        shuffled in prop::collection::vec(record_strategy(), 0..40).prop_shuffle(),
        first in range_strategy(),
        second in range_strategy(),
    ) {
        let mut sorted = shuffled.clone();
        sorted.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.key.cmp(&b.key))
                .then(a.clicks.cmp(&b.clicks))
        });

        let a = compare(&shuffled, &first, &second);
        let b = compare(&sorted, &first, &second);
        let again = compare(&shuffled, &first, &second);

        prop_assert_eq!(&a.rows, &b.rows);
        prop_assert_eq!(&a.rows, &again.rows);
    }

    #[test]
    fn keys_are_the_union_of_both_subsets(
        records in prop::collection::vec(record_strategy(), 0..40),
        first in range_strategy(),
        second in range_strategy(),
    ) {
        let comparison = compare(&records, &first, &second);

        let expected: BTreeSet<DimensionKey> = keys_in(&records, &first)
            .union(&keys_in(&records, &second))
            .cloned()
            .collect();
        let actual: Vec<DimensionKey> = comparison.rows.iter().map(|r| r.key.clone()).collect();
        let unique: BTreeSet<DimensionKey> = actual.iter().cloned().collect();

        prop_assert_eq!(actual.len(), unique.len());
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn aggregates_match_a_direct_reduction(
        records in prop::collection::vec(record_strategy(), 0..40),
        first in range_strategy(),
        second in range_strategy(),
    ) {
        let comparison = compare(&records, &first, &second);

        for row in &comparison.rows {
            let members: Vec<&Record> = records
                .iter()
                .filter(|r| first.contains(r.date) && r.key == row.key)
                .collect();

            match row.first {
                Some(agg) => {
                    let n = members.len() as f64;
                    prop_assert_eq!(agg.clicks, members.iter().map(|r| r.clicks).sum::<u64>());
                    prop_assert_eq!(
                        agg.impressions,
                        members.iter().map(|r| r.impressions).sum::<u64>()
                    );
                    prop_assert_eq!(agg.ctr, members.iter().map(|r| r.ctr).sum::<f64>() / n);
                    prop_assert_eq!(
                        agg.position,
                        members.iter().map(|r| r.position).sum::<f64>() / n
                    );
                }
                None => prop_assert!(members.is_empty()),
            }

            prop_assert_eq!(row.clicks_diff.is_some(), row.first.is_some() && row.second.is_some());
            if let (Some(a), Some(b), Some(diff)) = (row.first, row.second, row.clicks_diff) {
                prop_assert_eq!(diff, b.clicks as i64 - a.clicks as i64);
            }
        }
    }
}
