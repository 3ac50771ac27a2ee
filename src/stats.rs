use crate::compare::ComparisonRow;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ComparisonSummary {
    pub in_both: usize,
    pub only_first: usize,
    pub only_second: usize,
    pub first_clicks: u64,
    pub first_impressions: u64,
    pub second_clicks: u64,
    pub second_impressions: u64,
}

impl ComparisonSummary {
    pub fn from_rows(rows: &[ComparisonRow]) -> Self {
        let mut summary = Self::default();
        for row in rows {
            match (&row.first, &row.second) {
                (Some(_), Some(_)) => summary.in_both += 1,
                (Some(_), None) => summary.only_first += 1,
                (None, Some(_)) => summary.only_second += 1,
                (None, None) => {}
            }
            if let Some(first) = &row.first {
                summary.first_clicks = summary.first_clicks.saturating_add(first.clicks);
                summary.first_impressions =
                    summary.first_impressions.saturating_add(first.impressions);
            }
            if let Some(second) = &row.second {
                summary.second_clicks = summary.second_clicks.saturating_add(second.clicks);
                summary.second_impressions =
                    summary.second_impressions.saturating_add(second.impressions);
            }
        }
        summary
    }

    pub fn total_keys(&self) -> usize {
        self.in_both + self.only_first + self.only_second
    }
}
