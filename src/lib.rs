pub mod args;
pub mod compare;
pub mod error;
pub mod export;
pub mod loader;
pub mod range;
pub mod record;
pub mod report;
pub mod stats;
pub mod utils;

pub use args::Args;
pub use compare::{compare, compare_raw, Comparison, ComparisonRow, PeriodAggregate};
pub use error::{CompareError, CompareWarning};
pub use range::DateRange;
pub use record::{DimensionKey, RawRecord, Record};
pub use report::{print_comparison_results, run_comparison};
pub use stats::ComparisonSummary;
