use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rangediff",
    about = "Compare search analytics metrics between two date ranges of a CSV export",
    version,
    long_about = None
)]
pub struct Args {
    /// CSV with date, page, query, country, device, clicks, impressions, ctr, position
    pub input: PathBuf,

    /// Start of the first range (defaults to the earliest date in the file)
    #[arg(long)]
    pub start1: Option<String>,

    /// End of the first range (defaults to the latest date in the file)
    #[arg(long)]
    pub end1: Option<String>,

    /// Start of the second range (defaults to the earliest date in the file)
    #[arg(long)]
    pub start2: Option<String>,

    /// End of the second range (defaults to the latest date in the file)
    #[arg(long)]
    pub end2: Option<String>,

    /// Where to write the comparison CSV ("-" for stdout)
    #[arg(short, long, default_value = "processed_data.csv")]
    pub output: PathBuf,

    /// Number of largest click gains to display
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Number of largest click losses to display
    #[arg(long)]
    pub bottom: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of worker threads used while parsing rows
    #[arg(short, long)]
    pub workers: Option<usize>,
}
