use anyhow::Result;
use clap::Parser;
use std::io;
use tracing::error;

use rangediff::utils::{setup_logging, validate_args};
use rangediff::{print_comparison_results, run_comparison, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    validate_args(&args)?;

    match run_comparison(&args) {
        Ok(report) => {
            // Keep stdout clean for the CSV when it is written there
            if args.output.as_os_str() == "-" {
                print_comparison_results(&mut io::stderr().lock(), &report, &args)?;
            } else {
                print_comparison_results(&mut io::stdout().lock(), &report, &args)?;
            }
            Ok(())
        }
        Err(e) => {
            error!(
                action = "abort",
                component = "comparison",
                error = %format!("{:#}", e),
                "Comparison failed"
            );
            std::process::exit(1);
        }
    }
}
