use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::new(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        )))
        .with_writer(std::io::stderr)
        .init();
}

pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Like [`format_number`] but always carries a sign, e.g. `+1,204` or `-7`.
pub fn format_signed(num: i64) -> String {
    let sign = if num < 0 { '-' } else { '+' };
    format!("{}{}", sign, format_number(num.unsigned_abs()))
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    let counts = [
        ("--top", args.top),
        ("--bottom", args.bottom),
        ("--workers", args.workers),
    ];
    for (flag, value) in counts {
        if value == Some(0) {
            anyhow::bail!("{} must be greater than 0", flag);
        }
    }

    Ok(())
}
