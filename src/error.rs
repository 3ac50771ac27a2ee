use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Row {row}: unparseable date '{value}'")]
    MalformedDate { row: usize, value: String },

    #[error("Unparseable range boundary '{value}'")]
    MalformedRange { value: String },

    #[error("Row {row}: non-numeric {column} value '{value}'")]
    MalformedMetric {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Dataset is empty; range boundaries must be given explicitly")]
    EmptyDataset,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, CompareError>;

/// Non-fatal conditions attached to a finished comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareWarning {
    /// Neither range matched a single record.
    EmptyResult,
}

impl std::fmt::Display for CompareWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareWarning::EmptyResult => write!(f, "no records fall inside either date range"),
        }
    }
}
