use pamm_dataset::DatasetError;
use pamm_stats::StatsError;
use thiserror::Error;

/// Errors raised while rendering, writing or parsing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("report contains no validators")]
    EmptyReport,

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
