use thiserror::Error;

/// Errors that can occur while loading or querying the event dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open dataset '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset is missing required columns {missing:?} (available: {available:?})")]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("no events found for protocol '{protocol}' (available: {available:?})")]
    UnknownProtocol {
        protocol: String,
        available: Vec<String>,
    },

    #[error("dataset is empty")]
    Empty,

    #[error("parquet decode error: {0}")]
    Decode(#[from] polars::prelude::PolarsError),
}
