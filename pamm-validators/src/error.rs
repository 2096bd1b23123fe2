use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while fetching or caching validator metadata.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API token not set: export {0} or add it to .env")]
    MissingToken(&'static str),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
