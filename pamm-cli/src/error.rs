use pamm_dataset::DatasetError;
use pamm_report::ReportError;
use pamm_stats::StatsError;
use pamm_types::PammError;
use pamm_validators::FetchError;
use thiserror::Error;

/// Errors surfaced by the `pamm` commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {reason}")]
    Config { reason: String },

    #[error("{path} not found: {hint}")]
    MissingInput { path: String, hint: String },

    #[error("{0}")]
    Types(#[from] PammError),

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("report error: {0}")]
    Report(#[from] ReportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = CliError::Config {
            reason: "bad spike window".to_string(),
        };
        assert_eq!(err.to_string(), "config error: bad spike window");
    }

    #[test]
    fn test_missing_input_display_carries_hint() {
        let err = CliError::MissingInput {
            path: "output/top20_by_client.txt".to_string(),
            hint: "run `pamm group` first".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("top20_by_client.txt"));
        assert!(msg.contains("pamm group"));
    }

    #[test]
    fn test_missing_token_converts() {
        let err: CliError = FetchError::MissingToken("API_TOKEN").into();
        assert!(matches!(err, CliError::Fetch(FetchError::MissingToken(_))));
        assert!(err.to_string().contains("API_TOKEN"));
    }

    #[test]
    fn test_stats_error_from() {
        let err: CliError = StatsError::EmptyMapping.into();
        assert!(matches!(err, CliError::Stats(_)));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CliError = io_err.into();
        assert!(matches!(err, CliError::Io(_)));
    }
}
