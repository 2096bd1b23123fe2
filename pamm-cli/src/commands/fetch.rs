use chrono::Local;
use pamm_report::format::{print_heading, print_kv, print_success, print_warning, style_dim};
use pamm_report::ranking_report::ids_in_rank_range;
use pamm_types::constants::API_TOKEN_ENV;
use pamm_validators::{
    write_outcomes_csv, FetchError, FetchLog, FetchSummary, Fetcher, TokenBucket, ValidatorDirectory,
    ValidatorsAppClient,
};

use crate::commands::{load_ranking, open_cache};
use crate::config::PammConfig;
use crate::error::CliError;

pub async fn run(config: &PammConfig, from: usize, to: usize, progress: bool) -> Result<(), CliError> {
    let token = resolve_token(std::env::var(API_TOKEN_ENV).ok(), config.api.token.as_deref())?;
    let client = ValidatorsAppClient::with_options(
        token,
        &config.api.base_url,
        &config.api.network,
        config.request_timeout(),
    )?;
    let summary = fetch_with(config, client, from, to, progress).await?;
    if summary.failed > 0 {
        print_warning(&format!(
            "{} validator(s) failed, see the fetch log",
            summary.failed
        ));
    }
    Ok(())
}

/// Environment token first, then the config file. Blank values count as unset.
pub fn resolve_token(env: Option<String>, configured: Option<&str>) -> Result<String, FetchError> {
    env.filter(|t| !t.trim().is_empty())
        .or_else(|| configured.filter(|t| !t.trim().is_empty()).map(str::to_string))
        .ok_or(FetchError::MissingToken(API_TOKEN_ENV))
}

/// Fetch the metadata of ranks `from..=to` through `directory` and write the
/// outcome CSV.
pub async fn fetch_with<D: ValidatorDirectory>(
    config: &PammConfig,
    directory: D,
    from: usize,
    to: usize,
    progress: bool,
) -> Result<FetchSummary, CliError> {
    if from == 0 || from > to {
        return Err(pamm_types::PammError::InvalidRankRange { first: from, last: to }.into());
    }
    let ranking = load_ranking(config)?;
    let ids = ids_in_rank_range(&ranking, from, to);
    if ids.is_empty() {
        print_warning(&format!("No validators ranked {from}-{to}"));
        return Ok(FetchSummary::default());
    }

    let cache = open_cache(config)?;
    let log = FetchLog::open(cache.dir())?;
    let pacer = TokenBucket::every(config.request_delay()?);
    let mut fetcher = Fetcher::new(directory, cache, log, pacer).with_progress(progress);
    fetcher
        .log_mut()
        .write(&format!("START: ranks {from}-{to} | {} validators", ids.len()))?;

    tracing::info!(from, to, validators = ids.len(), "fetching validator metadata");
    let summary = fetcher.run(&ids).await?;
    fetcher.log_mut().write(&format!(
        "DONE: fetched {} | cached {} | failed {}",
        summary.fetched, summary.cached, summary.failed
    ))?;

    config.ensure_output_dir()?;
    let csv_path = config.output_path(&format!(
        "validator_clients_{from}_{to}_{}.csv",
        Local::now().format("%Y%m%d")
    ));
    write_outcomes_csv(&csv_path, &summary.outcomes)?;

    print_heading(&format!("Validator metadata, ranks {from}-{to}"));
    print_kv("Validators", summary.total());
    print_kv("Fetched", summary.fetched);
    print_kv("Already cached", summary.cached);
    print_kv("Failed", summary.failed);
    print_kv("Cache", style_dim().apply_to(fetcher.cache().dir().display()));
    print_kv("Log", style_dim().apply_to(fetcher.log_mut().path().display()));
    println!();
    print_success(&format!("Wrote {}", csv_path.display()));
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_token_wins() {
        let token = resolve_token(Some("env".to_string()), Some("file")).unwrap();
        assert_eq!(token, "env");
    }

    #[test]
    fn test_config_token_fallback() {
        let token = resolve_token(None, Some("file")).unwrap();
        assert_eq!(token, "file");
        let token = resolve_token(Some("  ".to_string()), Some("file")).unwrap();
        assert_eq!(token, "file");
    }

    #[test]
    fn test_missing_token() {
        let err = resolve_token(None, Some("")).unwrap_err();
        assert!(matches!(err, FetchError::MissingToken(API_TOKEN_ENV)));
    }
}
