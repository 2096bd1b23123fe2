pub mod clients;
pub mod dashboard;
pub mod fetch;
pub mod group;
pub mod init;
pub mod jito;
pub mod rank;
pub mod reconcile;
pub mod report;

use std::path::Path;

use pamm_dataset::{Dataset, ParquetSource};
use pamm_report::ranking_report::read_ranking_report;
use pamm_stats::ranking::rank_validators;
use pamm_types::RankedValidator;
use pamm_validators::MetadataCache;

use crate::config::PammConfig;
use crate::error::CliError;

pub(crate) fn load_dataset(config: &PammConfig) -> Result<Dataset, CliError> {
    let path = Path::new(&config.dataset.path);
    if !path.exists() {
        return Err(CliError::MissingInput {
            path: config.dataset.path.clone(),
            hint: "set dataset.path in pamm.toml or pass --dataset".to_string(),
        });
    }
    let dataset = Dataset::load(&ParquetSource::new(path))?;
    dataset.ensure_not_empty()?;
    Ok(dataset)
}

/// Ranking from the `pamm rank` report, or recomputed from the dataset when
/// the report has not been written yet.
pub(crate) fn load_ranking(config: &PammConfig) -> Result<Vec<RankedValidator>, CliError> {
    let path = config.ranking_report_path(config.analysis.ranking_depth);
    if path.exists() {
        tracing::info!(path = %path.display(), "reading ranking report");
        return Ok(read_ranking_report(&path)?);
    }
    tracing::info!(path = %path.display(), "ranking report not found, ranking the dataset");
    let dataset = load_dataset(config)?;
    let mut ranking = rank_validators(dataset.events());
    ranking.truncate(config.analysis.ranking_depth);
    Ok(ranking)
}

pub(crate) fn open_cache(config: &PammConfig) -> Result<MetadataCache, CliError> {
    Ok(MetadataCache::open(&config.output.metadata_dir)?)
}

pub(crate) fn require_file(path: &Path, hint: &str) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::MissingInput {
            path: path.display().to_string(),
            hint: hint.to_string(),
        })
    }
}
