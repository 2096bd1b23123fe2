use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use pamm_types::{FetchOutcome, ValidatorMetadata};
use serde::Serialize;

use crate::cache::MetadataCache;
use crate::directory::ValidatorDirectory;
use crate::error::FetchError;
use crate::fetch_log::FetchLog;
use crate::rate_limit::TokenBucket;

/// Counters of one fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub fetched: usize,
    pub cached: usize,
    pub failed: usize,
    pub outcomes: Vec<FetchOutcome>,
}

impl FetchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Fetches validator metadata through a directory, backed by an on-disk cache.
pub struct Fetcher<D> {
    directory: D,
    cache: MetadataCache,
    log: FetchLog,
    pacer: TokenBucket,
    show_progress: bool,
}

impl<D: ValidatorDirectory> Fetcher<D> {
    pub fn new(directory: D, cache: MetadataCache, log: FetchLog, pacer: TokenBucket) -> Self {
        Self {
            directory,
            cache,
            log,
            pacer,
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while running.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn log_mut(&mut self) -> &mut FetchLog {
        &mut self.log
    }

    /// Fetch every id in order. Request, read and write failures for a single
    /// id are recorded in the outcome list; only a fetch log write failure
    /// aborts the run.
    pub async fn run(&mut self, ids: &[String]) -> Result<FetchSummary, FetchError> {
        let progress = self.progress_bar(ids.len() as u64);
        let mut summary = FetchSummary::default();

        for id in ids {
            progress.set_message(id.clone());
            let outcome = if self.cache.contains(id) {
                summary.cached += 1;
                self.read_cached(id)?
            } else {
                self.pacer.acquire().await;
                let outcome = self.fetch_one(id).await?;
                if outcome.is_ok() {
                    summary.fetched += 1;
                }
                outcome
            };
            if !outcome.is_ok() {
                summary.failed += 1;
            }
            summary.outcomes.push(outcome);
            progress.inc(1);
        }
        progress.finish_and_clear();

        tracing::info!(
            total = summary.total(),
            fetched = summary.fetched,
            cached = summary.cached,
            failed = summary.failed,
            "fetch run finished"
        );
        Ok(summary)
    }

    fn read_cached(&mut self, id: &str) -> Result<FetchOutcome, FetchError> {
        self.log.skip(id)?;
        match self.cache.load(id) {
            Ok(meta) => Ok(FetchOutcome::from_metadata(&meta)),
            Err(e) => {
                self.log
                    .error(id, &format!("failed to read existing file: {e}"))?;
                Ok(FetchOutcome::failed(id, format!("read error: {e}")))
            }
        }
    }

    async fn fetch_one(&mut self, id: &str) -> Result<FetchOutcome, FetchError> {
        let raw = match self.directory.fetch(id).await {
            Ok(raw) => raw,
            Err(e) => {
                let message = e.to_string();
                self.log.error(id, &message)?;
                return Ok(FetchOutcome::failed(id, message));
            }
        };
        if let Err(e) = self.cache.store(id, &raw) {
            self.log.error(id, &format!("failed to write file: {e}"))?;
            return Ok(FetchOutcome::failed(id, format!("write error: {e}")));
        }
        let meta = ValidatorMetadata::from_json(id, &raw);
        self.log.success(
            id,
            meta.software_client.as_deref(),
            meta.software_client_id,
        )?;
        Ok(FetchOutcome::from_metadata(&meta))
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb
    }
}

/// Write outcomes as `validator_id,software_client,software_client_id,error`.
pub fn write_outcomes_csv(path: &Path, outcomes: &[FetchOutcome]) -> Result<(), FetchError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["validator_id", "software_client", "software_client_id", "error"])?;
    for outcome in outcomes {
        let client_id = outcome
            .software_client_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        writer.write_record([
            outcome.validator_id.as_str(),
            outcome.software_client.as_deref().unwrap_or(""),
            client_id.as_str(),
            outcome.error.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;

    struct FakeDirectory {
        records: HashMap<String, Value>,
        calls: AtomicUsize,
    }

    impl FakeDirectory {
        fn new(records: &[(&str, Value)]) -> Self {
            Self {
                records: records
                    .iter()
                    .map(|(id, v)| (id.to_string(), v.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ValidatorDirectory for FakeDirectory {
        async fn fetch(&self, validator_id: &str) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.records
                .get(validator_id)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    status: 404,
                    url: format!("fake/{validator_id}.json"),
                })
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn fetcher(dir: &Path, directory: FakeDirectory, interval: Duration) -> Fetcher<FakeDirectory> {
        let cache = MetadataCache::open(dir).unwrap();
        let log = FetchLog::open(dir).unwrap();
        Fetcher::new(directory, cache, log, TokenBucket::every(interval))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_cache_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let directory = FakeDirectory::new(&[
            ("jito", json!({"software_client": "JitoLabs", "software_client_id": 1})),
            ("harm", json!({"software_client": "Unknown", "software_client_id": 10})),
        ]);
        let mut fetcher = fetcher(dir.path(), directory, Duration::from_secs(7));
        fetcher.cache().store("cached", &json!({"software_client_id": 3})).unwrap();

        let summary = fetcher
            .run(&ids(&["jito", "cached", "missing", "harm"]))
            .await
            .unwrap();

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.cached, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.fetched, 2);
        assert_eq!(fetcher.directory.calls.load(Ordering::SeqCst), 3);

        let missing = &summary.outcomes[2];
        assert!(missing.error.as_deref().unwrap().contains("404"));
        assert_eq!(summary.outcomes[1].software_client_id, Some(3));
        assert!(fetcher.cache().contains("jito"));
        assert!(!fetcher.cache().contains("missing"));

        let log = std::fs::read_to_string(dir.path().join("fetch_log.txt")).unwrap();
        assert!(log.contains("SUCCESS: jito | software_client: JitoLabs | software_client_id: 1"));
        assert!(log.contains("SKIP: cached | already exists"));
        assert!(log.contains("ERROR: missing | HTTP 404"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hits_are_not_paced() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = fetcher(dir.path(), FakeDirectory::new(&[]), Duration::from_secs(7));
        for id in ["a", "b", "c"] {
            fetcher.cache().store(id, &json!({})).unwrap();
        }
        let start = tokio::time::Instant::now();
        let summary = fetcher.run(&ids(&["a", "b", "c"])).await.unwrap();
        assert_eq!(summary.cached, 3);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(fetcher.directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_paced() {
        let dir = tempfile::tempdir().unwrap();
        let directory = FakeDirectory::new(&[("a", json!({})), ("b", json!({})), ("c", json!({}))]);
        let mut fetcher = fetcher(dir.path(), directory, Duration::from_secs(7));
        let start = tokio::time::Instant::now();
        fetcher.run(&ids(&["a", "b", "c"])).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(14));
    }

    #[tokio::test]
    async fn test_unreadable_cache_entry_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = fetcher(dir.path(), FakeDirectory::new(&[]), Duration::ZERO);
        std::fs::write(fetcher.cache().path_for("bad"), "{oops").unwrap();
        let summary = fetcher.run(&ids(&["bad"])).await.unwrap();
        let outcome = &summary.outcomes[0];
        assert!(outcome.error.as_deref().unwrap().starts_with("read error: "));
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cached, 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let directory = FakeDirectory::new(&[("a", json!({})), ("b", json!({"software_client_id": 1}))]);
        let mut fetcher = fetcher(dir.path(), directory, Duration::ZERO);
        // A directory where the record file should go makes the write fail.
        std::fs::create_dir(fetcher.cache().path_for("a")).unwrap();

        let summary = fetcher.run(&ids(&["a", "b"])).await.unwrap();

        assert_eq!(fetcher.directory.calls.load(Ordering::SeqCst), 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.fetched, 1);
        assert!(summary.outcomes[0].error.as_deref().unwrap().starts_with("write error: "));
        assert_eq!(summary.outcomes[1].software_client_id, Some(1));
        assert!(fetcher.cache().contains("b"));

        let log = std::fs::read_to_string(dir.path().join("fetch_log.txt")).unwrap();
        assert!(log.contains("ERROR: a | failed to write file"));
    }

    #[test]
    fn test_outcomes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.csv");
        let outcomes = vec![
            FetchOutcome {
                validator_id: "a".into(),
                software_client: Some("JitoLabs".into()),
                software_client_id: Some(1),
                error: None,
            },
            FetchOutcome::failed("b", "HTTP 429 for x, y"),
        ];
        write_outcomes_csv(&path, &outcomes).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "validator_id,software_client,software_client_id,error");
        assert_eq!(lines[1], "a,JitoLabs,1,");
        assert_eq!(lines[2], "b,,,\"HTTP 429 for x, y\"");
    }
}
