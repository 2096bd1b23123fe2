use std::fs;
use std::path::{Path, PathBuf};

use pamm_types::ValidatorMetadata;
use serde_json::Value;

use crate::error::FetchError;

const FILE_PREFIX: &str = "validator_";
const FILE_SUFFIX: &str = ".json";

/// Directory of `validator_<id>.json` records.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    dir: PathBuf,
}

impl MetadataCache {
    /// Open a cache rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, validator_id: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{validator_id}{FILE_SUFFIX}"))
    }

    pub fn contains(&self, validator_id: &str) -> bool {
        self.path_for(validator_id).is_file()
    }

    pub fn load_raw(&self, validator_id: &str) -> Result<Value, FetchError> {
        let path = self.path_for(validator_id);
        let bytes = fs::read(&path)?;
        serde_json::from_slice(&bytes).map_err(|source| FetchError::InvalidJson { path, source })
    }

    pub fn load(&self, validator_id: &str) -> Result<ValidatorMetadata, FetchError> {
        let raw = self.load_raw(validator_id)?;
        Ok(ValidatorMetadata::from_json(validator_id, &raw))
    }

    /// Cached metadata, or `None` when absent or unreadable.
    pub fn get(&self, validator_id: &str) -> Option<ValidatorMetadata> {
        if !self.contains(validator_id) {
            return None;
        }
        match self.load(validator_id) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(validator = validator_id, error = %e, "unreadable cache entry");
                None
            }
        }
    }

    /// Write a record pretty-printed.
    pub fn store(&self, validator_id: &str, value: &Value) -> Result<PathBuf, FetchError> {
        let path = self.path_for(validator_id);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        Ok(path)
    }

    /// Ids of all cached validators, sorted.
    pub fn cached_ids(&self) -> Result<Vec<String>, FetchError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = name
                .strip_prefix(FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
            {
                if !id.is_empty() {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Load every cached record. Files that fail to parse are returned
    /// separately as (path, error message).
    pub fn load_all(&self) -> Result<(Vec<ValidatorMetadata>, Vec<(PathBuf, String)>), FetchError> {
        let mut records = Vec::new();
        let mut errors = Vec::new();
        for id in self.cached_ids()? {
            match self.load(&id) {
                Ok(meta) => records.push(meta),
                Err(e) => errors.push((self.path_for(&id), e.to_string())),
            }
        }
        Ok((records, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::open(dir.path().join("outputs")).unwrap();
        assert!(!cache.contains("abc"));

        let record = json!({"software_client": "JitoLabs", "software_client_id": 1, "name": "A"});
        let path = cache.store("abc", &record).unwrap();
        assert!(path.ends_with("validator_abc.json"));
        assert!(cache.contains("abc"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"name\""));

        let meta = cache.load("abc").unwrap();
        assert_eq!(meta.software_client.as_deref(), Some("JitoLabs"));
        assert_eq!(meta.name.as_deref(), Some("A"));
    }

    #[test]
    fn test_cached_ids_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::open(dir.path()).unwrap();
        cache.store("b", &json!({})).unwrap();
        cache.store("a", &json!({})).unwrap();
        fs::write(dir.path().join("fetch_log.txt"), "x").unwrap();
        fs::write(dir.path().join("validator_.json"), "{}").unwrap();
        assert_eq!(cache.cached_ids().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_json_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::open(dir.path()).unwrap();
        cache.store("good", &json!({"software_client_id": 10})).unwrap();
        fs::write(cache.path_for("bad"), "{not json").unwrap();

        assert!(matches!(cache.load("bad"), Err(FetchError::InvalidJson { .. })));
        assert!(cache.get("bad").is_none());

        let (records, errors) = cache.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].0.ends_with("validator_bad.json"));
    }
}
