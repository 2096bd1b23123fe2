use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::error::FetchError;

pub const FETCH_LOG_FILE: &str = "fetch_log.txt";

/// Append-only `<timestamp> | <message>` log of a fetch run.
#[derive(Debug)]
pub struct FetchLog {
    path: PathBuf,
    file: File,
}

impl FetchLog {
    /// Open `fetch_log.txt` inside `dir` for appending.
    pub fn open(dir: &Path) -> Result<Self, FetchError> {
        let path = dir.join(FETCH_LOG_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&mut self, message: &str) -> Result<(), FetchError> {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        writeln!(self.file, "{stamp} | {message}")?;
        Ok(())
    }

    pub fn skip(&mut self, validator_id: &str) -> Result<(), FetchError> {
        tracing::debug!(validator = validator_id, "cached, skipping request");
        self.write(&format!("SKIP: {validator_id} | already exists"))
    }

    pub fn success(
        &mut self,
        validator_id: &str,
        software_client: Option<&str>,
        software_client_id: Option<i64>,
    ) -> Result<(), FetchError> {
        let client = software_client.unwrap_or("None");
        let client_id = software_client_id.map_or_else(|| "None".to_string(), |id| id.to_string());
        tracing::info!(validator = validator_id, client, client_id = %client_id, "fetched metadata");
        self.write(&format!(
            "SUCCESS: {validator_id} | software_client: {client} | software_client_id: {client_id}"
        ))
    }

    pub fn error(&mut self, validator_id: &str, error: &str) -> Result<(), FetchError> {
        tracing::warn!(validator = validator_id, error, "fetch failed");
        self.write(&format!("ERROR: {validator_id} | {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_lines_appended() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut log = FetchLog::open(dir.path()).unwrap();
            log.skip("a").unwrap();
            log.success("b", Some("JitoLabs"), Some(1)).unwrap();
        }
        let mut log = FetchLog::open(dir.path()).unwrap();
        log.error("c", "HTTP 404").unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" | SKIP: a | already exists"));
        assert!(lines[1].ends_with(" | SUCCESS: b | software_client: JitoLabs | software_client_id: 1"));
        assert!(lines[2].ends_with(" | ERROR: c | HTTP 404"));

        let stamp = lines[0].split(" | ").next().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_missing_client_fields_logged_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = FetchLog::open(dir.path()).unwrap();
        log.success("x", None, None).unwrap();
        let text = std::fs::read_to_string(log.path()).unwrap();
        assert!(text.contains("software_client: None | software_client_id: None"));
    }
}
