use std::fs::File;
use std::path::{Path, PathBuf};

use pamm_types::{AmmEvent, EventKind};
use polars::prelude::*;

use crate::error::DatasetError;
use crate::traits::EventSource;

/// Columns every PropAMM dataset must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["slot", "time", "validator", "kind"];

/// Optional protocol column.
pub const PROTOCOL_COLUMN: &str = "amm";

/// Event source backed by a Parquet file, decoded with polars.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: PathBuf,
}

impl ParquetSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_frame(&self) -> Result<DataFrame, DatasetError> {
        let file = File::open(&self.path).map_err(|source| DatasetError::Open {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(ParquetReader::new(file).finish()?)
    }
}

impl EventSource for ParquetSource {
    fn load(&self) -> Result<Vec<AmmEvent>, DatasetError> {
        let df = self.read_frame()?;
        tracing::debug!(path = %self.path.display(), rows = df.height(), "decoded parquet file");
        events_from_frame(&df)
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }
}

/// Convert a decoded frame into typed events.
///
/// Rows with a missing slot, time, validator or kind are dropped.
pub fn events_from_frame(df: &DataFrame) -> Result<Vec<AmmEvent>, DatasetError> {
    let available: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !available.iter().any(|a| a == *c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns { missing, available });
    }

    let slots = u64_column(df, "slot")?;
    let times = unix_seconds_column(df, "time")?;
    let validators = string_column(df, "validator")?;
    let kinds = string_column(df, "kind")?;
    let protocols = if available.iter().any(|a| a == PROTOCOL_COLUMN) {
        string_column(df, PROTOCOL_COLUMN)?
    } else {
        vec![None; df.height()]
    };

    let mut events = Vec::with_capacity(df.height());
    let mut dropped = 0usize;
    for i in 0..df.height() {
        let kind = kinds[i].as_deref().and_then(|k| EventKind::parse(k).ok());
        match (slots[i], times[i], validators[i].as_ref(), kind) {
            (Some(slot), Some(time), Some(validator), Some(kind)) => events.push(AmmEvent {
                slot,
                time,
                validator: validator.clone(),
                amm: protocols[i].clone(),
                kind,
            }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!(dropped, kept = events.len(), "dropped rows with missing fields");
    }
    Ok(events)
}

fn u64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<u64>>, DatasetError> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;
    Ok(series.u64()?.into_iter().collect())
}

/// Read a time column as unix seconds, accepting numeric seconds or a datetime column.
fn unix_seconds_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, DatasetError> {
    let column = df.column(name)?.as_materialized_series();
    let per_second = match column.dtype() {
        DataType::Datetime(TimeUnit::Milliseconds, _) => 1e3,
        DataType::Datetime(TimeUnit::Microseconds, _) => 1e6,
        DataType::Datetime(TimeUnit::Nanoseconds, _) => 1e9,
        _ => 1.0,
    };
    let series = column.cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.map(|secs| (secs / per_second).floor() as i64))
        .collect())
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, DatasetError> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df!(
            "slot" => &[391_900_000u64, 391_900_000, 391_900_001, 391_900_002],
            "time" => &[1_767_802_800i64, 1_767_802_800, 1_767_802_801, 1_767_802_802],
            "validator" => &["A", "A", "B", "B"],
            "amm" => &[Some("HumidiFi"), None, Some("ZeroFi"), Some("HumidiFi")],
            "kind" => &["ORACLE", "TRADE", "TRADE", "ORACLE"]
        )
        .unwrap()
    }

    #[test]
    fn test_events_from_frame() {
        let events = events_from_frame(&sample_frame()).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].slot, 391_900_000);
        assert_eq!(events[0].kind, EventKind::Oracle);
        assert_eq!(events[1].amm, None);
        assert_eq!(events[2].validator, "B");
        assert_eq!(events[3].time, 1_767_802_802);
    }

    #[test]
    fn test_missing_required_column() {
        let df = df!(
            "slot" => &[1u64],
            "validator" => &["A"]
        )
        .unwrap();
        match events_from_frame(&df) {
            Err(DatasetError::MissingColumns { missing, available }) => {
                assert_eq!(missing, vec!["time".to_string(), "kind".to_string()]);
                assert_eq!(available.len(), 2);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_protocol_column_is_optional() {
        let df = df!(
            "slot" => &[1u64],
            "time" => &[10i64],
            "validator" => &["A"],
            "kind" => &["TRADE"]
        )
        .unwrap();
        let events = events_from_frame(&df).unwrap();
        assert_eq!(events[0].amm, None);
    }

    #[test]
    fn test_rows_with_nulls_are_dropped() {
        let df = df!(
            "slot" => &[Some(1u64), None, Some(3)],
            "time" => &[10i64, 11, 12],
            "validator" => &[Some("A"), Some("B"), None],
            "kind" => &["TRADE", "TRADE", "TRADE"]
        )
        .unwrap();
        let events = events_from_frame(&df).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].validator, "A");
    }

    #[test]
    fn test_float_seconds_are_floored() {
        let df = df!(
            "slot" => &[1u64],
            "time" => &[1_767_802_800.75f64],
            "validator" => &["A"],
            "kind" => &["ORACLE"]
        )
        .unwrap();
        let events = events_from_frame(&df).unwrap();
        assert_eq!(events[0].time, 1_767_802_800);
    }

    #[test]
    fn test_load_parquet_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pamm.parquet");
        let mut df = sample_frame();
        let mut file = File::create(&path).unwrap();
        ParquetWriter::new(&mut file).finish(&mut df).unwrap();

        let source = ParquetSource::new(&path);
        let events = source.load().unwrap();
        assert_eq!(events.len(), 4);
        assert!(source.origin().ends_with("pamm.parquet"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let source = ParquetSource::new("/nonexistent/pamm.parquet");
        assert!(matches!(source.load(), Err(DatasetError::Open { .. })));
    }
}
