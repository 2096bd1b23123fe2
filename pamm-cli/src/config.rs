use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use pamm_stats::spike::SpikeConfig;
use pamm_types::constants::{
    BLOCK_RANGE_END, BLOCK_RANGE_START, DEFAULT_DATASET, DEFAULT_FETCH_FIRST_RANK,
    DEFAULT_FETCH_LAST_RANK, DEFAULT_FOCUS_PROTOCOLS, DEFAULT_GROUP_LIMIT, DEFAULT_JITO_TARGET, DEFAULT_NETWORK, DEFAULT_PEAK_SLOTS,
    DEFAULT_RANKING_DEPTH, DEFAULT_REQUEST_DELAY, DEFAULT_REQUEST_TIMEOUT, DEFAULT_ROLLING_WINDOW,
    DEFAULT_SAMPLE_STRIDE, DEFAULT_SPIKE_CONTEXT_END, DEFAULT_SPIKE_CONTEXT_START,
    DEFAULT_SPIKE_END, DEFAULT_SPIKE_START, DEFAULT_TIME_BIN_SECS, TOP_VALIDATORS_PANEL,
    VALIDATORS_APP_BASE_URL,
};
use pamm_types::time::format_timestamp;
use pamm_types::TimeWindow;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Default config file name.
pub const CONFIG_FILE: &str = "pamm.toml";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PammConfig {
    pub dataset: DatasetConfig,
    pub output: OutputConfig,
    pub api: ApiConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Parquet file with one row per AMM update.
    pub path: String,
    /// Block range the dataset was captured over, shown in report headers.
    pub block_start: Option<u64>,
    pub block_end: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Reports, CSVs, dashboards and markdown.
    pub dir: String,
    /// Cached validators.app JSON and the fetch log.
    pub metadata_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub network: String,
    /// Pause between uncached requests; 0 disables pacing.
    pub request_delay_secs: f64,
    pub timeout_secs: u64,
    /// Fallback when `API_TOKEN` is not set in the environment.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub ranking_depth: usize,
    pub fetch_first_rank: usize,
    pub fetch_last_rank: usize,
    pub group_limit: usize,
    pub jito_target: usize,
    pub bin_secs: i64,
    pub rolling_window: usize,
    pub sample_stride: usize,
    pub top_validators: usize,
    pub focus_protocols: Vec<String>,
    /// UTC, `YYYY-MM-DD HH:MM:SS`.
    pub spike_start: String,
    pub spike_end: String,
    pub context_start: String,
    pub context_end: String,
    pub peak_slots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATASET.to_string(),
            block_start: Some(BLOCK_RANGE_START),
            block_end: Some(BLOCK_RANGE_END),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            metadata_dir: "outputs".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: VALIDATORS_APP_BASE_URL.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            request_delay_secs: DEFAULT_REQUEST_DELAY.as_secs_f64(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            token: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ranking_depth: DEFAULT_RANKING_DEPTH,
            fetch_first_rank: DEFAULT_FETCH_FIRST_RANK,
            fetch_last_rank: DEFAULT_FETCH_LAST_RANK,
            group_limit: DEFAULT_GROUP_LIMIT,
            jito_target: DEFAULT_JITO_TARGET,
            bin_secs: DEFAULT_TIME_BIN_SECS,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            top_validators: TOP_VALIDATORS_PANEL,
            focus_protocols: DEFAULT_FOCUS_PROTOCOLS.iter().map(|p| p.to_string()).collect(),
            spike_start: format_timestamp(DEFAULT_SPIKE_START),
            spike_end: format_timestamp(DEFAULT_SPIKE_END),
            context_start: format_timestamp(DEFAULT_SPIKE_CONTEXT_START),
            context_end: format_timestamp(DEFAULT_SPIKE_CONTEXT_END),
            peak_slots: DEFAULT_PEAK_SLOTS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PammConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &str) -> Result<Self, CliError> {
        if !Path::new(path).exists() {
            tracing::debug!(path, "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| CliError::Config {
            reason: format!("failed to read config file '{}': {}", path, e),
        })?;
        let config: PammConfig = toml::from_str(&contents).map_err(|e| CliError::Config {
            reason: format!("failed to parse config file '{}': {}", path, e),
        })?;
        Ok(config)
    }

    /// Write a default `pamm.toml` into `dir`.
    pub fn init(dir: &str) -> Result<PathBuf, CliError> {
        let dir_path = Path::new(dir);
        if !dir_path.exists() {
            std::fs::create_dir_all(dir_path)?;
        }

        let toml_str =
            toml::to_string_pretty(&PammConfig::default()).map_err(|e| CliError::Config {
                reason: format!("failed to serialize default config: {}", e),
            })?;

        let config_path = dir_path.join(CONFIG_FILE);
        std::fs::write(&config_path, toml_str)?;
        Ok(config_path)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.dir)
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output_dir().join(file)
    }

    pub fn ensure_output_dir(&self) -> Result<PathBuf, CliError> {
        let dir = self.output_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Ranking report written by `pamm rank` for the top `depth` validators.
    pub fn ranking_report_path(&self, depth: usize) -> PathBuf {
        self.output_path(&format!("top{depth}_validators_by_slots.txt"))
    }

    /// Client group report written by `pamm group`.
    pub fn client_report_path(&self, limit: usize) -> PathBuf {
        self.output_path(&format!("top{limit}_by_client.txt"))
    }

    pub fn block_range(&self) -> Option<(u64, u64)> {
        self.dataset.block_start.zip(self.dataset.block_end)
    }

    pub fn request_delay(&self) -> Result<Duration, CliError> {
        Duration::try_from_secs_f64(self.api.request_delay_secs).map_err(|e| CliError::Config {
            reason: format!("invalid api.request_delay_secs: {}", e),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn spike_config(&self) -> Result<SpikeConfig, CliError> {
        let a = &self.analysis;
        let window = TimeWindow::new(parse_time(&a.spike_start)?, parse_time(&a.spike_end)?)?;
        let context = TimeWindow::new(parse_time(&a.context_start)?, parse_time(&a.context_end)?)?;
        Ok(SpikeConfig::new(window, context, a.peak_slots)?)
    }
}

fn parse_time(s: &str) -> Result<i64, CliError> {
    NaiveDateTime::parse_from_str(s.trim(), TIME_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|e| CliError::Config {
            reason: format!("invalid timestamp '{}' (expected {}): {}", s, TIME_FORMAT, e),
        })
}
