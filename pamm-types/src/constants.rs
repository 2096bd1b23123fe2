use std::time::Duration;

// ─── Dataset ─────────────────────────────────────────────────────────────────

/// Parquet file holding the PropAMM updates for the observed block range.
pub const DEFAULT_DATASET: &str = "pamm_updates_391876700_391976700.parquet";

/// First slot of the observed block range.
pub const BLOCK_RANGE_START: u64 = 391_876_700;

/// Last slot of the observed block range.
pub const BLOCK_RANGE_END: u64 = 391_976_700;

/// Label used for events that carry no protocol name.
pub const UNKNOWN_PROTOCOL: &str = "Unknown";

/// Protocols that get their own focused dashboard by default.
pub const DEFAULT_FOCUS_PROTOCOLS: &[&str] = &["HumidiFi", "ZeroFi", "TesseraV"];

// ─── Ranking ─────────────────────────────────────────────────────────────────

/// Number of validators kept in the slot ranking report.
pub const DEFAULT_RANKING_DEPTH: usize = 100;

/// First rank whose metadata is fetched by default.
pub const DEFAULT_FETCH_FIRST_RANK: usize = 21;

/// Last rank whose metadata is fetched by default.
pub const DEFAULT_FETCH_LAST_RANK: usize = 100;

/// Number of validators listed per client group.
pub const DEFAULT_GROUP_LIMIT: usize = 20;

/// Number of Jito-solana validators collected by the extraction report.
pub const DEFAULT_JITO_TARGET: usize = 20;

// ─── validators.app ──────────────────────────────────────────────────────────

/// Base URL of the validators.app REST API.
pub const VALIDATORS_APP_BASE_URL: &str = "https://www.validators.app/api/v1";

/// Cluster queried on validators.app.
pub const DEFAULT_NETWORK: &str = "mainnet";

/// Delay between two network requests (validators.app rate limit).
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(7);

/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Environment variable carrying the validators.app API token.
pub const API_TOKEN_ENV: &str = "API_TOKEN";

/// `software_client` reported for Jito-solana validators.
pub const JITO_SOFTWARE_CLIENT: &str = "JitoLabs";

/// `software_client_id` reported for Jito-solana validators.
pub const JITO_SOFTWARE_CLIENT_ID: i64 = 1;

/// `software_client_id` reported for Harmonic validators.
pub const HARMONIC_SOFTWARE_CLIENT_ID: i64 = 10;

// ─── Analysis ────────────────────────────────────────────────────────────────

/// Width of the activity time bins (5 minutes).
pub const DEFAULT_TIME_BIN_SECS: i64 = 300;

/// Width of the protocol dashboard time bins (1 minute).
pub const PROTOCOL_TIME_BIN_SECS: i64 = 60;

/// Window of the centered rolling average over events per block.
pub const DEFAULT_ROLLING_WINDOW: usize = 100;

/// Every n-th block is kept when plotting the rolling average.
pub const DEFAULT_SAMPLE_STRIDE: usize = 10;

/// Number of validators shown in the "most active" panels.
pub const TOP_VALIDATORS_PANEL: usize = 10;

/// Characters of a validator id kept in chart labels.
pub const VALIDATOR_LABEL_CHARS: usize = 8;

/// Relative difference under which two clients are considered equally efficient.
pub const SIMILAR_EFFICIENCY_PCT: f64 = 10.0;

/// Spike window start: 2026-01-07 16:20:00 UTC.
pub const DEFAULT_SPIKE_START: i64 = 1_767_802_800;

/// Spike window end (exclusive): 2026-01-07 16:24:59 UTC, so the last
/// second of the fifth minute falls outside the window.
pub const DEFAULT_SPIKE_END: i64 = 1_767_803_099;

/// Context window start: 2026-01-07 16:00:00 UTC.
pub const DEFAULT_SPIKE_CONTEXT_START: i64 = 1_767_801_600;

/// Context window end (exclusive): 2026-01-07 16:40:00 UTC.
pub const DEFAULT_SPIKE_CONTEXT_END: i64 = 1_767_804_000;

/// Number of peak slots highlighted inside the spike window.
pub const DEFAULT_PEAK_SLOTS: usize = 2;
