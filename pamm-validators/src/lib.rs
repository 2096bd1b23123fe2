//! Validator client metadata from validators.app.
//!
//! A [`Fetcher`] walks a list of validator ids, serving cached records from
//! a [`MetadataCache`] and requesting the rest through a
//! [`ValidatorDirectory`], paced by a [`TokenBucket`]. Every step is written
//! to a [`FetchLog`].

pub mod cache;
pub mod directory;
pub mod error;
pub mod fetch_log;
pub mod fetcher;
pub mod rate_limit;

pub use cache::MetadataCache;
pub use directory::{ValidatorDirectory, ValidatorsAppClient};
pub use error::FetchError;
pub use fetch_log::FetchLog;
pub use fetcher::{write_outcomes_csv, FetchSummary, Fetcher};
pub use rate_limit::TokenBucket;
