//! Event dataset access for PropAMM analytics.
//!
//! Provides an [`EventSource`](traits::EventSource) trait with a Parquet backend
//! (decoded through polars) and an in-memory backend, plus the [`Dataset`]
//! wrapper that every analysis step works on.

pub mod dataset;
pub mod error;
pub mod memory;
pub mod parquet;
pub mod traits;

pub use dataset::Dataset;
pub use error::DatasetError;
pub use memory::MemorySource;
pub use parquet::ParquetSource;
pub use traits::EventSource;
