//! Descriptive statistics for the PropAMM dataset.
//!
//! Everything here is a pure function of the event rows: validator slot
//! rankings, activity series, protocol and event-kind breakdowns, the
//! Jito-solana vs Harmonic block packing comparison, spike-window analysis
//! and the client grouping of fetched validator metadata.

pub mod activity;
pub mod clients;
pub mod describe;
pub mod error;
pub mod grouping;
pub mod ranking;
pub mod spike;

pub use error::StatsError;
