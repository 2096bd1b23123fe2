//! Report rendering and parsing.
//!
//! Plain-text reports double as inputs for later pipeline steps: the ranking
//! report feeds the metadata fetch and the client grouping, and the client
//! group report feeds the efficiency comparison. Each text format therefore
//! has a matching parser here.

pub mod client_report;
pub mod dashboard;
pub mod error;
pub mod figure;
pub mod format;
pub mod jito_report;
pub mod markdown;
pub mod ranking_report;
pub mod reconcile;
pub mod table;

pub use error::ReportError;
