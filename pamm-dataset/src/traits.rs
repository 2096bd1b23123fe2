use pamm_types::AmmEvent;

use crate::error::DatasetError;

/// A source of PropAMM events.
///
/// Implementations decode the whole dataset at once; the analysis works on
/// the resulting rows in memory.
pub trait EventSource {
    /// Read every event from the source.
    fn load(&self) -> Result<Vec<AmmEvent>, DatasetError>;

    /// Human-readable origin of the events (file path, "memory", ...).
    fn origin(&self) -> String;
}
