use pamm_types::AmmEvent;

use crate::error::DatasetError;
use crate::traits::EventSource;

/// In-memory event source.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    events: Vec<AmmEvent>,
}

impl MemorySource {
    pub fn new(events: Vec<AmmEvent>) -> Self {
        Self { events }
    }
}

impl EventSource for MemorySource {
    fn load(&self) -> Result<Vec<AmmEvent>, DatasetError> {
        Ok(self.events.clone())
    }

    fn origin(&self) -> String {
        "memory".to_string()
    }
}
