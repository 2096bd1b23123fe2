use std::collections::{BTreeSet, HashSet};

use pamm_types::time::TimeWindow;
use pamm_types::AmmEvent;

use crate::error::DatasetError;
use crate::traits::EventSource;

/// The loaded PropAMM events plus the queries the reports share.
#[derive(Debug, Clone)]
pub struct Dataset {
    events: Vec<AmmEvent>,
    origin: String,
}

impl Dataset {
    /// Load every event from `source`.
    pub fn load(source: &dyn EventSource) -> Result<Self, DatasetError> {
        let events = source.load()?;
        let origin = source.origin();
        tracing::info!(origin = %origin, events = events.len(), "loaded dataset");
        Ok(Self { events, origin })
    }

    pub fn from_events(events: Vec<AmmEvent>, origin: impl Into<String>) -> Self {
        Self {
            events,
            origin: origin.into(),
        }
    }

    pub fn events(&self) -> &[AmmEvent] {
        &self.events
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Fail with [`DatasetError::Empty`] when there is nothing to analyse.
    pub fn ensure_not_empty(&self) -> Result<(), DatasetError> {
        if self.events.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(())
    }

    /// Number of distinct slots with at least one event.
    pub fn unique_slots(&self) -> usize {
        self.events.iter().map(|e| e.slot).collect::<HashSet<_>>().len()
    }

    /// Number of distinct validators.
    pub fn validator_count(&self) -> usize {
        self.events
            .iter()
            .map(|e| e.validator.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Earliest and latest event time.
    pub fn time_range(&self) -> Option<(i64, i64)> {
        let min = self.events.iter().map(|e| e.time).min()?;
        let max = self.events.iter().map(|e| e.time).max()?;
        Some((min, max))
    }

    pub fn duration_hours(&self) -> f64 {
        self.time_range()
            .map(|(start, end)| (end - start) as f64 / 3600.0)
            .unwrap_or(0.0)
    }

    /// Lowest and highest slot.
    pub fn slot_range(&self) -> Option<(u64, u64)> {
        let min = self.events.iter().map(|e| e.slot).min()?;
        let max = self.events.iter().map(|e| e.slot).max()?;
        Some((min, max))
    }

    /// Protocol names present in the dataset, sorted. Rows without a protocol are ignored.
    pub fn protocols(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| e.amm.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Events whose validator satisfies `keep`.
    pub fn filter_validators<F>(&self, keep: F) -> Dataset
    where
        F: Fn(&str) -> bool,
    {
        self.subset(|e| keep(&e.validator))
    }

    /// Events emitted by `protocol`. Fails when the protocol never appears.
    pub fn filter_protocol(&self, protocol: &str) -> Result<Dataset, DatasetError> {
        let subset = self.subset(|e| e.amm.as_deref() == Some(protocol));
        if subset.is_empty() {
            return Err(DatasetError::UnknownProtocol {
                protocol: protocol.to_string(),
                available: self.protocols(),
            });
        }
        Ok(subset)
    }

    /// Events inside `window`.
    pub fn filter_window(&self, window: &TimeWindow) -> Dataset {
        self.subset(|e| window.contains(e.time))
    }

    /// Share (0-100) of this dataset's events that `other` holds.
    pub fn share_pct(&self, other: &Dataset) -> f64 {
        if self.events.is_empty() {
            return 0.0;
        }
        other.len() as f64 / self.len() as f64 * 100.0
    }

    fn subset<F>(&self, keep: F) -> Dataset
    where
        F: Fn(&AmmEvent) -> bool,
    {
        Dataset {
            events: self.events.iter().filter(|e| keep(e)).cloned().collect(),
            origin: self.origin.clone(),
        }
    }
}
