use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use pamm_types::constants::UNKNOWN_PROTOCOL;
use pamm_types::time::{floor_to_bin, hour_of_day};
use pamm_types::{AmmEvent, EventKind};
use serde::Serialize;

use crate::error::StatsError;

/// Number of events recorded in each slot, ordered by slot.
pub fn events_per_slot(events: &[AmmEvent]) -> BTreeMap<u64, u64> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.slot).or_insert(0) += 1;
    }
    counts
}

/// Centered rolling mean over `window` consecutive values.
///
/// Positions whose window would run past either end yield `None`. For an
/// even window the extra element sits on the leading side.
pub fn centered_rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>, StatsError> {
    if window == 0 {
        return Err(StatsError::InvalidWindow);
    }
    let n = values.len();
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for v in values {
        prefix.push(prefix[prefix.len() - 1] + v);
    }

    let offset = (window - 1) / 2;
    Ok((0..n)
        .map(|i| {
            let end = i + 1 + offset;
            if end > n || end < window {
                return None;
            }
            let start = end - window;
            Some((prefix[end] - prefix[start]) / window as f64)
        })
        .collect())
}

/// Events per block with its centered rolling average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockThroughput {
    pub slots: Vec<u64>,
    pub counts: Vec<u64>,
    pub rolling_mean: Vec<Option<f64>>,
    pub window: usize,
}

impl BlockThroughput {
    pub fn compute(events: &[AmmEvent], window: usize) -> Result<Self, StatsError> {
        let per_slot = events_per_slot(events);
        let slots: Vec<u64> = per_slot.keys().copied().collect();
        let counts: Vec<u64> = per_slot.values().copied().collect();
        let values: Vec<f64> = counts.iter().map(|c| *c as f64).collect();
        let rolling_mean = centered_rolling_mean(&values, window)?;
        Ok(Self {
            slots,
            counts,
            rolling_mean,
            window,
        })
    }

    /// Every `stride`-th block, starting from the first one.
    pub fn sampled(&self, stride: usize) -> Vec<(u64, Option<f64>)> {
        let stride = stride.max(1);
        self.slots
            .iter()
            .zip(&self.rolling_mean)
            .step_by(stride)
            .map(|(slot, mean)| (*slot, *mean))
            .collect()
    }
}

/// Event counts per time bin (bin start in unix seconds).
pub fn activity_series(events: &[AmmEvent], bin_secs: i64) -> Result<BTreeMap<i64, u64>, StatsError> {
    let mut series = BTreeMap::new();
    for event in events {
        *series.entry(floor_to_bin(event.time, bin_secs)?).or_insert(0) += 1;
    }
    Ok(series)
}

/// Event counts per time bin, split by protocol label (`Unknown` included).
pub fn time_series_by_protocol(
    events: &[AmmEvent],
    bin_secs: i64,
) -> Result<BTreeMap<String, BTreeMap<i64, u64>>, StatsError> {
    let mut series: BTreeMap<String, BTreeMap<i64, u64>> = BTreeMap::new();
    for event in events {
        let bin = floor_to_bin(event.time, bin_secs)?;
        *series
            .entry(event.protocol_label().to_string())
            .or_default()
            .entry(bin)
            .or_insert(0) += 1;
    }
    Ok(series)
}

/// Event counts per UTC hour of day. Hours without events are absent.
pub fn hourly_activity(events: &[AmmEvent]) -> BTreeMap<u32, u64> {
    let mut hours = BTreeMap::new();
    for event in events {
        *hours.entry(hour_of_day(event.time)).or_insert(0) += 1;
    }
    hours
}

/// A label with its count and share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub count: u64,
    pub pct: f64,
}

/// Protocol market share, excluding events without a protocol.
pub fn protocol_share(events: &[AmmEvent]) -> Vec<Share> {
    let counts = value_counts(
        events
            .iter()
            .map(|e| e.protocol_label())
            .filter(|label| *label != UNKNOWN_PROTOCOL),
    );
    to_shares(counts.into_iter().map(|(label, count)| (label.to_string(), count)))
}

/// Event kind counts, most frequent first.
pub fn kind_counts(events: &[AmmEvent]) -> Vec<(EventKind, u64)> {
    value_counts(events.iter().map(|e| e.kind.clone()))
}

/// Event kind shares, most frequent first.
pub fn kind_shares(events: &[AmmEvent]) -> Vec<Share> {
    to_shares(
        kind_counts(events)
            .into_iter()
            .map(|(kind, count)| (kind.as_str().to_string(), count)),
    )
}

/// The `n` validators with the most events.
pub fn top_validators_by_events(events: &[AmmEvent], n: usize) -> Vec<(String, u64)> {
    let mut counts = value_counts(events.iter().map(|e| e.validator.as_str()));
    counts.truncate(n);
    counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect()
}

/// Count occurrences, most frequent first; ties ordered by key.
pub fn value_counts<K, I>(items: I) -> Vec<(K, u64)>
where
    K: Eq + Hash + Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts: HashMap<K, u64> = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    let mut counts: Vec<(K, u64)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn to_shares(counts: impl Iterator<Item = (String, u64)>) -> Vec<Share> {
    let counts: Vec<(String, u64)> = counts.collect();
    let total: u64 = counts.iter().map(|(_, c)| c).sum();
    counts
        .into_iter()
        .map(|(label, count)| Share {
            pct: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
            label,
            count,
        })
        .collect()
}
