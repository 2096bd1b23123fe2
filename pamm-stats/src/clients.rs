use std::collections::{BTreeMap, HashMap, HashSet};

use pamm_types::constants::SIMILAR_EFFICIENCY_PCT;
use pamm_types::time::floor_to_bin;
use pamm_types::{AmmEvent, ClientMapping, ClientType};
use serde::Serialize;

use crate::describe::{Describe, Percentiles};
use crate::error::StatsError;

/// Block packing metrics of one client type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientMetrics {
    pub client: ClientType,
    /// Validators mapped to this client, whether or not they produced events.
    pub validators: usize,
    pub total_events: u64,
    pub unique_slots: u64,
    pub volume_share_pct: f64,
    pub avg_events_per_validator: f64,
    pub avg_slots_per_validator: f64,
    /// Distribution of events per slot.
    pub efficiency: Describe,
    pub percentiles: Percentiles,
    /// Event count per kind label.
    pub kind_counts: BTreeMap<String, u64>,
    pub kind_share_pct: BTreeMap<String, f64>,
    /// Mean events per slot for each kind, over the slots where that kind occurs.
    pub efficiency_by_kind: BTreeMap<String, f64>,
    /// (slot, events) for every slot produced by this client.
    pub slot_events: Vec<(u64, u64)>,
    /// Events per time bin.
    pub volume_series: BTreeMap<i64, u64>,
    /// Mean events per slot per time bin.
    pub efficiency_series: BTreeMap<i64, f64>,
}

impl ClientMetrics {
    pub fn mean_events_per_slot(&self) -> f64 {
        self.efficiency.mean
    }

    /// Event counts for each slot, in slot order.
    pub fn slot_event_values(&self) -> Vec<f64> {
        self.slot_events.iter().map(|(_, e)| *e as f64).collect()
    }
}

/// Outcome of comparing the per-slot efficiency of two clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EfficiencyVerdict {
    /// Difference under the similarity threshold.
    Similar { diff_pct: f64 },
    JitoAhead { diff_pct: f64 },
    HarmonicAhead { diff_pct: f64 },
}

/// Jito-solana relative to Harmonic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRatios {
    pub events_per_validator_ratio: f64,
    pub events_per_slot_ratio: f64,
    /// Jito minus Harmonic mean events per slot.
    pub efficiency_diff: f64,
    pub efficiency_diff_pct: f64,
    pub verdict: EfficiencyVerdict,
}

impl ComparisonRatios {
    fn compute(jito: &ClientMetrics, harmonic: &ClientMetrics) -> Self {
        let ratio = |a: f64, b: f64| if b > 0.0 { a / b } else { 0.0 };
        let jito_mean = jito.mean_events_per_slot();
        let harmonic_mean = harmonic.mean_events_per_slot();
        let efficiency_diff = jito_mean - harmonic_mean;
        let efficiency_diff_pct = if harmonic_mean > 0.0 {
            efficiency_diff / harmonic_mean * 100.0
        } else {
            0.0
        };
        let verdict = if efficiency_diff_pct.abs() < SIMILAR_EFFICIENCY_PCT {
            EfficiencyVerdict::Similar {
                diff_pct: efficiency_diff_pct,
            }
        } else if jito_mean > harmonic_mean {
            EfficiencyVerdict::JitoAhead {
                diff_pct: efficiency_diff_pct,
            }
        } else {
            EfficiencyVerdict::HarmonicAhead {
                diff_pct: -efficiency_diff_pct,
            }
        };
        Self {
            events_per_validator_ratio: ratio(
                jito.avg_events_per_validator,
                harmonic.avg_events_per_validator,
            ),
            events_per_slot_ratio: ratio(jito_mean, harmonic_mean),
            efficiency_diff,
            efficiency_diff_pct,
            verdict,
        }
    }
}

/// Jito-solana vs Harmonic block packing comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientComparison {
    pub jito: ClientMetrics,
    pub harmonic: ClientMetrics,
    pub ratios: ComparisonRatios,
    /// Events kept after restricting to mapped validators.
    pub mapped_events: usize,
    pub dataset_events: usize,
    pub time_range: Option<(i64, i64)>,
    pub bin_secs: i64,
}

impl ClientComparison {
    /// Compare the mapped Jito-solana and Harmonic validators.
    ///
    /// Validators mapped to other clients are ignored. Fails when either
    /// compared client has no events.
    pub fn compute(
        events: &[AmmEvent],
        mapping: &ClientMapping,
        bin_secs: i64,
    ) -> Result<Self, StatsError> {
        let mapping = mapping.restrict_to(&ClientType::COMPARED);
        if mapping.is_empty() {
            return Err(StatsError::EmptyMapping);
        }

        let mut by_client: HashMap<ClientType, Vec<&AmmEvent>> = HashMap::new();
        for event in events {
            if let Some(client) = mapping.get(&event.validator) {
                by_client.entry(client).or_default().push(event);
            }
        }
        let mapped_events: usize = by_client.values().map(Vec::len).sum();
        tracing::info!(
            mapped_events,
            dataset_events = events.len(),
            validators = mapping.len(),
            "filtered dataset to mapped validators"
        );

        let mut metrics = Vec::with_capacity(2);
        for client in ClientType::COMPARED {
            let client_events = by_client
                .get(&client)
                .filter(|e| !e.is_empty())
                .ok_or(StatsError::MissingClient(client))?;
            metrics.push(client_metrics(
                client,
                client_events,
                mapping.count(client),
                mapped_events,
                bin_secs,
            )?);
        }
        let harmonic = metrics.pop().ok_or(StatsError::MissingClient(ClientType::Harmonic))?;
        let jito = metrics.pop().ok_or(StatsError::MissingClient(ClientType::JitoSolana))?;
        let ratios = ComparisonRatios::compute(&jito, &harmonic);

        let times = by_client.values().flatten().map(|e| e.time);
        let time_range = times.clone().min().zip(times.max());

        Ok(Self {
            jito,
            harmonic,
            ratios,
            mapped_events,
            dataset_events: events.len(),
            time_range,
            bin_secs,
        })
    }

    pub fn metrics(&self, client: ClientType) -> Option<&ClientMetrics> {
        match client {
            ClientType::JitoSolana => Some(&self.jito),
            ClientType::Harmonic => Some(&self.harmonic),
            ClientType::Other => None,
        }
    }

    pub fn total_events(&self) -> u64 {
        self.jito.total_events + self.harmonic.total_events
    }

    pub fn mapped_share_pct(&self) -> f64 {
        if self.dataset_events == 0 {
            0.0
        } else {
            self.mapped_events as f64 / self.dataset_events as f64 * 100.0
        }
    }
}

fn client_metrics(
    client: ClientType,
    events: &[&AmmEvent],
    validators: usize,
    mapped_events: usize,
    bin_secs: i64,
) -> Result<ClientMetrics, StatsError> {
    let total_events = events.len() as u64;

    let mut per_slot: BTreeMap<u64, u64> = BTreeMap::new();
    let mut per_slot_kind: HashMap<(u64, &str), u64> = HashMap::new();
    let mut per_bin_slot: HashMap<(i64, u64), u64> = HashMap::new();
    let mut volume_series: BTreeMap<i64, u64> = BTreeMap::new();
    let mut kind_counts: BTreeMap<String, u64> = BTreeMap::new();

    for event in events {
        let bin = floor_to_bin(event.time, bin_secs)?;
        *per_slot.entry(event.slot).or_insert(0) += 1;
        *per_slot_kind.entry((event.slot, event.kind.as_str())).or_insert(0) += 1;
        *per_bin_slot.entry((bin, event.slot)).or_insert(0) += 1;
        *volume_series.entry(bin).or_insert(0) += 1;
        *kind_counts.entry(event.kind.as_str().to_string()).or_insert(0) += 1;
    }

    let slot_events: Vec<(u64, u64)> = per_slot.into_iter().collect();
    let values: Vec<f64> = slot_events.iter().map(|(_, e)| *e as f64).collect();
    let efficiency = Describe::from_values(&values).ok_or(StatsError::MissingClient(client))?;
    let percentiles = Percentiles::from_values(&values).ok_or(StatsError::MissingClient(client))?;
    let unique_slots = slot_events.len() as u64;

    let mut kind_groups: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for ((_, kind), count) in per_slot_kind {
        let entry = kind_groups.entry(kind.to_string()).or_insert((0, 0));
        entry.0 += count;
        entry.1 += 1;
    }
    let efficiency_by_kind = kind_groups
        .into_iter()
        .map(|(kind, (events, slots))| (kind, events as f64 / slots as f64))
        .collect();

    let mut bin_groups: BTreeMap<i64, (u64, u64)> = BTreeMap::new();
    for ((bin, _), count) in per_bin_slot {
        let entry = bin_groups.entry(bin).or_insert((0, 0));
        entry.0 += count;
        entry.1 += 1;
    }
    let efficiency_series = bin_groups
        .into_iter()
        .map(|(bin, (events, slots))| (bin, events as f64 / slots as f64))
        .collect();

    let kind_share_pct = kind_counts
        .iter()
        .map(|(kind, count)| (kind.clone(), *count as f64 / total_events as f64 * 100.0))
        .collect();

    let per_validator = |value: f64| {
        if validators == 0 {
            0.0
        } else {
            value / validators as f64
        }
    };

    Ok(ClientMetrics {
        client,
        validators,
        total_events,
        unique_slots,
        volume_share_pct: if mapped_events == 0 {
            0.0
        } else {
            total_events as f64 / mapped_events as f64 * 100.0
        },
        avg_events_per_validator: per_validator(total_events as f64),
        avg_slots_per_validator: per_validator(unique_slots as f64),
        efficiency,
        percentiles,
        kind_counts,
        kind_share_pct,
        efficiency_by_kind,
        slot_events,
        volume_series,
        efficiency_series,
    })
}
