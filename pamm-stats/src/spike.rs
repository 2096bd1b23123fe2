use std::collections::{BTreeMap, HashMap};

use pamm_types::constants::{
    DEFAULT_PEAK_SLOTS, DEFAULT_SPIKE_CONTEXT_END, DEFAULT_SPIKE_CONTEXT_START, DEFAULT_SPIKE_END,
    DEFAULT_SPIKE_START,
};
use pamm_types::{AmmEvent, ClientMapping, ClientType, TimeWindow};
use serde::Serialize;

use crate::clients::ClientComparison;
use crate::error::StatsError;

/// Spike window, the surrounding context window and how many peaks to highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpikeConfig {
    pub window: TimeWindow,
    pub context: TimeWindow,
    pub peak_count: usize,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            window: TimeWindow {
                start: DEFAULT_SPIKE_START,
                end: DEFAULT_SPIKE_END,
            },
            context: TimeWindow {
                start: DEFAULT_SPIKE_CONTEXT_START,
                end: DEFAULT_SPIKE_CONTEXT_END,
            },
            peak_count: DEFAULT_PEAK_SLOTS,
        }
    }
}

impl SpikeConfig {
    pub fn new(window: TimeWindow, context: TimeWindow, peak_count: usize) -> Result<Self, StatsError> {
        if window.start < context.start || window.end > context.end {
            return Err(StatsError::SpikeOutsideContext);
        }
        Ok(Self {
            window,
            context,
            peak_count,
        })
    }
}

/// One slot of the context scatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotPoint {
    pub slot: u64,
    pub events: u64,
    pub in_spike: bool,
}

/// Spike-window figures for one client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSpike {
    pub client: ClientType,
    /// Mean events per slot inside the spike window.
    pub avg: f64,
    pub total_events: u64,
    pub blocks: u64,
    /// Mean events per slot over the whole dataset.
    pub baseline: f64,
}

impl ClientSpike {
    /// Change of the spike average against the baseline, in percent.
    pub fn change_pct(&self) -> Option<f64> {
        (self.baseline > 0.0).then(|| (self.avg - self.baseline) / self.baseline * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikeAnalysis {
    pub config: SpikeConfig,
    /// Per-client slot scatter over the context window, ordered by slot.
    pub context: BTreeMap<ClientType, Vec<SlotPoint>>,
    /// Clients without events in the spike window are absent.
    pub clients: BTreeMap<ClientType, ClientSpike>,
    /// Highest-event slots of the spike window, busiest first.
    pub peak_slots: Vec<SlotPoint>,
    /// First and last slot produced inside the spike window.
    pub slot_span: Option<(u64, u64)>,
}

impl SpikeAnalysis {
    /// Analyse the spike window for the mapped Jito-solana and Harmonic
    /// validators, using each client's overall mean from `comparison` as its
    /// baseline.
    pub fn compute(
        events: &[AmmEvent],
        mapping: &ClientMapping,
        comparison: &ClientComparison,
        config: SpikeConfig,
    ) -> Self {
        let mut context_counts: HashMap<ClientType, BTreeMap<u64, (u64, bool)>> = HashMap::new();
        for event in events.iter().filter(|e| config.context.contains(e.time)) {
            let Some(client) = mapping.get(&event.validator) else {
                continue;
            };
            if client == ClientType::Other {
                continue;
            }
            let entry = context_counts
                .entry(client)
                .or_default()
                .entry(event.slot)
                .or_insert((0, false));
            entry.0 += 1;
            entry.1 |= config.window.contains(event.time);
        }

        let context: BTreeMap<ClientType, Vec<SlotPoint>> = context_counts
            .into_iter()
            .map(|(client, slots)| {
                let points = slots
                    .into_iter()
                    .map(|(slot, (events, in_spike))| SlotPoint {
                        slot,
                        events,
                        in_spike,
                    })
                    .collect();
                (client, points)
            })
            .collect();

        // Spike figures count only events timestamped inside the window.
        let mut spike_counts: HashMap<ClientType, BTreeMap<u64, u64>> = HashMap::new();
        for event in events.iter().filter(|e| config.window.contains(e.time)) {
            if let Some(client) = mapping.get(&event.validator).filter(|c| *c != ClientType::Other) {
                *spike_counts
                    .entry(client)
                    .or_default()
                    .entry(event.slot)
                    .or_insert(0) += 1;
            }
        }

        let mut clients = BTreeMap::new();
        let mut spike_points = Vec::new();
        for (client, slots) in &spike_counts {
            let total_events: u64 = slots.values().sum();
            let blocks = slots.len() as u64;
            let baseline = comparison
                .metrics(*client)
                .map(|m| m.mean_events_per_slot())
                .unwrap_or(0.0);
            clients.insert(
                *client,
                ClientSpike {
                    client: *client,
                    avg: total_events as f64 / blocks as f64,
                    total_events,
                    blocks,
                    baseline,
                },
            );
            spike_points.extend(slots.iter().map(|(slot, events)| SlotPoint {
                slot: *slot,
                events: *events,
                in_spike: true,
            }));
        }

        let slot_span = spike_points
            .iter()
            .map(|p| p.slot)
            .min()
            .zip(spike_points.iter().map(|p| p.slot).max());

        spike_points.sort_by(|a, b| b.events.cmp(&a.events).then(a.slot.cmp(&b.slot)));
        spike_points.truncate(config.peak_count);

        tracing::debug!(
            window = %config.window.label(),
            clients = clients.len(),
            peaks = spike_points.len(),
            "analysed spike window"
        );

        Self {
            config,
            context,
            clients,
            peak_slots: spike_points,
            slot_span,
        }
    }

    pub fn is_peak(&self, slot: u64) -> bool {
        self.peak_slots.iter().any(|p| p.slot == slot)
    }

    pub fn client(&self, client: ClientType) -> Option<&ClientSpike> {
        self.clients.get(&client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pamm_types::EventKind;

    fn ev(slot: u64, time: i64, validator: &str) -> AmmEvent {
        AmmEvent {
            slot,
            time,
            validator: validator.to_string(),
            amm: None,
            kind: EventKind::Trade,
        }
    }

    fn mapping() -> ClientMapping {
        let mut m = ClientMapping::new();
        m.assign("J", ClientType::JitoSolana);
        m.assign("H", ClientType::Harmonic);
        m
    }

    fn config() -> SpikeConfig {
        SpikeConfig::new(
            TimeWindow::new(100, 200).unwrap(),
            TimeWindow::new(0, 400).unwrap(),
            2,
        )
        .unwrap()
    }

    fn events() -> Vec<AmmEvent> {
        let mut events = Vec::new();
        // Outside the context window.
        for _ in 0..2 {
            events.push(ev(1, 1000, "J"));
            events.push(ev(2, 1000, "H"));
        }
        // Context only.
        for _ in 0..2 {
            events.push(ev(10, 50, "J"));
            events.push(ev(11, 50, "H"));
        }
        // Spike window.
        for _ in 0..4 {
            events.push(ev(20, 150, "J"));
        }
        for _ in 0..10 {
            events.push(ev(21, 160, "H"));
        }
        for _ in 0..6 {
            events.push(ev(22, 170, "H"));
        }
        events
    }

    #[test]
    fn test_spike_outside_context_rejected() {
        let err = SpikeConfig::new(
            TimeWindow::new(100, 500).unwrap(),
            TimeWindow::new(0, 400).unwrap(),
            2,
        )
        .unwrap_err();
        assert_eq!(err, StatsError::SpikeOutsideContext);
    }

    #[test]
    fn test_spike_metrics() {
        let events = events();
        let cmp = ClientComparison::compute(&events, &mapping(), 300).unwrap();
        let spike = SpikeAnalysis::compute(&events, &mapping(), &cmp, config());

        let h = spike.client(ClientType::Harmonic).unwrap();
        assert_eq!(h.total_events, 16);
        assert_eq!(h.blocks, 2);
        assert!((h.avg - 8.0).abs() < 1e-9);
        // Harmonic overall: slots 2, 11, 21, 22 with 2, 2, 10, 6 events -> mean 5.
        assert!((h.baseline - 5.0).abs() < 1e-9);
        assert!((h.change_pct().unwrap() - 60.0).abs() < 1e-9);

        let j = spike.client(ClientType::JitoSolana).unwrap();
        assert_eq!(j.blocks, 1);
        assert!((j.avg - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_context_scatter_and_peaks() {
        let events = events();
        let cmp = ClientComparison::compute(&events, &mapping(), 300).unwrap();
        let spike = SpikeAnalysis::compute(&events, &mapping(), &cmp, config());

        let h = &spike.context[&ClientType::Harmonic];
        assert_eq!(h.len(), 3);
        assert!(!h[0].in_spike);
        assert!(h[1].in_spike);

        let peaks: Vec<u64> = spike.peak_slots.iter().map(|p| p.slot).collect();
        assert_eq!(peaks, vec![21, 22]);
        assert!(spike.is_peak(21));
        assert!(!spike.is_peak(20));
        assert_eq!(spike.slot_span, Some((20, 22)));
    }

    #[test]
    fn test_default_window_excludes_last_second() {
        let events = vec![
            ev(29, DEFAULT_SPIKE_START - 60, "H"),
            ev(30, DEFAULT_SPIKE_START, "J"),
            ev(31, DEFAULT_SPIKE_START + 298, "J"),
            // 16:24:59 falls outside the default window.
            ev(32, DEFAULT_SPIKE_START + 299, "J"),
        ];
        let cmp = ClientComparison::compute(&events, &mapping(), 300).unwrap();
        let spike = SpikeAnalysis::compute(&events, &mapping(), &cmp, SpikeConfig::default());
        assert_eq!(spike.config.window.label(), "16:20-16:24");
        assert_eq!(spike.client(ClientType::JitoSolana).unwrap().blocks, 2);
        assert_eq!(spike.slot_span, Some((30, 31)));
    }

    #[test]
    fn test_empty_window_has_no_clients() {
        let events = events();
        let cmp = ClientComparison::compute(&events, &mapping(), 300).unwrap();
        let config = SpikeConfig::new(
            TimeWindow::new(300, 350).unwrap(),
            TimeWindow::new(0, 400).unwrap(),
            2,
        )
        .unwrap();
        let spike = SpikeAnalysis::compute(&events, &mapping(), &cmp, config);
        assert!(spike.clients.is_empty());
        assert!(spike.peak_slots.is_empty());
        assert_eq!(spike.slot_span, None);
    }
}
