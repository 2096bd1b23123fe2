use std::collections::{HashMap, HashSet};

use pamm_types::{AmmEvent, PammError, RankedValidator, ValidatorStats};
use rayon::prelude::*;
use serde::Serialize;

type SlotTally<'a> = HashMap<&'a str, (HashSet<u64>, u64)>;

/// Unique slots and total events per validator, in no particular order.
///
/// Events are tallied per rayon split and the partial maps merged, so a slot
/// seen in two splits is still counted once.
pub fn validator_stats(events: &[AmmEvent]) -> Vec<ValidatorStats> {
    let per_validator = events
        .par_iter()
        .fold(SlotTally::new, |mut tally, event| {
            let entry = tally.entry(event.validator.as_str()).or_default();
            entry.0.insert(event.slot);
            entry.1 += 1;
            tally
        })
        .reduce(SlotTally::new, merge_tallies);
    per_validator
        .into_iter()
        .map(|(validator, (slots, total_events))| ValidatorStats {
            validator: validator.to_string(),
            unique_slots: slots.len() as u64,
            total_events,
        })
        .collect()
}

fn merge_tallies<'a>(mut left: SlotTally<'a>, right: SlotTally<'a>) -> SlotTally<'a> {
    for (validator, (slots, events)) in right {
        let entry = left.entry(validator).or_default();
        entry.0.extend(slots);
        entry.1 += events;
    }
    left
}

/// Rank validators by unique slots produced.
///
/// Ties on slots are broken by total events (descending), then by validator
/// id so the ranking is deterministic.
pub fn rank_validators(events: &[AmmEvent]) -> Vec<RankedValidator> {
    let mut stats = validator_stats(events);
    stats.par_sort_unstable_by(|a, b| {
        b.unique_slots
            .cmp(&a.unique_slots)
            .then_with(|| b.total_events.cmp(&a.total_events))
            .then_with(|| a.validator.cmp(&b.validator))
    });
    stats
        .into_iter()
        .enumerate()
        .map(|(i, s)| RankedValidator {
            rank: i + 1,
            validator: s.validator,
            unique_slots: s.unique_slots,
            total_events: s.total_events,
        })
        .collect()
}

/// Inclusive 1-based rank slice (`first..=last`), clipped to the ranking length.
pub fn select_ranks(
    ranking: &[RankedValidator],
    first: usize,
    last: usize,
) -> Result<&[RankedValidator], PammError> {
    if first == 0 || first > last {
        return Err(PammError::InvalidRankRange { first, last });
    }
    let start = (first - 1).min(ranking.len());
    let end = last.min(ranking.len());
    Ok(&ranking[start..end])
}

/// Whole-dataset totals the ranking summaries are compared against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetTotals {
    pub validators: usize,
    pub unique_slots: usize,
    pub events: usize,
}

impl DatasetTotals {
    pub fn compute(events: &[AmmEvent]) -> Self {
        Self {
            validators: events
                .iter()
                .map(|e| e.validator.as_str())
                .collect::<HashSet<_>>()
                .len(),
            unique_slots: events.iter().map(|e| e.slot).collect::<HashSet<_>>().len(),
            events: events.len(),
        }
    }
}

/// How much of the dataset a rank selection accounts for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingSummary {
    pub totals: DatasetTotals,
    pub selected: usize,
    pub selected_slots: u64,
    pub selected_events: u64,
    pub slot_share_pct: f64,
    pub event_share_pct: f64,
    pub avg_slots_per_validator: f64,
    pub events_per_slot: f64,
}

impl RankingSummary {
    pub fn compute(totals: DatasetTotals, selection: &[RankedValidator]) -> Self {
        let selected_slots: u64 = selection.iter().map(|v| v.unique_slots).sum();
        let selected_events: u64 = selection.iter().map(|v| v.total_events).sum();
        let pct = |part: f64, whole: usize| {
            if whole == 0 {
                0.0
            } else {
                part / whole as f64 * 100.0
            }
        };
        Self {
            slot_share_pct: pct(selected_slots as f64, totals.unique_slots),
            event_share_pct: pct(selected_events as f64, totals.events),
            avg_slots_per_validator: if selection.is_empty() {
                0.0
            } else {
                selected_slots as f64 / selection.len() as f64
            },
            events_per_slot: if selected_slots == 0 {
                0.0
            } else {
                selected_events as f64 / selected_slots as f64
            },
            totals,
            selected: selection.len(),
            selected_slots,
            selected_events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pamm_types::EventKind;
    use proptest::prelude::*;

    fn ev(slot: u64, validator: &str) -> AmmEvent {
        AmmEvent {
            slot,
            time: 0,
            validator: validator.to_string(),
            amm: None,
            kind: EventKind::Oracle,
        }
    }

    fn sample() -> Vec<AmmEvent> {
        vec![
            ev(1, "A"),
            ev(1, "A"),
            ev(1, "A"),
            ev(2, "B"),
            ev(3, "B"),
            ev(4, "C"),
            ev(5, "C"),
            ev(5, "C"),
            ev(6, "D"),
        ]
    }

    #[test]
    fn test_validator_stats() {
        let mut stats = validator_stats(&sample());
        stats.sort_by(|a, b| a.validator.cmp(&b.validator));
        assert_eq!(stats[0].validator, "A");
        assert_eq!(stats[0].unique_slots, 1);
        assert_eq!(stats[0].total_events, 3);
        assert_eq!(stats[2].unique_slots, 2);
        assert_eq!(stats[2].total_events, 3);
    }

    #[test]
    fn test_rank_order_and_tie_breaks() {
        let ranking = rank_validators(&sample());
        let order: Vec<&str> = ranking.iter().map(|r| r.validator.as_str()).collect();
        // C and B both have 2 slots; C has more events. A and D both have 1 slot; A has more events.
        assert_eq!(order, vec!["C", "B", "A", "D"]);
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[3].rank, 4);
    }

    #[test]
    fn test_select_ranks() {
        let ranking = rank_validators(&sample());
        let next = select_ranks(&ranking, 2, 3).unwrap();
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].rank, 2);
        // Clipped to the ranking length.
        assert_eq!(select_ranks(&ranking, 3, 100).unwrap().len(), 2);
        assert!(select_ranks(&ranking, 10, 20).unwrap().is_empty());
        assert!(select_ranks(&ranking, 0, 5).is_err());
        assert!(select_ranks(&ranking, 5, 4).is_err());
    }

    #[test]
    fn test_ranking_summary() {
        let events = sample();
        let ranking = rank_validators(&events);
        let totals = DatasetTotals::compute(&events);
        assert_eq!(totals.validators, 4);
        assert_eq!(totals.unique_slots, 6);
        let summary = RankingSummary::compute(totals, select_ranks(&ranking, 1, 2).unwrap());
        assert_eq!(summary.selected, 2);
        assert_eq!(summary.selected_slots, 4);
        assert_eq!(summary.selected_events, 5);
        assert!((summary.slot_share_pct - 4.0 / 6.0 * 100.0).abs() < 1e-9);
        assert!((summary.event_share_pct - 5.0 / 9.0 * 100.0).abs() < 1e-9);
        assert!((summary.avg_slots_per_validator - 2.0).abs() < 1e-9);
        assert!((summary.events_per_slot - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_ranking_summary_empty_selection() {
        let summary = RankingSummary::compute(
            DatasetTotals {
                validators: 0,
                unique_slots: 0,
                events: 0,
            },
            &[],
        );
        assert_eq!(summary.slot_share_pct, 0.0);
        assert_eq!(summary.events_per_slot, 0.0);
    }

    #[test]
    fn test_merge_tallies_dedups_slots() {
        let mut left = SlotTally::new();
        left.insert("A", (HashSet::from([1, 2]), 3));
        let mut right = SlotTally::new();
        right.insert("A", (HashSet::from([2, 3]), 2));
        right.insert("B", (HashSet::from([9]), 1));
        let merged = merge_tallies(left, right);
        assert_eq!(merged["A"].0.len(), 3);
        assert_eq!(merged["A"].1, 5);
        assert_eq!(merged["B"].1, 1);
    }

    proptest! {
        #[test]
        fn prop_validator_stats_match_sequential(raw in prop::collection::vec((0u64..40, 0usize..6), 0..2000)) {
            let events: Vec<AmmEvent> = raw
                .iter()
                .map(|(slot, v)| ev(*slot, &format!("V{v}")))
                .collect();
            let mut expected: HashMap<String, (HashSet<u64>, u64)> = HashMap::new();
            for (slot, v) in &raw {
                let entry = expected.entry(format!("V{v}")).or_default();
                entry.0.insert(*slot);
                entry.1 += 1;
            }
            let stats = validator_stats(&events);
            prop_assert_eq!(stats.len(), expected.len());
            for s in stats {
                let (slots, total) = &expected[&s.validator];
                prop_assert_eq!(s.unique_slots, slots.len() as u64);
                prop_assert_eq!(s.total_events, *total);
            }
        }

        #[test]
        fn prop_ranking_sorted_and_complete(raw in prop::collection::vec((0u64..50, 0usize..8), 0..300)) {
            let events: Vec<AmmEvent> = raw
                .iter()
                .map(|(slot, v)| ev(*slot, &format!("V{v}")))
                .collect();
            let ranking = rank_validators(&events);
            let total: u64 = ranking.iter().map(|r| r.total_events).sum();
            prop_assert_eq!(total as usize, events.len());
            for pair in ranking.windows(2) {
                prop_assert!(pair[0].unique_slots >= pair[1].unique_slots);
                prop_assert_eq!(pair[1].rank, pair[0].rank + 1);
            }
        }
    }
}
