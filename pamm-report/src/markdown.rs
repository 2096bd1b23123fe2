use std::fmt::Write as _;
use std::path::Path;

use pamm_dataset::Dataset;
use pamm_stats::activity::{
    events_per_slot, hourly_activity, kind_shares, protocol_share, top_validators_by_events, Share,
};
use pamm_stats::clients::{ClientComparison, EfficiencyVerdict};
use pamm_stats::describe::Describe;
use pamm_stats::spike::SpikeAnalysis;
use pamm_types::time::format_timestamp;
use pamm_types::ClientType;

use crate::error::ReportError;
use crate::format::{format_count, format_decimal, format_signed_pct};

/// Headline figures of a dataset.
#[derive(Debug, Clone)]
pub struct DatasetOverview {
    pub origin: String,
    pub events: usize,
    pub unique_slots: usize,
    pub validators: usize,
    pub time_range: Option<(i64, i64)>,
    pub duration_hours: f64,
    pub slot_range: Option<(u64, u64)>,
    pub protocols: Vec<Share>,
    pub kinds: Vec<Share>,
    /// Distribution of events per block.
    pub throughput: Option<Describe>,
    pub busiest_block: Option<(u64, u64)>,
    pub top_validators: Vec<(String, u64)>,
    pub hourly: Vec<(u32, u64)>,
}

impl DatasetOverview {
    pub fn compute(dataset: &Dataset, top_n: usize) -> Result<Self, ReportError> {
        dataset.ensure_not_empty()?;
        let events = dataset.events();
        let per_slot = events_per_slot(events);
        let values: Vec<f64> = per_slot.values().map(|c| *c as f64).collect();
        let busiest_block = per_slot
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(s, c)| (*s, *c));
        Ok(Self {
            origin: dataset.origin().to_string(),
            events: dataset.len(),
            unique_slots: dataset.unique_slots(),
            validators: dataset.validator_count(),
            time_range: dataset.time_range(),
            duration_hours: dataset.duration_hours(),
            slot_range: dataset.slot_range(),
            protocols: protocol_share(events),
            kinds: kind_shares(events),
            throughput: Describe::from_values(&values),
            busiest_block,
            top_validators: top_validators_by_events(events, top_n),
            hourly: hourly_activity(events).into_iter().collect(),
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# PropAMM Dataset Overview\n");
        let _ = writeln!(out, "Source: `{}`\n", self.origin);

        let _ = writeln!(out, "## Summary\n");
        let _ = writeln!(out, "| Metric | Value |");
        let _ = writeln!(out, "|---|---:|");
        let _ = writeln!(out, "| Events | {} |", format_count(self.events as u64));
        let _ = writeln!(out, "| Unique slots | {} |", format_count(self.unique_slots as u64));
        let _ = writeln!(out, "| Validators | {} |", format_count(self.validators as u64));
        if let Some((first, last)) = self.slot_range {
            let _ = writeln!(out, "| Slot range | {first} - {last} |");
        }
        if let Some((start, end)) = self.time_range {
            let _ = writeln!(
                out,
                "| Time range (UTC) | {} - {} |",
                format_timestamp(start),
                format_timestamp(end)
            );
            let _ = writeln!(out, "| Duration | {:.2} h |", self.duration_hours);
        }
        out.push('\n');

        share_section(&mut out, "Protocols", "Protocol", &self.protocols);
        share_section(&mut out, "Event kinds", "Kind", &self.kinds);

        if let Some(t) = &self.throughput {
            let _ = writeln!(out, "## Block throughput\n");
            let _ = writeln!(out, "- Mean events per block: {:.2}", t.mean);
            let _ = writeln!(out, "- Median events per block: {:.1}", t.median);
            if let Some(std) = t.std {
                let _ = writeln!(out, "- Std deviation: {std:.2}");
            }
            if let Some((slot, count)) = self.busiest_block {
                let _ = writeln!(out, "- Busiest block: {slot} ({} events)", format_count(count));
            }
            out.push('\n');
        }

        if !self.top_validators.is_empty() {
            let _ = writeln!(out, "## Top {} validators by events\n", self.top_validators.len());
            let _ = writeln!(out, "| # | Validator | Events |");
            let _ = writeln!(out, "|---:|---|---:|");
            for (i, (validator, count)) in self.top_validators.iter().enumerate() {
                let _ = writeln!(out, "| {} | `{validator}` | {} |", i + 1, format_count(*count));
            }
            out.push('\n');
        }

        if !self.hourly.is_empty() {
            let _ = writeln!(out, "## Hourly activity (UTC)\n");
            let _ = writeln!(out, "| Hour | Events |");
            let _ = writeln!(out, "|---:|---:|");
            for (hour, count) in &self.hourly {
                let _ = writeln!(out, "| {hour:02}:00 | {} |", format_count(*count));
            }
            out.push('\n');
        }
        out
    }
}

fn share_section(out: &mut String, title: &str, column: &str, shares: &[Share]) {
    if shares.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {title}\n");
    let _ = writeln!(out, "| {column} | Events | Share |");
    let _ = writeln!(out, "|---|---:|---:|");
    for share in shares {
        let _ = writeln!(
            out,
            "| {} | {} | {:.1}% |",
            share.label,
            format_count(share.count),
            share.pct
        );
    }
    out.push('\n');
}

/// Markdown write-up of the Jito-solana vs Harmonic comparison.
pub fn comparison_markdown(cmp: &ClientComparison, spike: Option<&SpikeAnalysis>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Validator Client Performance: Jito-solana vs Harmonic\n");
    let _ = writeln!(
        out,
        "Mapped validators produced {} of {} events ({:.1}%).",
        format_count(cmp.mapped_events as u64),
        format_count(cmp.dataset_events as u64),
        cmp.mapped_share_pct()
    );
    if let Some((start, end)) = cmp.time_range {
        let _ = writeln!(
            out,
            "Time range: {} - {} UTC.",
            format_timestamp(start),
            format_timestamp(end)
        );
    }
    out.push('\n');

    let _ = writeln!(out, "## Block packing efficiency (events per slot)\n");
    let _ = writeln!(
        out,
        "| Client | Validators | Blocks | Events | Share | Mean ± Std | Median | CV | p95 | p99 |"
    );
    let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|---:|---:|---:|---:|");
    for m in [&cmp.jito, &cmp.harmonic] {
        let e = &m.efficiency;
        let std = e.std.map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}"));
        let cv = e.cv().map_or_else(|| "n/a".to_string(), |c| format!("{c:.3}"));
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {:.1}% | {:.2} ± {std} | {:.2} | {cv} | {:.1} | {:.1} |",
            m.client,
            m.validators,
            format_count(m.unique_slots),
            format_count(m.total_events),
            m.volume_share_pct,
            e.mean,
            e.median,
            m.percentiles.p95,
            m.percentiles.p99
        );
    }
    out.push('\n');

    let _ = writeln!(out, "## Normalized volume\n");
    let _ = writeln!(out, "| Client | Events / validator | Slots / validator |");
    let _ = writeln!(out, "|---|---:|---:|");
    for m in [&cmp.jito, &cmp.harmonic] {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            m.client,
            format_decimal(m.avg_events_per_validator, 1),
            format_decimal(m.avg_slots_per_validator, 1)
        );
    }
    out.push('\n');

    let _ = writeln!(out, "## Efficiency by event kind\n");
    let _ = writeln!(out, "| Kind | Jito-solana | Harmonic |");
    let _ = writeln!(out, "|---|---:|---:|");
    let mut kinds: Vec<&String> = cmp
        .jito
        .efficiency_by_kind
        .keys()
        .chain(cmp.harmonic.efficiency_by_kind.keys())
        .collect();
    kinds.sort();
    kinds.dedup();
    for kind in kinds {
        let cell = |v: Option<&f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        let _ = writeln!(
            out,
            "| {kind} | {} | {} |",
            cell(cmp.jito.efficiency_by_kind.get(kind)),
            cell(cmp.harmonic.efficiency_by_kind.get(kind))
        );
    }
    out.push('\n');

    let r = &cmp.ratios;
    let _ = writeln!(out, "## Comparison\n");
    let _ = writeln!(
        out,
        "- Difference: {:+.2} events/slot ({:+.1}%)",
        r.efficiency_diff, r.efficiency_diff_pct
    );
    let _ = writeln!(out, "- Events per slot ratio (Jito / Harmonic): {:.2}x", r.events_per_slot_ratio);
    let _ = writeln!(
        out,
        "- Events per validator ratio (Jito / Harmonic): {:.2}x",
        r.events_per_validator_ratio
    );
    let _ = writeln!(out, "\n**Interpretation:** {}\n", interpretation(r.verdict));
    let _ = writeln!(
        out,
        "Differences in total volume between client types mostly follow stake-weighted slot \
         assignment; events per slot is the like-for-like measure."
    );
    out.push('\n');

    if let Some(spike) = spike {
        spike_section(&mut out, spike);
    }
    out
}

/// One-line reading of the efficiency verdict.
pub fn interpretation(verdict: EfficiencyVerdict) -> String {
    match verdict {
        EfficiencyVerdict::Similar { diff_pct } => format!(
            "both clients show similar block packing efficiency ({diff_pct:+.1}%, under 10%)"
        ),
        EfficiencyVerdict::JitoAhead { diff_pct } => {
            format!("Jito-solana packs {diff_pct:.1}% more events per block")
        }
        EfficiencyVerdict::HarmonicAhead { diff_pct } => {
            format!("Harmonic packs {diff_pct:.1}% more events per block")
        }
    }
}

fn spike_section(out: &mut String, spike: &SpikeAnalysis) {
    let _ = writeln!(out, "## Spike window {}\n", spike.config.window.label());
    if spike.clients.is_empty() {
        let _ = writeln!(out, "No mapped validator produced blocks in this window.\n");
        return;
    }
    let _ = writeln!(out, "| Client | Avg events/slot | Blocks | Events | Baseline | Change |");
    let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|");
    for client in ClientType::COMPARED {
        if let Some(s) = spike.client(client) {
            let change = s.change_pct().map_or_else(|| "n/a".to_string(), format_signed_pct);
            let _ = writeln!(
                out,
                "| {client} | {:.2} | {} | {} | {:.2} | {change} |",
                s.avg,
                s.blocks,
                format_count(s.total_events),
                s.baseline
            );
        }
    }
    if !spike.peak_slots.is_empty() {
        let peaks: Vec<String> = spike
            .peak_slots
            .iter()
            .map(|p| format!("{} ({} events)", p.slot, p.events))
            .collect();
        let _ = writeln!(out, "\nPeak slots: {}", peaks.join(", "));
    }
    out.push('\n');
}

pub fn write_markdown(path: &Path, content: &str) -> Result<(), ReportError> {
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "wrote markdown report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pamm_stats::spike::SpikeConfig;
    use pamm_types::{AmmEvent, ClientMapping, EventKind, TimeWindow};

    fn ev(slot: u64, time: i64, validator: &str, amm: Option<&str>) -> AmmEvent {
        AmmEvent {
            slot,
            time,
            validator: validator.into(),
            amm: amm.map(str::to_string),
            kind: if slot % 2 == 0 { EventKind::Oracle } else { EventKind::Trade },
        }
    }

    fn events() -> Vec<AmmEvent> {
        let mut events = Vec::new();
        for slot in 0..10u64 {
            let validator = if slot < 5 { "J" } else { "H" };
            for _ in 0..=slot {
                events.push(ev(slot, 3600 + slot as i64 * 100, validator, Some("HumidiFi")));
            }
        }
        events.push(ev(20, 7300, "X", None));
        events
    }

    #[test]
    fn test_overview_markdown() {
        let dataset = Dataset::from_events(events(), "memory");
        let overview = DatasetOverview::compute(&dataset, 10).unwrap();
        assert_eq!(overview.events, 56);
        assert_eq!(overview.busiest_block, Some((9, 10)));
        let md = overview.to_markdown();
        assert!(md.starts_with("# PropAMM Dataset Overview"));
        assert!(md.contains("| Events | 56 |"));
        assert!(md.contains("| HumidiFi | 55 | 100.0% |"));
        assert!(md.contains("| 01:00 | 55 |"));
        assert!(md.contains("| 02:00 | 1 |"));
        assert!(md.contains("- Busiest block: 9 (10 events)"));
    }

    #[test]
    fn test_overview_rejects_empty_dataset() {
        let dataset = Dataset::from_events(Vec::new(), "memory");
        assert!(matches!(
            DatasetOverview::compute(&dataset, 10),
            Err(ReportError::Dataset(_))
        ));
    }

    #[test]
    fn test_comparison_markdown() {
        let events = events();
        let mut mapping = ClientMapping::new();
        mapping.assign("J", ClientType::JitoSolana);
        mapping.assign("H", ClientType::Harmonic);
        let cmp = ClientComparison::compute(&events, &mapping, 300).unwrap();
        let config = SpikeConfig::new(
            TimeWindow::new(4000, 4400).unwrap(),
            TimeWindow::new(3600, 7200).unwrap(),
            1,
        )
        .unwrap();
        let spike = SpikeAnalysis::compute(&events, &mapping, &cmp, config);
        let md = comparison_markdown(&cmp, Some(&spike));

        assert!(md.contains("| Jito-solana | 1 | 5 | 15 |"));
        assert!(md.contains("| Harmonic | 1 | 5 | 40 |"));
        assert!(md.contains("Harmonic packs 62.5% more events per block"));
        assert!(md.contains("## Spike window 01:06-01:13"));
        assert!(md.contains("Peak slots: 7 (8 events)"));
    }

    #[test]
    fn test_interpretation_similar() {
        let text = interpretation(EfficiencyVerdict::Similar { diff_pct: -4.0 });
        assert!(text.contains("similar"));
        assert!(text.contains("-4.0%"));
    }
}
