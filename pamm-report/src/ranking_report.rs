use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Local};
use pamm_stats::ranking::RankingSummary;
use pamm_types::RankedValidator;

use crate::error::ReportError;
use crate::format::{format_count, parse_count};

const RULE_WIDTH: usize = 85;

/// Slot ranking report for a contiguous rank range.
#[derive(Debug, Clone)]
pub struct RankingReport<'a> {
    pub title: String,
    pub source: String,
    pub block_range: Option<(u64, u64)>,
    pub generated_at: DateTime<Local>,
    pub entries: &'a [RankedValidator],
    pub summary: RankingSummary,
    /// Label used in the summary, e.g. `Top 100 validators` or `Ranks 21-100`.
    pub selection_label: String,
}

impl RankingReport<'_> {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let totals = &self.summary.totals;
        let _ = writeln!(out, "# {}", self.title);
        let _ = writeln!(out, "# Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "# Source: {}", self.source);
        if let Some((start, end)) = self.block_range {
            let _ = writeln!(
                out,
                "# Block range: {start}-{end} (~{} blocks)",
                format_count(end.saturating_sub(start))
            );
        }
        let _ = writeln!(out, "# Total validators in dataset: {}", format_count(totals.validators as u64));
        let _ = writeln!(out, "#{}", "=".repeat(78));
        out.push('\n');

        let _ = writeln!(
            out,
            "{:<6} {:<45} {:<15} {:<15}",
            "Rank", "Validator ID", "Unique Slots", "Total Events"
        );
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
        for entry in self.entries {
            let _ = writeln!(
                out,
                "{:<6} {:<45} {:>13}  {:>13}",
                entry.rank,
                entry.validator,
                format_count(entry.unique_slots),
                format_count(entry.total_events)
            );
        }

        let s = &self.summary;
        out.push('\n');
        let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
        let _ = writeln!(out, "SUMMARY STATISTICS");
        let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
        let _ = writeln!(out, "Total unique validators: {}", format_count(totals.validators as u64));
        let _ = writeln!(out, "Total unique slots in dataset: {}", format_count(totals.unique_slots as u64));
        let _ = writeln!(out, "Total events in dataset: {}", format_count(totals.events as u64));
        out.push('\n');
        let _ = writeln!(out, "{} represent:", self.selection_label);
        let _ = writeln!(
            out,
            "  • {} slots ({:.1}% of total)",
            format_count(s.selected_slots),
            s.slot_share_pct
        );
        let _ = writeln!(
            out,
            "  • {} events ({:.1}% of total)",
            format_count(s.selected_events),
            s.event_share_pct
        );
        let _ = writeln!(out, "Average slots per validator: {:.1}", s.avg_slots_per_validator);
        let _ = writeln!(out, "Average events per slot: {:.1}", s.events_per_slot);
        out
    }

    pub fn write_text(&self, path: &Path) -> Result<(), ReportError> {
        std::fs::write(path, self.render_text())?;
        tracing::info!(path = %path.display(), entries = self.entries.len(), "wrote ranking report");
        Ok(())
    }
}

/// `Rank,Validator_ID,Unique_Slots,Total_Events` CSV.
pub fn write_ranking_csv(path: &Path, entries: &[RankedValidator]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Rank", "Validator_ID", "Unique_Slots", "Total_Events"])?;
    for entry in entries {
        writer.write_record([
            entry.rank.to_string(),
            entry.validator.clone(),
            entry.unique_slots.to_string(),
            entry.total_events.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse the table rows of a ranking text report.
///
/// Comment, header, separator, summary and blank lines are skipped. Any
/// line whose first field is an integer rank is a row and must carry a
/// validator id and both counts.
pub fn parse_ranking_report(text: &str) -> Result<Vec<RankedValidator>, ReportError> {
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("Rank")
            || trimmed.starts_with('-')
            || trimmed.starts_with('=')
        {
            continue;
        }
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let Ok(rank) = parts[0].parse::<usize>() else {
            continue;
        };
        let parse_err = |reason: &str| ReportError::Parse {
            line: idx + 1,
            reason: reason.to_string(),
        };
        if parts.len() < 4 {
            return Err(parse_err("expected rank, validator id, slots and events"));
        }
        let unique_slots = parse_count(parts[2]).ok_or_else(|| parse_err("invalid slot count"))?;
        let total_events = parse_count(parts[3]).ok_or_else(|| parse_err("invalid event count"))?;
        entries.push(RankedValidator {
            rank,
            validator: parts[1].to_string(),
            unique_slots,
            total_events,
        });
    }
    Ok(entries)
}

pub fn read_ranking_report(path: &Path) -> Result<Vec<RankedValidator>, ReportError> {
    let text = std::fs::read_to_string(path)?;
    let entries = parse_ranking_report(&text)?;
    if entries.is_empty() {
        return Err(ReportError::EmptyReport);
    }
    tracing::debug!(path = %path.display(), entries = entries.len(), "parsed ranking report");
    Ok(entries)
}

/// Validator ids whose rank falls in `first..=last`.
pub fn ids_in_rank_range(entries: &[RankedValidator], first: usize, last: usize) -> Vec<String> {
    entries
        .iter()
        .filter(|e| (first..=last).contains(&e.rank))
        .map(|e| e.validator.clone())
        .collect()
}
