use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Local};
use pamm_stats::grouping::JitoExtraction;
use pamm_types::constants::{JITO_SOFTWARE_CLIENT, JITO_SOFTWARE_CLIENT_ID};

use crate::error::ReportError;
use crate::format::short_id;

const RULE: usize = 100;
const NAME_WIDTH: usize = 30;

fn display_name(name: Option<&str>) -> &str {
    name.filter(|n| !n.is_empty()).unwrap_or("Unknown")
}

/// Text report of a Jito-solana extraction run.
pub fn render_jito_report(
    extraction: &JitoExtraction,
    source: &str,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "TOP {} JITO-SOLANA VALIDATORS (BY SLOTS PROCESSED)",
        extraction.target
    );
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Source: {source}");
    let _ = writeln!(
        out,
        "Criteria: software_client = '{JITO_SOFTWARE_CLIENT}' AND software_client_id = {JITO_SOFTWARE_CLIENT_ID}"
    );
    let _ = writeln!(out, "{rule}");
    out.push('\n');

    let _ = writeln!(
        out,
        "{:<6} {:<45} {:<12} {:<12} {:<30}",
        "Rank", "Validator ID", "Slots", "Events", "Name"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE));
    for pick in &extraction.picks {
        let _ = writeln!(
            out,
            "{:<6} {:<45} {:<12} {:<12} {:<30}",
            pick.rank,
            pick.validator_id,
            pick.slots,
            pick.events,
            short_id(display_name(pick.name.as_deref()), NAME_WIDTH)
        );
    }

    out.push('\n');
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "SUMMARY");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total validators checked: {}", extraction.checked);
    let _ = writeln!(out, "Jito-solana validators found: {}", extraction.picks.len());
    let _ = writeln!(out, "Missing JSON files: {}", extraction.missing.len());
    if !extraction.missing.is_empty() {
        let _ = writeln!(out, "\nValidators with missing JSON files:");
        for (rank, id) in &extraction.missing {
            let _ = writeln!(out, "  Rank {rank}: {id}");
        }
    }
    out
}

/// `rank,validator_id,slots,events,name,software_client,software_client_id` CSV.
pub fn write_jito_csv(path: &Path, extraction: &JitoExtraction) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "rank",
        "validator_id",
        "slots",
        "events",
        "name",
        "software_client",
        "software_client_id",
    ])?;
    for pick in &extraction.picks {
        writer.write_record([
            pick.rank.to_string(),
            pick.validator_id.clone(),
            pick.slots.to_string(),
            pick.events.to_string(),
            display_name(pick.name.as_deref()).to_string(),
            pick.software_client.clone().unwrap_or_default(),
            pick.software_client_id.map(|id| id.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
