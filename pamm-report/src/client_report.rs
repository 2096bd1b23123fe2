use std::fmt::Write as _;
use std::path::Path;

use pamm_stats::grouping::ClientGroups;
use pamm_types::{ClientMapping, ClientType};

use crate::error::ReportError;

const ERRORS_HEADER: &str = "=== Errors/Incomplete Data ===";

/// Group name of a `=== Top N Validators for <group> ===` header.
fn section_group(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("===")?.strip_suffix("===")?.trim();
    let rest = inner.strip_prefix("Top")?.trim_start();
    let (count, rest) = rest.split_once(char::is_whitespace)?;
    count.parse::<usize>().ok()?;
    let name = rest.trim_start().strip_prefix("Validators for")?.trim();
    (!name.is_empty()).then_some(name)
}

/// Render the per-client top validators report.
pub fn render_client_report(groups: &ClientGroups) -> String {
    let mut out = String::new();
    for client in ClientType::ALL {
        let _ = writeln!(out, "=== Top {} Validators for {} ===", groups.limit, client);
        let _ = writeln!(out, "{:<5} {:<44} {:>10} {:>10}", "Rank", "Validator ID", "Slots", "Events");
        let _ = writeln!(out, "{}", "-".repeat(75));
        for (i, entry) in groups.group(client).iter().enumerate() {
            let count = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |n| n.to_string());
            let _ = writeln!(
                out,
                "{:<5} {:<44} {:>10} {:>10}",
                i + 1,
                entry.validator_id,
                count(entry.slots),
                count(entry.events)
            );
        }
        out.push('\n');
    }
    if !groups.errors.is_empty() {
        let _ = writeln!(out, "{ERRORS_HEADER}");
        for err in &groups.errors {
            let _ = writeln!(out, "{}: {}", err.path, err.error);
        }
    }
    out
}

/// Build the validator → client mapping from a client group report.
///
/// Rows are assigned to the client named by the closest preceding section
/// header. Rows outside a recognised section are ignored.
pub fn parse_client_report(text: &str) -> Result<ClientMapping, ReportError> {
    let mut mapping = ClientMapping::new();
    let mut current: Option<ClientType> = None;

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("===") {
            current = match section_group(trimmed) {
                Some(name) => {
                    let client = ClientType::from_group_name(name).ok_or_else(|| ReportError::Parse {
                        line: idx + 1,
                        reason: format!("unknown client group '{name}'"),
                    })?;
                    Some(client)
                }
                None => None,
            };
            continue;
        }
        let Some(client) = current else {
            continue;
        };
        let mut parts = trimmed.split_whitespace();
        let (Some(rank), Some(id)) = (parts.next(), parts.next()) else {
            continue;
        };
        if rank.parse::<usize>().is_ok() {
            mapping.assign(id, client);
        }
    }

    tracing::debug!(
        validators = mapping.len(),
        jito = mapping.count(ClientType::JitoSolana),
        harmonic = mapping.count(ClientType::Harmonic),
        "parsed client report"
    );
    Ok(mapping)
}

pub fn read_client_report(path: &Path) -> Result<ClientMapping, ReportError> {
    let text = std::fs::read_to_string(path)?;
    let mapping = parse_client_report(&text)?;
    if mapping.is_empty() {
        return Err(ReportError::EmptyReport);
    }
    Ok(mapping)
}
