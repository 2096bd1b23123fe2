use comfy_table::Cell;
use pamm_report::client_report::render_client_report;
use pamm_report::format::{
    format_count, print_heading, print_kv, print_success, print_warning, short_id, style_bold,
};
use pamm_report::ranking_report::read_ranking_report;
use pamm_report::table::{cell_right, data_table, print_table};
use pamm_stats::grouping::{ClientGroups, GroupEntry, GroupError};
use pamm_types::ClientType;

use crate::commands::open_cache;
use crate::config::PammConfig;
use crate::error::CliError;

const NAME_CHARS: usize = 24;

pub fn run(config: &PammConfig, limit: usize) -> Result<ClientGroups, CliError> {
    let cache = open_cache(config)?;
    let (records, failures) = cache.load_all()?;
    let errors = failures
        .into_iter()
        .map(|(path, error)| GroupError {
            path: path.display().to_string(),
            error,
        })
        .collect();

    let ranking_path = config.ranking_report_path(config.analysis.ranking_depth);
    let ranking = if ranking_path.exists() {
        Some(read_ranking_report(&ranking_path)?)
    } else {
        tracing::warn!(
            path = %ranking_path.display(),
            "ranking report not found, using slot counts from metadata"
        );
        None
    };

    let groups = ClientGroups::build(&records, ranking.as_deref(), errors, limit);
    config.ensure_output_dir()?;
    let report_path = config.client_report_path(limit);
    std::fs::write(&report_path, render_client_report(&groups))?;
    tracing::info!(path = %report_path.display(), "wrote client group report");

    print_heading("Validators by client");
    print_kv("Metadata records", records.len());
    for client in ClientType::ALL {
        let total = groups.totals.get(&client).copied().unwrap_or(0);
        print_kv(client.as_str(), total);
    }
    for client in ClientType::ALL {
        let entries = groups.group(client);
        if entries.is_empty() {
            continue;
        }
        println!();
        let title = format!("Top {} {}", entries.len(), client);
        println!("  {}", style_bold().apply_to(title));
        print_group(entries);
    }
    println!();
    if !groups.errors.is_empty() {
        print_warning(&format!("{} metadata file(s) could not be read", groups.errors.len()));
    }
    print_success(&format!("Wrote {}", report_path.display()));
    Ok(groups)
}

fn print_group(entries: &[GroupEntry]) {
    let mut table = data_table(&["#", "Validator", "Name", "Slots", "Events"]);
    let count = |v: Option<u64>| v.map_or_else(|| "-".to_string(), format_count);
    for (i, entry) in entries.iter().enumerate() {
        let name: String = entry.name.as_deref().unwrap_or("").chars().take(NAME_CHARS).collect();
        table.add_row(vec![
            cell_right(i + 1),
            Cell::new(short_id(&entry.validator_id, 12)),
            Cell::new(name),
            cell_right(count(entry.slots)),
            cell_right(count(entry.events)),
        ]);
    }
    print_table(&table);
}
