use chrono::Local;
use comfy_table::Cell;
use pamm_report::format::{format_count, print_heading, print_kv, print_success, print_warning, short_id};
use pamm_report::jito_report::{render_jito_report, write_jito_csv};
use pamm_report::table::{cell_right, data_table, print_table};
use pamm_stats::grouping::JitoExtraction;

use crate::commands::{load_ranking, open_cache};
use crate::config::PammConfig;
use crate::error::CliError;

pub fn run(config: &PammConfig, limit: usize) -> Result<JitoExtraction, CliError> {
    let ranking = load_ranking(config)?;
    let cache = open_cache(config)?;
    let extraction = JitoExtraction::run(&ranking, |id| cache.get(id), limit);

    config.ensure_output_dir()?;
    let now = Local::now();
    let stem = format!("top{limit}_jito_by_slots_{}", now.format("%Y%m%d_%H%M%S"));
    let txt_path = config.output_path(&format!("{stem}.txt"));
    let csv_path = config.output_path(&format!("{stem}.csv"));
    let source = config
        .ranking_report_path(config.analysis.ranking_depth)
        .display()
        .to_string();
    std::fs::write(&txt_path, render_jito_report(&extraction, &source, now))?;
    write_jito_csv(&csv_path, &extraction)?;
    tracing::info!(
        found = extraction.picks.len(),
        checked = extraction.checked,
        missing = extraction.missing.len(),
        "extracted Jito-solana validators"
    );

    print_heading(&format!("Top {limit} Jito-solana validators by slots"));
    print_kv("Validators checked", extraction.checked);
    print_kv("Jito-solana found", extraction.picks.len());
    print_kv("Missing metadata", extraction.missing.len());
    println!();
    let mut table = data_table(&["#", "Rank", "Validator", "Name", "Slots", "Events"]);
    for (i, pick) in extraction.picks.iter().enumerate() {
        table.add_row(vec![
            cell_right(i + 1),
            cell_right(pick.rank),
            Cell::new(short_id(&pick.validator_id, 12)),
            Cell::new(pick.name.as_deref().unwrap_or("Unknown")),
            cell_right(format_count(pick.slots)),
            cell_right(format_count(pick.events)),
        ]);
    }
    print_table(&table);
    println!();
    if !extraction.is_complete() {
        print_warning(&format!(
            "Only {} of {} Jito-solana validators found; fetch more metadata",
            extraction.picks.len(),
            limit
        ));
    }
    print_success(&format!("Wrote {}", txt_path.display()));
    print_success(&format!("Wrote {}", csv_path.display()));
    Ok(extraction)
}
