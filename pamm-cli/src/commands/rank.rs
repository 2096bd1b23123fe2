use chrono::Local;
use pamm_report::format::{format_count, print_heading, print_kv, print_success};
use pamm_report::ranking_report::{write_ranking_csv, RankingReport};
use pamm_report::table::{cell_right, data_table, print_table};
use pamm_stats::ranking::{rank_validators, select_ranks, DatasetTotals, RankingSummary};
use pamm_types::RankedValidator;

use crate::commands::load_dataset;
use crate::config::PammConfig;
use crate::error::CliError;

const PREVIEW_ROWS: usize = 10;

pub fn run(config: &PammConfig, top: usize, from: usize, to: usize) -> Result<(), CliError> {
    let dataset = load_dataset(config)?;
    let ranking = rank_validators(dataset.events());
    let totals = DatasetTotals::compute(dataset.events());
    config.ensure_output_dir()?;
    let generated_at = Local::now();

    let top_entries = select_ranks(&ranking, 1, top)?;
    let top_report = RankingReport {
        title: format!("Top {top} Validators by Unique Slots"),
        source: dataset.origin().to_string(),
        block_range: config.block_range(),
        generated_at,
        entries: top_entries,
        summary: RankingSummary::compute(totals.clone(), top_entries),
        selection_label: format!("Top {top} validators"),
    };
    let top_path = config.ranking_report_path(top);
    top_report.write_text(&top_path)?;
    let csv_path = top_path.with_extension("csv");
    write_ranking_csv(&csv_path, top_entries)?;

    let range_entries = select_ranks(&ranking, from, to)?;
    let range_report = RankingReport {
        title: format!("Validators Ranked {from}-{to} by Unique Slots"),
        source: dataset.origin().to_string(),
        block_range: config.block_range(),
        generated_at,
        entries: range_entries,
        summary: RankingSummary::compute(totals, range_entries),
        selection_label: format!("Ranks {from}-{to}"),
    };
    let range_path = config.output_path(&format!("validators_{from}_{to}_by_slots.txt"));
    range_report.write_text(&range_path)?;

    print_heading("Validator ranking");
    print_kv("Validators in dataset", format_count(top_report.summary.totals.validators as u64));
    print_kv("Unique slots", format_count(top_report.summary.totals.unique_slots as u64));
    print_kv("Events", format_count(top_report.summary.totals.events as u64));
    print_kv(
        &format!("Top {top} slot share"),
        format!("{:.1}%", top_report.summary.slot_share_pct),
    );
    println!();
    print_preview(top_entries);
    println!();
    print_success(&format!("Wrote {}", top_path.display()));
    print_success(&format!("Wrote {}", csv_path.display()));
    print_success(&format!(
        "Wrote {} ({} validators)",
        range_path.display(),
        range_entries.len()
    ));
    Ok(())
}

fn print_preview(entries: &[RankedValidator]) {
    let mut table = data_table(&["Rank", "Validator ID", "Unique Slots", "Total Events"]);
    for entry in entries.iter().take(PREVIEW_ROWS) {
        table.add_row(vec![
            cell_right(entry.rank),
            comfy_table::Cell::new(&entry.validator),
            cell_right(format_count(entry.unique_slots)),
            cell_right(format_count(entry.total_events)),
        ]);
    }
    print_table(&table);
}
