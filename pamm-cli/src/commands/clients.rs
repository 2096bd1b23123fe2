use std::path::PathBuf;

use comfy_table::Cell;
use pamm_report::client_report::read_client_report;
use pamm_report::dashboard::client_dashboard;
use pamm_report::format::{
    format_count, format_decimal, format_pct, format_signed_pct, print_heading, print_kv,
    print_success, style_info,
};
use pamm_report::markdown::{comparison_markdown, interpretation, write_markdown};
use pamm_report::table::{cell_right, data_table, print_table};
use pamm_stats::clients::{ClientComparison, ClientMetrics};
use pamm_stats::spike::SpikeAnalysis;
use pamm_types::ClientType;

use crate::commands::{load_dataset, require_file};
use crate::config::PammConfig;
use crate::error::CliError;

pub const ANALYSIS_STEM: &str = "validator_client_analysis";

pub fn run(config: &PammConfig, client_report: Option<&str>) -> Result<(), CliError> {
    let report_path = client_report
        .map(PathBuf::from)
        .unwrap_or_else(|| config.client_report_path(config.analysis.group_limit));
    require_file(&report_path, "run `pamm group` first or pass --client-report")?;
    let mapping = read_client_report(&report_path)?;
    tracing::info!(
        jito = mapping.count(ClientType::JitoSolana),
        harmonic = mapping.count(ClientType::Harmonic),
        other = mapping.count(ClientType::Other),
        "loaded client mapping"
    );

    let dataset = load_dataset(config)?;
    let mapped = dataset.filter_validators(|v| mapping.contains(v));
    tracing::info!(
        events = mapped.len(),
        retained_pct = dataset.share_pct(&mapped),
        "restricted dataset to mapped validators"
    );
    let spike_config = config.spike_config()?;
    let comparison = ClientComparison::compute(dataset.events(), &mapping, config.analysis.bin_secs)?;
    let spike = SpikeAnalysis::compute(dataset.events(), &mapping, &comparison, spike_config);

    config.ensure_output_dir()?;
    let md_path = config.output_path(&format!("{ANALYSIS_STEM}.md"));
    write_markdown(&md_path, &comparison_markdown(&comparison, Some(&spike)))?;
    let html_path = config.output_path(&format!("{ANALYSIS_STEM}.html"));
    client_dashboard(&comparison, &spike)
        .write_html(&html_path, "Validator Client Performance: Jito-solana vs Harmonic")?;

    print_summary(&comparison, &spike);
    println!();
    print_success(&format!("Wrote {}", md_path.display()));
    print_success(&format!("Wrote {}", html_path.display()));
    Ok(())
}

fn print_summary(cmp: &ClientComparison, spike: &SpikeAnalysis) {
    print_heading("Jito-solana vs Harmonic");
    print_kv("Mapped events", format!(
        "{} ({} of dataset)",
        format_count(cmp.mapped_events as u64),
        format_pct(cmp.mapped_share_pct())
    ));
    println!();

    let mut table = data_table(&[
        "Client",
        "Validators",
        "Events",
        "Blocks",
        "Share",
        "Events/validator",
        "Mean events/slot",
        "Median",
        "CV",
    ]);
    for m in [&cmp.jito, &cmp.harmonic] {
        table.add_row(metrics_row(m));
    }
    print_table(&table);
    println!();

    let r = &cmp.ratios;
    print_kv("Events/validator ratio", format!("{:.2}x", r.events_per_validator_ratio));
    print_kv("Events/slot ratio", format!("{:.2}x", r.events_per_slot_ratio));
    print_kv("Efficiency difference", format_signed_pct(r.efficiency_diff_pct));
    println!("  {}", style_info().apply_to(interpretation(r.verdict)));

    if !spike.clients.is_empty() {
        println!();
        let mut table = data_table(&["Client", "Spike avg", "Blocks", "Events", "Baseline", "Change"]);
        for client in ClientType::COMPARED {
            if let Some(s) = spike.client(client) {
                table.add_row(vec![
                    Cell::new(client.as_str()),
                    cell_right(format_decimal(s.avg, 2)),
                    cell_right(s.blocks),
                    cell_right(format_count(s.total_events)),
                    cell_right(format_decimal(s.baseline, 2)),
                    cell_right(s.change_pct().map_or_else(|| "n/a".to_string(), format_signed_pct)),
                ]);
            }
        }
        print_kv("Spike window", spike.config.window.label());
        print_table(&table);
    }
}

fn metrics_row(m: &ClientMetrics) -> Vec<Cell> {
    vec![
        Cell::new(m.client.as_str()),
        cell_right(m.validators),
        cell_right(format_count(m.total_events)),
        cell_right(format_count(m.unique_slots)),
        cell_right(format_pct(m.volume_share_pct)),
        cell_right(format_decimal(m.avg_events_per_validator, 1)),
        cell_right(format_decimal(m.efficiency.mean, 2)),
        cell_right(format_decimal(m.efficiency.median, 2)),
        cell_right(m.efficiency.cv().map_or_else(|| "n/a".to_string(), |cv| format_decimal(cv, 3))),
    ]
}
