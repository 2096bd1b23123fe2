use std::collections::BTreeSet;
use std::path::PathBuf;

use pamm_report::format::{print_heading, print_kv, print_success, print_warning};
use pamm_report::reconcile::{IdExtractor, Reconciliation};

use crate::commands::{open_cache, require_file};
use crate::config::PammConfig;
use crate::error::CliError;

pub fn run(config: &PammConfig, report: Option<&str>) -> Result<Reconciliation, CliError> {
    let report_path = report
        .map(PathBuf::from)
        .unwrap_or_else(|| config.client_report_path(config.analysis.group_limit));
    require_file(&report_path, "run `pamm group` first or pass --report")?;

    let text = std::fs::read_to_string(&report_path)?;
    let report_ids = IdExtractor::new()?.extract(&text);
    let cache_ids: BTreeSet<String> = open_cache(config)?.cached_ids()?.into_iter().collect();
    let result = Reconciliation::compute(report_ids, cache_ids);
    tracing::info!(
        report = result.report_ids.len(),
        cache = result.cache_ids.len(),
        both = result.in_both.len(),
        "reconciled report against metadata cache"
    );

    print_heading("Report vs metadata cache");
    print_kv("Ids in report", result.report_ids.len());
    print_kv("Ids in cache", result.cache_ids.len());
    print_kv("In both", result.in_both.len());
    print_id_list("Only in cache", &result.only_in_cache);
    print_id_list("Only in report", &result.only_in_report);
    println!();
    if result.is_consistent() {
        print_success("Report and cache list the same validators");
    } else {
        print_warning(&format!(
            "{} id(s) differ between {} and the cache",
            result.only_in_cache.len() + result.only_in_report.len(),
            report_path.display()
        ));
    }
    Ok(result)
}

fn print_id_list(label: &str, ids: &[String]) {
    print_kv(label, ids.len());
    for id in ids {
        println!("      {id}");
    }
}
