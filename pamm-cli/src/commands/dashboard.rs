use std::path::PathBuf;

use pamm_report::dashboard::{overview_dashboard, protocol_dashboard, protocol_dashboard_file, OverviewOptions};
use pamm_report::format::{format_count, print_heading, print_kv, print_success};

use crate::commands::load_dataset;
use crate::config::PammConfig;
use crate::error::CliError;

pub const OVERVIEW_FILE: &str = "dashboard_propamm.html";

pub fn run(config: &PammConfig, protocols: &[String], overview: bool) -> Result<(), CliError> {
    let dataset = load_dataset(config)?;
    config.ensure_output_dir()?;
    let mut written: Vec<PathBuf> = Vec::new();

    if overview {
        let opts = OverviewOptions {
            bin_secs: config.analysis.bin_secs,
            rolling_window: config.analysis.rolling_window,
            sample_stride: config.analysis.sample_stride,
            top_validators: config.analysis.top_validators,
        };
        let path = config.output_path(OVERVIEW_FILE);
        overview_dashboard(&dataset, &opts)?.write_html(&path, "PropAMM Analytics Dashboard")?;
        written.push(path);
    }

    for protocol in protocols {
        let figure = protocol_dashboard(&dataset, protocol, config.analysis.top_validators)?;
        let path = config.output_path(&protocol_dashboard_file(protocol));
        figure.write_html(&path, &format!("{protocol} Dashboard"))?;
        written.push(path);
    }

    print_heading("Dashboards");
    print_kv("Events", format_count(dataset.len() as u64));
    print_kv("Protocols", dataset.protocols().join(", "));
    println!();
    for path in &written {
        print_success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}
