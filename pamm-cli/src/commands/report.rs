use pamm_report::format::print_success;
use pamm_report::markdown::{write_markdown, DatasetOverview};

use crate::commands::load_dataset;
use crate::config::PammConfig;
use crate::error::CliError;

pub const OVERVIEW_REPORT_FILE: &str = "propamm_overview.md";

pub fn run(config: &PammConfig) -> Result<(), CliError> {
    let dataset = load_dataset(config)?;
    let overview = DatasetOverview::compute(&dataset, config.analysis.top_validators)?;
    config.ensure_output_dir()?;
    let path = config.output_path(OVERVIEW_REPORT_FILE);
    write_markdown(&path, &overview.to_markdown())?;
    print_success(&format!("Wrote {}", path.display()));
    Ok(())
}
