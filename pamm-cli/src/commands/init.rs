use pamm_report::format::print_success;

use crate::config::PammConfig;
use crate::error::CliError;

pub fn run(dir: &str) -> Result<(), CliError> {
    let path = PammConfig::init(dir)?;
    tracing::info!("configuration initialized in {}", dir);
    print_success(&format!("Wrote {}", path.display()));
    Ok(())
}
