use clap::Parser;
use pamm_cli::cli::{self, Cli};
use pamm_report::format::print_error;
use tracing_subscriber::EnvFilter;

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = cli::load_config(&cli);

    // RUST_LOG wins over the configured level.
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Fatal error: failed to create Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };
    rt.block_on(async {
        let result = match config {
            Ok(config) => cli::run(cli, config).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::error!("Fatal error: {}", e);
            print_error(&e.to_string());
            std::process::exit(1);
        }
    });
}
