use clap::{Parser, Subcommand};

use crate::commands;
use crate::config::{PammConfig, CONFIG_FILE};
use crate::error::CliError;

#[derive(Parser)]
#[command(
    name = "pamm",
    about = "PropAMM validator analytics: slot rankings, client metadata and block packing reports",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    pub config: String,
    /// Override the Parquet dataset path
    #[arg(long, global = true)]
    pub dataset: Option<String>,
    /// Override the output directory
    #[arg(long, global = true)]
    pub output_dir: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a default pamm.toml
    Init {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        dir: String,
    },
    /// Rank validators by unique slots and write the ranking reports
    Rank {
        /// Depth of the full ranking report
        #[arg(short, long)]
        top: Option<usize>,
        /// First rank of the fetch selection (1-based, inclusive)
        #[arg(long)]
        from: Option<usize>,
        /// Last rank of the fetch selection (inclusive)
        #[arg(long)]
        to: Option<usize>,
    },
    /// Fetch validators.app metadata for a rank range
    Fetch {
        #[arg(long)]
        from: Option<usize>,
        #[arg(long)]
        to: Option<usize>,
        /// Seconds between uncached requests (0 disables pacing)
        #[arg(long)]
        delay: Option<f64>,
        /// validators.app network, e.g. "mainnet" or "testnet"
        #[arg(long)]
        network: Option<String>,
        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },
    /// Group cached validators by client software
    Group {
        /// Validators listed per client type
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Extract the top Jito-solana validators by slots
    Jito {
        /// Number of Jito-solana validators to collect
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Compare validator ids in a client report with the metadata cache
    Reconcile {
        /// Report to scan (defaults to the client group report)
        #[arg(short, long)]
        report: Option<String>,
    },
    /// Render the overview and per-protocol HTML dashboards
    Dashboard {
        /// Protocol to render a focus dashboard for (repeatable)
        #[arg(short, long = "protocol")]
        protocols: Vec<String>,
        /// Skip the overview dashboard
        #[arg(long)]
        no_overview: bool,
    },
    /// Compare Jito-solana and Harmonic block packing efficiency
    Clients {
        /// Client group report to read the mapping from
        #[arg(long)]
        client_report: Option<String>,
    },
    /// Write the markdown dataset overview
    Report,
}

/// Config for this invocation. `init` ignores any existing file so a broken
/// `pamm.toml` can be rewritten.
pub fn load_config(cli: &Cli) -> Result<PammConfig, CliError> {
    match cli.command {
        Command::Init { .. } => Ok(PammConfig::default()),
        _ => PammConfig::load(&cli.config),
    }
}

pub async fn run(cli: Cli, mut config: PammConfig) -> Result<(), CliError> {
    if let Some(path) = cli.dataset {
        config.dataset.path = path;
    }
    if let Some(dir) = cli.output_dir {
        config.output.dir = dir;
    }

    match cli.command {
        Command::Init { dir } => commands::init::run(&dir),
        Command::Rank { top, from, to } => {
            let a = &config.analysis;
            let top = top.unwrap_or(a.ranking_depth);
            let from = from.unwrap_or(a.fetch_first_rank);
            let to = to.unwrap_or(a.fetch_last_rank);
            commands::rank::run(&config, top, from, to)
        }
        Command::Fetch {
            from,
            to,
            delay,
            network,
            quiet,
        } => {
            if let Some(delay) = delay {
                config.api.request_delay_secs = delay;
            }
            if let Some(network) = network {
                config.api.network = network;
            }
            let from = from.unwrap_or(config.analysis.fetch_first_rank);
            let to = to.unwrap_or(config.analysis.fetch_last_rank);
            commands::fetch::run(&config, from, to, !quiet).await
        }
        Command::Group { limit } => {
            let limit = limit.unwrap_or(config.analysis.group_limit);
            commands::group::run(&config, limit).map(drop)
        }
        Command::Jito { limit } => {
            let limit = limit.unwrap_or(config.analysis.jito_target);
            commands::jito::run(&config, limit).map(drop)
        }
        Command::Reconcile { report } => {
            commands::reconcile::run(&config, report.as_deref()).map(drop)
        }
        Command::Dashboard {
            protocols,
            no_overview,
        } => {
            let protocols = if protocols.is_empty() {
                config.analysis.focus_protocols.clone()
            } else {
                protocols
            };
            commands::dashboard::run(&config, &protocols, !no_overview)
        }
        Command::Clients { client_report } => {
            commands::clients::run(&config, client_report.as_deref())
        }
        Command::Report => commands::report::run(&config),
    }
}
