//! windstat CLI - wind turbine production reports from live telemetry

use clap::Parser;

mod aggregate;
mod cache;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod output;
mod period;

use cli::args::GlobalOptions;
use cli::{CacheCommands, Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `warn` by default, `debug` with `--debug`; `RUST_LOG` overrides both
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init => cli::init::run(&opts),
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("windstat version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Now => cli::report::now(&opts).await,
        Commands::Last30 => cli::report::last30(&opts).await,
        Commands::Months => cli::report::months(&opts).await,
        Commands::Years => cli::report::years(&opts).await,
        Commands::Ytd => cli::report::ytd(&opts).await,
        Commands::Month { month } => cli::report::month(&opts, month).await,
        Commands::Year { year } => cli::report::year(&opts, year).await,
        Commands::Snapshot { year } => cli::report::snapshot(&opts, year).await,
        Commands::Export(ref export_cmd) => cli::export::run(&opts, export_cmd).await,
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(&opts),
            CacheCommands::Clear => cli::cache::clear(&opts),
            CacheCommands::Path => cli::cache::path(&opts),
        },
    }
}
