//! nvram - non-volatile attribute store CLI
//!
//! Persists key/value attributes across power cycles, replicated over
//! two backing copies per section.

use clap::{CommandFactory, FromArgMatches};
use nvram_core::{Config, StoreManager};

mod args;
mod output;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(config.debug);

    let matches = args::Cli::command().get_matches();
    let cli = args::Cli::from_arg_matches(&matches)?;
    let request = args::collect_request(&cli, &matches)?;

    let mut manager = StoreManager::open(&config)?;
    let response = manager.execute(&request)?;
    output::print_response(&response, cli.format);
    Ok(())
}

fn init_logging(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::WARN.into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
