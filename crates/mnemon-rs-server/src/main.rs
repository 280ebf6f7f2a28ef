//! Stdio MCP memory server.
//! CLI entry point — see lib.rs for the reusable request handler.

use anyhow::Context;
use clap::Parser;
use log::info;
use mnemon_rs_config::MnemonConfig;
use mnemon_rs_server::Server;
use mnemon_rs_store::Store;
use std::path::PathBuf;

/// Command-line options for the memory server.
#[derive(Parser)]
#[command(name = "mnemon-server", version)]
struct Cli {
    /// Override the data directory from the environment/config.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = MnemonConfig::from_env().context("failed to load config")?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.clone()),
    )
    .format_timestamp_millis()
    .try_init();

    info!(
        "starting memory server (data_dir={}, max_results={})",
        config.storage.data_dir.display(),
        config.search.max_results
    );

    let store = Store::open(config.storage).context("failed to open memory store")?;
    let server = Server::new(store, config.search.max_results);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let result = server
        .run(stdin.lock(), stdout.lock())
        .context("server loop failed");

    server.close().context("failed to close memory store")?;
    result
}
