use clap::Parser;
use tracing::debug;
use tracing_log::AsTrace;
use velomenaj::cli::{Cli, Command};
use velomenaj::commands;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // stdout carries command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.verbosity.log_level_filter().as_trace())
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    debug!(config = ?cli);

    let config = commands::load_config(cli.conffile.as_deref(), cli.data_dir.as_deref())?;

    match cli.command {
        Command::Render { year, out } => {
            commands::render(&config, year, &out).await?;
        }
        Command::Stats { top, derive } => {
            commands::stats(&config, top, derive, &mut std::io::stdout().lock()).await?;
        }
        Command::Config => commands::dump_config(&config, &mut std::io::stdout().lock())?,
        Command::Watch => commands::watch(&config).await?,
    }
    Ok(())
}
