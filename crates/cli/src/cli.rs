use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};

/// Velomenaj: cycling infrastructure layers for the Lyon metropolitan area
///
/// Reads the precomputed infrastructure, counter, prediction and score files
/// and turns them into styled map layers for a selected year.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// Data directory (or base URL for the http source). Overrides
    /// `data.root` from the configuration.
    #[arg(short, long)]
    pub data_dir: Option<String>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write the styled layers of one year as GeoJSON files.
    Render {
        /// Year to render. Defaults to the configured or latest year.
        #[arg(short, long)]
        year: Option<i32>,

        /// Output directory, created if missing.
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Print the statistics panel as JSON.
    Stats {
        /// Number of rows. Defaults to `layers.stats_top`.
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        top: Option<u16>,

        /// Derive the rows from segments and counters even when a stats
        /// file exists.
        #[arg(long)]
        derive: bool,
    },

    /// Print the effective configuration as TOML.
    Config,

    /// Read years from stdin, one per line, and apply each selection.
    ///
    /// SIGHUP reloads the data files. SIGINT and SIGTERM stop.
    Watch,
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}
