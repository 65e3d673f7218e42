use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use mzscan::store::{ScanStore, StoreConfig};

mod config;
mod index;
mod info;
mod inspect;
mod summary;

/// mzscan - Indexed mzXML/mzML scan file inspector
#[derive(Parser)]
#[command(name = "mzscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Load store settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Ignore the trailer index and scan the file sequentially
    #[arg(long, global = true)]
    sequential: bool,

    // === Advanced tuning flags (hidden from --help) ===
    /// Bytes mapped per window
    #[arg(long, hide = true, global = true)]
    window_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display file-level metadata and index status
    Info {
        /// Input scan file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the header of one scan
    Header {
        /// Input scan file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Scan number
        #[arg(value_name = "SCAN")]
        scan: u32,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print one scan with its peaks
    Scan {
        /// Input scan file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Scan number
        #[arg(value_name = "SCAN")]
        scan: u32,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Maximum number of peaks to print in text mode
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Summarize every scan header in a file
    Summary {
        /// Input scan file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the offset index
    Index {
        /// Input scan file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print every scan number and offset
        #[arg(long)]
        list: bool,

        /// Also build the index sequentially and compare
        #[arg(long)]
        verify: bool,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    /// Store settings from the config file, then flags
    fn store_config(&self) -> Result<StoreConfig> {
        let mut store = match &self.config {
            Some(path) => config::Config::from_file(path)?.store,
            None => StoreConfig::default(),
        };
        if self.sequential {
            store = store.sequential_only();
        }
        if let Some(window_size) = self.window_size {
            store = store.with_window_size(window_size);
        }
        Ok(store)
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let config = cli.store_config()?;

    match cli.command {
        Commands::Info { file } => info::run(&file, config),
        Commands::Header { file, scan, json } => inspect::run_header(&file, config, scan, json),
        Commands::Scan {
            file,
            scan,
            json,
            limit,
        } => inspect::run_scan(&file, config, scan, json, limit),
        Commands::Summary { file, json } => summary::run(&file, config, json),
        Commands::Index { file, list, verify } => index::run(&file, config, list, verify),
    }
}

fn open_store(file: &Path, config: StoreConfig) -> Result<ScanStore> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }
    ScanStore::open_with_config(file, config)
        .with_context(|| format!("Failed to open {}", file.display()))
}

/// Section heading, colored when the feature is enabled
fn heading(text: &str) -> String {
    #[cfg(feature = "colorized_output")]
    {
        format!(
            "{}\n{}",
            console::style(text).bold().cyan(),
            console::style("=".repeat(text.len())).cyan()
        )
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        format!("{}\n{}", text, "=".repeat(text.len()))
    }
}
