//! # mzscan
//!
//! Command-line inspector for indexed mzXML and mzML scan files.
//!
//! ## Usage
//!
//! ```bash
//! # File-level metadata and index status
//! mzscan info run01.mzML
//!
//! # One scan header, or a scan with its peaks, as JSON
//! mzscan header run01.mzML 42 --json
//! mzscan scan run01.mzXML 42
//!
//! # Per-level counts and ranges over every header
//! mzscan summary run01.mzML
//!
//! # Compare the trailer index against a sequential scan
//! mzscan index run01.mzML --verify
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
