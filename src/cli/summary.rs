use anyhow::{Context, Result};
use std::path::Path;

use mzscan::store::StoreConfig;

use super::open_store;

/// Summarize every scan header in a file
pub fn run(file: &Path, config: StoreConfig, json: bool) -> Result<()> {
    let mut store = open_store(file, config)?;
    let summary = store.summary().context("Failed to summarize scans")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
    } else {
        print!("{}", summary);
    }
    Ok(())
}
