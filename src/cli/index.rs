use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use mzscan::store::{IndexSource, ScanStore, StoreConfig};

use super::{heading, open_store};

/// Show the offset index, optionally checked against a sequential scan
pub fn run(file: &Path, config: StoreConfig, list: bool, verify: bool) -> Result<()> {
    let mut store = open_store(file, config.clone())?;
    let source = store.index_source().context("Failed to acquire index")?;
    let table = store.offset_table()?.clone();

    println!("{}", heading("Offset Index"));
    println!("Source: {:?}", source);
    println!("Scans: {}", table.len());
    println!("Max scan number: {}", table.max_scan_number());

    if list {
        println!();
        for (scan_number, offset) in table.entries_by_offset() {
            println!("{:>8}  {:>14}", scan_number, offset);
        }
    }

    if verify {
        if source == IndexSource::Sequential {
            println!("Index was built sequentially; nothing to compare");
            return Ok(());
        }

        info!("Building sequential index for comparison...");
        let mut sequential = ScanStore::open_with_config(file, config.sequential_only())?;
        let rebuilt = sequential.offset_table()?;

        if rebuilt == &table {
            println!("Trailer index matches a sequential scan");
        } else {
            let missing = table
                .entries_by_offset()
                .into_iter()
                .filter(|(scan, offset)| rebuilt.get(*scan) != Some(*offset))
                .count();
            anyhow::bail!(
                "Trailer index differs from a sequential scan ({} trailer entries disagree, {} scans found sequentially)",
                missing,
                rebuilt.len()
            );
        }
    }

    Ok(())
}
