use anyhow::{Context, Result};
use std::path::Path;

use mzscan::store::StoreConfig;

use super::{heading, open_store};

/// Display file-level metadata and index status
pub fn run(file: &Path, config: StoreConfig) -> Result<()> {
    let mut store = open_store(file, config)?;

    println!("{}", heading("Scan File Information"));
    println!("File: {}", file.display());
    println!("Dialect: {}", store.dialect());
    println!();

    let info = store.file_info().context("Failed to read file metadata")?.clone();
    if let Some(run_id) = &info.run_id {
        println!("Run: {}", run_id);
    }
    if let Some(timestamp) = &info.start_timestamp {
        println!("Started: {}", timestamp);
    }
    if let (Some(start), Some(end)) = (info.start_time, info.end_time) {
        println!("Time range: {:.2} - {:.2} sec", start, end);
    }
    if let Some(count) = info.declared_scan_count {
        println!("Declared scans: {}", count);
    }

    let instrument = &info.instrument;
    for (label, value) in [
        ("Manufacturer", &instrument.manufacturer),
        ("Model", &instrument.model),
        ("Ionisation", &instrument.ionisation),
        ("Analyzer", &instrument.mass_analyzer),
        ("Detector", &instrument.detector),
    ] {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }

    if !info.parent_files.is_empty() {
        println!();
        println!("Source files:");
        for parent in &info.parent_files {
            println!(
                "  {} ({})",
                parent.file_name,
                parent.file_type.as_deref().unwrap_or("unknown type")
            );
        }
    }
    if !info.software.is_empty() {
        println!();
        println!("Software:");
        for software in &info.software {
            println!(
                "  {} {}",
                software.name,
                software.version.as_deref().unwrap_or("")
            );
        }
    }

    println!();
    let source = store.index_source()?;
    let scan_count = store.scan_count()?;
    let indexed = store.offset_table()?.len();
    println!("Index: {:?} ({} scans, max scan number {})", source, indexed, scan_count);
    if let Some(offset) = store.chromatogram_index_offset()? {
        println!("Chromatogram index at byte {}", offset);
    }

    Ok(())
}
