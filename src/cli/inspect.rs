use anyhow::{Context, Result};
use std::path::Path;

use mzscan::models::{Polarity, ScanHeader};
use mzscan::store::StoreConfig;

use super::{heading, open_store};

/// Print the header of one scan
pub fn run_header(file: &Path, config: StoreConfig, scan_number: u32, json: bool) -> Result<()> {
    let mut store = open_store(file, config)?;
    let Some(header) = store.header(scan_number)? else {
        anyhow::bail!("Scan {} not found in {}", scan_number, file.display());
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&header).context("Failed to serialize header")?
        );
    } else {
        print_header(&header);
    }
    Ok(())
}

/// Print one scan with its peaks
pub fn run_scan(
    file: &Path,
    config: StoreConfig,
    scan_number: u32,
    json: bool,
    limit: usize,
) -> Result<()> {
    let mut store = open_store(file, config)?;
    let Some(scan) = store.scan(scan_number)? else {
        anyhow::bail!("Scan {} not found in {}", scan_number, file.display());
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&scan).context("Failed to serialize scan")?
        );
        return Ok(());
    }

    print_header(&scan.header);
    println!();
    println!("Peaks ({}):", scan.peak_count());
    for (mz, intensity) in scan.peaks().take(limit) {
        println!("  {:>12.4}  {:>14.2}", mz, intensity);
    }
    if scan.peak_count() > limit {
        println!("  ... {} more", scan.peak_count() - limit);
    }
    Ok(())
}

fn print_header(header: &ScanHeader) {
    println!("{}", heading(&format!("Scan {}", header.scan_number)));
    if let Some(id) = &header.native_id {
        println!("Native id: {}", id);
    }
    println!("Offset: {}", header.offset);
    println!("MS level: {}", header.ms_level);
    println!("Declared peaks: {}", header.peak_count);
    if let Some(rt) = header.retention_time {
        println!("Retention time: {:.3} sec", rt);
    }
    match header.polarity {
        Polarity::Positive => println!("Polarity: +"),
        Polarity::Negative => println!("Polarity: -"),
        Polarity::Unknown => {}
    }
    if let Some(centroided) = header.centroided {
        println!("Centroided: {}", centroided);
    }
    if let (Some(low), Some(high)) = (header.low_mz, header.high_mz) {
        println!("m/z range: {:.4} - {:.4}", low, high);
    }
    if let Some(mz) = header.base_peak_mz {
        println!(
            "Base peak: {:.4} ({:.1})",
            mz,
            header.base_peak_intensity.unwrap_or_default()
        );
    }
    if let Some(tic) = header.total_ion_current {
        println!("TIC: {:.1}", tic);
    }
    if let Some(filter) = &header.filter_line {
        println!("Filter: {}", filter);
    }
    if let Some(precursor) = &header.precursor {
        let mz = precursor
            .mz
            .map(|mz| format!("{:.4}", mz))
            .unwrap_or_else(|| "?".to_string());
        let charge = precursor
            .charge
            .map(|z| format!(" z={}", z))
            .unwrap_or_default();
        println!("Precursor: {}{}", mz, charge);
        if let Some(activation) = &precursor.activation {
            println!("Activation: {}", activation);
        }
    }
    if let Some(energy) = header.collision_energy {
        println!("Collision energy: {:.1}", energy);
    }
}
