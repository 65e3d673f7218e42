use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{IndexSource, ScanStore, StoreError};
use crate::dialect::Dialect;

/// Summary statistics over every header in a file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    /// Dialect of the file
    pub dialect: Dialect,
    /// Largest scan number
    pub scan_count: u32,
    /// Number of scans in the offset table
    pub indexed_scans: usize,
    /// Number of scans per MS level
    pub ms_levels: BTreeMap<u8, usize>,
    /// Sum of declared peak counts
    pub total_peaks: u64,
    /// Retention time range (min, max) in seconds
    pub rt_range: Option<(f64, f64)>,
    /// m/z range (min, max) over the declared scan ranges
    pub mz_range: Option<(f64, f64)>,
    /// How the offset index was obtained
    pub index_source: IndexSource,
}

fn widen(range: &mut Option<(f64, f64)>, low: f64, high: f64) {
    *range = match *range {
        Some((min, max)) => Some((min.min(low), max.max(high))),
        None => Some((low, high)),
    };
}

impl ScanStore {
    /// Read every header and collect summary statistics
    ///
    /// Only headers are decoded, so the m/z range comes from each scan's
    /// declared low and high m/z.
    pub fn summary(&mut self) -> Result<ScanSummary, StoreError> {
        let dialect = self.dialect();
        let index_source = self.index_source()?;
        let scan_count = self.scan_count()?;
        let indexed_scans = self.offset_table()?.len();

        let mut ms_levels = BTreeMap::new();
        let mut total_peaks = 0u64;
        let mut rt_range = None;
        let mut mz_range = None;

        for header in self.headers()? {
            let header = header?;
            *ms_levels.entry(header.ms_level).or_insert(0) += 1;
            total_peaks += header.peak_count as u64;

            if let Some(rt) = header.retention_time {
                widen(&mut rt_range, rt, rt);
            }
            if let (Some(low), Some(high)) = (header.low_mz, header.high_mz) {
                widen(&mut mz_range, low, high);
            }
        }

        Ok(ScanSummary {
            dialect,
            scan_count,
            indexed_scans,
            ms_levels,
            total_peaks,
            rt_range,
            mz_range,
            index_source,
        })
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan File Summary")?;
        writeln!(f, "=================")?;
        writeln!(f, "Dialect: {}", self.dialect)?;
        writeln!(f, "Index: {:?}", self.index_source)?;
        writeln!(f, "Scans: {} (max scan number {})", self.indexed_scans, self.scan_count)?;
        for (level, count) in &self.ms_levels {
            writeln!(f, "  MS{} scans: {}", level, count)?;
        }
        writeln!(f, "Total peaks: {}", self.total_peaks)?;
        if let Some((min_rt, max_rt)) = self.rt_range {
            writeln!(f, "RT range: {:.2} - {:.2} sec", min_rt, max_rt)?;
        }
        if let Some((min_mz, max_mz)) = self.mz_range {
            writeln!(f, "m/z range: {:.4} - {:.4}", min_mz, max_mz)?;
        }
        Ok(())
    }
}
