//! Data models for scan files
//!
//! These are the values handed to callers: per-record [`ScanHeader`]s and
//! [`Scan`]s (built fresh for every request), the per-file [`OffsetTable`]
//! (built once, then immutable) and file-level [`FileInfo`].

use std::collections::HashMap;

use serde::Serialize;

use crate::codec::ArrayEncoding;
use crate::dialect::Dialect;

/// Ion polarity of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Not declared
    #[default]
    Unknown,
    /// Positive ion mode
    Positive,
    /// Negative ion mode
    Negative,
}

/// Precursor ion information for MS2+ scans
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Precursor {
    /// Precursor m/z
    pub mz: Option<f64>,
    /// Precursor intensity
    pub intensity: Option<f64>,
    /// Precursor charge state
    pub charge: Option<i32>,
    /// Activation method (CID, HCD, ...)
    pub activation: Option<String>,
}

/// Metadata of a single scan record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanHeader {
    /// Scan number (1-based, unique within a file)
    pub scan_number: u32,

    /// Native identifier, for dialects that carry one
    pub native_id: Option<String>,

    /// MS level (1 for MS1, 2 for MS2, etc.)
    pub ms_level: u8,

    /// Declared number of peaks
    pub peak_count: usize,

    /// Retention time in seconds
    pub retention_time: Option<f64>,

    /// Base peak m/z
    pub base_peak_mz: Option<f64>,

    /// Base peak intensity
    pub base_peak_intensity: Option<f64>,

    /// Total ion current
    pub total_ion_current: Option<f64>,

    /// Lower bound of the m/z range
    pub low_mz: Option<f64>,

    /// Upper bound of the m/z range
    pub high_mz: Option<f64>,

    /// Vendor filter string
    pub filter_line: Option<String>,

    /// Scan type text
    pub scan_type: Option<String>,

    /// Ion polarity
    pub polarity: Polarity,

    /// Whether the peaks are centroided, when declared
    pub centroided: Option<bool>,

    /// Precursor information (MS2+ only)
    pub precursor: Option<Precursor>,

    /// Collision energy
    pub collision_energy: Option<f64>,

    /// Encoding of the m/z array, when declared before the header ended
    pub mz_encoding: Option<ArrayEncoding>,

    /// Encoding of the intensity array, when declared before the header ended
    pub intensity_encoding: Option<ArrayEncoding>,

    /// Byte offset of the record's opening delimiter
    pub offset: u64,
}

impl ScanHeader {
    /// Returns true if this is a precursor (MS1) scan
    pub fn is_ms1(&self) -> bool {
        self.ms_level == 1
    }
}

/// A scan header plus its decoded peak arrays
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scan {
    /// Record metadata
    pub header: ScanHeader,
    /// m/z values
    pub masses: Vec<f64>,
    /// Intensity values, parallel to `masses`
    pub intensities: Vec<f64>,
}

impl Scan {
    /// Get the number of peaks
    pub fn peak_count(&self) -> usize {
        self.masses.len()
    }

    /// Iterate over `(m/z, intensity)` pairs
    pub fn peaks(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.masses.iter().copied().zip(self.intensities.iter().copied())
    }
}

/// Mapping from scan number to the byte offset of its record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: HashMap<u32, u64>,
    max_scan_number: u32,
}

impl OffsetTable {
    /// Offset of a scan's record
    pub fn get(&self, scan_number: u32) -> Option<u64> {
        self.offsets.get(&scan_number).copied()
    }

    /// Returns true if the table holds the scan
    pub fn contains(&self, scan_number: u32) -> bool {
        self.offsets.contains_key(&scan_number)
    }

    /// Number of indexed scans
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns true if no scans are indexed
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Largest indexed scan number (0 for an empty table)
    pub fn max_scan_number(&self) -> u32 {
        self.max_scan_number
    }

    /// `(scan number, offset)` entries in increasing file-offset order
    pub fn entries_by_offset(&self) -> Vec<(u32, u64)> {
        let mut entries: Vec<(u32, u64)> = self.offsets.iter().map(|(&s, &o)| (s, o)).collect();
        entries.sort_unstable_by_key(|&(scan, offset)| (offset, scan));
        entries
    }
}

/// Incremental builder for an [`OffsetTable`]
#[derive(Debug, Default)]
pub struct OffsetTableBuilder {
    table: OffsetTable,
}

impl OffsetTableBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder sized for `capacity` scans
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: OffsetTable {
                offsets: HashMap::with_capacity(capacity),
                max_scan_number: 0,
            },
        }
    }

    /// Record a scan's offset, returning the offset it already had, if any.
    ///
    /// An existing entry is left untouched.
    pub fn insert(&mut self, scan_number: u32, offset: u64) -> Option<u64> {
        if let Some(&existing) = self.table.offsets.get(&scan_number) {
            return Some(existing);
        }
        self.table.offsets.insert(scan_number, offset);
        self.table.max_scan_number = self.table.max_scan_number.max(scan_number);
        None
    }

    /// Number of scans recorded so far
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Freeze the table
    pub fn build(self) -> OffsetTable {
        self.table
    }
}

/// Instrument description
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstrumentInfo {
    /// Manufacturer
    pub manufacturer: Option<String>,
    /// Model
    pub model: Option<String>,
    /// Ionisation source
    pub ionisation: Option<String>,
    /// Mass analyzer
    pub mass_analyzer: Option<String>,
    /// Detector
    pub detector: Option<String>,
}

/// Provenance of a file the scans were converted from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParentFile {
    /// File name or URI
    pub file_name: String,
    /// File type or format
    pub file_type: Option<String>,
    /// SHA-1 checksum
    pub sha1: Option<String>,
}

/// Software that produced or processed the file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SoftwareInfo {
    /// Role of the software (acquisition, conversion, processing)
    pub kind: Option<String>,
    /// Software name
    pub name: String,
    /// Software version
    pub version: Option<String>,
}

/// File-level metadata, independent of per-scan data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    /// Dialect of the file
    pub dialect: Dialect,
    /// Instrument description
    pub instrument: InstrumentInfo,
    /// Parent/source files
    pub parent_files: Vec<ParentFile>,
    /// Software provenance
    pub software: Vec<SoftwareInfo>,
    /// Record count declared near the top of the file
    pub declared_scan_count: Option<u64>,
    /// Run identifier
    pub run_id: Option<String>,
    /// Run start time in seconds
    pub start_time: Option<f64>,
    /// Run end time in seconds
    pub end_time: Option<f64>,
    /// Run start timestamp
    pub start_timestamp: Option<String>,
}

impl FileInfo {
    /// Empty file info for a dialect
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            instrument: InstrumentInfo::default(),
            parent_files: Vec::new(),
            software: Vec::new(),
            declared_scan_count: None,
            run_id: None,
            start_time: None,
            end_time: None,
            start_timestamp: None,
        }
    }
}
