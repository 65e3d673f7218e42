//! # Scan file dialects
//!
//! Two schemas describe the same scan data in structurally different ways:
//!
//! ```text
//! Legacy (mzXML)                         Modern (mzML)
//! mzXML                                  indexedmzML
//! ├── msRun scanCount=..                 ├── mzML
//! │   ├── parentFile / msInstrument      │   ├── fileDescription / softwareList
//! │   └── scan num=.. msLevel=.. ...     │   └── run / spectrumList count=..
//! │       ├── precursorMz                │       └── spectrum id=.. defaultArrayLength=..
//! │       ├── peaks precision=..         │           ├── cvParam* (name, value, unit)
//! │       └── scan* (nested MSn)         │           └── binaryDataArrayList
//! ├── index name="scan"                  │               └── binaryDataArray
//! │   └── offset id=..                   │                   ├── cvParam* (encoding)
//! └── indexOffset                        │                   └── binary
//!                                        ├── indexList
//!                                        │   └── index name="spectrum|chromatogram"
//!                                        │       └── offset idRef=..
//!                                        └── indexListOffset
//! ```
//!
//! A [`DialectDescriptor`] captures everything the decoder and the index code
//! need to know about one schema as plain data: tag names, attribute names and
//! the tables that map attributes or CV accessions onto semantic [`Field`]s.
//! The descriptor is chosen once per file and never changes afterwards.

mod legacy;
mod modern;
mod units;

use std::path::Path;

use serde::Serialize;

pub use legacy::LEGACY;
pub use modern::{cv, MODERN};
pub use units::{normalize_retention_time, parse_duration_seconds};

/// Number of leading bytes inspected when sniffing the root element
pub const SNIFF_LENGTH: usize = 4096;

/// The two supported schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dialect {
    /// Per-scan attribute schema with nested elements (mzXML)
    Legacy,
    /// Controlled-vocabulary schema (mzML)
    Modern,
}

impl Dialect {
    /// Static descriptor for this dialect
    pub fn descriptor(self) -> &'static DialectDescriptor {
        match self {
            Dialect::Legacy => &LEGACY,
            Dialect::Modern => &MODERN,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Legacy => write!(f, "mzXML"),
            Dialect::Modern => write!(f, "mzML"),
        }
    }
}

/// Semantic field a dialect-specific attribute or CV term maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Numeric scan number
    ScanNumber,
    /// Native identifier string, resolved to a scan number
    NativeId,
    /// Zero-based position in the record list
    RecordIndex,
    /// MS level
    MsLevel,
    /// Declared number of peaks
    PeakCount,
    /// Retention time as a numeric value with an optional unit
    RetentionTime,
    /// Retention time as an ISO-8601 duration (`PT12.5S`)
    RetentionTimeDuration,
    /// Base peak m/z
    BasePeakMz,
    /// Base peak intensity
    BasePeakIntensity,
    /// Total ion current
    TotalIonCurrent,
    /// Lower bound of the m/z range
    LowMz,
    /// Upper bound of the m/z range
    HighMz,
    /// Scan window lower limit, used when no observed bound exists
    ScanWindowLower,
    /// Scan window upper limit, used when no observed bound exists
    ScanWindowUpper,
    /// Vendor filter string
    FilterLine,
    /// Scan type text
    ScanType,
    /// Scan type implied by the term's name (flag term)
    ScanTypeFlag,
    /// Polarity given as `+` / `-`
    Polarity,
    /// Positive polarity flag
    PositiveScan,
    /// Negative polarity flag
    NegativeScan,
    /// Centroided given as `0` / `1`
    Centroided,
    /// Centroid spectrum flag
    CentroidSpectrum,
    /// Profile spectrum flag
    ProfileSpectrum,
    /// Precursor m/z
    PrecursorMz,
    /// Isolation window target, used when no selected ion m/z exists
    IsolationTargetMz,
    /// Precursor intensity
    PrecursorIntensity,
    /// Precursor charge
    PrecursorCharge,
    /// Activation method given as text
    ActivationMethod,
    /// Activation method implied by the term's name (flag term)
    ActivationFlag,
    /// Collision energy
    CollisionEnergy,
    /// Array precision given as a bit count
    ArrayPrecision,
    /// 32-bit array flag
    ArrayFloat32,
    /// 64-bit array flag
    ArrayFloat64,
    /// Array compression given as text
    ArrayCompression,
    /// zlib compression flag
    ArrayZlib,
    /// No compression flag
    ArrayNoCompression,
    /// Array byte order given as text
    ArrayByteOrder,
    /// Array content (`m/z`, `intensity`, `m/z-int`)
    ArrayContent,
    /// m/z array flag
    ArrayMz,
    /// Intensity array flag
    ArrayIntensity,
}

/// File-level element roles used while reading [`FileInfo`](crate::models::FileInfo)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoElement {
    /// Container of the records (`msRun`, `run`)
    Run,
    /// Record list carrying the declared count (`spectrumList`)
    RecordList,
    /// Parent or source file
    ParentFile,
    /// Instrument manufacturer
    Manufacturer,
    /// Instrument model
    Model,
    /// Ionisation source
    Ionisation,
    /// Mass analyzer
    Analyzer,
    /// Detector
    Detector,
    /// Software entry
    Software,
}

/// Static, per-dialect mapping of schema names onto semantics
#[derive(Debug)]
pub struct DialectDescriptor {
    /// Which dialect this descriptor describes
    pub dialect: Dialect,
    /// Root element names used for content sniffing
    pub root_tags: &'static [&'static str],
    /// File extensions (lower case, without dot)
    pub extensions: &'static [&'static str],
    /// Element holding one scan record
    pub record_tag: &'static str,
    /// Element whose attribute declares the number of records
    pub record_count_tag: &'static str,
    /// Attribute on `record_count_tag` holding the declared count
    pub record_count_attribute: &'static str,
    /// Attributes of the record element
    pub record_attributes: &'static [(&'static str, Field)],
    /// Attributes that identify the record during a sequential scan
    pub record_key_attributes: &'static [(&'static str, Field)],
    /// Element whose text is the precursor m/z (legacy only)
    pub precursor_tag: Option<&'static str>,
    /// Attributes of the precursor element
    pub precursor_attributes: &'static [(&'static str, Field)],
    /// Name/value/unit parameter element (modern only)
    pub param_tag: Option<&'static str>,
    /// Parameter accessions
    pub param_fields: &'static [(&'static str, Field)],
    /// Element wrapping all arrays; the header is complete when it opens
    pub array_list_tag: Option<&'static str>,
    /// Element holding one array's encoding declaration
    pub array_tag: &'static str,
    /// Attributes of the array element
    pub array_attributes: &'static [(&'static str, Field)],
    /// Element whose text is the Base64 payload
    pub payload_tag: &'static str,
    /// Whether arrays without a content declaration are assigned by position:
    /// a lone array holds interleaved pairs, otherwise m/z precedes intensity
    pub positional_arrays: bool,
    /// Whether records of this dialect nest inside each other
    pub nested_records: bool,
    /// Footer element holding the index block offset
    pub index_offset_tag: &'static str,
    /// Element enclosing one named index
    pub index_tag: &'static str,
    /// Closing element that terminates index parsing
    pub index_end_tag: &'static str,
    /// Attribute naming an index
    pub index_name_attribute: &'static str,
    /// Name of the index that maps scans
    pub scan_index_name: &'static str,
    /// Name of the chromatogram index, if the dialect has one
    pub chromatogram_index_name: Option<&'static str>,
    /// Element carrying one offset entry
    pub offset_tag: &'static str,
    /// Attribute of `offset_tag` identifying the scan
    pub offset_key_attribute: &'static str,
    /// File-level elements
    pub info_elements: &'static [(&'static str, InfoElement)],
}

impl DialectDescriptor {
    /// Semantic field of a record attribute
    pub fn record_field(&self, attribute: &str) -> Option<Field> {
        lookup(self.record_attributes, attribute)
    }

    /// Semantic field of a record attribute that identifies the record
    pub fn key_field(&self, attribute: &str) -> Option<Field> {
        lookup(self.record_key_attributes, attribute)
    }

    /// Semantic field of a precursor attribute
    pub fn precursor_field(&self, attribute: &str) -> Option<Field> {
        lookup(self.precursor_attributes, attribute)
    }

    /// Semantic field of a parameter accession
    pub fn param_field(&self, accession: &str) -> Option<Field> {
        lookup(self.param_fields, accession)
    }

    /// Semantic field of an array attribute
    pub fn array_field(&self, attribute: &str) -> Option<Field> {
        lookup(self.array_attributes, attribute)
    }

    /// File-level role of an element
    pub fn info_element(&self, tag: &str) -> Option<InfoElement> {
        lookup(self.info_elements, tag)
    }

    /// Opening delimiter of a record, without the trailing whitespace
    pub fn record_delimiter(&self) -> String {
        format!("<{}", self.record_tag)
    }

    /// Opening and closing footer delimiters around the index offset
    pub fn index_offset_delimiters(&self) -> (String, String) {
        (
            format!("<{}>", self.index_offset_tag),
            format!("</{}>", self.index_offset_tag),
        )
    }

    /// Resolve an index entry key to a scan number
    pub fn scan_number_from_key(&self, key: &str) -> Option<u32> {
        match self.dialect {
            Dialect::Legacy => key.trim().parse().ok(),
            Dialect::Modern => scan_number_from_native_id(key),
        }
    }

    /// Pick the dialect for a file, by extension first and by content otherwise
    pub fn detect(path: &Path, head: &[u8]) -> Option<&'static DialectDescriptor> {
        Self::for_path(path).or_else(|| Self::sniff(head))
    }

    /// Dialect implied by a file extension (case-insensitive)
    pub fn for_path(path: &Path) -> Option<&'static DialectDescriptor> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        [&LEGACY, &MODERN]
            .into_iter()
            .find(|d| d.extensions.contains(&extension.as_str()))
    }

    /// Dialect implied by the first root element found in `head`
    pub fn sniff(head: &[u8]) -> Option<&'static DialectDescriptor> {
        let text = String::from_utf8_lossy(&head[..head.len().min(SNIFF_LENGTH)]);
        [&LEGACY, &MODERN]
            .into_iter()
            .filter_map(|d| {
                d.root_tags
                    .iter()
                    .filter_map(|tag| find_element(&text, tag))
                    .min()
                    .map(|pos| (pos, d))
            })
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, d)| d)
    }
}

fn lookup<T: Copy>(table: &[(&'static str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Position of `<tag` followed by whitespace, `>` or `/`
fn find_element(text: &str, tag: &str) -> Option<usize> {
    let needle = format!("<{}", tag);
    text.match_indices(&needle).map(|(pos, _)| pos).find(|&pos| {
        text[pos + needle.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_whitespace() || c == '>' || c == '/')
    })
}

/// Resolve a native spectrum id to a scan number
///
/// Common formats:
/// - `"controllerType=0 controllerNumber=1 scan=12345"`
/// - `"scan=12345"`, `"scanId=12345"`
/// - `"S12345"`
/// - `"index=12344"` (zero-based, so the scan number is one more)
/// - `"12345"`
pub fn scan_number_from_native_id(id: &str) -> Option<u32> {
    let id = id.trim();
    for token in id.split_ascii_whitespace() {
        if let Some((key, value)) = token.split_once('=') {
            match key {
                "scan" | "scanId" | "scanNumber" => return value.parse().ok(),
                "index" => return value.parse::<u32>().ok().and_then(|v| v.checked_add(1)),
                _ => {}
            }
        }
    }
    if let Some(rest) = id.strip_prefix('S') {
        if let Ok(n) = rest.parse() {
            return Some(n);
        }
    }
    id.parse().ok()
}
