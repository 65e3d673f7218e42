use crate::codec::CodecError;
use crate::dialect::Field;

/// Which of a record's arrays an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// m/z values
    Mz,
    /// Intensity values
    Intensity,
    /// Interleaved `(m/z, intensity)` pairs
    Pairs,
}

impl std::fmt::Display for ArrayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayKind::Mz => write!(f, "m/z"),
            ArrayKind::Intensity => write!(f, "intensity"),
            ArrayKind::Pairs => write!(f, "m/z-intensity pair"),
        }
    }
}

/// Errors that can occur while decoding a single scan record
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Error decoding a binary array
    #[error("Binary decode error in {array} array: {source}")]
    Codec {
        /// Array that failed to decode
        array: ArrayKind,
        /// Underlying codec failure
        #[source]
        source: CodecError,
    },

    /// The bytes at the offset do not start a record
    #[error("Expected <{expected}> at record start, found {found}")]
    NotARecord {
        /// Record element of the dialect
        expected: &'static str,
        /// What was found instead
        found: String,
    },

    /// A field value could not be parsed
    #[error("Invalid value for {field:?}: {value:?}")]
    InvalidValue {
        /// Field being set
        field: Field,
        /// Offending text
        value: String,
    },

    /// An array's encoding was not declared before its payload
    #[error("No precision declared for {0} array")]
    MissingEncoding(ArrayKind),

    /// A record with peaks lacks one of its arrays
    #[error("Missing {0} array in record with {1} peaks")]
    MissingArray(ArrayKind, usize),

    /// The file ended inside a record
    #[error("Unexpected end of file inside record")]
    UnexpectedEof,

    /// The record carries no resolvable scan number
    #[error("Record has no resolvable scan number")]
    MissingScanNumber,

    /// The record at a resolved offset belongs to a different scan
    #[error("Record holds scan {found}, expected scan {expected}")]
    ScanNumberMismatch {
        /// Requested scan number
        expected: u32,
        /// Scan number found in the record
        found: u32,
    },

    /// UTF-8 encoding error in a name or value
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}
