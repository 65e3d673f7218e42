//! # Offset index acquisition
//!
//! Random access needs an [`OffsetTable`] mapping scan numbers to the byte
//! offset of each record. There are two ways to get one:
//!
//! 1. **Trailer index.** Indexed files end with a footer such as
//!    `<indexOffset>123456</indexOffset>` pointing at an index block near the
//!    end of the file. [`TrailerIndexLocator`] finds the footer in the last few
//!    hundred bytes and [`TrailerIndexParser`] streams the block.
//! 2. **Sequential scan.** [`SequentialIndexBuilder`] walks the whole file once
//!    and records the position of every record's opening delimiter.
//!
//! Trailer problems are recoverable: the caller falls back to the sequential
//! scan. Only I/O errors are fatal on that path.

mod sequential;
mod trailer;


use std::io;

use crate::chunked::ChunkedByteReader;
use crate::decoder::RecordError;
use crate::dialect::DialectDescriptor;
use crate::models::OffsetTable;

pub use sequential::{read_declared_count, RecordLocation, RecordScanner, SequentialIndexBuilder};
pub use trailer::{verify_offsets, TrailerIndexLocator, TrailerIndexParser, DEFAULT_TAIL_SIZE};

/// Errors that can occur while acquiring an offset index
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The located offset does not start an index block
    #[error("No index block at offset {offset}, found {found}")]
    NotAnIndex {
        /// Offset read from the footer
        offset: u64,
        /// What was found instead
        found: String,
    },

    /// The file ended before the index block was closed
    #[error("Index block is not terminated")]
    Truncated,

    /// An index entry carries no resolvable scan number
    #[error("Index entry without a resolvable scan number (key {0:?})")]
    MissingKey(Option<String>),

    /// An index entry's offset is not a decimal integer
    #[error("Invalid offset in index entry: {0:?}")]
    InvalidOffset(String),

    /// Two entries claim the same scan number
    #[error("Scan {scan_number} indexed twice (offsets {first} and {second})")]
    DuplicateScan {
        /// Repeated scan number
        scan_number: u32,
        /// Offset recorded first
        first: u64,
        /// Offset of the repeated entry
        second: u64,
    },

    /// An indexed offset does not point at a record
    #[error("Indexed offset {offset} of scan {scan_number} does not point at a record")]
    StaleOffset {
        /// Scan whose entry was checked
        scan_number: u32,
        /// Offending offset
        offset: u64,
    },

    /// A record found by the sequential scan has no resolvable scan number
    #[error("Record at offset {offset} has no resolvable scan number")]
    MissingScanNumber {
        /// Record offset
        offset: u64,
    },

    /// A record's opening tag could not be decoded
    #[error("Malformed record tag at offset {offset}: {source}")]
    RecordTag {
        /// Record offset
        offset: u64,
        /// Underlying decode failure
        #[source]
        source: RecordError,
    },
}

impl IndexError {
    /// Returns true if a trailer failing with this error should give way to
    /// the sequential scan
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, IndexError::Io(_))
    }
}

/// A parsed trailer index
#[derive(Debug, Clone, Default)]
pub struct TrailerIndex {
    /// Scan number to record offset
    pub table: OffsetTable,
    /// Offset of the index block, as read from the footer
    pub index_offset: u64,
    /// Offset of the chromatogram sub-index, if the file has one
    pub chromatogram_index_offset: Option<u64>,
    /// Chromatogram ids and their record offsets
    pub chromatogram_offsets: Vec<(String, u64)>,
}

/// Locate, parse and optionally verify a trailer index
///
/// Returns `Ok(None)` when the file has no usable footer. Parse failures are
/// returned as errors; [`IndexError::is_recoverable`] tells them apart from
/// I/O failures.
pub fn read_trailer_index(
    reader: &mut ChunkedByteReader,
    descriptor: &'static DialectDescriptor,
    tail_size: usize,
    verify: bool,
) -> Result<Option<TrailerIndex>, IndexError> {
    let locator = TrailerIndexLocator::new(descriptor).with_tail_size(tail_size);
    let Some(offset) = locator.locate(reader)? else {
        return Ok(None);
    };

    let index = TrailerIndexParser::new(descriptor).parse(reader, offset)?;
    if verify {
        verify_offsets(reader, descriptor, &index.table)?;
    }
    Ok(Some(index))
}
