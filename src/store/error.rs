use std::path::PathBuf;

use crate::decoder::RecordError;
use crate::index::IndexError;

/// Errors that can occur while serving scans from a file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither the file name nor its content identify a supported dialect
    #[error("Unrecognized scan file format: {}", .0.display())]
    UnknownDialect(PathBuf),

    /// A record could not be decoded
    #[error("Failed to decode scan {scan_number} at offset {offset}: {source}")]
    Record {
        /// Offset of the failing record
        offset: u64,
        /// Scan number that was requested or indexed
        scan_number: u32,
        /// Underlying decode failure
        #[source]
        source: RecordError,
    },

    /// File-level metadata could not be decoded
    #[error("Failed to read file info: {0}")]
    FileInfo(#[source] RecordError),

    /// No index could be built, not even by scanning the file
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// The store was closed
    #[error("Scan store is closed")]
    Closed,
}

impl StoreError {
    /// Returns true for per-record decode failures
    pub fn is_decode_error(&self) -> bool {
        matches!(self, StoreError::Record { .. })
    }

    /// Returns true when the bytes at an indexed offset are not the requested record
    pub(crate) fn is_misplaced_record(&self) -> bool {
        matches!(
            self,
            StoreError::Record {
                source: RecordError::NotARecord { .. }
                    | RecordError::ScanNumberMismatch { .. }
                    | RecordError::Xml(_),
                ..
            }
        )
    }
}
