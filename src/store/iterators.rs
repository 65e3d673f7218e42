use std::path::Path;
use std::vec;

use super::{ScanStore, StoreError};
use crate::chunked::ChunkedByteReader;
use crate::decoder::{DecodeMode, ScanRecordDecoder};
use crate::dialect::DialectDescriptor;
use crate::index::RecordScanner;
use crate::models::{Scan, ScanHeader};

/// Walks the offset table in file order
struct TableCursor<'a> {
    store: &'a mut ScanStore,
    scan_numbers: vec::IntoIter<u32>,
}

impl<'a> TableCursor<'a> {
    fn new(store: &'a mut ScanStore, scan_numbers: Vec<u32>) -> Self {
        Self {
            store,
            scan_numbers: scan_numbers.into_iter(),
        }
    }

    fn next(&mut self, mode: DecodeMode) -> Option<Result<Scan, StoreError>> {
        // A scan can drop out when a stale trailer is replaced mid-walk
        loop {
            let scan_number = self.scan_numbers.next()?;
            if let Some(result) = self.store.serve(scan_number, mode).transpose() {
                return Some(result);
            }
        }
    }
}

/// Iterator over all headers of an indexed file, in file order
pub struct Headers<'a> {
    cursor: TableCursor<'a>,
}

impl<'a> Headers<'a> {
    pub(super) fn new(store: &'a mut ScanStore, scan_numbers: Vec<u32>) -> Self {
        Self {
            cursor: TableCursor::new(store, scan_numbers),
        }
    }
}

impl Iterator for Headers<'_> {
    type Item = Result<ScanHeader, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor
            .next(DecodeMode::HeaderOnly)
            .map(|result| result.map(|scan| scan.header))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.cursor.scan_numbers.size_hint().1)
    }
}

/// Iterator over all scans of an indexed file, in file order
pub struct Scans<'a> {
    cursor: TableCursor<'a>,
}

impl<'a> Scans<'a> {
    pub(super) fn new(store: &'a mut ScanStore, scan_numbers: Vec<u32>) -> Self {
        Self {
            cursor: TableCursor::new(store, scan_numbers),
        }
    }
}

impl Iterator for Scans<'_> {
    type Item = Result<Scan, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next(DecodeMode::Full)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.cursor.scan_numbers.size_hint().1)
    }
}

/// Single pass over a file's records without an offset table
struct RecordStream {
    reader: ChunkedByteReader,
    scanner: RecordScanner,
    decoder: ScanRecordDecoder,
    done: bool,
}

impl RecordStream {
    fn open(
        path: &Path,
        descriptor: &'static DialectDescriptor,
        window_size: usize,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            reader: ChunkedByteReader::with_window_size(path, window_size)?,
            scanner: RecordScanner::new(descriptor),
            decoder: ScanRecordDecoder::new(descriptor),
            done: false,
        })
    }

    fn next(&mut self, mode: DecodeMode) -> Option<Result<Scan, StoreError>> {
        if self.done {
            return None;
        }

        let location = match self.scanner.next_record(&mut self.reader) {
            Ok(Some(location)) => location,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                // The scan position is unreliable after a failure
                self.done = true;
                return Some(Err(e.into()));
            }
        };

        self.reader.seek_to(location.offset);
        Some(
            self.decoder
                .decode(&mut self.reader, location.offset, mode)
                .map_err(|source| StoreError::Record {
                    offset: location.offset,
                    scan_number: location.scan_number,
                    source,
                }),
        )
    }
}

/// Streaming iterator over headers in file order
///
/// A record that fails to decode yields an error and the stream moves on to
/// the next record.
pub struct HeaderStream {
    inner: RecordStream,
}

impl HeaderStream {
    /// Open a stream over a file
    pub fn open(
        path: &Path,
        descriptor: &'static DialectDescriptor,
        window_size: usize,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            inner: RecordStream::open(path, descriptor, window_size)?,
        })
    }
}

impl Iterator for HeaderStream {
    type Item = Result<ScanHeader, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next(DecodeMode::HeaderOnly)
            .map(|result| result.map(|scan| scan.header))
    }
}

/// Streaming iterator over scans in file order
pub struct ScanStream {
    inner: RecordStream,
}

impl ScanStream {
    /// Open a stream over a file
    pub fn open(
        path: &Path,
        descriptor: &'static DialectDescriptor,
        window_size: usize,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            inner: RecordStream::open(path, descriptor, window_size)?,
        })
    }
}

impl Iterator for ScanStream {
    type Item = Result<Scan, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next(DecodeMode::Full)
    }
}
