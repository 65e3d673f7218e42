//! # Random-access scan store
//!
//! [`ScanStore`] is the entry point for reading scan files. It owns one
//! [`ChunkedByteReader`] per open file and answers header and scan requests
//! by seeking to the record's offset and decoding it there.
//!
//! ## Lifecycle
//!
//! ```text
//! open() ──► DialectDetected ──► IndexReady ──► Serving
//!                  │                  │            │
//!                  └──────────────────┴────────────┴──► Closed (close())
//! ```
//!
//! The offset index is acquired on the first call that needs it: the trailer
//! index when the file has a usable one, otherwise a sequential scan of the
//! whole file. Both yield the same [`OffsetTable`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use mzscan::store::ScanStore;
//!
//! let mut store = ScanStore::open("run01.mzML")?;
//! println!("{} scans", store.scan_count()?);
//!
//! if let Some(scan) = store.scan(42)? {
//!     println!("scan 42: {} peaks at {:?} s", scan.peak_count(), scan.header.retention_time);
//! }
//!
//! for header in store.headers()? {
//!     let header = header?;
//!     println!("{} MS{}", header.scan_number, header.ms_level);
//! }
//! # Ok::<(), mzscan::store::StoreError>(())
//! ```

mod config;
mod error;
mod iterators;
mod summary;


use std::path::{Path, PathBuf};

use serde::Serialize;

pub use config::StoreConfig;
pub use error::StoreError;
pub use iterators::{HeaderStream, Headers, ScanStream, Scans};
pub use summary::ScanSummary;

use crate::chunked::ChunkedByteReader;
use crate::decoder::{DecodeMode, RecordError, ScanRecordDecoder};
use crate::dialect::{Dialect, DialectDescriptor, SNIFF_LENGTH};
use crate::index::{read_trailer_index, SequentialIndexBuilder};
use crate::models::{FileInfo, OffsetTable, Scan, ScanHeader};

/// Lifecycle state of a [`ScanStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreState {
    /// File opened and dialect chosen; no index yet
    DialectDetected,
    /// Offset index acquired
    IndexReady,
    /// At least one record has been served
    Serving,
    /// Handle released
    Closed,
}

/// How the offset index was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexSource {
    /// Parsed from the trailer index block
    Trailer,
    /// Built by scanning the file
    Sequential,
}

#[derive(Debug)]
struct AcquiredIndex {
    table: OffsetTable,
    source: IndexSource,
    chromatogram_index_offset: Option<u64>,
}

/// Random-access reader over one scan file
#[derive(Debug)]
pub struct ScanStore {
    path: PathBuf,
    config: StoreConfig,
    state: StoreState,
    decoder: ScanRecordDecoder,
    reader: Option<ChunkedByteReader>,
    index: Option<AcquiredIndex>,
    file_info: Option<FileInfo>,
}

impl ScanStore {
    /// Open a scan file with the default configuration
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Open a scan file with a custom configuration
    ///
    /// Only the dialect is determined here; the index is acquired lazily.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut reader = ChunkedByteReader::with_window_size(&path, config.window_size)?;

        let head = reader.read_at(0, SNIFF_LENGTH)?;
        let descriptor = DialectDescriptor::detect(&path, head)
            .ok_or_else(|| StoreError::UnknownDialect(path.clone()))?;

        log::debug!(
            "opened {} as {} ({} bytes)",
            path.display(),
            descriptor.dialect,
            reader.len()
        );

        Ok(Self {
            path,
            config,
            state: StoreState::DialectDetected,
            decoder: ScanRecordDecoder::new(descriptor),
            reader: Some(reader),
            index: None,
            file_info: None,
        })
    }

    /// Path of the open file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dialect of the open file
    pub fn dialect(&self) -> Dialect {
        self.decoder.descriptor().dialect
    }

    /// Descriptor of the open file's dialect
    pub fn descriptor(&self) -> &'static DialectDescriptor {
        self.decoder.descriptor()
    }

    /// Current lifecycle state
    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// File-level metadata, parsed on first access
    pub fn file_info(&mut self) -> Result<&FileInfo, StoreError> {
        let info = match self.file_info.take() {
            Some(info) => info,
            None => {
                let reader = self.reader.as_mut().ok_or(StoreError::Closed)?;
                reader.seek_to(0);
                self.decoder
                    .read_file_info(&mut *reader)
                    .map_err(StoreError::FileInfo)?
            }
        };
        Ok(self.file_info.insert(info))
    }

    /// Largest known scan number
    pub fn scan_count(&mut self) -> Result<u32, StoreError> {
        Ok(self.ensure_index()?.table.max_scan_number())
    }

    /// The scan-number-to-offset table
    pub fn offset_table(&mut self) -> Result<&OffsetTable, StoreError> {
        Ok(&self.ensure_index()?.table)
    }

    /// Whether the index came from the trailer or a sequential scan
    pub fn index_source(&mut self) -> Result<IndexSource, StoreError> {
        Ok(self.ensure_index()?.source)
    }

    /// Offset of the chromatogram sub-index, when the trailer has one
    pub fn chromatogram_index_offset(&mut self) -> Result<Option<u64>, StoreError> {
        Ok(self.ensure_index()?.chromatogram_index_offset)
    }

    /// Header of a scan, or `None` if the file has no such scan
    pub fn header(&mut self, scan_number: u32) -> Result<Option<ScanHeader>, StoreError> {
        Ok(self
            .serve(scan_number, DecodeMode::HeaderOnly)?
            .map(|scan| scan.header))
    }

    /// Header and peaks of a scan, or `None` if the file has no such scan
    pub fn scan(&mut self, scan_number: u32) -> Result<Option<Scan>, StoreError> {
        self.serve(scan_number, DecodeMode::Full)
    }

    /// Iterate over all headers in file order
    pub fn headers(&mut self) -> Result<Headers<'_>, StoreError> {
        let scan_numbers = self.scan_numbers_in_file_order()?;
        Ok(Headers::new(self, scan_numbers))
    }

    /// Iterate over all scans in file order
    pub fn scans(&mut self) -> Result<Scans<'_>, StoreError> {
        let scan_numbers = self.scan_numbers_in_file_order()?;
        Ok(Scans::new(self, scan_numbers))
    }

    /// Stream headers in file order without building an index
    ///
    /// The stream reads the file through its own handle.
    pub fn stream_headers(&self) -> Result<HeaderStream, StoreError> {
        self.ensure_open()?;
        HeaderStream::open(&self.path, self.descriptor(), self.config.window_size)
    }

    /// Stream scans in file order without building an index
    pub fn stream_scans(&self) -> Result<ScanStream, StoreError> {
        self.ensure_open()?;
        ScanStream::open(&self.path, self.descriptor(), self.config.window_size)
    }

    /// Release the file handle; every later request fails with [`StoreError::Closed`]
    pub fn close(&mut self) {
        self.reader = None;
        self.index = None;
        self.file_info = None;
        self.state = StoreState::Closed;
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        match self.state {
            StoreState::Closed => Err(StoreError::Closed),
            _ => Ok(()),
        }
    }

    fn scan_numbers_in_file_order(&mut self) -> Result<Vec<u32>, StoreError> {
        let entries = self.ensure_index()?.table.entries_by_offset();
        Ok(entries.into_iter().map(|(scan_number, _)| scan_number).collect())
    }

    /// Resolve and decode one scan
    ///
    /// A trailer entry that leads to the wrong bytes discards the trailer;
    /// the request is then retried once against a sequential index.
    fn serve(&mut self, scan_number: u32, mode: DecodeMode) -> Result<Option<Scan>, StoreError> {
        let Some(offset) = self.offset_of(scan_number)? else {
            return Ok(None);
        };

        match self.decode_at(scan_number, offset, mode) {
            Err(e) if e.is_misplaced_record() && self.serves_from_trailer() => {
                log::warn!(
                    "{}: trailer entry for scan {} is stale ({}), scanning sequentially",
                    self.path.display(),
                    scan_number,
                    e
                );
                self.replace_with_sequential_index()?;
                match self.offset_of(scan_number)? {
                    Some(offset) => self.decode_at(scan_number, offset, mode).map(Some),
                    None => Ok(None),
                }
            }
            result => result.map(Some),
        }
    }

    fn serves_from_trailer(&self) -> bool {
        self.index
            .as_ref()
            .is_some_and(|index| index.source == IndexSource::Trailer)
    }

    fn replace_with_sequential_index(&mut self) -> Result<(), StoreError> {
        let reader = self.reader.as_mut().ok_or(StoreError::Closed)?;
        let index = sequential_index(reader, self.decoder.descriptor(), &self.path)?;
        self.index = Some(index);
        Ok(())
    }

    fn offset_of(&mut self, scan_number: u32) -> Result<Option<u64>, StoreError> {
        Ok(self.ensure_index()?.table.get(scan_number))
    }

    fn ensure_index(&mut self) -> Result<&AcquiredIndex, StoreError> {
        let index = match self.index.take() {
            Some(index) => index,
            None => {
                let reader = self.reader.as_mut().ok_or(StoreError::Closed)?;
                let index =
                    acquire_index(reader, self.decoder.descriptor(), &self.config, &self.path)?;
                self.state = StoreState::IndexReady;
                index
            }
        };
        Ok(self.index.insert(index))
    }

    fn decode_at(
        &mut self,
        scan_number: u32,
        offset: u64,
        mode: DecodeMode,
    ) -> Result<Scan, StoreError> {
        let reader = self.reader.as_mut().ok_or(StoreError::Closed)?;
        reader.seek_to(offset);

        let record_error = |source| StoreError::Record {
            offset,
            scan_number,
            source,
        };
        let scan = self
            .decoder
            .decode(&mut *reader, offset, mode)
            .map_err(record_error)?;

        if scan.header.scan_number != scan_number {
            return Err(record_error(RecordError::ScanNumberMismatch {
                expected: scan_number,
                found: scan.header.scan_number,
            }));
        }

        self.state = StoreState::Serving;
        Ok(scan)
    }
}

fn acquire_index(
    reader: &mut ChunkedByteReader,
    descriptor: &'static DialectDescriptor,
    config: &StoreConfig,
    path: &Path,
) -> Result<AcquiredIndex, StoreError> {
    if !config.force_sequential {
        match read_trailer_index(reader, descriptor, config.tail_size, config.verify_trailer) {
            Ok(Some(trailer)) => {
                log::info!(
                    "{}: trailer index with {} scans (max scan {})",
                    path.display(),
                    trailer.table.len(),
                    trailer.table.max_scan_number()
                );
                return Ok(AcquiredIndex {
                    table: trailer.table,
                    source: IndexSource::Trailer,
                    chromatogram_index_offset: trailer.chromatogram_index_offset,
                });
            }
            Ok(None) => {
                log::info!("{}: no trailer index, scanning sequentially", path.display());
            }
            Err(e) if e.is_recoverable() => {
                log::warn!(
                    "{}: unusable trailer index ({}), scanning sequentially",
                    path.display(),
                    e
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    sequential_index(reader, descriptor, path)
}

fn sequential_index(
    reader: &mut ChunkedByteReader,
    descriptor: &'static DialectDescriptor,
    path: &Path,
) -> Result<AcquiredIndex, StoreError> {
    let table = SequentialIndexBuilder::new(descriptor).build(reader)?;
    log::info!(
        "{}: sequential index with {} scans (max scan {})",
        path.display(),
        table.len(),
        table.max_scan_number()
    );
    Ok(AcquiredIndex {
        table,
        source: IndexSource::Sequential,
        chromatogram_index_offset: None,
    })
}
