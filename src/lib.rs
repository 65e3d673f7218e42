//! # mzscan - Indexed Random Access to mzXML and mzML Scan Files
//!
//! `mzscan` reads the two XML scan-file formats used in mass spectrometry
//! (the legacy mzXML dialect and the modern mzML dialect) without loading
//! whole documents. Files are memory-mapped one window at a time; scans are
//! located through the trailer offset index when the file has one, or
//! through a single sequential pass when it doesn't.
//!
//! ## Key Features
//!
//! - **Bounded memory**: Only one mapped window per open file, however large
//!   the file is.
//!
//! - **Random access**: Any scan's header or peaks are decoded by seeking to
//!   its record offset.
//!
//! - **Resilient indexing**: A missing, garbled or stale trailer index falls
//!   back to a sequential scan that produces the same offset table.
//!
//! - **Both dialects**: Differences between mzXML and mzML are captured as
//!   data in a [`dialect::DialectDescriptor`], so the decoder and index
//!   builders are shared.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mzscan::store::ScanStore;
//!
//! let mut store = ScanStore::open("sample.mzXML")?;
//!
//! let header = store.header(1)?.expect("scan 1");
//! println!("MS{} at {:?} s", header.ms_level, header.retention_time);
//!
//! let scan = store.scan(1)?.expect("scan 1");
//! for (mz, intensity) in scan.peaks() {
//!     println!("{mz:.4}\t{intensity:.1}");
//! }
//! # Ok::<(), mzscan::store::StoreError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`chunked`]: Windowed memory-mapped byte reader
//! - [`codec`]: Base64, zlib and endianness decoding of peak arrays
//! - [`dialect`]: Per-dialect vocabulary and format detection
//! - [`decoder`]: Streaming decoder for single scan records
//! - [`index`]: Trailer index parsing and sequential index building
//! - [`models`]: Headers, scans, offset tables and file metadata
//! - [`store`]: The random-access facade tying everything together

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod chunked;
pub mod codec;
pub mod decoder;
pub mod dialect;
pub mod index;
pub mod models;
pub mod store;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::chunked::{ChunkedByteReader, DEFAULT_WINDOW_SIZE};
    pub use crate::codec::{ArrayEncoding, ByteOrder, CodecError, Compression, PeakArrayCodec, Precision};
    pub use crate::decoder::{ArrayKind, DecodeMode, RecordError, ScanRecordDecoder};
    pub use crate::dialect::{Dialect, DialectDescriptor, LEGACY, MODERN};
    pub use crate::index::{
        IndexError, SequentialIndexBuilder, TrailerIndex, TrailerIndexLocator, TrailerIndexParser,
    };
    pub use crate::models::{
        FileInfo, InstrumentInfo, OffsetTable, ParentFile, Polarity, Precursor, Scan, ScanHeader,
        SoftwareInfo,
    };
    pub use crate::store::{
        IndexSource, ScanStore, ScanSummary, StoreConfig, StoreError, StoreState,
    };
}
