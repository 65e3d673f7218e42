//! Windowed, memory-mapped reads over large scan files
//!
//! Scan files routinely run to several gigabytes, so nothing here ever maps or
//! buffers the whole file. A [`ChunkedByteReader`] keeps exactly one mapped
//! window alive at a time and replaces it on the next request:
//!
//! - [`ChunkedByteReader::read_at`] maps `[offset, offset + min(length, remaining))`
//! - [`ChunkedByteReader::next_chunk`] maps the next `window_size` bytes after the
//!   previous read, which is what the sequential index builder walks the file with
//! - the [`BufRead`] implementation streams from a seek position, so the XML pull
//!   parser can read a record straight out of the mapped windows

use std::fs::File;
use std::io::{self, BufRead, Read};
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

/// Default number of bytes mapped per window (10 KiB)
pub const DEFAULT_WINDOW_SIZE: usize = 10 * 1024;

/// Positioned, windowed reader over a read-only file
pub struct ChunkedByteReader {
    file: File,
    file_len: u64,
    window_size: usize,
    window: Option<Mmap>,
    window_start: u64,
    cursor: usize,
    bytes_consumed: u64,
}

impl ChunkedByteReader {
    /// Open a file with the default window size
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::with_window_size(path, DEFAULT_WINDOW_SIZE)
    }

    /// Open a file mapping at most `window_size` bytes per sequential read
    pub fn with_window_size<P: AsRef<Path>>(path: P, window_size: usize) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            file,
            file_len,
            window_size: window_size.max(1),
            window: None,
            window_start: 0,
            cursor: 0,
            bytes_consumed: 0,
        })
    }

    /// Total length of the underlying file in bytes
    pub fn len(&self) -> u64 {
        self.file_len
    }

    /// Returns true if the underlying file is empty
    pub fn is_empty(&self) -> bool {
        self.file_len == 0
    }

    /// Number of bytes mapped per sequential read
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Total number of bytes handed out since the reader was opened.
    ///
    /// The counter never decreases, not even across [`seek_to`](Self::seek_to).
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    /// Absolute file position of the next unread byte
    pub fn position(&self) -> u64 {
        self.window_start + self.cursor as u64
    }

    /// Returns true once the read position has reached the end of the file
    pub fn is_eof(&self) -> bool {
        self.position() >= self.file_len
    }

    /// Read `length` bytes starting at `offset`.
    ///
    /// Returns fewer bytes only when the file ends first; the following call
    /// then returns an empty slice. The returned slice borrows the current
    /// window and is invalidated by the next read.
    pub fn read_at(&mut self, offset: u64, length: usize) -> io::Result<&[u8]> {
        self.map_window(offset, length)?;
        let available = self.window_len();
        self.cursor = available;
        self.bytes_consumed += available as u64;
        Ok(self.window_bytes())
    }

    /// Read the next window following the previous read
    pub fn next_chunk(&mut self) -> io::Result<&[u8]> {
        let position = self.position();
        let size = self.window_size;
        self.read_at(position, size)
    }

    /// Reposition the reader so that streaming reads continue at `offset`
    pub fn seek_to(&mut self, offset: u64) {
        self.window = None;
        self.window_start = offset.min(self.file_len);
        self.cursor = 0;
    }

    fn map_window(&mut self, offset: u64, length: usize) -> io::Result<()> {
        let offset = offset.min(self.file_len);
        let remaining = self.file_len - offset;
        let len = (length as u64).min(remaining) as usize;

        self.window_start = offset;
        self.cursor = 0;
        self.window = if len == 0 {
            None
        } else {
            // SAFETY: the mapping is read-only and scan files are treated as
            // immutable while a handle is open.
            let mmap = unsafe { MmapOptions::new().offset(offset).len(len).map(&self.file)? };
            Some(mmap)
        };

        Ok(())
    }

    fn window_bytes(&self) -> &[u8] {
        self.window.as_deref().unwrap_or(&[])
    }

    fn window_len(&self) -> usize {
        self.window.as_ref().map_or(0, |w| w.len())
    }
}

impl BufRead for ChunkedByteReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.cursor >= self.window_len() {
            let position = self.position();
            self.map_window(position, self.window_size)?;
        }
        Ok(&self.window_bytes()[self.cursor..])
    }

    fn consume(&mut self, amt: usize) {
        let amt = amt.min(self.window_len() - self.cursor);
        self.cursor += amt;
        self.bytes_consumed += amt as u64;
    }
}

impl Read for ChunkedByteReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl std::fmt::Debug for ChunkedByteReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedByteReader")
            .field("file_len", &self.file_len)
            .field("window_size", &self.window_size)
            .field("position", &self.position())
            .field("bytes_consumed", &self.bytes_consumed)
            .finish()
    }
}
