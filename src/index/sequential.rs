use quick_xml::events::Event;
use quick_xml::Reader;

use super::IndexError;
use crate::chunked::ChunkedByteReader;
use crate::decoder::helpers::get_attribute;
use crate::decoder::{RecordError, ScanRecordDecoder};
use crate::dialect::DialectDescriptor;
use crate::models::{OffsetTable, OffsetTableBuilder};

/// Start of one record found by the sequential scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLocation {
    /// Scan number declared by the opening tag
    pub scan_number: u32,
    /// Offset of the opening delimiter
    pub offset: u64,
}

/// Finds record delimiters in file order, one window at a time
///
/// Matches may straddle window boundaries: unmatched bytes that could still
/// begin a delimiter are carried over and prepended to the next window, and
/// an opening tag cut by a boundary is completed from the following window.
#[derive(Debug)]
pub struct RecordScanner {
    decoder: ScanRecordDecoder,
    delimiter: Vec<u8>,
    /// Unconsumed bytes, `carry[0]` sits at `carry_start` in the file
    carry: Vec<u8>,
    carry_start: u64,
    next_read: u64,
    exhausted: bool,
}

impl RecordScanner {
    /// Scan from the start of the file
    pub fn new(descriptor: &'static DialectDescriptor) -> Self {
        Self::starting_at(descriptor, 0)
    }

    /// Scan from an arbitrary file offset
    pub fn starting_at(descriptor: &'static DialectDescriptor, offset: u64) -> Self {
        Self {
            decoder: ScanRecordDecoder::new(descriptor),
            delimiter: descriptor.record_delimiter().into_bytes(),
            carry: Vec::new(),
            carry_start: offset,
            next_read: offset,
            exhausted: false,
        }
    }

    /// Find the next record
    ///
    /// The scanner only remembers its own file position, so `reader` may be
    /// repositioned between calls.
    pub fn next_record(
        &mut self,
        reader: &mut ChunkedByteReader,
    ) -> Result<Option<RecordLocation>, IndexError> {
        loop {
            if let Some(start) = self.find_delimiter() {
                match self.opening_tag_end(start) {
                    Some(end) => {
                        let offset = self.carry_start + start as u64;
                        let scan_number = self
                            .decoder
                            .read_record_key(&self.carry[start..=end])
                            .map_err(|source| match source {
                                RecordError::MissingScanNumber => {
                                    IndexError::MissingScanNumber { offset }
                                }
                                source => IndexError::RecordTag { offset, source },
                            })?;
                        self.discard(end + 1);
                        return Ok(Some(RecordLocation {
                            scan_number,
                            offset,
                        }));
                    }
                    None if self.exhausted => {
                        return Err(IndexError::RecordTag {
                            offset: self.carry_start + start as u64,
                            source: RecordError::UnexpectedEof,
                        })
                    }
                    None => {
                        // Tag cut by the window boundary; keep it whole
                        self.discard(start);
                    }
                }
            } else {
                if self.exhausted {
                    return Ok(None);
                }
                // Anything but a possible delimiter prefix can go
                let keep = self.delimiter.len().min(self.carry.len());
                self.discard(self.carry.len() - keep);
            }

            self.fill(reader)?;
        }
    }

    /// Position of the next complete delimiter followed by a tag boundary
    fn find_delimiter(&self) -> Option<usize> {
        let len = self.delimiter.len();
        let mut from = 0;
        while let Some(pos) = find(&self.carry[from..], &self.delimiter) {
            let start = from + pos;
            match self.carry.get(start + len) {
                Some(&b) if b.is_ascii_whitespace() || b == b'>' || b == b'/' => return Some(start),
                Some(_) => from = start + 1,
                // Boundary byte not read yet
                None => return None,
            }
        }
        None
    }

    /// Position of the `>` closing the opening tag at `start`
    fn opening_tag_end(&self, start: usize) -> Option<usize> {
        let mut quote: Option<u8> = None;
        for (i, &b) in self.carry.iter().enumerate().skip(start) {
            match (quote, b) {
                (Some(q), b) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"') | (None, b'\'') => quote = Some(b),
                (None, b'>') => return Some(i),
                _ => {}
            }
        }
        None
    }

    fn discard(&mut self, count: usize) {
        self.carry.drain(..count);
        self.carry_start += count as u64;
    }

    fn fill(&mut self, reader: &mut ChunkedByteReader) -> Result<(), IndexError> {
        reader.seek_to(self.next_read);
        let chunk = reader.next_chunk()?;
        if chunk.is_empty() {
            self.exhausted = true;
        } else {
            self.carry.extend_from_slice(chunk);
            self.next_read += chunk.len() as u64;
        }
        Ok(())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Read the record count declared near the top of the file
///
/// Stops at the first record; returns `None` if no declaration precedes it.
pub fn read_declared_count(
    reader: &mut ChunkedByteReader,
    descriptor: &DialectDescriptor,
) -> Result<Option<u64>, IndexError> {
    reader.seek_to(0);
    let mut xml = Reader::from_reader(&mut *reader);
    xml.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = e.name();
                if name.as_ref() == descriptor.record_count_tag.as_bytes() {
                    return Ok(get_attribute(e, descriptor.record_count_attribute)?
                        .and_then(|v| v.trim().parse().ok()));
                }
                if name.as_ref() == descriptor.record_tag.as_bytes() {
                    return Ok(None);
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Builds an [`OffsetTable`] by scanning the whole file
#[derive(Debug, Clone, Copy)]
pub struct SequentialIndexBuilder {
    descriptor: &'static DialectDescriptor,
}

impl SequentialIndexBuilder {
    /// Create a builder for a dialect
    pub fn new(descriptor: &'static DialectDescriptor) -> Self {
        Self { descriptor }
    }

    /// Scanner yielding record locations in file order without building a table
    pub fn records(&self) -> RecordScanner {
        RecordScanner::new(self.descriptor)
    }

    /// Scan the file and collect every record's offset
    pub fn build(&self, reader: &mut ChunkedByteReader) -> Result<OffsetTable, IndexError> {
        let declared = read_declared_count(reader, self.descriptor)?;
        let capacity = declared.map_or(0, |n| n.min(1 << 20) as usize);
        let mut builder = OffsetTableBuilder::with_capacity(capacity);

        let mut scanner = self.records();
        while let Some(location) = scanner.next_record(reader)? {
            if let Some(first) = builder.insert(location.scan_number, location.offset) {
                return Err(IndexError::DuplicateScan {
                    scan_number: location.scan_number,
                    first,
                    second: location.offset,
                });
            }
        }

        let table = builder.build();
        if let Some(declared) = declared {
            if declared != table.len() as u64 {
                log::warn!(
                    "file declares {} scans but {} records were found",
                    declared,
                    table.len()
                );
            }
        }
        Ok(table)
    }
}
