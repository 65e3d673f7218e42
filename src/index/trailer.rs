use std::io;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{IndexError, TrailerIndex};
use crate::chunked::ChunkedByteReader;
use crate::decoder::helpers::{describe_event, get_attribute};
use crate::dialect::DialectDescriptor;
use crate::models::{OffsetTable, OffsetTableBuilder};

/// Default number of trailing bytes searched for the index footer
pub const DEFAULT_TAIL_SIZE: usize = 500;

/// Finds the index-offset footer at the end of a file
#[derive(Debug, Clone, Copy)]
pub struct TrailerIndexLocator {
    descriptor: &'static DialectDescriptor,
    tail_size: usize,
}

impl TrailerIndexLocator {
    /// Create a locator searching the default tail size
    pub fn new(descriptor: &'static DialectDescriptor) -> Self {
        Self {
            descriptor,
            tail_size: DEFAULT_TAIL_SIZE,
        }
    }

    /// Search the last `tail_size` bytes instead
    pub fn with_tail_size(mut self, tail_size: usize) -> Self {
        self.tail_size = tail_size;
        self
    }

    /// Offset of the index block, or `None` if the footer is missing or garbled
    pub fn locate(&self, reader: &mut ChunkedByteReader) -> io::Result<Option<u64>> {
        let file_len = reader.len();
        let tail_len = (self.tail_size as u64).min(file_len);
        let tail = reader.read_at(file_len - tail_len, tail_len as usize)?;
        let tail = String::from_utf8_lossy(tail);

        let (open, close) = self.descriptor.index_offset_delimiters();
        let Some(pos) = tail.rfind(&open) else {
            log::debug!("no {} in the last {} bytes", open, tail_len);
            return Ok(None);
        };
        let start = pos + open.len();
        let Some(end) = tail[start..].find(&close) else {
            log::debug!("{} is not closed", open);
            return Ok(None);
        };

        let text = tail[start..start + end].trim();
        let offset = match text.parse::<u64>() {
            Ok(offset) => offset,
            Err(_) => {
                log::debug!("index offset {:?} is not an integer", text);
                return Ok(None);
            }
        };
        if offset >= file_len {
            log::debug!("index offset {} lies beyond the file ({} bytes)", offset, file_len);
            return Ok(None);
        }

        Ok(Some(offset))
    }
}

/// Streams an index block into an [`OffsetTable`]
#[derive(Debug, Clone, Copy)]
pub struct TrailerIndexParser {
    descriptor: &'static DialectDescriptor,
}

impl TrailerIndexParser {
    /// Create a parser for a dialect
    pub fn new(descriptor: &'static DialectDescriptor) -> Self {
        Self { descriptor }
    }

    /// Parse the index block starting at `offset`
    pub fn parse(
        &self,
        reader: &mut ChunkedByteReader,
        offset: u64,
    ) -> Result<TrailerIndex, IndexError> {
        let d = self.descriptor;
        reader.seek_to(offset);

        // Whitespace is kept so that element positions stay exact
        let mut xml = Reader::from_reader(&mut *reader);
        let mut buf = Vec::new();

        let mut builder = OffsetTableBuilder::new();
        let mut index = TrailerIndex {
            index_offset: offset,
            ..Default::default()
        };
        let mut started = false;
        let mut current_index: Option<String> = None;
        // Key and accumulated text of the open offset entry
        let mut entry: Option<(Option<String>, String)> = None;

        loop {
            let position = offset + xml.buffer_position() as u64;
            let event = xml.read_event_into(&mut buf)?;

            if !started {
                match &event {
                    Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {
                        buf.clear();
                        continue;
                    }
                    Event::Start(e)
                        if e.name().as_ref() == d.index_tag.as_bytes()
                            || e.name().as_ref() == d.index_end_tag.as_bytes() =>
                    {
                        started = true;
                    }
                    other => {
                        return Err(IndexError::NotAnIndex {
                            offset,
                            found: describe_event(other),
                        })
                    }
                }
            }

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let name = e.name();
                    let name = name.as_ref();
                    if name == d.index_tag.as_bytes() {
                        current_index = get_attribute(e, d.index_name_attribute)?;
                        if current_index.is_some()
                            && current_index.as_deref() == d.chromatogram_index_name
                        {
                            index.chromatogram_index_offset = Some(position);
                        }
                    } else if name == d.offset_tag.as_bytes() {
                        entry = Some((get_attribute(e, d.offset_key_attribute)?, String::new()));
                    }
                }
                Event::Text(ref t) => {
                    if let Some((_, text)) = entry.as_mut() {
                        text.push_str(&String::from_utf8_lossy(t));
                    }
                }
                Event::End(ref e) => {
                    let name = e.name();
                    let name = name.as_ref();
                    if name == d.offset_tag.as_bytes() {
                        if let Some((key, text)) = entry.take() {
                            let record_offset = text
                                .trim()
                                .parse::<u64>()
                                .map_err(|_| IndexError::InvalidOffset(text.clone()))?;
                            self.record_entry(
                                current_index.as_deref(),
                                key,
                                record_offset,
                                &mut builder,
                                &mut index,
                            )?;
                        }
                    }
                    if name == d.index_end_tag.as_bytes() {
                        break;
                    }
                    if name == d.index_tag.as_bytes() {
                        current_index = None;
                    }
                }
                Event::Eof => return Err(IndexError::Truncated),
                _ => {}
            }
            buf.clear();
        }

        index.table = builder.build();
        log::debug!(
            "parsed {} index at offset {}: {} scans, {} chromatograms",
            d.dialect,
            offset,
            index.table.len(),
            index.chromatogram_offsets.len()
        );
        Ok(index)
    }

    fn record_entry(
        &self,
        index_name: Option<&str>,
        key: Option<String>,
        record_offset: u64,
        builder: &mut OffsetTableBuilder,
        index: &mut TrailerIndex,
    ) -> Result<(), IndexError> {
        let d = self.descriptor;
        // Legacy index blocks are unnamed or named "scan"
        let is_scan_index = index_name.map_or(true, |name| name == d.scan_index_name);

        if is_scan_index {
            let scan_number = key
                .as_deref()
                .and_then(|k| d.scan_number_from_key(k))
                .ok_or_else(|| IndexError::MissingKey(key.clone()))?;
            if let Some(first) = builder.insert(scan_number, record_offset) {
                return Err(IndexError::DuplicateScan {
                    scan_number,
                    first,
                    second: record_offset,
                });
            }
        } else if index_name.is_some() && index_name == d.chromatogram_index_name {
            index
                .chromatogram_offsets
                .push((key.unwrap_or_default(), record_offset));
        } else {
            log::debug!("skipping entry of index {:?}", index_name);
        }
        Ok(())
    }
}

/// Check that the lowest and highest indexed offsets point at record delimiters
///
/// A trailer written for a different version of the file passes parsing but
/// points into the middle of records.
pub fn verify_offsets(
    reader: &mut ChunkedByteReader,
    descriptor: &DialectDescriptor,
    table: &OffsetTable,
) -> Result<(), IndexError> {
    let entries = table.entries_by_offset();
    let (Some(&first), Some(&last)) = (entries.first(), entries.last()) else {
        return Ok(());
    };

    let delimiter = descriptor.record_delimiter();
    for (scan_number, offset) in [first, last] {
        let bytes = reader.read_at(offset, delimiter.len() + 1)?;
        let matches = bytes.starts_with(delimiter.as_bytes())
            && bytes
                .get(delimiter.len())
                .is_some_and(|&b| b.is_ascii_whitespace() || b == b'>' || b == b'/');
        if !matches {
            return Err(IndexError::StaleOffset {
                scan_number,
                offset,
            });
        }
    }
    Ok(())
}
