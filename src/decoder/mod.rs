//! # Scan record decoder
//!
//! Decodes one scan record starting at a known byte offset. The decoder is
//! handed a [`BufRead`] already positioned at the record's opening delimiter
//! and pulls XML events until the record is complete.
//!
//! ## Modes
//!
//! - [`DecodeMode::HeaderOnly`] steps over peak payloads without decoding
//!   them and stops once the array list closes. Array encodings are still
//!   recorded on the header.
//! - [`DecodeMode::Full`] consumes the payloads and decodes both arrays.
//!
//! The same loop serves both dialects: every attribute and parameter is
//! resolved to a semantic [`Field`](crate::dialect::Field) through the
//! [`DialectDescriptor`] tables. Elements the tables do not name are skipped.
//!
//! A nested record (legacy MSn scans inside their survey scan) ends the
//! current record; the nested one is decoded from its own offset.

mod builder;
mod error;
mod file_info;
pub(crate) mod helpers;

#[cfg(test)]
mod tests;

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::dialect::{DialectDescriptor, Field};
use crate::models::{FileInfo, Scan, ScanHeader};

use builder::{ArrayContent, ArrayContext, FieldValue, HeaderBuilder, PeakArrays, RecordArrays};
pub use error::{ArrayKind, RecordError};
use helpers::{attributes, describe_event, parse_cv_param};

/// How much of a record to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Metadata and array encodings; payloads are skipped
    HeaderOnly,
    /// Metadata and both peak arrays
    Full,
}

/// Decodes scan records of one dialect
#[derive(Debug, Clone, Copy)]
pub struct ScanRecordDecoder {
    descriptor: &'static DialectDescriptor,
}

impl ScanRecordDecoder {
    /// Create a decoder for a dialect
    pub fn new(descriptor: &'static DialectDescriptor) -> Self {
        Self { descriptor }
    }

    /// Dialect descriptor in use
    pub fn descriptor(&self) -> &'static DialectDescriptor {
        self.descriptor
    }

    /// Decode only the header of the record starting at `source`
    ///
    /// `offset` is the record's position in the file and is copied into
    /// the returned header.
    pub fn read_header<R: BufRead>(
        &self,
        source: R,
        offset: u64,
    ) -> Result<ScanHeader, RecordError> {
        Ok(self.decode(source, offset, DecodeMode::HeaderOnly)?.header)
    }

    /// Decode the header and both peak arrays of the record starting at `source`
    pub fn read_scan<R: BufRead>(&self, source: R, offset: u64) -> Result<Scan, RecordError> {
        self.decode(source, offset, DecodeMode::Full)
    }

    /// Read file-level metadata from the start of a file
    ///
    /// Parsing stops at the first record.
    pub fn read_file_info<R: BufRead>(&self, source: R) -> Result<FileInfo, RecordError> {
        file_info::read_file_info(self.descriptor, source)
    }

    /// Scan number declared by a record's opening tag
    ///
    /// `tag` holds the opening tag only, e.g. `<scan num="12" msLevel="1">`.
    /// Only the dialect's key attributes are consulted.
    pub fn read_record_key(&self, tag: &[u8]) -> Result<u32, RecordError> {
        let d = self.descriptor;
        let mut reader = Reader::from_reader(tag);
        let mut buf = Vec::new();
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.name().as_ref() == d.record_tag.as_bytes() =>
            {
                let mut builder = HeaderBuilder::new(0);
                self.apply_attributes(e, &mut builder, Target::Key)?;
                Ok(builder.finish()?.scan_number)
            }
            other => Err(RecordError::NotARecord {
                expected: d.record_tag,
                found: describe_event(&other),
            }),
        }
    }

    /// Decode a record in the given mode
    pub fn decode<R: BufRead>(
        &self,
        source: R,
        offset: u64,
        mode: DecodeMode,
    ) -> Result<Scan, RecordError> {
        let d = self.descriptor;
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);

        let mut builder = HeaderBuilder::new(offset);
        let mut buf = Vec::new();

        // The first event must open the record
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == d.record_tag.as_bytes() => {
                    self.apply_attributes(e, &mut builder, Target::Record)?;
                    break;
                }
                Event::Empty(ref e) if e.name().as_ref() == d.record_tag.as_bytes() => {
                    // Self-closing record: header only, no arrays
                    self.apply_attributes(e, &mut builder, Target::Record)?;
                    let header = builder.finish()?;
                    return finish_scan(header, Vec::new(), mode);
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                other => {
                    return Err(RecordError::NotARecord {
                        expected: d.record_tag,
                        found: describe_event(&other),
                    })
                }
            }
            buf.clear();
        }
        buf.clear();

        let mut depth = 1usize;
        let mut in_precursor = false;
        let mut in_payload = false;
        let mut array: Option<ArrayContext> = None;
        let mut arrays = RecordArrays::default();
        let mut skip_buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf)?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let name = e.name();
                    let name = name.as_ref();

                    if name == d.record_tag.as_bytes() {
                        log::trace!("nested <{}> ends record at offset {}", d.record_tag, offset);
                        break;
                    }

                    if d.precursor_tag.is_some_and(|tag| name == tag.as_bytes()) {
                        self.apply_attributes(e, &mut builder, Target::Precursor)?;
                        in_precursor = !is_empty;
                    } else if d.param_tag.is_some_and(|tag| name == tag.as_bytes()) {
                        let param = parse_cv_param(e)?;
                        if let Some(field) = d.param_field(&param.accession) {
                            let value = FieldValue {
                                value: param.value.as_deref(),
                                name: Some(param.name.as_str()),
                                unit: param.unit(),
                            };
                            match array.as_mut() {
                                Some(ctx) => ctx.apply(field, value)?,
                                None => builder.apply(field, value)?,
                            }
                        }
                    } else if name == d.array_tag.as_bytes() {
                        let mut ctx = ArrayContext::new(d.positional_arrays);
                        for (key, value) in attributes(e)? {
                            if let Some(field) = d.array_field(&key) {
                                ctx.apply(field, FieldValue::text(&value))?;
                            }
                        }
                        array = Some(ctx);
                    }

                    let closes_array = name == d.array_tag.as_bytes();
                    if name == d.payload_tag.as_bytes() && !is_empty {
                        if mode == DecodeMode::HeaderOnly {
                            // Step over the payload text without collecting it
                            reader.read_to_end_into(e.name(), &mut skip_buf)?;
                            skip_buf.clear();
                            if closes_array {
                                arrays.extend(array.take());
                            }
                            buf.clear();
                            continue;
                        }
                        in_payload = true;
                    }

                    if is_empty {
                        if closes_array {
                            arrays.extend(array.take());
                        }
                    } else {
                        depth += 1;
                    }
                }
                Event::Text(ref t) => {
                    if in_payload {
                        if let Some(ctx) = array.as_mut() {
                            ctx.payload.extend_from_slice(t);
                        }
                    } else if in_precursor {
                        let text = std::str::from_utf8(t)?;
                        builder.apply(Field::PrecursorMz, FieldValue::text(text))?;
                    }
                }
                Event::CData(ref t) => {
                    if in_payload {
                        if let Some(ctx) = array.as_mut() {
                            ctx.payload.extend_from_slice(t);
                        }
                    }
                }
                Event::End(ref e) => {
                    depth = depth.saturating_sub(1);
                    let name = e.name();
                    let name = name.as_ref();

                    if name == d.payload_tag.as_bytes() {
                        in_payload = false;
                    }
                    if name == d.array_tag.as_bytes() {
                        arrays.extend(array.take());
                    }
                    if d.precursor_tag.is_some_and(|tag| name == tag.as_bytes()) {
                        in_precursor = false;
                    }
                    if depth == 0 {
                        break;
                    }
                    // Nothing of interest follows the array list
                    if mode == DecodeMode::HeaderOnly
                        && d.array_list_tag.is_some_and(|tag| name == tag.as_bytes())
                    {
                        break;
                    }
                }
                Event::Eof => return Err(RecordError::UnexpectedEof),
                _ => {}
            }
            buf.clear();
        }

        let arrays = arrays.resolve();
        for (content, ctx) in &arrays {
            if let Some(encoding) = ctx.encoding() {
                builder.note_encoding(*content, encoding);
            }
        }
        let header = builder.finish()?;
        finish_scan(header, arrays, mode)
    }

    fn apply_attributes(
        &self,
        e: &BytesStart,
        builder: &mut HeaderBuilder,
        target: Target,
    ) -> Result<(), RecordError> {
        for (key, value) in attributes(e)? {
            let field = match target {
                Target::Record => self.descriptor.record_field(&key),
                Target::Precursor => self.descriptor.precursor_field(&key),
                Target::Key => self.descriptor.key_field(&key),
            };
            if let Some(field) = field {
                builder.apply(field, FieldValue::text(&value))?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Target {
    Record,
    Precursor,
    Key,
}

fn finish_scan(
    header: ScanHeader,
    arrays: Vec<(ArrayContent, ArrayContext)>,
    mode: DecodeMode,
) -> Result<Scan, RecordError> {
    if mode == DecodeMode::HeaderOnly || header.peak_count == 0 {
        return Ok(Scan {
            header,
            ..Default::default()
        });
    }

    let mut decoded = PeakArrays::default();
    for (content, ctx) in arrays {
        ctx.decode_into(content, header.peak_count, &mut decoded)?;
    }

    let masses = decoded
        .masses
        .ok_or(RecordError::MissingArray(ArrayKind::Mz, header.peak_count))?;
    let intensities = decoded
        .intensities
        .ok_or(RecordError::MissingArray(ArrayKind::Intensity, header.peak_count))?;

    Ok(Scan {
        header,
        masses,
        intensities,
    })
}
