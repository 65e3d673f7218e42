//! Field setters shared by both dialects
//!
//! The decoder resolves every attribute or parameter to a [`Field`] through the
//! dialect tables and hands the raw text here. Nothing in this file knows
//! which dialect produced the value.

use std::str::FromStr;

use crate::codec::{ArrayEncoding, ByteOrder, Compression, PeakArrayCodec, Precision};
use crate::dialect::{normalize_retention_time, parse_duration_seconds, scan_number_from_native_id, Field};
use crate::models::{Polarity, Precursor, ScanHeader};

use super::{ArrayKind, RecordError};

/// Raw text of one field occurrence
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FieldValue<'a> {
    /// Attribute value or parameter value
    pub value: Option<&'a str>,
    /// Parameter term name, for flag terms
    pub name: Option<&'a str>,
    /// Unit accession or name
    pub unit: Option<&'a str>,
}

impl<'a> FieldValue<'a> {
    pub fn text(value: &'a str) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }
}

fn parse<T: FromStr>(field: Field, value: Option<&str>) -> Result<T, RecordError> {
    let text = value.unwrap_or_default().trim();
    text.parse().map_err(|_| RecordError::InvalidValue {
        field,
        value: text.to_string(),
    })
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string).filter(|s| !s.is_empty())
}

/// Accumulates a [`ScanHeader`] field by field
#[derive(Debug)]
pub(crate) struct HeaderBuilder {
    header: ScanHeader,
    record_index: Option<u32>,
    isolation_target: Option<f64>,
    window_lower: Option<f64>,
    window_upper: Option<f64>,
}

impl HeaderBuilder {
    pub fn new(offset: u64) -> Self {
        Self {
            header: ScanHeader {
                offset,
                ..Default::default()
            },
            record_index: None,
            isolation_target: None,
            window_lower: None,
            window_upper: None,
        }
    }

    pub fn peak_count(&self) -> usize {
        self.header.peak_count
    }

    fn precursor(&mut self) -> &mut Precursor {
        self.header.precursor.get_or_insert_with(Precursor::default)
    }

    pub fn apply(&mut self, field: Field, v: FieldValue<'_>) -> Result<(), RecordError> {
        let h = &mut self.header;
        match field {
            Field::ScanNumber => h.scan_number = parse(field, v.value)?,
            Field::NativeId => h.native_id = owned(v.value),
            Field::RecordIndex => self.record_index = Some(parse(field, v.value)?),
            Field::MsLevel => h.ms_level = parse(field, v.value)?,
            Field::PeakCount => h.peak_count = parse(field, v.value)?,
            Field::RetentionTime => {
                let value: f64 = parse(field, v.value)?;
                h.retention_time = Some(normalize_retention_time(value, v.unit));
            }
            Field::RetentionTimeDuration => {
                let text = v.value.unwrap_or_default();
                h.retention_time = Some(parse_duration_seconds(text).ok_or_else(|| {
                    RecordError::InvalidValue {
                        field,
                        value: text.to_string(),
                    }
                })?);
            }
            Field::BasePeakMz => h.base_peak_mz = Some(parse(field, v.value)?),
            Field::BasePeakIntensity => h.base_peak_intensity = Some(parse(field, v.value)?),
            Field::TotalIonCurrent => h.total_ion_current = Some(parse(field, v.value)?),
            Field::LowMz => h.low_mz = Some(parse(field, v.value)?),
            Field::HighMz => h.high_mz = Some(parse(field, v.value)?),
            Field::ScanWindowLower => self.window_lower = Some(parse(field, v.value)?),
            Field::ScanWindowUpper => self.window_upper = Some(parse(field, v.value)?),
            Field::FilterLine => h.filter_line = owned(v.value),
            Field::ScanType => h.scan_type = owned(v.value),
            Field::ScanTypeFlag => h.scan_type = owned(v.name),
            Field::Polarity => {
                h.polarity = match v.value.map(str::trim) {
                    Some("+") => Polarity::Positive,
                    Some("-") => Polarity::Negative,
                    _ => Polarity::Unknown,
                }
            }
            Field::PositiveScan => h.polarity = Polarity::Positive,
            Field::NegativeScan => h.polarity = Polarity::Negative,
            Field::Centroided => {
                h.centroided = match v.value.map(str::trim) {
                    Some("1") | Some("true") => Some(true),
                    Some("0") | Some("false") => Some(false),
                    _ => None,
                }
            }
            Field::CentroidSpectrum => h.centroided = Some(true),
            Field::ProfileSpectrum => h.centroided = Some(false),
            Field::PrecursorMz => {
                let mz = parse(field, v.value)?;
                let precursor = self.precursor();
                if precursor.mz.is_none() {
                    precursor.mz = Some(mz);
                }
            }
            Field::IsolationTargetMz => {
                if self.isolation_target.is_none() {
                    self.isolation_target = Some(parse(field, v.value)?);
                }
            }
            Field::PrecursorIntensity => {
                let intensity = parse(field, v.value)?;
                self.precursor().intensity.get_or_insert(intensity);
            }
            Field::PrecursorCharge => {
                let charge = parse(field, v.value)?;
                self.precursor().charge.get_or_insert(charge);
            }
            Field::ActivationMethod => {
                if let Some(method) = owned(v.value) {
                    self.precursor().activation.get_or_insert(method);
                }
            }
            Field::ActivationFlag => {
                if let Some(method) = owned(v.name) {
                    self.precursor().activation.get_or_insert(method);
                }
            }
            Field::CollisionEnergy => h.collision_energy = Some(parse(field, v.value)?),
            Field::ArrayPrecision
            | Field::ArrayFloat32
            | Field::ArrayFloat64
            | Field::ArrayCompression
            | Field::ArrayZlib
            | Field::ArrayNoCompression
            | Field::ArrayByteOrder
            | Field::ArrayContent
            | Field::ArrayMz
            | Field::ArrayIntensity => {
                log::debug!("array field {:?} outside of an array element", field);
            }
        }
        Ok(())
    }

    /// Remember the encoding of an array whose payload is about to start
    pub fn note_encoding(&mut self, content: ArrayContent, encoding: ArrayEncoding) {
        let h = &mut self.header;
        match content {
            ArrayContent::Mz => {
                h.mz_encoding.get_or_insert(encoding);
            }
            ArrayContent::Intensity => {
                h.intensity_encoding.get_or_insert(encoding);
            }
            ArrayContent::Pairs => {
                h.mz_encoding.get_or_insert(encoding);
                h.intensity_encoding.get_or_insert(encoding);
            }
            ArrayContent::Other => {}
        }
    }

    pub fn finish(mut self) -> Result<ScanHeader, RecordError> {
        let h = &mut self.header;

        if h.scan_number == 0 {
            h.scan_number = h
                .native_id
                .as_deref()
                .and_then(scan_number_from_native_id)
                .or_else(|| self.record_index.and_then(|i| i.checked_add(1)))
                .ok_or(RecordError::MissingScanNumber)?;
        }

        // Records that do not declare a level are survey scans
        if h.ms_level == 0 {
            h.ms_level = 1;
        }

        if h.low_mz.is_none() {
            h.low_mz = self.window_lower;
        }
        if h.high_mz.is_none() {
            h.high_mz = self.window_upper;
        }

        if let Some(target) = self.isolation_target {
            let precursor = h.precursor.get_or_insert_with(Precursor::default);
            precursor.mz.get_or_insert(target);
        }

        Ok(self.header)
    }
}

/// What an array element holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArrayContent {
    Mz,
    Intensity,
    Pairs,
    Other,
}

impl ArrayContent {
    fn parse(value: &str) -> Self {
        match value.trim() {
            "m/z" | "mz" => ArrayContent::Mz,
            "intensity" => ArrayContent::Intensity,
            "m/z-int" | "m/z ruler" => ArrayContent::Pairs,
            _ => ArrayContent::Other,
        }
    }

    fn kind(self) -> ArrayKind {
        match self {
            ArrayContent::Mz => ArrayKind::Mz,
            ArrayContent::Intensity => ArrayKind::Intensity,
            ArrayContent::Pairs | ArrayContent::Other => ArrayKind::Pairs,
        }
    }
}

/// Encoding declaration and payload of one array element
#[derive(Debug)]
pub(crate) struct ArrayContext {
    precision: Option<Precision>,
    compression: Compression,
    byte_order: ByteOrder,
    content: Option<ArrayContent>,
    positional: bool,
    pub payload: Vec<u8>,
}

/// Decoded arrays of one record
#[derive(Debug, Default)]
pub(crate) struct PeakArrays {
    pub masses: Option<Vec<f64>>,
    pub intensities: Option<Vec<f64>>,
}

impl ArrayContext {
    pub fn new(positional: bool) -> Self {
        Self {
            precision: None,
            compression: Compression::None,
            byte_order: ByteOrder::Little,
            content: None,
            positional,
            payload: Vec::new(),
        }
    }

    pub fn apply(&mut self, field: Field, v: FieldValue<'_>) -> Result<(), RecordError> {
        let text = v.value.unwrap_or_default();
        let invalid = |_| RecordError::InvalidValue {
            field,
            value: text.to_string(),
        };
        match field {
            Field::ArrayPrecision => self.precision = Some(Precision::parse(text).map_err(invalid)?),
            Field::ArrayFloat32 => self.precision = Some(Precision::Float32),
            Field::ArrayFloat64 => self.precision = Some(Precision::Float64),
            Field::ArrayCompression => self.compression = Compression::parse(text).map_err(invalid)?,
            Field::ArrayZlib => self.compression = Compression::Zlib,
            Field::ArrayNoCompression => self.compression = Compression::None,
            Field::ArrayByteOrder => self.byte_order = ByteOrder::parse(text).map_err(invalid)?,
            Field::ArrayContent => self.content = Some(ArrayContent::parse(text)),
            Field::ArrayMz => self.content = Some(ArrayContent::Mz),
            Field::ArrayIntensity => self.content = Some(ArrayContent::Intensity),
            other => log::debug!("ignoring {:?} inside an array element", other),
        }
        Ok(())
    }

    pub fn encoding(&self) -> Option<ArrayEncoding> {
        self.precision.map(|precision| ArrayEncoding {
            precision,
            compression: self.compression,
            byte_order: self.byte_order,
        })
    }

    fn declares(&self, content: ArrayContent) -> bool {
        self.content
            .is_some_and(|c| c == content || c == ArrayContent::Pairs)
    }

    /// Decode the captured payload into `arrays`
    pub fn decode_into(
        self,
        content: ArrayContent,
        peak_count: usize,
        arrays: &mut PeakArrays,
    ) -> Result<(), RecordError> {
        if content == ArrayContent::Other {
            return Ok(());
        }

        let kind = content.kind();
        let encoding = match self.encoding() {
            Some(encoding) => encoding,
            None if peak_count == 0 => ArrayEncoding::default(),
            None => return Err(RecordError::MissingEncoding(kind)),
        };
        let codec_error = |source| RecordError::Codec { array: kind, source };

        match content {
            ArrayContent::Pairs => {
                let (masses, intensities) =
                    PeakArrayCodec::decode_pairs(&self.payload, peak_count, encoding)
                        .map_err(codec_error)?;
                arrays.masses = Some(masses);
                arrays.intensities = Some(intensities);
            }
            ArrayContent::Mz => {
                arrays.masses = Some(
                    PeakArrayCodec::decode_with(&self.payload, peak_count, encoding)
                        .map_err(codec_error)?,
                );
            }
            ArrayContent::Intensity => {
                arrays.intensities = Some(
                    PeakArrayCodec::decode_with(&self.payload, peak_count, encoding)
                        .map_err(codec_error)?,
                );
            }
            ArrayContent::Other => {}
        }
        Ok(())
    }
}

/// Array elements of one record, in document order
#[derive(Debug, Default)]
pub(crate) struct RecordArrays {
    arrays: Vec<ArrayContext>,
}

impl Extend<ArrayContext> for RecordArrays {
    fn extend<I: IntoIterator<Item = ArrayContext>>(&mut self, iter: I) {
        self.arrays.extend(iter);
    }
}

impl RecordArrays {
    /// Pair every array with what it holds
    ///
    /// Positional arrays without a content declaration fill the m/z slot and
    /// then the intensity slot. A lone undeclared array in a record with no
    /// declared arrays holds interleaved pairs.
    pub fn resolve(self) -> Vec<(ArrayContent, ArrayContext)> {
        let mut mz_taken = self.arrays.iter().any(|a| a.declares(ArrayContent::Mz));
        let mut intensity_taken = self
            .arrays
            .iter()
            .any(|a| a.declares(ArrayContent::Intensity));
        let undeclared = self
            .arrays
            .iter()
            .filter(|a| a.positional && a.content.is_none())
            .count();
        let lone = undeclared == 1 && !mz_taken && !intensity_taken;

        self.arrays
            .into_iter()
            .map(|array| {
                let content = match array.content {
                    Some(content) => content,
                    None if !array.positional => ArrayContent::Other,
                    None if lone => ArrayContent::Pairs,
                    None if !mz_taken => {
                        mz_taken = true;
                        ArrayContent::Mz
                    }
                    None if !intensity_taken => {
                        intensity_taken = true;
                        ArrayContent::Intensity
                    }
                    None => {
                        log::debug!("ignoring surplus undeclared array");
                        ArrayContent::Other
                    }
                };
                (content, array)
            })
            .collect()
    }
}
