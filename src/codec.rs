//! Binary peak array decoding
//!
//! Both dialects store numerical arrays (m/z, intensity) as Base64-encoded
//! binary data, optionally compressed with zlib. The decoding pipeline is:
//!
//! 1. Base64 decode the text (whitespace inside the payload is ignored)
//! 2. Inflate if zlib-compressed, to exactly `count * precision / 8` bytes
//! 3. Interpret the bytes as float32 or float64 and widen to `f64`
//!
//! Every step checks the byte length it expects against what it got. A
//! mismatch means a corrupt file or a mis-declared encoding, and is reported
//! instead of padding or truncating the output.

use std::io::Read;

use base64::prelude::*;
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use flate2::read::ZlibDecoder;
use serde::Serialize;

/// Numeric precision of a stored array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Precision {
    /// 32-bit IEEE-754 single
    #[serde(rename = "32")]
    Float32,
    /// 64-bit IEEE-754 double
    #[default]
    #[serde(rename = "64")]
    Float64,
}

impl Precision {
    /// Precision from a declared bit width
    pub fn from_bits(bits: u32) -> Result<Self, CodecError> {
        match bits {
            32 => Ok(Precision::Float32),
            64 => Ok(Precision::Float64),
            other => Err(CodecError::UnsupportedPrecision(other.to_string())),
        }
    }

    /// Precision from a declared attribute value such as `"32"`
    pub fn parse(value: &str) -> Result<Self, CodecError> {
        value
            .trim()
            .parse::<u32>()
            .map_err(|_| CodecError::UnsupportedPrecision(value.to_string()))
            .and_then(Self::from_bits)
    }

    /// Bit width of one stored value
    pub fn bits(&self) -> u32 {
        match self {
            Precision::Float32 => 32,
            Precision::Float64 => 64,
        }
    }

    /// Byte size of one stored value
    pub fn byte_size(&self) -> usize {
        match self {
            Precision::Float32 => 4,
            Precision::Float64 => 8,
        }
    }
}

/// Compression applied to the raw array bytes before Base64 encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Stored as-is
    #[default]
    None,
    /// zlib stream
    Zlib,
}

impl Compression {
    /// Compression from a declared attribute value (`"none"`, `"zlib"`)
    pub fn parse(value: &str) -> Result<Self, CodecError> {
        match value.trim() {
            "" | "none" | "None" => Ok(Compression::None),
            "zlib" | "Zlib" | "ZLIB" => Ok(Compression::Zlib),
            other => Err(CodecError::UnsupportedCompression(other.to_string())),
        }
    }
}

/// Byte order of the stored values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Little-endian
    #[default]
    Little,
    /// Big-endian ("network" order)
    Network,
}

impl ByteOrder {
    /// Byte order from a declared attribute value (`"little"`, `"network"`, `"big"`)
    pub fn parse(value: &str) -> Result<Self, CodecError> {
        match value.trim() {
            "" | "little" | "little-endian" => Ok(ByteOrder::Little),
            "network" | "big" | "big-endian" => Ok(ByteOrder::Network),
            other => Err(CodecError::UnsupportedByteOrder(other.to_string())),
        }
    }
}

/// Complete encoding declaration for one binary array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ArrayEncoding {
    /// Stored precision
    pub precision: Precision,
    /// Compression applied before Base64
    pub compression: Compression,
    /// Byte order of the stored values
    pub byte_order: ByteOrder,
}

impl ArrayEncoding {
    /// Little-endian encoding with the given precision and compression
    pub fn new(precision: Precision, compression: Compression) -> Self {
        Self {
            precision,
            compression,
            byte_order: ByteOrder::Little,
        }
    }
}

/// Errors that can occur during binary decoding
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Payload is not valid Base64
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// zlib stream could not be inflated
    #[error("Decompression error: {0}")]
    Inflate(#[from] std::io::Error),

    /// Observed byte length differs from the declared count and precision
    #[error("Invalid data length: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Bytes implied by the declared count and precision
        expected: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// Precision other than 32 or 64 bits
    #[error("Unsupported precision: {0}")]
    UnsupportedPrecision(String),

    /// Compression scheme other than none or zlib
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// Unknown byte order declaration
    #[error("Unsupported byte order: {0}")]
    UnsupportedByteOrder(String),
}

/// Decoder for Base64 peak arrays
pub struct PeakArrayCodec;

impl PeakArrayCodec {
    /// Decode a little-endian Base64 array of exactly `expected_count` values
    ///
    /// # Arguments
    /// * `base64_text` - The Base64 payload of the array element
    /// * `expected_count` - Declared number of values (the record's peak count)
    /// * `precision` - Stored precision (32 or 64 bit)
    /// * `compression` - Compression applied before Base64 encoding
    pub fn decode(
        base64_text: &[u8],
        expected_count: usize,
        precision: Precision,
        compression: Compression,
    ) -> Result<Vec<f64>, CodecError> {
        Self::decode_with(
            base64_text,
            expected_count,
            ArrayEncoding::new(precision, compression),
        )
    }

    /// Decode an array with a full encoding declaration, including byte order
    pub fn decode_with(
        base64_text: &[u8],
        expected_count: usize,
        encoding: ArrayEncoding,
    ) -> Result<Vec<f64>, CodecError> {
        if expected_count == 0 {
            return Ok(Vec::new());
        }

        // Step 1: Base64 decode
        let decoded = decode_base64(base64_text)?;

        let Some(expected_bytes) = expected_count.checked_mul(encoding.precision.byte_size()) else {
            return Err(CodecError::LengthMismatch {
                expected: usize::MAX,
                actual: decoded.len(),
            });
        };

        // Step 2: Decompress if needed
        let raw = match encoding.compression {
            Compression::None => decoded,
            Compression::Zlib => inflate_exact(&decoded, expected_bytes)?,
        };

        if raw.len() != expected_bytes {
            return Err(CodecError::LengthMismatch {
                expected: expected_bytes,
                actual: raw.len(),
            });
        }

        // Step 3: Convert bytes to floats
        Ok(bytes_to_floats(&raw, encoding))
    }

    /// Decode an interleaved `(m/z, intensity)` pair array into two arrays
    pub fn decode_pairs(
        base64_text: &[u8],
        pair_count: usize,
        encoding: ArrayEncoding,
    ) -> Result<(Vec<f64>, Vec<f64>), CodecError> {
        let value_count = pair_count.saturating_mul(2);
        let values = Self::decode_with(base64_text, value_count, encoding)?;
        let (masses, intensities) = values
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .unzip();
        Ok((masses, intensities))
    }
}

fn decode_base64(text: &[u8]) -> Result<Vec<u8>, CodecError> {
    if text.iter().any(u8::is_ascii_whitespace) {
        let compact: Vec<u8> = text
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        Ok(BASE64_STANDARD.decode(compact)?)
    } else {
        Ok(BASE64_STANDARD.decode(text)?)
    }
}

fn inflate_exact(compressed: &[u8], expected_bytes: usize) -> Result<Vec<u8>, CodecError> {
    // One byte of headroom so an over-long stream shows up as a mismatch
    let mut decoder = ZlibDecoder::new(compressed).take((expected_bytes as u64).saturating_add(1));
    // Declared counts are untrusted; grow past the first megabyte on demand
    let mut inflated = Vec::with_capacity(expected_bytes.min(1 << 20));
    decoder.read_to_end(&mut inflated)?;
    Ok(inflated)
}

fn bytes_to_floats(bytes: &[u8], encoding: ArrayEncoding) -> Vec<f64> {
    match (encoding.precision, encoding.byte_order) {
        (Precision::Float32, ByteOrder::Little) => bytes
            .chunks_exact(4)
            .map(|c| LittleEndian::read_f32(c) as f64)
            .collect(),
        (Precision::Float32, ByteOrder::Network) => bytes
            .chunks_exact(4)
            .map(|c| BigEndian::read_f32(c) as f64)
            .collect(),
        (Precision::Float64, ByteOrder::Little) => {
            bytes.chunks_exact(8).map(LittleEndian::read_f64).collect()
        }
        (Precision::Float64, ByteOrder::Network) => {
            bytes.chunks_exact(8).map(BigEndian::read_f64).collect()
        }
    }
}
