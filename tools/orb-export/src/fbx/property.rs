//! FBX property values
//!
//! Each node carries an ordered list of tagged values. The 13 variants
//! below are closed: an unrecognized tag aborts the decode. Array
//! variants may be zlib-compressed on disk; after decoding they are
//! always the plain element sequence.

use std::io::Read;

use flate2::read::ZlibDecoder;

use super::FbxError;
use crate::reader::SliceReader;

/// Typed-cast failure when reading a property as the wrong variant.
#[derive(Debug, thiserror::Error)]
#[error("property type mismatch: expected {expected}, found {found}")]
pub struct PropertyError {
    pub expected: &'static str,
    pub found: &'static str,
}

/// One decoded FBX property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    I16(i16),
    Bool(bool),
    I32(i32),
    F32(f32),
    F64(f64),
    I64(i64),
    String(String),
    Bytes(Vec<u8>),
    F32Array(Vec<f32>),
    I32Array(Vec<i32>),
    F64Array(Vec<f64>),
    I64Array(Vec<i64>),
    BoolArray(Vec<bool>),
}

impl Property {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::I16(_) => "i16",
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::I64(_) => "i64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::F32Array(_) => "f32 array",
            Self::I32Array(_) => "i32 array",
            Self::F64Array(_) => "f64 array",
            Self::I64Array(_) => "i64 array",
            Self::BoolArray(_) => "bool array",
        }
    }

    fn mismatch(&self, expected: &'static str) -> PropertyError {
        PropertyError {
            expected,
            found: self.type_name(),
        }
    }

    pub fn as_i64(&self) -> Result<i64, PropertyError> {
        match self {
            Self::I64(v) => Ok(*v),
            other => Err(other.mismatch("i64")),
        }
    }

    pub fn as_str(&self) -> Result<&str, PropertyError> {
        match self {
            Self::String(v) => Ok(v),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_i32_array(&self) -> Result<&[i32], PropertyError> {
        match self {
            Self::I32Array(v) => Ok(v),
            other => Err(other.mismatch("i32 array")),
        }
    }

    pub fn as_f64_array(&self) -> Result<&[f64], PropertyError> {
        match self {
            Self::F64Array(v) => Ok(v),
            other => Err(other.mismatch("f64 array")),
        }
    }

    /// Read any scalar numeric variant as f64.
    ///
    /// `Properties70` channel values vary between files (doubles,
    /// floats, enum ints), so numeric readers accept all of them.
    pub fn as_number(&self) -> Result<f64, PropertyError> {
        match self {
            Self::I16(v) => Ok(*v as f64),
            Self::I32(v) => Ok(*v as f64),
            Self::I64(v) => Ok(*v as f64),
            Self::F32(v) => Ok(*v as f64),
            Self::F64(v) => Ok(*v),
            other => Err(other.mismatch("number")),
        }
    }

    /// Decode one property from its 1-byte type tag.
    pub(super) fn decode(r: &mut SliceReader) -> Result<Self, FbxError> {
        let tag = r.read_u8()?;
        Ok(match tag {
            b'Y' => Self::I16(r.read_i16()?),
            b'C' => Self::Bool(r.read_u8()? != 0),
            b'I' => Self::I32(r.read_i32()?),
            b'F' => Self::F32(r.read_f32()?),
            b'D' => Self::F64(r.read_f64()?),
            b'L' => Self::I64(r.read_i64()?),
            b'R' => {
                let len = r.read_u32()? as usize;
                Self::Bytes(r.take(len)?.to_vec())
            }
            b'S' => {
                let len = r.read_u32()? as usize;
                Self::String(String::from_utf8_lossy(r.take(len)?).into_owned())
            }
            b'f' => Self::F32Array(decode_array(r, |b| {
                f32::from_le_bytes([b[0], b[1], b[2], b[3]])
            })?),
            b'i' => Self::I32Array(decode_array(r, |b| {
                i32::from_le_bytes([b[0], b[1], b[2], b[3]])
            })?),
            b'd' => Self::F64Array(decode_array(r, |b| {
                f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            })?),
            b'l' => Self::I64Array(decode_array(r, |b| {
                i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            })?),
            b'b' => Self::BoolArray(decode_array(r, |b: &[u8]| b[0] != 0)?),
            b'c' => Self::Bytes(decode_array(r, |b: &[u8]| b[0])?),
            other => return Err(FbxError::UnknownPropertyType(other)),
        })
    }
}

/// Array framing: `length:u32, encoding:u32, compressedByteLen:u32`
/// followed by the payload; encoding 1 means zlib.
fn decode_array<T>(r: &mut SliceReader, element: impl Fn(&[u8]) -> T) -> Result<Vec<T>, FbxError> {
    let length = r.read_u32()? as usize;
    let encoding = r.read_u32()?;
    let stored_len = r.read_u32()? as usize;
    let stored = r.take(stored_len)?;

    let size = core::mem::size_of::<T>();
    let expected = length * size;

    let raw: Vec<u8>;
    let bytes: &[u8] = if encoding == 1 {
        let mut inflated = Vec::with_capacity(expected);
        ZlibDecoder::new(stored).read_to_end(&mut inflated)?;
        if inflated.len() != expected {
            return Err(FbxError::InflatedSizeMismatch {
                expected,
                actual: inflated.len(),
            });
        }
        raw = inflated;
        &raw
    } else {
        if stored.len() < expected {
            return Err(FbxError::InflatedSizeMismatch {
                expected,
                actual: stored.len(),
            });
        }
        stored
    };

    Ok(bytes[..expected].chunks_exact(size).map(element).collect())
}
