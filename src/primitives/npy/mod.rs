#![forbid(unsafe_code)]
//! NumPy `.npy` array files.
//!
//! Each persisted CSR array is a one-dimensional vector of fixed-width
//! little-endian integers. The file starts with a self-describing header
//! (magic, format version, header length and a Python-literal dict holding
//! `descr`, `fortran_order` and `shape`) followed by the raw payload. Headers
//! are padded so the payload begins on a [`HEADER_ALIGN`] boundary, which keeps
//! memory-mapped payloads aligned for every supported element type.

use std::io::Write;
use std::ops::Range;

use crate::types::checksum::{Checksum, Crc32Fast};
use crate::types::{Result, StaticGraphError};

/// Leading magic bytes of every `.npy` file.
pub const MAGIC: &[u8; 6] = b"\x93NUMPY";
/// Payload alignment produced by [`ArrayHeader::encode`].
pub const HEADER_ALIGN: usize = 64;

const PREAMBLE_V1: usize = MAGIC.len() + 2 + 2;
const PREAMBLE_V2: usize = MAGIC.len() + 2 + 4;
const WRITE_CHUNK_ELEMS: usize = 16 * 1024;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// Integer types that can be stored in an array file.
pub trait Element: Copy + Default + Send + Sync + 'static + sealed::Sealed {
    /// NumPy type descriptor (`<u4`, `<u8`).
    const DESCR: &'static str;
    /// Width in bytes.
    const SIZE: usize;

    /// Decodes one element from exactly [`Self::SIZE`] little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Appends the little-endian encoding of `self`.
    fn extend_le(self, out: &mut Vec<u8>);
}

impl Element for u32 {
    const DESCR: &'static str = "<u4";
    const SIZE: usize = 4;

    fn from_le_slice(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        u32::from_le_bytes(buf)
    }

    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Element for u64 {
    const DESCR: &'static str = "<u8";
    const SIZE: usize = 8;

    fn from_le_slice(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        u64::from_le_bytes(buf)
    }

    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

/// Parsed `.npy` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayHeader {
    /// Type descriptor, e.g. `<u8`.
    pub descr: String,
    /// Whether the payload is column-major (irrelevant for vectors).
    pub fortran_order: bool,
    /// Array dimensions.
    pub shape: Vec<usize>,
    /// Byte offset of the payload from the start of the file.
    pub data_offset: usize,
}

impl ArrayHeader {
    /// Header describing a vector of `len` elements of type `T`.
    pub fn for_vector<T: Element>(len: usize) -> Self {
        let mut header = Self {
            descr: T::DESCR.to_string(),
            fortran_order: false,
            shape: vec![len],
            data_offset: 0,
        };
        header.data_offset = header.encoded_len();
        header
    }

    fn dict_literal(&self) -> String {
        let shape = match self.shape.as_slice() {
            [single] => format!("({single},)"),
            dims => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                format!("({})", parts.join(", "))
            }
        };
        let fortran = if self.fortran_order { "True" } else { "False" };
        format!(
            "{{'descr': '{}', 'fortran_order': {}, 'shape': {}, }}",
            self.descr, fortran, shape
        )
    }

    fn encoded_len(&self) -> usize {
        let unpadded = PREAMBLE_V1 + self.dict_literal().len() + 1;
        unpadded.div_ceil(HEADER_ALIGN) * HEADER_ALIGN
    }

    /// Encodes the preamble and padded header dict (format version 1.0).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let dict = self.dict_literal();
        let total = self.encoded_len();
        let header_len = u16::try_from(total - PREAMBLE_V1).map_err(|_| {
            StaticGraphError::Serialization("array header exceeds 64 KiB".into())
        })?;
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&header_len.to_le_bytes());
        out.extend_from_slice(dict.as_bytes());
        out.resize(total - 1, b' ');
        out.push(b'\n');
        Ok(out)
    }

    /// Parses the header at the start of `bytes` (versions 1.0 through 3.0).
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PREAMBLE_V1 || &bytes[..MAGIC.len()] != MAGIC {
            return Err(StaticGraphError::storage("not an npy array file (bad magic)"));
        }
        let major = bytes[6];
        let (preamble, header_len) = match major {
            1 => (PREAMBLE_V1, u16::from_le_bytes([bytes[8], bytes[9]]) as usize),
            2 | 3 => {
                if bytes.len() < PREAMBLE_V2 {
                    return Err(StaticGraphError::storage("truncated npy preamble"));
                }
                let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
                (PREAMBLE_V2, len as usize)
            }
            other => {
                return Err(StaticGraphError::Storage(format!(
                    "unsupported npy format version {other}.{}",
                    bytes[7]
                )))
            }
        };
        let data_offset = preamble + header_len;
        let raw = bytes
            .get(preamble..data_offset)
            .ok_or_else(|| StaticGraphError::storage("truncated npy header"))?;
        let dict = std::str::from_utf8(raw)
            .map_err(|_| StaticGraphError::storage("npy header is not valid UTF-8"))?;

        let descr = parse_quoted(dict_field(dict, "descr")?)?;
        let fortran_order = match dict_field(dict, "fortran_order")? {
            rest if rest.starts_with("True") => true,
            rest if rest.starts_with("False") => false,
            _ => return Err(StaticGraphError::storage("malformed fortran_order in npy header")),
        };
        let shape = parse_shape(dict_field(dict, "shape")?)?;

        Ok(Self {
            descr: descr.to_string(),
            fortran_order,
            shape,
            data_offset,
        })
    }

    /// Checks that the header describes a vector of `T` and returns its length.
    pub fn vector_len<T: Element>(&self) -> Result<usize> {
        if self.descr != T::DESCR {
            return Err(StaticGraphError::Storage(format!(
                "array dtype {} does not match expected {}",
                self.descr,
                T::DESCR
            )));
        }
        match self.shape.as_slice() {
            [len] => Ok(*len),
            dims => Err(StaticGraphError::Storage(format!(
                "expected a one-dimensional array, found shape {dims:?}"
            ))),
        }
    }

    /// Byte range of the payload within a file of `file_len` bytes.
    pub fn payload_range<T: Element>(&self, file_len: usize) -> Result<Range<usize>> {
        let len = self.vector_len::<T>()?;
        let end = len
            .checked_mul(T::SIZE)
            .and_then(|bytes| bytes.checked_add(self.data_offset))
            .ok_or_else(|| StaticGraphError::storage("array shape overflows payload size"))?;
        if end != file_len {
            return Err(StaticGraphError::Storage(format!(
                "array payload is {} bytes, header promises {}",
                file_len.saturating_sub(self.data_offset),
                end - self.data_offset
            )));
        }
        Ok(self.data_offset..end)
    }
}

fn dict_field<'a>(dict: &'a str, key: &str) -> Result<&'a str> {
    let needle = format!("'{key}':");
    let start = dict
        .find(&needle)
        .ok_or_else(|| StaticGraphError::Storage(format!("npy header lacks '{key}'")))?;
    Ok(dict[start + needle.len()..].trim_start())
}

fn parse_quoted(rest: &str) -> Result<&str> {
    let quote = rest
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| StaticGraphError::storage("malformed descr in npy header"))?;
    let body = &rest[1..];
    let end = body
        .find(quote)
        .ok_or_else(|| StaticGraphError::storage("unterminated descr in npy header"))?;
    Ok(&body[..end])
}

fn parse_shape(rest: &str) -> Result<Vec<usize>> {
    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.find(')').map(|end| &r[..end]))
        .ok_or_else(|| StaticGraphError::storage("malformed shape in npy header"))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| StaticGraphError::Storage(format!("bad dimension '{dim}' in shape")))
        })
        .collect()
}

/// Writes `data` as a complete `.npy` file and returns the payload CRC32.
pub fn write_vector<T: Element, W: Write>(out: &mut W, data: &[T]) -> Result<u32> {
    let header = ArrayHeader::for_vector::<T>(data.len()).encode()?;
    out.write_all(&header)?;
    let mut crc = Crc32Fast::default();
    let mut buf = Vec::with_capacity(WRITE_CHUNK_ELEMS.min(data.len()) * T::SIZE);
    for chunk in data.chunks(WRITE_CHUNK_ELEMS) {
        buf.clear();
        for value in chunk {
            value.extend_le(&mut buf);
        }
        crc.update(&buf);
        out.write_all(&buf)?;
    }
    Ok(crc.finalize())
}

/// Decodes a little-endian payload into an owned vector.
pub fn decode_vector<T: Element>(payload: &[u8]) -> Vec<T> {
    payload
        .chunks_exact(T::SIZE)
        .map(T::from_le_slice)
        .collect()
}
