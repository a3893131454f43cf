//! Turning typed arrays into the bytes that end up in a file, and back.
//!
//! Binary arrays are preceded by a header of unsigned integers describing their
//! length. Without compression the header is a single value, the number of
//! payload bytes. With compression it is the block table
//! `[num_blocks, block_size, last_block_size, compressed_sizes...]`.
//!
//! With base64 encoding an uncompressed array is encoded together with its
//! header as one base64 string, while for compressed arrays the header and the
//! compressed blocks are encoded separately and concatenated.

use crate::compression::{CompressedBlocks, Compressor};
use crate::error::{ConfigError, DecodeError, Error};
use crate::field::FieldData;
use crate::precision::{ByteOrder, Numeric, Precision};

/// Options of the plain text encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AsciiOptions {
    /// number of digits after the decimal point for floating point values,
    /// `None` writes the shortest representation that round trips
    pub precision: Option<usize>,
    /// insert a line break after this many values
    pub entries_per_line: Option<usize>,
}

/// How the bytes of an array are represented in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    /// human readable, whitespace separated text
    Ascii(AsciiOptions),
    Base64,
    /// unencoded bytes, only usable in the appended section
    RawBinary,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::RawBinary
    }
}

impl Encoder {
    pub fn ascii() -> Self {
        Self::Ascii(AsciiOptions::default())
    }

    pub fn is_ascii(&self) -> bool {
        matches!(self, Self::Ascii(_))
    }

    pub fn vtk_name(&self) -> &'static str {
        match self {
            Self::Ascii(_) => "ascii",
            Self::Base64 => "base64",
            Self::RawBinary => "raw",
        }
    }
}

/// Integer type of the length headers in front of binary arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPrecision {
    UInt32,
    #[default]
    UInt64,
}

impl HeaderPrecision {
    pub fn precision(&self) -> Precision {
        match self {
            Self::UInt32 => Precision::UINT32,
            Self::UInt64 => Precision::UINT64,
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.precision().size_in_bytes()
    }

    fn extend_bytes(&self, value: usize, order: ByteOrder, out: &mut Vec<u8>) -> Result<(), ConfigError> {
        match self {
            Self::UInt32 => u32::try_from(value)
                .map_err(|_| ConfigError::HeaderOverflow(value))?
                .extend_bytes(order, out),
            Self::UInt64 => (value as u64).extend_bytes(order, out),
        }
        Ok(())
    }

    fn read(&self, bytes: &[u8], index: usize, order: ByteOrder) -> Result<usize, DecodeError> {
        let size = self.size_in_bytes();
        let chunk = bytes
            .get(index * size..(index + 1) * size)
            .ok_or_else(|| DecodeError::new("binary", format!("header entry {} is missing", index)))?;

        let value = match self {
            Self::UInt32 => u32::from_bytes(chunk, order) as u64,
            Self::UInt64 => u64::from_bytes(chunk, order),
        };

        usize::try_from(value).map_err(|_| DecodeError::new("binary", format!("header value {} is too large", value)))
    }

    fn encode(&self, values: &[usize], order: ByteOrder) -> Result<Vec<u8>, ConfigError> {
        let mut out = Vec::with_capacity(values.len() * self.size_in_bytes());
        for &value in values {
            self.extend_bytes(value, order, &mut out)?;
        }
        Ok(out)
    }
}

/// Number of base64 characters needed to encode `bytes` bytes
fn base64_len(bytes: usize) -> usize {
    4 * ((bytes + 2) / 3)
}

/// Size in bytes of a block table with `num_blocks` entries, `None` if a
/// corrupt header announces more blocks than can be addressed
fn block_table_len(num_blocks: usize, entry_size: usize) -> Option<usize> {
    num_blocks.checked_add(3)?.checked_mul(entry_size)
}

fn oversized(what: &str, value: usize) -> DecodeError {
    DecodeError::new("binary", format!("{} of {} is larger than any input", what, value))
}

fn total_size(sizes: &[usize]) -> Result<usize, DecodeError> {
    sizes
        .iter()
        .try_fold(0usize, |total, size| total.checked_add(*size))
        .ok_or_else(|| DecodeError::new("binary", "compressed block sizes overflow".into()))
}

fn decode_base64(text: &[u8]) -> Result<Vec<u8>, DecodeError> {
    base64::decode(text).map_err(|e| DecodeError::new("base64", e.to_string()))
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn slice<'b>(bytes: &'b [u8], start: usize, len: usize, what: &str) -> Result<&'b [u8], DecodeError> {
    bytes.get(start..).and_then(|rest| rest.get(..len)).ok_or_else(|| {
        DecodeError::new(
            "binary",
            format!("{} needs {} bytes at {}, but only {} are available", what, len, start, bytes.len()),
        )
    })
}

/// The full serialization pipeline of a single array: byte order, compression,
/// header layout and encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Codec {
    pub encoder: Encoder,
    pub compressor: Compressor,
    pub header: HeaderPrecision,
    pub byte_order: ByteOrder,
}

impl Codec {
    pub fn new(encoder: Encoder, compressor: Compressor, header: HeaderPrecision, byte_order: ByteOrder) -> Self {
        Self {
            encoder,
            compressor,
            header,
            byte_order,
        }
    }

    /// Serialize an array into the exact bytes that are written to the file.
    /// Text encodings ignore the compressor.
    pub fn encode(&self, data: &FieldData) -> Result<Vec<u8>, Error> {
        let options = match self.encoder {
            Encoder::Ascii(options) => options,
            _ => return self.encode_binary(data),
        };

        let mut text = String::new();
        data.write_ascii(options.precision, options.entries_per_line, &mut text);
        Ok(text.into_bytes())
    }

    fn encode_binary(&self, data: &FieldData) -> Result<Vec<u8>, Error> {
        let payload = data.to_bytes(self.byte_order);

        let out = match self.compressor.compress(&payload)? {
            None => {
                let mut block = self.header.encode(&[payload.len()], self.byte_order)?;
                block.extend_from_slice(&payload);
                match self.encoder {
                    Encoder::Base64 => base64::encode(&block).into_bytes(),
                    _ => block,
                }
            }
            Some(blocks) => {
                let header = self.header.encode(&blocks.header(), self.byte_order)?;
                match self.encoder {
                    Encoder::Base64 => {
                        let mut out = base64::encode(&header).into_bytes();
                        out.extend_from_slice(base64::encode(&blocks.data).as_bytes());
                        out
                    }
                    _ => {
                        let mut out = header;
                        out.extend_from_slice(&blocks.data);
                        out
                    }
                }
            }
        };

        Ok(out)
    }

    /// Reconstruct an array of the given precision from the output of
    /// [`encode`](Codec::encode). Surrounding whitespace in text encodings is
    /// ignored.
    pub fn decode(&self, encoded: &[u8], precision: Precision) -> Result<FieldData, Error> {
        let payload = match self.encoder {
            Encoder::Ascii(_) => {
                let text = std::str::from_utf8(encoded).map_err(|e| DecodeError::new("ascii", e.to_string()))?;
                return Ok(FieldData::from_ascii(precision, text)?);
            }
            Encoder::RawBinary => self.decode_raw(encoded)?,
            Encoder::Base64 => self.decode_base64(trim_whitespace(encoded))?,
        };

        Ok(FieldData::from_bytes(precision, &payload, self.byte_order)?)
    }

    fn decode_raw(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        let h = self.header.size_in_bytes();

        if self.compressor.is_none() {
            let len = self.header.read(bytes, 0, self.byte_order)?;
            return Ok(slice(bytes, h, len, "payload")?.to_vec());
        }

        let num_blocks = self.header.read(bytes, 0, self.byte_order)?;
        let header_len = block_table_len(num_blocks, h).ok_or_else(|| oversized("block count", num_blocks))?;
        let header = slice(bytes, 0, header_len, "block table")?;
        let blocks = self.read_block_table(header)?;

        self.decompress(blocks, &bytes[header_len..])
    }

    fn decode_base64(&self, text: &[u8]) -> Result<Vec<u8>, Error> {
        let h = self.header.size_in_bytes();

        if self.compressor.is_none() {
            let block = decode_base64(text)?;
            let len = self.header.read(&block, 0, self.byte_order)?;
            return Ok(slice(&block, h, len, "payload")?.to_vec());
        }

        // the leading groups of the header encode the number of blocks
        let first = decode_base64(slice(text, 0, base64_len(h), "base64 header")?)?;
        let num_blocks = self.header.read(&first, 0, self.byte_order)?;

        let header_chars = block_table_len(num_blocks, h)
            .filter(|len| *len <= text.len())
            .map(base64_len)
            .ok_or_else(|| oversized("block count", num_blocks))?;
        let header = decode_base64(slice(text, 0, header_chars, "base64 header")?)?;
        let blocks = self.read_block_table(&header)?;
        let data = decode_base64(text.get(header_chars..).unwrap_or_default())?;

        self.decompress(blocks, &data)
    }

    /// Parse a block table; the returned blocks have no data yet
    fn read_block_table(&self, header: &[u8]) -> Result<CompressedBlocks, DecodeError> {
        let num_blocks = self.header.read(header, 0, self.byte_order)?;
        let block_size = self.header.read(header, 1, self.byte_order)?;
        let last_block_size = self.header.read(header, 2, self.byte_order)?;

        let compressed_sizes = (0..num_blocks)
            .map(|i| self.header.read(header, 3 + i, self.byte_order))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompressedBlocks {
            block_size,
            last_block_size,
            data: Vec::new(),
            compressed_sizes,
        })
    }

    fn decompress(&self, mut blocks: CompressedBlocks, data: &[u8]) -> Result<Vec<u8>, Error> {
        let total = total_size(&blocks.compressed_sizes)?;
        blocks.data.extend_from_slice(slice(data, 0, total, "compressed blocks")?);
        self.compressor.decompress(&blocks)
    }
}
