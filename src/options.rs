//! Writer configuration.
//!
//! [`XmlOptions`] is what users build; it is checked once when a writer is
//! constructed. Combinations VTK cannot read (ascii text in the appended
//! section, raw bytes inline) are rejected there, and the automatic choices are
//! filled in, so the document writer only ever sees a consistent setup.

use crate::compression::{CompressionOptions, Compressor};
use crate::encoding::{Codec, Encoder, HeaderPrecision};
use crate::error::{ConfigError, InvalidPlacement};
use crate::precision::ByteOrder;

/// Where the values of data arrays are placed in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// values are written as the text content of their `DataArray` element
    Inlined,
    /// values are collected in a trailing `AppendedData` section and referenced
    /// by byte offset
    Appended,
}

/// Configuration of a writer. Fixed once the writer is constructed.
///
/// The defaults write raw binary, zlib compressed arrays into an appended
/// section with 64 bit headers in little endian byte order.
///
/// ```
/// use gridformat::{Compressor, DataFormat, Encoder, XmlOptions};
///
/// let options = XmlOptions::default()
///     .with_encoder(Encoder::Base64)
///     .with_compressor(Compressor::lz4())
///     .with_data_format(DataFormat::Inlined);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XmlOptions {
    pub encoder: Encoder,
    pub compressor: Compressor,
    /// `None` picks inlined for ascii and appended otherwise
    pub data_format: Option<DataFormat>,
    pub header_precision: HeaderPrecision,
    pub byte_order: ByteOrder,
}

impl XmlOptions {
    /// Options for human readable output, typically used for debugging
    pub fn ascii() -> Self {
        Self::default().with_encoder(Encoder::ascii()).with_compressor(Compressor::None)
    }

    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_compressor(mut self, compressor: Compressor) -> Self {
        self.compressor = compressor;
        self
    }

    /// Change the block size of the active compressor
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        let options = |o: CompressionOptions| o.with_block_size(block_size);
        self.compressor = match self.compressor {
            Compressor::None => Compressor::None,
            Compressor::Zlib(o) => Compressor::Zlib(options(o)),
            Compressor::Lzma(o) => Compressor::Lzma(options(o)),
            Compressor::Lz4(o) => Compressor::Lz4(options(o)),
        };
        self
    }

    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = Some(data_format);
        self
    }

    pub fn with_header_precision(mut self, header_precision: HeaderPrecision) -> Self {
        self.header_precision = header_precision;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Check the configuration and fill in automatic choices
    pub(crate) fn resolve(&self) -> Result<ResolvedOptions, ConfigError> {
        let data_format = self.data_format.unwrap_or(match self.encoder {
            Encoder::Ascii(_) => DataFormat::Inlined,
            _ => DataFormat::Appended,
        });

        match (self.encoder, data_format) {
            (Encoder::Ascii(_), DataFormat::Appended) => {
                return Err(InvalidPlacement::new("ascii", "appended").into());
            }
            (Encoder::RawBinary, DataFormat::Inlined) => {
                return Err(InvalidPlacement::new("raw binary", "inlined").into());
            }
            _ => (),
        }

        let compressor = if self.encoder.is_ascii() && !self.compressor.is_none() {
            tracing::debug!("ascii output is never compressed, ignoring {:?}", self.compressor);
            Compressor::None
        } else {
            self.compressor.validate()?;
            self.compressor
        };

        Ok(ResolvedOptions {
            codec: Codec::new(self.encoder, compressor, self.header_precision, self.byte_order),
            data_format,
        })
    }
}

/// Validated options as used by the document writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedOptions {
    pub(crate) codec: Codec,
    pub(crate) data_format: DataFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automatic_data_format() {
        let resolved = XmlOptions::default().resolve().unwrap();
        assert_eq!(resolved.data_format, DataFormat::Appended);

        let resolved = XmlOptions::ascii().resolve().unwrap();
        assert_eq!(resolved.data_format, DataFormat::Inlined);
    }

    #[test]
    fn illegal_placements() {
        let ascii_appended = XmlOptions::ascii().with_data_format(DataFormat::Appended);
        assert!(matches!(ascii_appended.resolve(), Err(ConfigError::InvalidPlacement(_))));

        let raw_inlined = XmlOptions::default().with_data_format(DataFormat::Inlined);
        assert!(matches!(raw_inlined.resolve(), Err(ConfigError::InvalidPlacement(_))));

        let base64 = XmlOptions::default().with_encoder(Encoder::Base64);
        assert!(base64.with_data_format(DataFormat::Inlined).resolve().is_ok());
        assert!(base64.with_data_format(DataFormat::Appended).resolve().is_ok());
    }

    #[test]
    fn ascii_drops_compression() {
        let options = XmlOptions::default().with_encoder(Encoder::ascii());
        assert_eq!(options.resolve().unwrap().codec.compressor, Compressor::None);
    }

    #[test]
    fn zero_block_size() {
        let options = XmlOptions::default().with_block_size(0);
        assert!(matches!(options.resolve(), Err(ConfigError::ZeroBlockSize)));
    }
}
