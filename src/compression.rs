//! Block-wise compression of serialized arrays.
//!
//! The input is split into blocks of `block_size` bytes (the last one may be
//! shorter), and every block is compressed on its own. A reader can therefore
//! decompress any block without touching the others.

use crate::error::{CompressionError, ConfigError, Error};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

pub const DEFAULT_BLOCK_SIZE: usize = 1 << 15;

/// zlib compression level used when none is requested
pub const DEFAULT_LEVEL: u32 = 6;

/// Upper bound of the lz4 compression ratio. Block tables announcing more output
/// than a block can produce are rejected before anything is allocated.
const LZ4_MAX_RATIO: usize = 255;

/// capacity reserved per compressed byte when the announced size is not trusted
const RESERVE_RATIO: usize = 8;

/// Parameters shared by all compressors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    /// maximum number of uncompressed bytes per block
    pub block_size: usize,
    /// Compression level. Only zlib supports levels (0 to 9), the other
    /// compressors ignore it.
    pub level: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            level: DEFAULT_LEVEL,
        }
    }
}

impl CompressionOptions {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }
}

/// Compression applied to binary arrays before they are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compressor {
    None,
    Zlib(CompressionOptions),
    Lzma(CompressionOptions),
    Lz4(CompressionOptions),
}

impl Default for Compressor {
    fn default() -> Self {
        Self::zlib()
    }
}

/// The output of compressing a buffer, along with the block table that is
/// written into the array's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBlocks {
    pub block_size: usize,
    /// uncompressed size of the final block, equal to `block_size` if the input
    /// divides evenly and zero for an empty input
    pub last_block_size: usize,
    pub compressed_sizes: Vec<usize>,
    /// all compressed blocks, concatenated
    pub data: Vec<u8>,
}

impl CompressedBlocks {
    pub fn num_blocks(&self) -> usize {
        self.compressed_sizes.len()
    }

    /// size of the input that was compressed
    pub fn uncompressed_size(&self) -> usize {
        match self.num_blocks() {
            0 => 0,
            n => ((n - 1).saturating_mul(self.block_size)).saturating_add(self.last_block_size),
        }
    }

    /// Header values in the order they appear in the file:
    /// `[num_blocks, block_size, last_block_size, compressed_sizes...]`
    pub fn header(&self) -> Vec<usize> {
        let mut header = Vec::with_capacity(3 + self.num_blocks());
        header.push(self.num_blocks());
        header.push(self.block_size);
        header.push(self.last_block_size);
        header.extend_from_slice(&self.compressed_sizes);
        header
    }
}

impl Compressor {
    pub fn zlib() -> Self {
        Self::Zlib(CompressionOptions::default())
    }

    pub fn lzma() -> Self {
        Self::Lzma(CompressionOptions::default())
    }

    pub fn lz4() -> Self {
        Self::Lz4(CompressionOptions::default())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn options(&self) -> Option<&CompressionOptions> {
        match self {
            Self::None => None,
            Self::Zlib(options) | Self::Lzma(options) | Self::Lz4(options) => Some(options),
        }
    }

    /// The `compressor` attribute of the `VTKFile` element
    pub fn vtk_name(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Zlib(_) => Some("vtkZLibDataCompressor"),
            Self::Lzma(_) => Some("vtkLZMADataCompressor"),
            Self::Lz4(_) => Some("vtkLZ4DataCompressor"),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zlib(_) => "zlib",
            Self::Lzma(_) => "lzma",
            Self::Lz4(_) => "lz4",
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match self.options() {
            Some(options) if options.block_size == 0 => Err(ConfigError::ZeroBlockSize),
            _ => Ok(()),
        }
    }

    /// Compress `bytes` block by block. Returns `None` if this is the identity
    /// compressor.
    pub fn compress(&self, bytes: &[u8]) -> Result<Option<CompressedBlocks>, Error> {
        let options = match self.options() {
            Some(options) => *options,
            None => return Ok(None),
        };
        self.validate()?;

        let mut compressed_sizes = Vec::with_capacity(bytes.len() / options.block_size + 1);
        let mut data = Vec::new();
        let mut last_block_size = 0;

        for (index, block) in bytes.chunks(options.block_size).enumerate() {
            let compressed = self.compress_block(block, &options, index)?;
            compressed_sizes.push(compressed.len());
            data.extend_from_slice(&compressed);
            last_block_size = block.len();
        }

        tracing::trace!(
            compressor = self.name(),
            input = bytes.len(),
            output = data.len(),
            blocks = compressed_sizes.len(),
            "compressed array"
        );

        Ok(Some(CompressedBlocks {
            block_size: options.block_size,
            last_block_size,
            compressed_sizes,
            data,
        }))
    }

    fn compress_block(&self, block: &[u8], options: &CompressionOptions, index: usize) -> Result<Vec<u8>, CompressionError> {
        let fail = |reason: String| CompressionError::new(self.name(), index, reason);

        match self {
            Self::None => Ok(block.to_vec()),
            Self::Zlib(_) => {
                let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::new(options.level));
                encoder.write_all(block).map_err(|e| fail(e.to_string()))?;
                encoder.finish().map_err(|e| fail(e.to_string()))
            }
            Self::Lzma(_) => {
                let mut out = Vec::new();
                lzma_rs::xz_compress(&mut &block[..], &mut out).map_err(|e| fail(e.to_string()))?;
                Ok(out)
            }
            Self::Lz4(_) => Ok(lz4_flex::block::compress(block)),
        }
    }

    /// Undo [`compress`](Compressor::compress)
    pub fn decompress(&self, blocks: &CompressedBlocks) -> Result<Vec<u8>, Error> {
        if blocks.last_block_size > blocks.block_size {
            return Err(CompressionError::new(
                self.name(),
                blocks.num_blocks().saturating_sub(1),
                format!("last block of {} bytes exceeds the block size {}", blocks.last_block_size, blocks.block_size),
            )
            .into());
        }

        let mut out = Vec::with_capacity(blocks.uncompressed_size().min(RESERVE_RATIO.saturating_mul(blocks.data.len())));
        let mut start = 0usize;

        for (index, &size) in blocks.compressed_sizes.iter().enumerate() {
            let fail = |reason: String| CompressionError::new(self.name(), index, reason);

            let block = blocks
                .data
                .get(start..)
                .and_then(|rest| rest.get(..size))
                .ok_or_else(|| fail("block table exceeds the compressed data".into()))?;
            start += size;

            let expected = if index + 1 == blocks.num_blocks() {
                blocks.last_block_size
            } else {
                blocks.block_size
            };
            let capacity = expected.min(RESERVE_RATIO.saturating_mul(size));

            let decompressed = match self {
                Self::None => block.to_vec(),
                Self::Zlib(_) => {
                    let mut buffer = Vec::with_capacity(capacity);
                    ZlibDecoder::new(block)
                        .read_to_end(&mut buffer)
                        .map_err(|e| fail(e.to_string()))?;
                    buffer
                }
                Self::Lzma(_) => {
                    let mut buffer = Vec::with_capacity(capacity);
                    lzma_rs::xz_decompress(&mut &block[..], &mut buffer).map_err(|e| fail(e.to_string()))?;
                    buffer
                }
                Self::Lz4(_) => {
                    if expected > LZ4_MAX_RATIO.saturating_mul(size).saturating_add(16) {
                        return Err(fail(format!("{} compressed bytes cannot hold {} bytes", size, expected)).into());
                    }
                    lz4_flex::block::decompress(block, expected).map_err(|e| fail(e.to_string()))?
                }
            };

            if decompressed.len() != expected {
                return Err(fail(format!("expected {} bytes, got {}", expected, decompressed.len())).into());
            }

            out.extend_from_slice(&decompressed);
        }

        Ok(out)
    }
}
