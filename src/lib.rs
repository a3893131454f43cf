#![doc = include_str!("../README.md")]

mod compression;
mod document;
mod encoding;
mod error;
mod field;
mod formats;
mod grid;
mod options;
pub mod parallel;
mod precision;
mod prelude;
mod writer;

pub use compression::{CompressedBlocks, CompressionOptions, Compressor, DEFAULT_BLOCK_SIZE, DEFAULT_LEVEL};
pub use encoding::{AsciiOptions, Codec, Encoder, HeaderPrecision};
pub use error::{
    CompressionError, ConfigError, DecodeError, Error, FieldSize, InvalidPlacement, NotImplemented, Result,
    StructuredLayout, UnknownPoint, UnsupportedCellType,
};
pub use field::{Field, FieldData, FieldShape, FieldValue, Fields, MetaValue};
pub use formats::{Format, PieceLayout, Vti, Vtp, Vtr, Vts, Vtu, WritePiece};
pub use grid::{
    reorder_lexicographic_corners, CellType, Grid, ImageCell, ImageGrid, ImagePoint, RectilinearGrid, StructuredGrid,
    UniformGrid, UnstructuredMesh,
};
pub use options::{DataFormat, XmlOptions};
pub use parallel::{Communicator, LocalCommunicator, ParallelWriter, SerialCommunicator};
pub use precision::{ByteOrder, Numeric, Precision, ScalarKind};
pub use writer::Writer;

#[cfg(feature = "derive")]
pub use gridformat_derive::Fields;

pub use ndarray;
