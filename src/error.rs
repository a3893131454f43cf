//! Error types for everything that can go wrong while writing a file.
//!
//! The top level [`Error`](crate::Error) separates failures by where they originate.
//! Configuration problems are always detected before a single byte reaches the
//! output sink, so an `Err(Error::Config(_))` never leaves a partial file behind.

use crate::grid::CellType;
use derive_more::{Constructor, Display, From};

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Could not write XML data: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("Could not assemble the document: {0}")]
    Document(String),
    #[error("Invalid writer configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Not implemented: {0}")]
    NotImplemented(#[from] NotImplemented),
    #[error("Compression failed: {0}")]
    Compression(#[from] CompressionError),
    #[error("Failed to decode array: {0}")]
    Decode(#[from] DecodeError),
    #[error("Communication between processes failed: {0}")]
    Communication(String),
    #[error("parallel write is incomplete, rank(s) {failed_ranks:?} failed to write their piece")]
    CollectiveFailure { failed_ranks: Vec<usize> },
}

#[derive(Debug, thiserror::Error, From)]
pub enum ConfigError {
    #[error("{0}")]
    InvalidPlacement(InvalidPlacement),
    #[error("{0}")]
    UnsupportedCellType(UnsupportedCellType),
    #[error("{0}")]
    FieldSize(FieldSize),
    #[error("{0}")]
    UnknownPoint(UnknownPoint),
    #[error("{0}")]
    StructuredLayout(StructuredLayout),
    #[error("compression block size must be larger than zero")]
    #[from(ignore)]
    ZeroBlockSize,
    #[error("a length of {0} does not fit into a UInt32 header, use UInt64 headers instead")]
    #[from(ignore)]
    HeaderOverflow(usize),
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "VTK's `{}` data format cannot be used with {} encoding, choose a different data format or encoder",
    data_format,
    encoder
)]
pub struct InvalidPlacement {
    pub(crate) encoder: &'static str,
    pub(crate) data_format: &'static str,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "cell type {:?} cannot be written to {} files", cell_type, format)]
pub struct UnsupportedCellType {
    pub(crate) cell_type: CellType,
    pub(crate) format: &'static str,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "field `{}` provides {} values, but {} are required",
    field,
    actual,
    expected
)]
pub struct FieldSize {
    pub(crate) field: String,
    pub(crate) expected: usize,
    pub(crate) actual: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "a cell references the point with id {}, which is not part of the grid's points",
    point_id
)]
pub struct UnknownPoint {
    pub(crate) point_id: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "inconsistent structured layout: {}", reason)]
pub struct StructuredLayout {
    pub(crate) reason: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "{} `{}` is not supported", kind, value)]
pub struct NotImplemented {
    pub(crate) kind: &'static str,
    pub(crate) value: String,
}

impl std::error::Error for NotImplemented {}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "{} failed on block {}: {}", compressor, block, reason)]
pub struct CompressionError {
    pub(crate) compressor: &'static str,
    pub(crate) block: usize,
    pub(crate) reason: String,
}

impl std::error::Error for CompressionError {}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "{} data: {}", encoding, reason)]
pub struct DecodeError {
    pub(crate) encoding: &'static str,
    pub(crate) reason: String,
}

impl std::error::Error for DecodeError {}

pub type Result<T> = std::result::Result<T, Error>;

impl From<InvalidPlacement> for Error {
    fn from(x: InvalidPlacement) -> Self {
        Self::Config(ConfigError::from(x))
    }
}

impl From<UnsupportedCellType> for Error {
    fn from(x: UnsupportedCellType) -> Self {
        Self::Config(ConfigError::from(x))
    }
}

impl From<FieldSize> for Error {
    fn from(x: FieldSize) -> Self {
        Self::Config(ConfigError::from(x))
    }
}

impl From<UnknownPoint> for Error {
    fn from(x: UnknownPoint) -> Self {
        Self::Config(ConfigError::from(x))
    }
}

impl From<StructuredLayout> for Error {
    fn from(x: StructuredLayout) -> Self {
        Self::Config(ConfigError::from(x))
    }
}
