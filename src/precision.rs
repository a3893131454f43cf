//! Runtime description of the scalar types written to a file.
//!
//! Every array that ends up in a document is tagged with a [`Precision`], which
//! is what the `type="Float64"` attributes are generated from. The [`Numeric`]
//! trait connects the primitive rust types to their runtime description and knows
//! how to turn a single value into bytes or text.

use crate::error::DecodeError;
use crate::field::FieldData;
use crate::prelude::*;

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integral { signed: bool },
    Float,
}

/// Runtime description of a scalar type: integral or floating point, signed or not,
/// and its width in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Constructor)]
pub struct Precision {
    kind: ScalarKind,
    size_in_bytes: usize,
}

impl Precision {
    pub const INT8: Precision = Precision::integral(true, 1);
    pub const INT16: Precision = Precision::integral(true, 2);
    pub const INT32: Precision = Precision::integral(true, 4);
    pub const INT64: Precision = Precision::integral(true, 8);
    pub const UINT8: Precision = Precision::integral(false, 1);
    pub const UINT16: Precision = Precision::integral(false, 2);
    pub const UINT32: Precision = Precision::integral(false, 4);
    pub const UINT64: Precision = Precision::integral(false, 8);
    pub const FLOAT32: Precision = Precision::float(4);
    pub const FLOAT64: Precision = Precision::float(8);

    const fn integral(signed: bool, size_in_bytes: usize) -> Self {
        Self {
            kind: ScalarKind::Integral { signed },
            size_in_bytes,
        }
    }

    const fn float(size_in_bytes: usize) -> Self {
        Self {
            kind: ScalarKind::Float,
            size_in_bytes,
        }
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn is_integral(&self) -> bool {
        matches!(self.kind, ScalarKind::Integral { .. })
    }

    pub fn is_float(&self) -> bool {
        self.kind == ScalarKind::Float
    }

    /// floats are always signed
    pub fn is_signed(&self) -> bool {
        match self.kind {
            ScalarKind::Integral { signed } => signed,
            ScalarKind::Float => true,
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }

    /// The name VTK uses for this type in `type` attributes, such as `Int32`,
    /// `UInt8` or `Float64`
    pub fn vtk_name(&self) -> String {
        let prefix = match self.kind {
            ScalarKind::Integral { signed: true } => "Int",
            ScalarKind::Integral { signed: false } => "UInt",
            ScalarKind::Float => "Float",
        };

        format!("{}{}", prefix, self.size_in_bytes * 8)
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.vtk_name())
    }
}

/// Byte order of both the binary payload and its length headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// byte order of the machine we are running on
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }

    pub fn vtk_name(&self) -> &'static str {
        match self {
            Self::LittleEndian => "LittleEndian",
            Self::BigEndian => "BigEndian",
        }
    }
}

/// A primitive number that can be written to a file.
///
/// Implemented for all primitive integers up to 64 bits and both float types.
pub trait Numeric:
    Copy
    + fmt::Debug
    + fmt::Display
    + PartialOrd
    + num_traits::Zero
    + num_traits::NumCast
    + num_traits::AsPrimitive<f64>
    + FromStr
    + 'static
{
    const SIZE: usize;
    const PRECISION: Precision;

    fn as_precision() -> Precision {
        Self::PRECISION
    }

    /// append the bytes of this value in the given byte order
    fn extend_bytes(&self, order: ByteOrder, buffer: &mut Vec<u8>);

    /// read a value back from exactly `Self::SIZE` bytes
    fn from_bytes(bytes: &[u8], order: ByteOrder) -> Self;

    /// Append the textual representation of this value to `out`. Floats are written
    /// with the shortest representation that round trips unless a number of
    /// `digits` after the decimal point is requested. Integers ignore `digits`.
    fn write_ascii(&self, digits: Option<usize>, out: &mut String);

    /// parse a single whitespace-free token
    fn parse_ascii(token: &str) -> Result<Self, DecodeError> {
        token
            .parse::<Self>()
            .map_err(|_| DecodeError::new("ascii", format!("`{}` is not a valid {}", token, Self::PRECISION)))
    }

    /// Wrap a buffer of this type in the type-erased [`FieldData`]
    fn into_field_data(values: Vec<Self>) -> FieldData;
}

fn write_ascii_integer<T: fmt::Display>(value: T, out: &mut String) {
    // writing into a String cannot fail
    let _ = write!(out, "{}", value);
}

fn write_ascii_float<T: ryu::Float + fmt::Display>(value: T, digits: Option<usize>, out: &mut String) {
    match digits {
        Some(digits) => {
            let _ = write!(out, "{:.*}", digits, value);
        }
        None => {
            let mut buffer = ryu::Buffer::new();
            out.push_str(buffer.format(value));
        }
    }
}

macro_rules! impl_numeric {
    ($t:ty, $precision:expr, $variant:ident, integer) => {
        impl_numeric!(@impl $t, $precision, $variant, |value: $t, _digits: Option<usize>, out: &mut String| {
            write_ascii_integer(value, out)
        });
    };
    ($t:ty, $precision:expr, $variant:ident, float) => {
        impl_numeric!(@impl $t, $precision, $variant, |value: $t, digits: Option<usize>, out: &mut String| {
            write_ascii_float(value, digits, out)
        });
    };
    (@impl $t:ty, $precision:expr, $variant:ident, $ascii:expr) => {
        impl Numeric for $t {
            const SIZE: usize = std::mem::size_of::<$t>();
            const PRECISION: Precision = $precision;

            #[inline]
            fn extend_bytes(&self, order: ByteOrder, buffer: &mut Vec<u8>) {
                match order {
                    ByteOrder::LittleEndian => buffer.extend_from_slice(&self.to_le_bytes()),
                    ByteOrder::BigEndian => buffer.extend_from_slice(&self.to_be_bytes()),
                }
            }

            #[inline]
            fn from_bytes(bytes: &[u8], order: ByteOrder) -> Self {
                let mut arr = [0; std::mem::size_of::<$t>()];
                arr.copy_from_slice(bytes);
                match order {
                    ByteOrder::LittleEndian => <$t>::from_le_bytes(arr),
                    ByteOrder::BigEndian => <$t>::from_be_bytes(arr),
                }
            }

            fn write_ascii(&self, digits: Option<usize>, out: &mut String) {
                ($ascii)(*self, digits, out)
            }

            fn into_field_data(values: Vec<Self>) -> FieldData {
                FieldData::$variant(values)
            }
        }
    };
}

impl_numeric!(i8, Precision::INT8, Int8, integer);
impl_numeric!(i16, Precision::INT16, Int16, integer);
impl_numeric!(i32, Precision::INT32, Int32, integer);
impl_numeric!(i64, Precision::INT64, Int64, integer);
impl_numeric!(u8, Precision::UINT8, UInt8, integer);
impl_numeric!(u16, Precision::UINT16, UInt16, integer);
impl_numeric!(u32, Precision::UINT32, UInt32, integer);
impl_numeric!(u64, Precision::UINT64, UInt64, integer);
impl_numeric!(f32, Precision::FLOAT32, Float32, float);
impl_numeric!(f64, Precision::FLOAT64, Float64, float);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vtk_names() {
        assert_eq!(Precision::INT8.vtk_name(), "Int8");
        assert_eq!(Precision::UINT32.vtk_name(), "UInt32");
        assert_eq!(Precision::FLOAT64.vtk_name(), "Float64");
        assert_eq!(<f32 as Numeric>::PRECISION.vtk_name(), "Float32");
        assert_eq!(<u64 as Numeric>::PRECISION, Precision::UINT64);
    }

    #[test]
    fn signedness() {
        assert!(Precision::INT16.is_signed());
        assert!(!Precision::UINT16.is_signed());
        assert!(Precision::FLOAT32.is_signed());
        assert!(Precision::FLOAT32.is_float());
        assert!(Precision::UINT8.is_integral());
    }

    #[test]
    fn bytes_respect_order() {
        let mut little = Vec::new();
        let mut big = Vec::new();
        258u16.extend_bytes(ByteOrder::LittleEndian, &mut little);
        258u16.extend_bytes(ByteOrder::BigEndian, &mut big);

        assert_eq!(little, vec![2, 1]);
        assert_eq!(big, vec![1, 2]);
        assert_eq!(u16::from_bytes(&big, ByteOrder::BigEndian), 258);
    }

    #[test]
    fn ascii_floats() {
        let mut out = String::new();
        0.1f64.write_ascii(None, &mut out);
        out.push(' ');
        1.0f32.write_ascii(None, &mut out);
        out.push(' ');
        2.0f64.write_ascii(Some(3), &mut out);
        assert_eq!(out, "0.1 1.0 2.000");

        assert_eq!(f64::parse_ascii("0.1").unwrap(), 0.1);
        assert!(i32::parse_ascii("abc").is_err());
    }
}
