//! # Fields
//!
//! A field is a named array of values attached to the points or cells of a grid,
//! or a standalone piece of meta data. Values are not stored up front: the user
//! registers a callback that is evaluated for every entity handle while the file
//! is written. Calling it twice for the same handle during one write must
//! produce the same value.
//!
//! Evaluated fields are materialized into a [`FieldData`] buffer, the typed flat
//! array that the compression and encoding stages work on.

use crate::error::{DecodeError, FieldSize};
use crate::grid::Grid;
use crate::precision::{ByteOrder, Numeric, Precision};
use crate::prelude::*;

use num_traits::AsPrimitive;

use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Per-entity shape of a field's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldShape {
    Scalar,
    Vector(usize),
    /// `rows x columns`, written row by row
    Tensor(usize, usize),
}

impl FieldShape {
    /// number of values per entity, the `NumberOfComponents` attribute
    pub fn number_of_components(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector(n) => *n,
            Self::Tensor(rows, columns) => rows * columns,
        }
    }
}

/// A value that can be produced for a single entity
pub trait FieldValue {
    type Scalar: Numeric;
    const SHAPE: FieldShape;

    fn extend_into(&self, out: &mut Vec<Self::Scalar>);
}

macro_rules! impl_scalar_field_value {
    ($($t:ty),*) => {
        $(
            impl FieldValue for $t {
                type Scalar = $t;
                const SHAPE: FieldShape = FieldShape::Scalar;

                #[inline]
                fn extend_into(&self, out: &mut Vec<$t>) {
                    out.push(*self);
                }
            }

            impl MetaValue for $t {
                fn into_field_data(self) -> FieldData {
                    <$t as Numeric>::into_field_data(vec![self])
                }
            }
        )*
    };
}

impl_scalar_field_value!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl<T: Numeric, const N: usize> FieldValue for [T; N] {
    type Scalar = T;
    const SHAPE: FieldShape = FieldShape::Vector(N);

    #[inline]
    fn extend_into(&self, out: &mut Vec<T>) {
        out.extend_from_slice(self);
    }
}

impl<T: Numeric, const N: usize, const M: usize> FieldValue for [[T; N]; M] {
    type Scalar = T;
    const SHAPE: FieldShape = FieldShape::Tensor(M, N);

    #[inline]
    fn extend_into(&self, out: &mut Vec<T>) {
        self.iter().for_each(|row| out.extend_from_slice(row));
    }
}

/// Type-erased flat buffer of values, one variant per supported scalar type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// run `$body` with `$values` bound to the inner vector of any variant
macro_rules! with_values {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            FieldData::Int8($values) => $body,
            FieldData::Int16($values) => $body,
            FieldData::Int32($values) => $body,
            FieldData::Int64($values) => $body,
            FieldData::UInt8($values) => $body,
            FieldData::UInt16($values) => $body,
            FieldData::UInt32($values) => $body,
            FieldData::UInt64($values) => $body,
            FieldData::Float32($values) => $body,
            FieldData::Float64($values) => $body,
        }
    };
}

/// run `$body` with `$t` set to the rust type matching a precision
macro_rules! with_precision {
    ($precision:expr, $t:ident => $body:expr) => {
        match $precision {
            Precision::INT8 => { type $t = i8; $body }
            Precision::INT16 => { type $t = i16; $body }
            Precision::INT32 => { type $t = i32; $body }
            Precision::INT64 => { type $t = i64; $body }
            Precision::UINT8 => { type $t = u8; $body }
            Precision::UINT16 => { type $t = u16; $body }
            Precision::UINT32 => { type $t = u32; $body }
            Precision::UINT64 => { type $t = u64; $body }
            Precision::FLOAT32 => { type $t = f32; $body }
            Precision::FLOAT64 => { type $t = f64; $body }
            other => {
                return Err(DecodeError::new("binary", format!("unsupported precision {:?}", other)))
            }
        }
    };
}

fn scatter<T: Numeric>(values: &[T], positions: &[usize], components: usize) -> Result<Vec<T>, FieldSize> {
    let rows = positions.len();
    if values.len() != rows * components {
        return Err(FieldSize::new("reordered field".into(), rows * components, values.len()));
    }

    let mut out = vec![T::zero(); values.len()];
    let mut seen = vec![false; rows];

    for (row, &target) in positions.iter().enumerate() {
        match seen.get_mut(target) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(FieldSize::new(format!("entity position {}", target), rows, target + 1)),
        }

        out[target * components..(target + 1) * components]
            .copy_from_slice(&values[row * components..(row + 1) * components]);
    }

    Ok(out)
}

fn values_from_bytes<T: Numeric>(bytes: &[u8], order: ByteOrder) -> Result<Vec<T>, DecodeError> {
    if bytes.len() % T::SIZE != 0 {
        return Err(DecodeError::new(
            "binary",
            format!("{} bytes are not a multiple of the {} byte element size", bytes.len(), T::SIZE),
        ));
    }

    Ok(bytes.chunks_exact(T::SIZE).map(|chunk| T::from_bytes(chunk, order)).collect())
}

fn values_from_ascii<T: Numeric>(text: &str) -> Result<Vec<T>, DecodeError> {
    text.split_ascii_whitespace().map(T::parse_ascii).collect()
}

impl FieldData {
    pub fn precision(&self) -> Precision {
        fn precision_of<T: Numeric>(_: &[T]) -> Precision {
            T::PRECISION
        }
        with_values!(self, values => precision_of(values))
    }

    /// total number of values (entities times components)
    pub fn len(&self) -> usize {
        with_values!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// size of the binary representation in bytes
    pub fn size_in_bytes(&self) -> usize {
        self.len() * self.precision().size_in_bytes()
    }

    pub fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size_in_bytes());
        with_values!(self, values => values.iter().for_each(|v| v.extend_bytes(order, &mut bytes)));
        bytes
    }

    /// Render all values as whitespace separated text, inserting a line break
    /// after every `entries_per_line` values if requested.
    pub fn write_ascii(&self, digits: Option<usize>, entries_per_line: Option<usize>, out: &mut String) {
        let per_line = entries_per_line.filter(|n| *n > 0).unwrap_or(usize::MAX);

        with_values!(self, values => {
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    if i % per_line == 0 {
                        out.push('\n');
                    } else {
                        out.push(' ');
                    }
                }
                value.write_ascii(digits, out);
            }
        })
    }

    pub fn from_bytes(precision: Precision, bytes: &[u8], order: ByteOrder) -> Result<Self, DecodeError> {
        with_precision!(precision, T => Ok(<T as Numeric>::into_field_data(values_from_bytes::<T>(bytes, order)?)))
    }

    pub fn from_ascii(precision: Precision, text: &str) -> Result<Self, DecodeError> {
        with_precision!(precision, T => Ok(<T as Numeric>::into_field_data(values_from_ascii::<T>(text)?)))
    }

    /// Move the row (group of `components` values) at index `i` to index
    /// `positions[i]`. `positions` has to be a permutation.
    pub fn scatter_rows(&self, positions: &[usize], components: usize) -> Result<Self, FieldSize> {
        with_values!(self, values => Ok(Numeric::into_field_data(scatter(values, positions, components)?)))
    }

    /// all values converted to `f64`, mostly useful for inspection
    pub fn to_f64(&self) -> Vec<f64> {
        with_values!(self, values => values.iter().map(|v| <_ as AsPrimitive<f64>>::as_(*v)).collect())
    }
}

/// A field that can be evaluated into a flat buffer
pub trait Field {
    fn precision(&self) -> Precision;

    fn shape(&self) -> FieldShape;

    /// evaluate the field for every entity it is attached to
    fn export(&self) -> Result<FieldData, Error>;
}

/// Field evaluated on every point of a grid, in the order of `Grid::points`
pub(crate) struct PointField<'a, G, P, V> {
    grid: &'a G,
    provider: P,
    _value: PhantomData<fn() -> V>,
}

impl<'a, G, P, V> PointField<'a, G, P, V> {
    pub(crate) fn new(grid: &'a G, provider: P) -> Self {
        Self {
            grid,
            provider,
            _value: PhantomData,
        }
    }
}

impl<'a, G, P, V> Field for PointField<'a, G, P, V>
where
    G: Grid,
    P: Fn(&G::Point) -> V,
    V: FieldValue,
{
    fn precision(&self) -> Precision {
        V::Scalar::PRECISION
    }

    fn shape(&self) -> FieldShape {
        V::SHAPE
    }

    fn export(&self) -> Result<FieldData, Error> {
        let mut values = Vec::with_capacity(self.grid.number_of_points() * V::SHAPE.number_of_components());
        for point in self.grid.points() {
            (self.provider)(&point).extend_into(&mut values);
        }
        Ok(<V::Scalar as Numeric>::into_field_data(values))
    }
}

/// Field evaluated on every cell of a grid, in the order of `Grid::cells`
pub(crate) struct CellField<'a, G, P, V> {
    grid: &'a G,
    provider: P,
    _value: PhantomData<fn() -> V>,
}

impl<'a, G, P, V> CellField<'a, G, P, V> {
    pub(crate) fn new(grid: &'a G, provider: P) -> Self {
        Self {
            grid,
            provider,
            _value: PhantomData,
        }
    }
}

impl<'a, G, P, V> Field for CellField<'a, G, P, V>
where
    G: Grid,
    P: Fn(&G::Cell) -> V,
    V: FieldValue,
{
    fn precision(&self) -> Precision {
        V::Scalar::PRECISION
    }

    fn shape(&self) -> FieldShape {
        V::SHAPE
    }

    fn export(&self) -> Result<FieldData, Error> {
        let mut values = Vec::with_capacity(self.grid.number_of_cells() * V::SHAPE.number_of_components());
        for cell in self.grid.cells() {
            (self.provider)(&cell).extend_into(&mut values);
        }
        Ok(<V::Scalar as Numeric>::into_field_data(values))
    }
}

/// A value that can be stored in the meta data (`FieldData`) section of a file
pub trait MetaValue {
    fn into_field_data(self) -> FieldData;
}

impl<T: Numeric> MetaValue for Vec<T> {
    fn into_field_data(self) -> FieldData {
        <T as Numeric>::into_field_data(self)
    }
}

impl<T: Numeric> MetaValue for &[T] {
    fn into_field_data(self) -> FieldData {
        <T as Numeric>::into_field_data(self.to_vec())
    }
}

impl MetaValue for &str {
    fn into_field_data(self) -> FieldData {
        FieldData::UInt8(self.as_bytes().to_vec())
    }
}

impl MetaValue for String {
    fn into_field_data(self) -> FieldData {
        FieldData::UInt8(self.into_bytes())
    }
}

/// Meta data values are stored as given
pub(crate) struct MetaField {
    data: FieldData,
}

impl MetaField {
    pub(crate) fn new<M: MetaValue>(value: M) -> Self {
        Self {
            data: value.into_field_data(),
        }
    }
}

impl Field for MetaField {
    fn precision(&self) -> Precision {
        self.data.precision()
    }

    fn shape(&self) -> FieldShape {
        FieldShape::Scalar
    }

    fn export(&self) -> Result<FieldData, Error> {
        Ok(self.data.clone())
    }
}

/// All fields registered on a writer, ordered by name within each section
#[derive(Default)]
pub(crate) struct FieldRegistry<'a> {
    pub(crate) points: BTreeMap<String, Box<dyn Field + 'a>>,
    pub(crate) cells: BTreeMap<String, Box<dyn Field + 'a>>,
    pub(crate) meta: BTreeMap<String, Box<dyn Field + 'a>>,
}

/// A collection of fields that knows how to register itself on a writer.
///
/// Usually derived, see [`gridformat_derive::Fields`](crate::Fields):
///
/// ```ignore
/// #[derive(gridformat::Fields)]
/// struct Flow {
///     pressure: Vec<f64>,
///     #[gridformat(rename = "U")]
///     velocity: Vec<[f64; 3]>,
/// }
/// ```
pub trait Fields {
    fn register<'a, G, F>(&'a self, writer: &mut crate::Writer<'a, G, F>) -> Result<(), Error>
    where
        G: Grid;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellType, UnstructuredMesh};

    fn mesh() -> UnstructuredMesh {
        let mut mesh = UnstructuredMesh::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        mesh.add_cell(CellType::Triangle, vec![0, 1, 2]).unwrap();
        mesh
    }

    #[test]
    fn shapes() {
        assert_eq!(<f64 as FieldValue>::SHAPE.number_of_components(), 1);
        assert_eq!(<[f32; 3] as FieldValue>::SHAPE, FieldShape::Vector(3));
        assert_eq!(<[[f64; 3]; 2] as FieldValue>::SHAPE, FieldShape::Tensor(2, 3));
        assert_eq!(FieldShape::Tensor(3, 3).number_of_components(), 9);
    }

    #[test]
    fn point_field_follows_point_order() {
        let mesh = mesh();
        let field = PointField::new(&mesh, |p: &usize| [*p as f32, 2.0 * *p as f32]);

        assert_eq!(field.precision(), Precision::FLOAT32);
        assert_eq!(field.export().unwrap(), FieldData::Float32(vec![0.0, 0.0, 1.0, 2.0, 2.0, 4.0]));
    }

    #[test]
    fn cell_field() {
        let mesh = mesh();
        let field = CellField::new(&mesh, |c: &usize| *c as i32 + 7);
        assert_eq!(field.export().unwrap(), FieldData::Int32(vec![7]));
    }

    #[test]
    fn tensor_values_are_row_major() {
        let mut out = Vec::new();
        [[1.0f64, 2.0], [3.0, 4.0]].extend_into(&mut out);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn scatter_moves_rows() {
        let data = FieldData::Int64(vec![0, 1, 10, 11, 20, 21]);
        let moved = data.scatter_rows(&[2, 0, 1], 2).unwrap();
        assert_eq!(moved, FieldData::Int64(vec![10, 11, 20, 21, 0, 1]));
    }

    #[test]
    fn scatter_rejects_collisions() {
        let data = FieldData::UInt8(vec![1, 2, 3]);
        assert!(data.scatter_rows(&[0, 0, 1], 1).is_err());
        assert!(data.scatter_rows(&[0, 1, 5], 1).is_err());
    }

    #[test]
    fn bytes_and_text() {
        let data = FieldData::Float64(vec![0.5, -1.0, 3.25]);
        let bytes = data.to_bytes(ByteOrder::BigEndian);
        assert_eq!(FieldData::from_bytes(Precision::FLOAT64, &bytes, ByteOrder::BigEndian).unwrap(), data);

        let mut text = String::new();
        data.write_ascii(None, Some(2), &mut text);
        assert_eq!(text, "0.5 -1.0\n3.25");
        assert_eq!(FieldData::from_ascii(Precision::FLOAT64, &text).unwrap(), data);
    }

    #[test]
    fn string_meta_data() {
        let data = "abc".into_field_data();
        assert_eq!(data, FieldData::UInt8(vec![97, 98, 99]));
    }
}
