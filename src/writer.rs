use crate::document::DocumentWriter;
use crate::error::{Error, FieldSize};
use crate::field::{CellField, Field, FieldData, FieldRegistry, FieldShape, FieldValue, Fields, MetaField, MetaValue, PointField};
use crate::formats::sealed::PieceWriter;
use crate::formats::{PieceLayout, WritePiece};
use crate::grid::{Grid, StructuredGrid};
use crate::options::{ResolvedOptions, XmlOptions};
use crate::precision::{Numeric, Precision};

use ndarray::{ArrayBase, ArrayViewD, Data, Dimension, IxDyn};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes a grid, together with the fields attached to it, in the file format `F`.
///
/// ## Example
///
/// ```
/// use gridformat::{Grid, ImageGrid, Vtu, Writer, XmlOptions};
///
/// let grid = ImageGrid::new([0.0, 0.0], [1.0, 1.0], [4, 3]).unwrap();
/// let mut writer = Writer::new(Vtu, &grid, XmlOptions::default()).unwrap();
///
/// writer.set_point_field("position", |p| grid.position(p));
/// writer.set_cell_field("rank", |_| 0u8);
/// writer.set_meta_data("time", vec![0.25]);
///
/// let mut out = Vec::new();
/// writer.write(&mut out).unwrap();
/// ```
pub struct Writer<'a, G, F> {
    format: F,
    grid: &'a G,
    options: XmlOptions,
    resolved: ResolvedOptions,
    fields: FieldRegistry<'a>,
}

impl<'a, G: Grid, F> Writer<'a, G, F> {
    /// Fails if the options describe an invalid combination of encoder, data
    /// format and compressor.
    pub fn new(format: F, grid: &'a G, options: XmlOptions) -> Result<Self, Error> {
        let resolved = options.resolve()?;
        tracing::debug!(?options, "constructed writer");

        Ok(Self {
            format,
            grid,
            options,
            resolved,
            fields: FieldRegistry::default(),
        })
    }

    pub fn grid(&self) -> &'a G {
        self.grid
    }

    pub fn options(&self) -> &XmlOptions {
        &self.options
    }

    /// Attach a field whose value for each point is computed by `provider`.
    /// Registering a field under an existing name replaces it.
    pub fn set_point_field<V, P>(&mut self, name: impl Into<String>, provider: P)
    where
        V: FieldValue + 'a,
        P: Fn(&G::Point) -> V + 'a,
    {
        let field = PointField::new(self.grid, provider);
        self.fields.points.insert(name.into(), Box::new(field));
    }

    /// Attach a field whose value for each cell is computed by `provider`
    pub fn set_cell_field<V, P>(&mut self, name: impl Into<String>, provider: P)
    where
        V: FieldValue + 'a,
        P: Fn(&G::Cell) -> V + 'a,
    {
        let field = CellField::new(self.grid, provider);
        self.fields.cells.insert(name.into(), Box::new(field));
    }

    /// Store a value in the `FieldData` section of the file, e.g. the simulation
    /// time or a description. Strings are stored as bytes.
    pub fn set_meta_data<M: MetaValue>(&mut self, name: impl Into<String>, value: M) {
        self.fields.meta.insert(name.into(), Box::new(MetaField::new(value)));
    }

    /// Attach point values stored in a slice that is indexed by point id
    pub fn set_point_values<V>(&mut self, name: impl Into<String>, values: &'a [V]) -> Result<(), Error>
    where
        V: FieldValue + Copy + 'a,
    {
        let name = name.into();
        let grid = self.grid;
        if let Some(id) = grid.points().map(|p| grid.point_id(&p)).find(|id| *id >= values.len()) {
            return Err(FieldSize::new(name, id + 1, values.len()).into());
        }

        self.set_point_field(name, move |p: &G::Point| values[grid.point_id(p)]);
        Ok(())
    }

    /// Attach cell values stored in a slice in the order of `Grid::cells`
    pub fn set_cell_values<V>(&mut self, name: impl Into<String>, values: &'a [V]) -> Result<(), Error>
    where
        V: FieldValue + Copy + 'a,
    {
        let name = name.into();
        if values.len() != self.grid.number_of_cells() {
            return Err(FieldSize::new(name, self.grid.number_of_cells(), values.len()).into());
        }

        self.fields
            .cells
            .insert(name, Box::new(SliceField { values }));
        Ok(())
    }

    /// Register all fields of a collection, see [`Fields`]
    pub fn set_fields<T: Fields>(&mut self, fields: &'a T) -> Result<(), Error> {
        fields.register(self)
    }
}

impl<'a, G: StructuredGrid, F> Writer<'a, G, F> {
    /// Attach point values stored in an array indexed by point location. The
    /// array has one axis per used grid axis, with `extents[axis] + 1` entries.
    pub fn set_point_array<S, D, T>(&mut self, name: impl Into<String>, array: &'a ArrayBase<S, D>) -> Result<(), Error>
    where
        S: Data<Elem = T>,
        D: Dimension,
        T: Numeric,
    {
        let name = name.into();
        let extents = self.grid.extents();
        let shape = extents.map(|e| e + 1);
        let array = validated_view(&name, array, shape)?;

        let grid = self.grid;
        self.fields.points.insert(
            name,
            Box::new(ArrayField {
                array,
                locations: Box::new(move |out: &mut Vec<[usize; 3]>| {
                    out.extend(grid.points().map(|p| grid.point_location(&p)))
                }),
            }),
        );
        Ok(())
    }

    /// Attach cell values stored in an array indexed by cell location. The
    /// array has one axis per used grid axis, with `extents[axis]` entries.
    pub fn set_cell_array<S, D, T>(&mut self, name: impl Into<String>, array: &'a ArrayBase<S, D>) -> Result<(), Error>
    where
        S: Data<Elem = T>,
        D: Dimension,
        T: Numeric,
    {
        let name = name.into();
        let shape = crate::grid::cell_counts(self.grid.extents());
        let array = validated_view(&name, array, shape)?;

        let grid = self.grid;
        self.fields.cells.insert(
            name,
            Box::new(ArrayField {
                array,
                locations: Box::new(move |out: &mut Vec<[usize; 3]>| {
                    out.extend(grid.cells().map(|c| grid.cell_location(&c)))
                }),
            }),
        );
        Ok(())
    }
}

impl<'a, G: Grid, F: WritePiece<G>> Writer<'a, G, F> {
    /// Write the file to `sink`. Nothing is written if an error occurs.
    pub fn write<W: Write>(&self, mut sink: W) -> Result<(), Error> {
        self.write_piece(&mut sink, None)
    }

    /// Write the file to `stem` with the extension of the format appended, and
    /// return the path of the file.
    pub fn write_to_file<P: AsRef<Path>>(&self, stem: P) -> Result<PathBuf, Error> {
        let path = with_suffix(stem.as_ref(), &format!(".{}", F::EXTENSION));
        self.write_piece_to_file(&path, None)?;
        Ok(path)
    }

    pub(crate) fn write_piece<W: Write>(&self, sink: &mut W, layout: Option<PieceLayout>) -> Result<(), Error> {
        let mut doc = DocumentWriter::new(self.resolved);
        doc.start_document(F::GRID_TYPE, F::VERSION)?;
        self.format.write_piece(&mut doc, self.grid, &self.fields, layout)?;
        doc.finish(sink)
    }

    /// Assemble the document in memory before creating the file, so that
    /// configuration errors do not leave an empty file behind.
    pub(crate) fn write_piece_to_file(&self, path: &Path, layout: Option<PieceLayout>) -> Result<(), Error> {
        let mut buffer = Vec::new();
        self.write_piece(&mut buffer, layout)?;

        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(&buffer)?;
        file.flush()?;

        tracing::debug!(path = %path.display(), bytes = buffer.len(), "wrote file");
        Ok(())
    }

    pub(crate) fn format(&self) -> &F {
        &self.format
    }

    pub(crate) fn fields(&self) -> &FieldRegistry<'a> {
        &self.fields
    }

    pub(crate) fn resolved_options(&self) -> ResolvedOptions {
        self.resolved
    }
}

/// `path` with `suffix` appended to its file name
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Check that the array has the lattice shape of the grid, ignoring trailing
/// axes with a single entry
fn validated_view<'a, S, D, T>(name: &str, array: &'a ArrayBase<S, D>, shape: [usize; 3]) -> Result<ArrayViewD<'a, T>, Error>
where
    S: Data<Elem = T>,
    D: Dimension,
{
    let ndim = array.ndim();
    let fits = ndim <= 3 && array.shape() == &shape[..ndim] && shape[ndim..].iter().all(|n| *n == 1);

    if !fits {
        return Err(FieldSize::new(name.to_string(), shape.iter().product(), array.len()).into());
    }

    Ok(array.view().into_dyn())
}

/// Values looked up in an `ndarray` by entity location
struct ArrayField<'a, T> {
    array: ArrayViewD<'a, T>,
    locations: Box<dyn Fn(&mut Vec<[usize; 3]>) + 'a>,
}

impl<'a, T: Numeric> Field for ArrayField<'a, T> {
    fn precision(&self) -> Precision {
        T::PRECISION
    }

    fn shape(&self) -> FieldShape {
        FieldShape::Scalar
    }

    fn export(&self) -> Result<FieldData, Error> {
        let mut locations = Vec::new();
        (self.locations)(&mut locations);

        let ndim = self.array.ndim();
        let values = locations
            .iter()
            .map(|location| {
                self.array
                    .get(IxDyn(&location[..ndim]))
                    .copied()
                    .ok_or_else(|| FieldSize::new(format!("array entry {:?}", location), self.array.len(), 0))
            })
            .collect::<Result<Vec<T>, _>>()?;

        Ok(<T as Numeric>::into_field_data(values))
    }
}

/// Cell values given in iteration order
struct SliceField<'a, V> {
    values: &'a [V],
}

impl<'a, V: FieldValue> Field for SliceField<'a, V> {
    fn precision(&self) -> Precision {
        V::Scalar::PRECISION
    }

    fn shape(&self) -> FieldShape {
        V::SHAPE
    }

    fn export(&self) -> Result<FieldData, Error> {
        let mut out = Vec::with_capacity(self.values.len() * V::SHAPE.number_of_components());
        self.values.iter().for_each(|v| v.extend_into(&mut out));
        Ok(<V::Scalar as Numeric>::into_field_data(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{Vti, Vtu};
    use crate::grid::ImageGrid;
    use ndarray::Array2;

    fn grid() -> ImageGrid<2> {
        ImageGrid::new([0.0, 0.0], [1.0, 1.0], [2, 1]).unwrap()
    }

    #[test]
    fn invalid_options_are_rejected_at_construction() {
        let grid = grid();
        let options = XmlOptions::default().with_data_format(crate::DataFormat::Inlined);
        assert!(matches!(Writer::new(Vtu, &grid, options), Err(Error::Config(_))));
    }

    #[test]
    fn point_values_by_id() {
        let grid = grid();
        let values: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let mut writer = Writer::new(Vtu, &grid, XmlOptions::ascii()).unwrap();
        writer.set_point_values("id", &values).unwrap();

        let data = writer.fields().points["id"].export().unwrap();
        assert_eq!(data, FieldData::Float64(values.clone()));

        assert!(writer.set_point_values("short", &values[..5]).is_err());
    }

    #[test]
    fn cell_values_need_one_per_cell() {
        let grid = grid();
        let mut writer = Writer::new(Vtu, &grid, XmlOptions::ascii()).unwrap();
        assert!(writer.set_cell_values("ok", &[1i32, 2]).is_ok());
        assert!(writer.set_cell_values("wrong", &[1i32]).is_err());
    }

    #[test]
    fn arrays_are_indexed_by_location() {
        let grid = grid();
        let points = Array2::from_shape_fn((3, 2), |(x, y)| (10 * x + y) as i32);
        let wrong = Array2::<f64>::zeros((2, 3));
        let mut writer = Writer::new(Vti, &grid, XmlOptions::ascii()).unwrap();
        writer.set_point_array("p", &points).unwrap();

        let data = writer.fields().points["p"].export().unwrap();
        assert_eq!(data, FieldData::Int32(vec![0, 10, 20, 1, 11, 21]));

        assert!(writer.set_point_array("wrong", &wrong).is_err());
    }

    #[test]
    fn write_to_file_appends_extension() {
        let grid = grid();
        let writer = Writer::new(Vti, &grid, XmlOptions::default()).unwrap();
        let stem = std::env::temp_dir().join("gridformat_writer_unit");
        let path = writer.write_to_file(&stem).unwrap();
        assert_eq!(path.extension().unwrap(), "vti");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_file(path).unwrap();
    }
}
