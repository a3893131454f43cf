//! # File formats
//!
//! One marker type per VTK XML flavour. They all share the document writer and
//! the field sections and only differ in how the geometry is described:
//!
//! | format | file   | geometry                         | grid requirement   |
//! |--------|--------|----------------------------------|--------------------|
//! | [`Vti`]| `.vti` | origin and spacing               | [`UniformGrid`](crate::UniformGrid)     |
//! | [`Vtr`]| `.vtr` | per-axis ordinates               | [`RectilinearGrid`](crate::RectilinearGrid) |
//! | [`Vts`]| `.vts` | point coordinates                | [`StructuredGrid`](crate::StructuredGrid)  |
//! | [`Vtu`]| `.vtu` | point coordinates + connectivity | [`Grid`]           |
//! | [`Vtp`]| `.vtp` | point coordinates + connectivity | [`Grid`]           |
//!
//! Which of these can be used for a grid is decided by its trait implementations
//! at compile time.

mod vti;
mod vtp;
mod vtr;
mod vts;
mod vtu;

pub use vti::Vti;
pub use vtp::Vtp;
pub use vtr::Vtr;
pub use vts::Vts;
pub use vtu::Vtu;

use crate::document::DocumentWriter;
use crate::error::{Error, FieldSize, StructuredLayout};
use num_traits::Zero;
use crate::field::{Field, FieldRegistry};
use crate::grid::{cell_counts, flat_index, point_counts, Grid, StructuredGrid};
use crate::precision::Numeric;

use num_traits::AsPrimitive;

use std::collections::BTreeMap;

/// Static description of a file format
pub trait Format {
    /// name of the grid element and the `type` attribute, e.g. `ImageData`
    const GRID_TYPE: &'static str;
    /// file extension of a serial file, the parallel summary prepends a `p`
    const EXTENSION: &'static str;
    const VERSION: &'static str = "1.0";
}

/// A format that can write grids of type `G`
#[allow(private_bounds)]
pub trait WritePiece<G: Grid>: Format + sealed::PieceWriter<G> {}

impl<G: Grid, F: Format + sealed::PieceWriter<G>> WritePiece<G> for F {}

/// Position of a structured piece within the global index space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PieceLayout {
    /// location of the piece's first point in the global lattice
    pub offset: [usize; 3],
    /// number of cells along each axis of the piece
    pub extents: [usize; 3],
    /// number of cells along each axis of the whole dataset
    pub whole_extents: [usize; 3],
}

impl PieceLayout {
    /// layout of a grid that makes up the whole dataset
    pub fn serial(extents: [usize; 3]) -> Self {
        Self {
            offset: [0; 3],
            extents,
            whole_extents: extents,
        }
    }

    pub(crate) fn piece_extent(&self) -> String {
        extent_string(self.offset, self.extents)
    }

    pub(crate) fn whole_extent(&self) -> String {
        extent_string([0; 3], self.whole_extents)
    }
}

/// What a structured piece reports about itself so that the global layout can
/// be reconstructed
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placement {
    /// position of the point at location `[0, 0, 0]`
    pub(crate) origin: [f64; 3],
    pub(crate) extents: [usize; 3],
}

/// Everything the summary file of a parallel write needs to know
#[derive(Debug, Clone)]
pub(crate) struct Summary {
    /// piece file names, in rank order
    pub(crate) sources: Vec<String>,
    /// layouts of all pieces in rank order, `None` for unstructured pieces
    pub(crate) layouts: Vec<Option<PieceLayout>>,
    /// rank of the process writing the summary
    pub(crate) rank: usize,
}

impl Summary {
    pub(crate) fn local_layout(&self) -> Option<PieceLayout> {
        self.layouts.get(self.rank).copied().flatten()
    }
}

#[allow(private_interfaces)]
pub(crate) mod sealed {
    use super::*;

    pub trait PieceWriter<G: Grid> {
        /// Write the grid element and everything inside of it
        fn write_piece(
            &self,
            doc: &mut DocumentWriter,
            grid: &G,
            fields: &FieldRegistry<'_>,
            layout: Option<PieceLayout>,
        ) -> Result<(), Error>;

        /// Write the grid element of the parallel summary file
        fn write_summary(
            &self,
            doc: &mut DocumentWriter,
            grid: &G,
            fields: &FieldRegistry<'_>,
            summary: &Summary,
        ) -> Result<(), Error>;

        /// structured formats report where their piece sits
        fn placement(&self, _grid: &G) -> Result<Option<Placement>, Error> {
            Ok(None)
        }
    }
}

/// `"x0 x1 y0 y1 z0 z1"`
pub(crate) fn extent_string(offset: [usize; 3], extents: [usize; 3]) -> String {
    (0..3)
        .map(|axis| format!("{} {}", offset[axis], offset[axis] + extents[axis]))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn vector_string<T: std::fmt::Display>(values: &[T]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

/// Write a `PointData` or `CellData` section. If given, `order` holds the target
/// position of each entity in the file.
pub(crate) fn write_field_section(
    doc: &mut DocumentWriter,
    section: &str,
    fields: &BTreeMap<String, Box<dyn Field + '_>>,
    entities: usize,
    order: Option<&[usize]>,
) -> Result<(), Error> {
    if fields.is_empty() {
        return doc.empty(section, &[]);
    }

    doc.open(section, &[])?;
    for (name, field) in fields {
        let shape = field.shape();
        let components = shape.number_of_components();
        let mut data = field.export()?;

        if data.len() != entities * components {
            return Err(FieldSize::new(name.clone(), entities * components, data.len()).into());
        }

        if let Some(order) = order {
            data = data.scatter_rows(order, components)?;
        }

        doc.data_array(name, data, shape)?;
    }
    doc.close(section)
}

/// Write the `FieldData` section holding meta data, if there is any
pub(crate) fn write_meta_data(doc: &mut DocumentWriter, fields: &FieldRegistry<'_>) -> Result<(), Error> {
    if fields.meta.is_empty() {
        return Ok(());
    }

    doc.open("FieldData", &[])?;
    for (name, field) in &fields.meta {
        doc.meta_data_array(name, field.export()?)?;
    }
    doc.close("FieldData")
}

fn write_summary_section(
    doc: &mut DocumentWriter,
    section: &str,
    fields: &BTreeMap<String, Box<dyn Field + '_>>,
) -> Result<(), Error> {
    if fields.is_empty() {
        return Ok(());
    }

    doc.open(section, &[])?;
    for (name, field) in fields {
        let precision = field.precision().vtk_name();
        let components = field.shape().number_of_components().to_string();
        doc.empty(
            "PDataArray",
            &[
                ("type", precision.as_str()),
                ("Name", name.as_str()),
                ("NumberOfComponents", components.as_str()),
            ],
        )?;
    }
    doc.close(section)
}

/// `PPointData` and `PCellData` of a summary file
pub(crate) fn write_summary_fields(doc: &mut DocumentWriter, fields: &FieldRegistry<'_>) -> Result<(), Error> {
    write_summary_section(doc, "PPointData", &fields.points)?;
    write_summary_section(doc, "PCellData", &fields.cells)
}

/// The `PPoints` element announcing three component coordinates
pub(crate) fn write_summary_points<G: Grid>(doc: &mut DocumentWriter) -> Result<(), Error> {
    let precision = G::Scalar::PRECISION.vtk_name();
    doc.open("PPoints", &[])?;
    doc.empty(
        "PDataArray",
        &[("type", precision.as_str()), ("NumberOfComponents", "3")],
    )?;
    doc.close("PPoints")
}

/// `Piece` references of a summary file, with extents for structured formats
pub(crate) fn write_summary_pieces(doc: &mut DocumentWriter, summary: &Summary) -> Result<(), Error> {
    for (source, layout) in summary.sources.iter().zip(&summary.layouts) {
        match layout {
            Some(layout) => {
                let extent = layout.piece_extent();
                doc.empty("Piece", &[("Extent", extent.as_str()), ("Source", source.as_str())])?;
            }
            None => doc.empty("Piece", &[("Source", source.as_str())])?,
        }
    }
    Ok(())
}

/// Point coordinates in the order of `Grid::points`, padded to three components
pub(crate) fn point_coordinates<G: Grid>(grid: &G) -> Vec<G::Scalar> {
    let mut values = Vec::with_capacity(3 * grid.number_of_points());
    for point in grid.points() {
        let position = grid.point_coordinates(&point);
        let position = position.as_ref();
        for axis in 0..3 {
            values.push(position.get(axis).copied().unwrap_or_else(G::Scalar::zero));
        }
    }
    values
}

/// target position of every point of a structured grid in VTK's x-fastest order
pub(crate) fn structured_point_order<G: StructuredGrid>(grid: &G) -> Vec<usize> {
    let counts = point_counts(grid.extents());
    grid.points()
        .map(|point| flat_index(grid.point_location(&point), counts))
        .collect()
}

/// target position of every cell of a structured grid in VTK's x-fastest order
pub(crate) fn structured_cell_order<G: StructuredGrid>(grid: &G) -> Vec<usize> {
    let counts = cell_counts(grid.extents());
    grid.cells()
        .map(|cell| flat_index(grid.cell_location(&cell), counts))
        .collect()
}

/// position of the point at location `[0, 0, 0]`, as reported by the grid
pub(crate) fn lower_corner<G: StructuredGrid>(grid: &G) -> Result<[f64; 3], Error> {
    let point = grid
        .points()
        .find(|p| grid.point_location(p) == [0; 3])
        .ok_or_else(|| StructuredLayout::new("the piece has no point at location [0, 0, 0]".into()))?;

    let mut corner = [0.0; 3];
    for (axis, value) in grid.point_coordinates(&point).as_ref().iter().take(3).enumerate() {
        corner[axis] = value.as_();
    }
    Ok(corner)
}

/// Write the point and cell data of a structured piece
pub(crate) fn write_structured_fields<G: StructuredGrid>(
    doc: &mut DocumentWriter,
    grid: &G,
    fields: &FieldRegistry<'_>,
) -> Result<(), Error> {
    let point_order = structured_point_order(grid);
    let cell_order = structured_cell_order(grid);
    write_field_section(doc, "PointData", &fields.points, grid.number_of_points(), Some(&point_order))?;
    write_field_section(doc, "CellData", &fields.cells, grid.number_of_cells(), Some(&cell_order))
}
