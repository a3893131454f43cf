//! Unstructured grid files (`.vtu`, `.pvtu`), along with the point and
//! connectivity helpers that poly data shares.

use super::sealed::PieceWriter;
use super::{
    point_coordinates, write_field_section, write_meta_data, write_summary_fields, write_summary_pieces,
    write_summary_points, Format, PieceLayout, Summary,
};
use crate::document::DocumentWriter;
use crate::error::{Error, UnknownPoint};
use crate::field::{FieldData, FieldRegistry, FieldShape};
use crate::grid::Grid;
use crate::precision::Numeric;

use std::collections::HashMap;

/// `.vtu` unstructured grid: explicit points and cells of arbitrary type
#[derive(Debug, Clone, Copy, Default)]
pub struct Vtu;

impl Format for Vtu {
    const GRID_TYPE: &'static str = "UnstructuredGrid";
    const EXTENSION: &'static str = "vtu";
    const VERSION: &'static str = "2.2";
}

/// Maps point ids to the position of the point in the `Points` array
pub(crate) struct PointIndex {
    positions: HashMap<usize, i64>,
}

impl PointIndex {
    pub(crate) fn new<G: Grid>(grid: &G) -> Self {
        let positions = grid
            .points()
            .enumerate()
            .map(|(position, point)| (grid.point_id(&point), position as i64))
            .collect();
        Self { positions }
    }

    pub(crate) fn get(&self, point_id: usize) -> Result<i64, UnknownPoint> {
        self.positions
            .get(&point_id)
            .copied()
            .ok_or_else(|| UnknownPoint::new(point_id))
    }
}

/// the `Points` element with three component coordinates
pub(crate) fn write_points<G: Grid>(doc: &mut DocumentWriter, grid: &G) -> Result<(), Error> {
    let points = <G::Scalar as Numeric>::into_field_data(point_coordinates(grid));
    doc.open("Points", &[])?;
    doc.data_array("Coordinates", points, FieldShape::Vector(3))?;
    doc.close("Points")
}

/// Connectivity and end offsets of a sequence of cells
pub(crate) fn connectivity<'g, G: Grid + 'g>(
    grid: &G,
    cells: impl Iterator<Item = &'g G::Cell>,
    index: &PointIndex,
) -> Result<(Vec<i64>, Vec<i64>), Error> {
    let mut connectivity = Vec::new();
    let mut offsets = Vec::new();

    for cell in cells {
        for point in grid.cell_points(cell) {
            connectivity.push(index.get(grid.point_id(&point))?);
        }
        offsets.push(connectivity.len() as i64);
    }

    Ok((connectivity, offsets))
}

impl<G: Grid> PieceWriter<G> for Vtu {
    fn write_piece(
        &self,
        doc: &mut DocumentWriter,
        grid: &G,
        fields: &FieldRegistry<'_>,
        _layout: Option<PieceLayout>,
    ) -> Result<(), Error> {
        let cells: Vec<G::Cell> = grid.cells().collect();
        let index = PointIndex::new(grid);
        let (connectivity, offsets) = connectivity(grid, cells.iter(), &index)?;
        let types: Vec<u8> = cells.iter().map(|cell| grid.cell_type(cell).vtk_id()).collect();

        let points = grid.number_of_points().to_string();
        let num_cells = grid.number_of_cells().to_string();

        doc.open(Self::GRID_TYPE, &[])?;
        write_meta_data(doc, fields)?;
        doc.open(
            "Piece",
            &[("NumberOfPoints", points.as_str()), ("NumberOfCells", num_cells.as_str())],
        )?;

        write_field_section(doc, "PointData", &fields.points, grid.number_of_points(), None)?;
        write_field_section(doc, "CellData", &fields.cells, grid.number_of_cells(), None)?;
        write_points(doc, grid)?;

        doc.open("Cells", &[])?;
        doc.data_array("connectivity", FieldData::Int64(connectivity), FieldShape::Scalar)?;
        doc.data_array("offsets", FieldData::Int64(offsets), FieldShape::Scalar)?;
        doc.data_array("types", FieldData::UInt8(types), FieldShape::Scalar)?;
        doc.close("Cells")?;

        doc.close("Piece")?;
        doc.close(Self::GRID_TYPE)
    }

    fn write_summary(
        &self,
        doc: &mut DocumentWriter,
        _grid: &G,
        fields: &FieldRegistry<'_>,
        summary: &Summary,
    ) -> Result<(), Error> {
        doc.open("PUnstructuredGrid", &[("GhostLevel", "0")])?;
        write_summary_fields(doc, fields)?;
        write_summary_points::<G>(doc)?;
        write_summary_pieces(doc, summary)?;
        doc.close("PUnstructuredGrid")
    }
}
