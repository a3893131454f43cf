//! Structured grid files (`.vts`, `.pvts`). Point coordinates are written in
//! lattice order like every other structured array.

use super::sealed::PieceWriter;
use super::{
    lower_corner, point_coordinates, structured_point_order, write_meta_data, write_structured_fields,
    write_summary_fields, write_summary_pieces, write_summary_points, Format, PieceLayout, Placement, Summary,
};
use crate::document::DocumentWriter;
use crate::error::Error;
use crate::field::{FieldRegistry, FieldShape};
use crate::grid::StructuredGrid;
use crate::precision::Numeric;

/// `.vts` structured grid: a curvilinear lattice with explicit point coordinates
#[derive(Debug, Clone, Copy, Default)]
pub struct Vts;

impl Format for Vts {
    const GRID_TYPE: &'static str = "StructuredGrid";
    const EXTENSION: &'static str = "vts";
}

impl<G: StructuredGrid> PieceWriter<G> for Vts {
    fn write_piece(
        &self,
        doc: &mut DocumentWriter,
        grid: &G,
        fields: &FieldRegistry<'_>,
        layout: Option<PieceLayout>,
    ) -> Result<(), Error> {
        let layout = layout.unwrap_or_else(|| PieceLayout::serial(grid.extents()));
        let whole_extent = layout.whole_extent();

        doc.open(Self::GRID_TYPE, &[("WholeExtent", whole_extent.as_str())])?;
        write_meta_data(doc, fields)?;

        let extent = layout.piece_extent();
        doc.open("Piece", &[("Extent", extent.as_str())])?;
        write_structured_fields(doc, grid, fields)?;

        let points = <G::Scalar as Numeric>::into_field_data(point_coordinates(grid))
            .scatter_rows(&structured_point_order(grid), 3)?;
        doc.open("Points", &[])?;
        doc.data_array("Coordinates", points, FieldShape::Vector(3))?;
        doc.close("Points")?;

        doc.close("Piece")?;
        doc.close(Self::GRID_TYPE)
    }

    fn write_summary(
        &self,
        doc: &mut DocumentWriter,
        grid: &G,
        fields: &FieldRegistry<'_>,
        summary: &Summary,
    ) -> Result<(), Error> {
        let layout = summary
            .local_layout()
            .unwrap_or_else(|| PieceLayout::serial(grid.extents()));
        let whole_extent = layout.whole_extent();

        doc.open(
            "PStructuredGrid",
            &[("WholeExtent", whole_extent.as_str()), ("GhostLevel", "0")],
        )?;
        write_summary_fields(doc, fields)?;
        write_summary_points::<G>(doc)?;
        write_summary_pieces(doc, summary)?;
        doc.close("PStructuredGrid")
    }

    fn placement(&self, grid: &G) -> Result<Option<Placement>, Error> {
        Ok(Some(Placement {
            origin: lower_corner(grid)?,
            extents: grid.extents(),
        }))
    }
}
