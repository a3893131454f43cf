//! Rectilinear grid files (`.vtr`, `.pvtr`).

use super::sealed::PieceWriter;
use super::{
    lower_corner, write_meta_data, write_structured_fields, write_summary_fields, write_summary_pieces, Format,
    PieceLayout, Placement, Summary,
};
use crate::document::DocumentWriter;
use crate::error::{Error, FieldSize};
use crate::field::{FieldRegistry, FieldShape};
use crate::grid::{point_counts, RectilinearGrid};
use crate::precision::Numeric;

/// `.vtr` rectilinear grid: axis aligned cells of varying size, described by
/// the coordinates of the point layers along each axis
#[derive(Debug, Clone, Copy, Default)]
pub struct Vtr;

impl Format for Vtr {
    const GRID_TYPE: &'static str = "RectilinearGrid";
    const EXTENSION: &'static str = "vtr";
}

const ORDINATE_NAMES: [&str; 3] = ["X", "Y", "Z"];

impl<G: RectilinearGrid> PieceWriter<G> for Vtr {
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

        let counts = point_counts(grid.extents());
        doc.open("Coordinates", &[])?;
        for (axis, name) in ORDINATE_NAMES.iter().enumerate() {
            let ordinates = grid.ordinates(axis);
            if ordinates.len() != counts[axis] {
                return Err(FieldSize::new(format!("{} ordinates", name), counts[axis], ordinates.len()).into());
            }
            doc.data_array(name, <G::Scalar as Numeric>::into_field_data(ordinates), FieldShape::Scalar)?;
        }
        doc.close("Coordinates")?;

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
        let precision = G::Scalar::PRECISION.vtk_name();

        doc.open(
            "PRectilinearGrid",
            &[("WholeExtent", whole_extent.as_str()), ("GhostLevel", "0")],
        )?;
        write_summary_fields(doc, fields)?;

        doc.open("PCoordinates", &[])?;
        for name in ORDINATE_NAMES {
            doc.empty(
                "PDataArray",
                &[("type", precision.as_str()), ("Name", name), ("NumberOfComponents", "1")],
            )?;
        }
        doc.close("PCoordinates")?;

        write_summary_pieces(doc, summary)?;
        doc.close("PRectilinearGrid")
    }

    fn placement(&self, grid: &G) -> Result<Option<Placement>, Error> {
        Ok(Some(Placement {
            origin: lower_corner(grid)?,
            extents: grid.extents(),
        }))
    }
}
