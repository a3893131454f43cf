//! Image data files (`.vti`, `.pvti`).

use super::sealed::PieceWriter;
use super::{
    lower_corner, vector_string, write_meta_data, write_structured_fields, write_summary_fields, write_summary_pieces,
    Format, PieceLayout, Placement, Summary,
};
use crate::document::DocumentWriter;
use crate::error::Error;
use crate::field::FieldRegistry;
use crate::grid::UniformGrid;

use num_traits::AsPrimitive;

/// `.vti` image data: an axis aligned grid of equally sized cells, described
/// only by its origin and spacing
#[derive(Debug, Clone, Copy, Default)]
pub struct Vti;

impl Format for Vti {
    const GRID_TYPE: &'static str = "ImageData";
    const EXTENSION: &'static str = "vti";
}

/// Origin of the whole dataset. Pieces of a parallel write report their own
/// origin, which sits `offset` cells away from the global one.
fn global_origin<G: UniformGrid>(grid: &G, layout: &PieceLayout) -> [f64; 3] {
    let origin = grid.origin();
    let spacing = grid.spacing();
    let mut global = [0.0; 3];
    for axis in 0..3 {
        let origin: f64 = origin[axis].as_();
        let spacing: f64 = spacing[axis].as_();
        global[axis] = origin - spacing * layout.offset[axis] as f64;
    }
    global
}

fn spacing_string<G: UniformGrid>(grid: &G) -> String {
    vector_string(&grid.spacing())
}

impl<G: UniformGrid> PieceWriter<G> for Vti {
    fn write_piece(
        &self,
        doc: &mut DocumentWriter,
        grid: &G,
        fields: &FieldRegistry<'_>,
        layout: Option<PieceLayout>,
    ) -> Result<(), Error> {
        let layout = layout.unwrap_or_else(|| PieceLayout::serial(grid.extents()));
        let whole_extent = layout.whole_extent();
        let origin = vector_string(&global_origin(grid, &layout));
        let spacing = spacing_string(grid);

        doc.open(
            Self::GRID_TYPE,
            &[
                ("WholeExtent", whole_extent.as_str()),
                ("Origin", origin.as_str()),
                ("Spacing", spacing.as_str()),
            ],
        )?;
        write_meta_data(doc, fields)?;

        let extent = layout.piece_extent();
        doc.open("Piece", &[("Extent", extent.as_str())])?;
        write_structured_fields(doc, grid, fields)?;
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
        let origin = vector_string(&global_origin(grid, &layout));
        let spacing = spacing_string(grid);

        doc.open(
            "PImageData",
            &[
                ("WholeExtent", whole_extent.as_str()),
                ("GhostLevel", "0"),
                ("Origin", origin.as_str()),
                ("Spacing", spacing.as_str()),
            ],
        )?;
        write_summary_fields(doc, fields)?;
        write_summary_pieces(doc, summary)?;
        doc.close("PImageData")
    }

    fn placement(&self, grid: &G) -> Result<Option<Placement>, Error> {
        Ok(Some(Placement {
            origin: lower_corner(grid)?,
            extents: grid.extents(),
        }))
    }
}
