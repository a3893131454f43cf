//! Poly data files (`.vtp`, `.pvtp`).

use super::sealed::PieceWriter;
use super::vtu::{connectivity, write_points, PointIndex};
use super::{
    write_field_section, write_meta_data, write_summary_fields, write_summary_pieces, write_summary_points, Format,
    PieceLayout, Summary,
};
use crate::document::DocumentWriter;
use crate::error::{Error, UnsupportedCellType};
use crate::field::{FieldData, FieldRegistry, FieldShape};
use crate::grid::{CellType, Grid};

/// `.vtp` poly data: points, together with vertices, lines and polygons
///
/// Cells are grouped by kind in the file (vertices, then lines, then polygons),
/// and cell data is written in that order. Volume and higher order cells cannot
/// be represented.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vtp;

impl Format for Vtp {
    const GRID_TYPE: &'static str = "PolyData";
    const EXTENSION: &'static str = "vtp";
    const VERSION: &'static str = "2.2";
}

/// the element each cell kind is written to, in file order
const SECTIONS: [&str; 3] = ["Verts", "Lines", "Polys"];

fn section_of(cell_type: CellType) -> Result<usize, UnsupportedCellType> {
    match cell_type {
        CellType::Vertex => Ok(0),
        CellType::Segment => Ok(1),
        CellType::Triangle | CellType::Quadrilateral | CellType::Polygon => Ok(2),
        other => Err(UnsupportedCellType::new(other, "vtp")),
    }
}

impl<G: Grid> PieceWriter<G> for Vtp {
    fn write_piece(
        &self,
        doc: &mut DocumentWriter,
        grid: &G,
        fields: &FieldRegistry<'_>,
        _layout: Option<PieceLayout>,
    ) -> Result<(), Error> {
        let mut sections: [Vec<G::Cell>; 3] = Default::default();
        let mut kinds = Vec::with_capacity(grid.number_of_cells());
        for cell in grid.cells() {
            let section = section_of(grid.cell_type(&cell))?;
            kinds.push(section);
            sections[section].push(cell);
        }

        // cell i of the grid ends up at position order[i] in the file
        let mut next = [0, sections[0].len(), sections[0].len() + sections[1].len()];
        let order: Vec<usize> = kinds
            .iter()
            .map(|&section| {
                next[section] += 1;
                next[section] - 1
            })
            .collect();

        let index = PointIndex::new(grid);
        let points = grid.number_of_points().to_string();
        let counts: Vec<String> = sections.iter().map(|cells| cells.len().to_string()).collect();

        doc.open(Self::GRID_TYPE, &[])?;
        write_meta_data(doc, fields)?;
        doc.open(
            "Piece",
            &[
                ("NumberOfPoints", points.as_str()),
                ("NumberOfVerts", counts[0].as_str()),
                ("NumberOfLines", counts[1].as_str()),
                ("NumberOfStrips", "0"),
                ("NumberOfPolys", counts[2].as_str()),
            ],
        )?;

        write_field_section(doc, "PointData", &fields.points, grid.number_of_points(), None)?;
        write_field_section(doc, "CellData", &fields.cells, grid.number_of_cells(), Some(&order))?;
        write_points(doc, grid)?;

        for (name, cells) in SECTIONS.iter().zip(&sections) {
            let (connectivity, offsets) = connectivity(grid, cells.iter(), &index)?;
            doc.open(name, &[])?;
            doc.data_array("connectivity", FieldData::Int64(connectivity), FieldShape::Scalar)?;
            doc.data_array("offsets", FieldData::Int64(offsets), FieldShape::Scalar)?;
            doc.close(name)?;
        }

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
        doc.open("PPolyData", &[("GhostLevel", "0")])?;
        write_summary_fields(doc, fields)?;
        write_summary_points::<G>(doc)?;
        write_summary_pieces(doc, summary)?;
        doc.close("PPolyData")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections() {
        assert_eq!(section_of(CellType::Vertex).unwrap(), 0);
        assert_eq!(section_of(CellType::Segment).unwrap(), 1);
        assert_eq!(section_of(CellType::Quadrilateral).unwrap(), 2);
        assert_eq!(section_of(CellType::Polygon).unwrap(), 2);
        assert!(section_of(CellType::Tetrahedron).is_err());
        assert!(section_of(CellType::LagrangeTriangle).is_err());
    }
}
