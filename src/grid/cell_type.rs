use crate::error::NotImplemented;

/// Shape tag of a cell, which also fixes the order in which its corners have to
/// be listed.
///
/// The corner order is the one defined by VTK, not the one of whatever mesh
/// library the grid comes from. Adapters that store corners in lexicographic
/// (tensor product) order can use [`CellType::lexicographic_corner`] to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellType {
    Vertex,
    Segment,
    Triangle,
    Quadrilateral,
    Polygon,
    Tetrahedron,
    Hexahedron,
    LagrangeSegment,
    LagrangeTriangle,
    LagrangeQuadrilateral,
    LagrangeTetrahedron,
    LagrangeHexahedron,
}

const QUADRILATERAL_CORNERS: [usize; 4] = [0, 1, 3, 2];
const HEXAHEDRON_CORNERS: [usize; 8] = [0, 1, 3, 2, 4, 5, 7, 6];

impl CellType {
    /// the integer id VTK uses in the `types` array of unstructured files
    pub fn vtk_id(&self) -> u8 {
        match self {
            Self::Vertex => 1,
            Self::Segment => 3,
            Self::Triangle => 5,
            Self::Polygon => 7,
            Self::Quadrilateral => 9,
            Self::Tetrahedron => 10,
            Self::Hexahedron => 12,
            Self::LagrangeSegment => 68,
            Self::LagrangeTriangle => 69,
            Self::LagrangeQuadrilateral => 70,
            Self::LagrangeTetrahedron => 71,
            Self::LagrangeHexahedron => 72,
        }
    }

    /// Inverse of [`vtk_id`](CellType::vtk_id). Ids of cell shapes this crate
    /// does not know about are an error rather than being skipped.
    pub fn from_vtk_id(id: u8) -> Result<Self, NotImplemented> {
        let cell_type = match id {
            1 => Self::Vertex,
            3 => Self::Segment,
            5 => Self::Triangle,
            7 => Self::Polygon,
            9 => Self::Quadrilateral,
            10 => Self::Tetrahedron,
            12 => Self::Hexahedron,
            68 => Self::LagrangeSegment,
            69 => Self::LagrangeTriangle,
            70 => Self::LagrangeQuadrilateral,
            71 => Self::LagrangeTetrahedron,
            72 => Self::LagrangeHexahedron,
            other => return Err(NotImplemented::new("vtk cell type id", other.to_string())),
        };

        Ok(cell_type)
    }

    /// Number of corners of linear cells. Polygons and lagrange cells have a
    /// variable number of points and return `None`.
    pub fn number_of_corners(&self) -> Option<usize> {
        match self {
            Self::Vertex => Some(1),
            Self::Segment => Some(2),
            Self::Triangle => Some(3),
            Self::Quadrilateral => Some(4),
            Self::Tetrahedron => Some(4),
            Self::Hexahedron => Some(8),
            _ => None,
        }
    }

    pub fn is_lagrange(&self) -> bool {
        matches!(
            self,
            Self::LagrangeSegment
                | Self::LagrangeTriangle
                | Self::LagrangeQuadrilateral
                | Self::LagrangeTetrahedron
                | Self::LagrangeHexahedron
        )
    }

    /// Index of the lexicographically ordered corner that sits at position
    /// `vtk_index` of the canonical corner order.
    ///
    /// Quadrilaterals and hexahedra list their corners counter-clockwise, while
    /// tensor product grids number them lexicographically. All other shapes use
    /// the identity.
    ///
    /// ```
    /// use gridformat::CellType;
    /// assert_eq!(CellType::Quadrilateral.lexicographic_corner(2), 3);
    /// assert_eq!(CellType::Triangle.lexicographic_corner(2), 2);
    /// ```
    pub fn lexicographic_corner(&self, vtk_index: usize) -> usize {
        match self {
            Self::Quadrilateral => QUADRILATERAL_CORNERS.get(vtk_index).copied().unwrap_or(vtk_index),
            Self::Hexahedron => HEXAHEDRON_CORNERS.get(vtk_index).copied().unwrap_or(vtk_index),
            _ => vtk_index,
        }
    }
}

/// Reorder corners that are given in lexicographic order into the canonical order
/// of `cell_type`
pub fn reorder_lexicographic_corners<T: Copy>(cell_type: CellType, corners: &mut [T]) {
    if !matches!(cell_type, CellType::Quadrilateral | CellType::Hexahedron) {
        return;
    }

    let lexicographic = corners.to_vec();
    for (vtk_index, corner) in corners.iter_mut().enumerate() {
        if let Some(value) = lexicographic.get(cell_type.lexicographic_corner(vtk_index)) {
            *corner = *value;
        }
    }
}
