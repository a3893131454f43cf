use super::{CellType, Grid};
use crate::error::{Error, FieldSize, NotImplemented, UnknownPoint};

/// A mesh stored as explicit point coordinates and per-cell connectivity.
///
/// Points and cells are referred to by their index. Corners have to be given in
/// the canonical order of the respective [`CellType`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnstructuredMesh {
    points: Vec<[f64; 3]>,
    cells: Vec<(CellType, Vec<usize>)>,
}

impl UnstructuredMesh {
    pub fn new(points: Vec<[f64; 3]>) -> Self {
        Self {
            points,
            cells: Vec::new(),
        }
    }

    /// Add a cell with the given corners. Fails if a corner index is out of
    /// range or the number of corners does not fit the cell type.
    pub fn add_cell(&mut self, cell_type: CellType, corners: Vec<usize>) -> Result<(), Error> {
        if let Some(expected) = cell_type.number_of_corners() {
            if expected != corners.len() {
                return Err(FieldSize::new(format!("{:?} corners", cell_type), expected, corners.len()).into());
            }
        }

        if let Some(&point_id) = corners.iter().find(|&&corner| corner >= self.points.len()) {
            return Err(UnknownPoint::new(point_id).into());
        }

        self.cells.push((cell_type, corners));
        Ok(())
    }

    /// Build a mesh from the flat arrays used by VTK's unstructured format:
    /// concatenated `connectivity`, the end `offsets` of each cell within it, and
    /// VTK cell type ids.
    pub fn from_vtk_arrays(
        points: Vec<[f64; 3]>,
        connectivity: &[usize],
        offsets: &[usize],
        types: &[u8],
    ) -> Result<Self, Error> {
        if offsets.len() != types.len() {
            return Err(FieldSize::new("types".into(), offsets.len(), types.len()).into());
        }

        let mut mesh = Self::new(points);
        let mut start = 0;

        for (&end, &vtk_id) in offsets.iter().zip(types) {
            let cell_type = CellType::from_vtk_id(vtk_id)?;
            let corners = connectivity
                .get(start..end)
                .ok_or_else(|| FieldSize::new("connectivity".into(), end, connectivity.len()))?;
            mesh.add_cell(cell_type, corners.to_vec())?;
            start = end;
        }

        Ok(mesh)
    }

    pub fn cell(&self, index: usize) -> Option<(CellType, &[usize])> {
        self.cells
            .get(index)
            .map(|(cell_type, corners)| (*cell_type, corners.as_slice()))
    }

    pub fn position(&self, point: usize) -> Option<[f64; 3]> {
        self.points.get(point).copied()
    }

    /// arithmetic mean of the corners of a cell
    pub fn center(&self, cell: usize) -> [f64; 3] {
        let mut center = [0.0; 3];
        let Some((_, corners)) = self.cell(cell) else {
            return center;
        };

        for &corner in corners {
            for (axis, value) in center.iter_mut().enumerate() {
                *value += self.points[corner][axis];
            }
        }

        let n = corners.len().max(1) as f64;
        center.iter_mut().for_each(|value| *value /= n);
        center
    }
}

impl Grid for UnstructuredMesh {
    type Point = usize;
    type Cell = usize;
    type Scalar = f64;
    type Position = [f64; 3];

    fn points(&self) -> impl Iterator<Item = usize> + '_ {
        0..self.points.len()
    }

    fn cells(&self) -> impl Iterator<Item = usize> + '_ {
        0..self.cells.len()
    }

    fn number_of_points(&self) -> usize {
        self.points.len()
    }

    fn number_of_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell_points(&self, cell: &usize) -> impl Iterator<Item = usize> + '_ {
        self.cells[*cell].1.iter().copied()
    }

    fn number_of_cell_points(&self, cell: &usize) -> usize {
        self.cells[*cell].1.len()
    }

    fn point_coordinates(&self, point: &usize) -> [f64; 3] {
        self.points[*point]
    }

    fn point_id(&self, point: &usize) -> usize {
        *point
    }

    fn cell_type(&self, cell: &usize) -> CellType {
        self.cells[*cell].0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<[f64; 3]> {
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
    }

    #[test]
    fn add_cells() {
        let mut mesh = UnstructuredMesh::new(unit_square());
        mesh.add_cell(CellType::Triangle, vec![0, 1, 2]).unwrap();
        mesh.add_cell(CellType::Triangle, vec![0, 2, 3]).unwrap();

        assert_eq!(mesh.number_of_cells(), 2);
        assert_eq!(mesh.cell_points(&1).collect::<Vec<_>>(), vec![0, 2, 3]);
        assert_eq!(mesh.center(0), [2.0 / 3.0, 1.0 / 3.0, 0.0]);
    }

    #[test]
    fn wrong_corner_count() {
        let mut mesh = UnstructuredMesh::new(unit_square());
        assert!(mesh.add_cell(CellType::Quadrilateral, vec![0, 1, 2]).is_err());
    }

    #[test]
    fn corner_out_of_range() {
        let mut mesh = UnstructuredMesh::new(unit_square());
        let err = mesh.add_cell(CellType::Triangle, vec![0, 1, 7]).unwrap_err();
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn vtk_arrays() {
        let mesh = UnstructuredMesh::from_vtk_arrays(unit_square(), &[0, 1, 2, 3, 0, 1], &[4, 6], &[9, 3]).unwrap();

        assert_eq!(mesh.cell_type(&0), CellType::Quadrilateral);
        assert_eq!(mesh.cell_type(&1), CellType::Segment);
    }

    #[test]
    fn unknown_topology_is_a_hard_failure() {
        let result = UnstructuredMesh::from_vtk_arrays(unit_square(), &[0, 1, 2, 3], &[4], &[8]);
        assert!(matches!(result, Err(Error::NotImplemented(_))));
    }
}
