use super::{CellType, Grid, RectilinearGrid, StructuredGrid, UniformGrid};
use crate::error::NotImplemented;

/// An axis aligned grid of equally sized cells in one to three dimensions.
///
/// ## Example
///
/// A 2D grid of `10 x 15` cells, each one `0.1 x 0.1` large, with the lower left
/// corner sitting at `(1, 0)`:
///
/// ```
/// use gridformat::{Grid, ImageGrid};
///
/// let grid = ImageGrid::new([1.0, 0.0], [0.1, 0.1], [10, 15]).unwrap();
/// assert_eq!(grid.number_of_cells(), 150);
/// assert_eq!(grid.number_of_points(), 11 * 16);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGrid<const DIM: usize> {
    origin: [f64; DIM],
    spacing: [f64; DIM],
    cells: [usize; DIM],
}

/// handle to a point of an [`ImageGrid`], its lattice location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImagePoint<const DIM: usize>(pub [usize; DIM]);

/// handle to a cell of an [`ImageGrid`], its lattice location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageCell<const DIM: usize>(pub [usize; DIM]);

impl<const DIM: usize> ImageGrid<DIM> {
    /// Construct a grid from the position of its first point, the size of each
    /// cell, and the number of cells along each axis.
    pub fn new(origin: [f64; DIM], spacing: [f64; DIM], cells: [usize; DIM]) -> Result<Self, NotImplemented> {
        if DIM == 0 || DIM > 3 {
            return Err(NotImplemented::new("image grid dimension", DIM.to_string()));
        }

        Ok(Self { origin, spacing, cells })
    }

    /// number of cells along each axis
    pub fn cells_per_axis(&self) -> [usize; DIM] {
        self.cells
    }

    fn points_per_axis(&self) -> [usize; DIM] {
        let mut points = self.cells;
        points.iter_mut().for_each(|n| *n += 1);
        points
    }

    pub fn position(&self, point: &ImagePoint<DIM>) -> [f64; DIM] {
        let mut position = self.origin;
        for axis in 0..DIM {
            position[axis] += self.spacing[axis] * point.0[axis] as f64;
        }
        position
    }

    /// center of a cell
    pub fn center(&self, cell: &ImageCell<DIM>) -> [f64; DIM] {
        let mut center = self.origin;
        for axis in 0..DIM {
            center[axis] += self.spacing[axis] * (cell.0[axis] as f64 + 0.5);
        }
        center
    }
}

/// unflatten an x-fastest index
fn unflatten<const DIM: usize>(mut index: usize, counts: &[usize; DIM]) -> [usize; DIM] {
    let mut location = [0; DIM];
    for axis in 0..DIM {
        location[axis] = index % counts[axis];
        index /= counts[axis];
    }
    location
}

fn pad<T: Copy, const DIM: usize>(values: &[T; DIM], fill: T) -> [T; 3] {
    let mut out = [fill; 3];
    out[..DIM].copy_from_slice(values);
    out
}

impl<const DIM: usize> Grid for ImageGrid<DIM> {
    type Point = ImagePoint<DIM>;
    type Cell = ImageCell<DIM>;
    type Scalar = f64;
    type Position = [f64; DIM];

    fn points(&self) -> impl Iterator<Item = Self::Point> + '_ {
        let counts = self.points_per_axis();
        (0..self.number_of_points()).map(move |index| ImagePoint(unflatten(index, &counts)))
    }

    fn cells(&self) -> impl Iterator<Item = Self::Cell> + '_ {
        let counts = self.cells;
        (0..self.number_of_cells()).map(move |index| ImageCell(unflatten(index, &counts)))
    }

    fn number_of_points(&self) -> usize {
        self.points_per_axis().iter().product()
    }

    fn number_of_cells(&self) -> usize {
        self.cells.iter().product()
    }

    fn cell_points(&self, cell: &Self::Cell) -> impl Iterator<Item = Self::Point> + '_ {
        let location = cell.0;
        let cell_type = self.cell_type(cell);

        (0..1usize << DIM).map(move |vtk_index| {
            let corner = cell_type.lexicographic_corner(vtk_index);
            let mut point = location;
            for axis in 0..DIM {
                point[axis] += (corner >> axis) & 1;
            }
            ImagePoint(point)
        })
    }

    fn number_of_cell_points(&self, _: &Self::Cell) -> usize {
        1 << DIM
    }

    fn point_coordinates(&self, point: &Self::Point) -> Self::Position {
        self.position(point)
    }

    fn point_id(&self, point: &Self::Point) -> usize {
        let counts = self.points_per_axis();
        let mut id = 0;
        for axis in (0..DIM).rev() {
            id = id * counts[axis] + point.0[axis];
        }
        id
    }

    fn cell_type(&self, _: &Self::Cell) -> CellType {
        match DIM {
            1 => CellType::Segment,
            2 => CellType::Quadrilateral,
            _ => CellType::Hexahedron,
        }
    }
}

impl<const DIM: usize> StructuredGrid for ImageGrid<DIM> {
    fn extents(&self) -> [usize; 3] {
        pad(&self.cells, 0)
    }

    fn point_location(&self, point: &Self::Point) -> [usize; 3] {
        pad(&point.0, 0)
    }

    fn cell_location(&self, cell: &Self::Cell) -> [usize; 3] {
        pad(&cell.0, 0)
    }
}

impl<const DIM: usize> RectilinearGrid for ImageGrid<DIM> {
    fn ordinates(&self, axis: usize) -> Vec<f64> {
        if axis >= DIM {
            return vec![0.0];
        }

        (0..=self.cells[axis])
            .map(|i| self.origin[axis] + self.spacing[axis] * i as f64)
            .collect()
    }
}

impl<const DIM: usize> UniformGrid for ImageGrid<DIM> {
    fn origin(&self) -> [f64; 3] {
        pad(&self.origin, 0.0)
    }

    fn spacing(&self) -> [f64; 3] {
        pad(&self.spacing, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_dimensions() {
        assert!(ImageGrid::<4>::new([0.0; 4], [1.0; 4], [1; 4]).is_err());
        assert!(ImageGrid::<3>::new([0.0; 3], [1.0; 3], [1; 3]).is_ok());
    }

    #[test]
    fn points_are_x_fastest() {
        let grid = ImageGrid::new([0.0, 0.0], [1.0, 1.0], [2, 1]).unwrap();
        let points: Vec<_> = grid.points().map(|p| p.0).collect();
        assert_eq!(points, vec![[0, 0], [1, 0], [2, 0], [0, 1], [1, 1], [2, 1]]);

        for (index, point) in grid.points().enumerate() {
            assert_eq!(grid.point_id(&point), index);
        }
    }

    #[test]
    fn quadrilateral_corners_are_counter_clockwise() {
        let grid = ImageGrid::new([0.0, 0.0], [1.0, 1.0], [2, 2]).unwrap();
        let corners: Vec<_> = grid.cell_points(&ImageCell([1, 0])).map(|p| p.0).collect();
        assert_eq!(corners, vec![[1, 0], [2, 0], [2, 1], [1, 1]]);
    }

    #[test]
    fn hexahedron_corners() {
        let grid = ImageGrid::new([0.0; 3], [1.0; 3], [1, 1, 1]).unwrap();
        let corners: Vec<_> = grid.cell_points(&ImageCell([0, 0, 0])).map(|p| p.0).collect();
        assert_eq!(
            corners,
            vec![
                [0, 0, 0],
                [1, 0, 0],
                [1, 1, 0],
                [0, 1, 0],
                [0, 0, 1],
                [1, 0, 1],
                [1, 1, 1],
                [0, 1, 1]
            ]
        );
        assert_eq!(grid.cell_type(&ImageCell([0, 0, 0])), CellType::Hexahedron);
    }

    #[test]
    fn padded_structured_information() {
        let grid = ImageGrid::new([1.0, 2.0], [0.5, 0.25], [4, 3]).unwrap();
        assert_eq!(grid.extents(), [4, 3, 0]);
        assert_eq!(grid.origin(), [1.0, 2.0, 0.0]);
        assert_eq!(grid.spacing(), [0.5, 0.25, 1.0]);
        assert_eq!(grid.ordinates(1), vec![2.0, 2.25, 2.5, 2.75]);
        assert_eq!(grid.ordinates(2), vec![0.0]);
    }
}
