//! # Grid adapters
//!
//! The writers never look at a mesh directly. Instead, a mesh type is made
//! writable by implementing a small set of capability traits for it. There is no
//! base type to inherit from and nothing is looked up at runtime: a grid lacking a
//! capability required by a file format simply does not satisfy the trait bound of
//! that format's writer, and the program does not compile.
//!
//! ## Capabilities
//!
//! [`Grid`] is required by every format. It exposes the points and cells of the
//! grid as *handles*, which are whatever the underlying mesh library uses to refer
//! to its entities (indices, iterators, references ...). Writers iterate the
//! handles, ask for connectivity, coordinates and cell shapes, and hand the
//! handles to the user's field callbacks.
//!
//! Structured formats additionally need to know where each entity sits in the
//! grid's index space:
//!
//! * [`StructuredGrid`]: extents and per-entity locations (`.vts`)
//! * [`RectilinearGrid`]: per-axis ordinates on top of that (`.vtr`)
//! * [`UniformGrid`]: origin and spacing on top of that (`.vti`)
//!
//! Only entities owned by the current process should be reported; ghost
//! entities in a distributed setting are not written.
//!
//! ## Defining your own adapter
//!
//! ```
//! use gridformat::{CellType, Grid};
//!
//! struct Triangles {
//!     points: Vec<[f64; 2]>,
//!     triangles: Vec<[usize; 3]>,
//! }
//!
//! impl Grid for Triangles {
//!     type Point = usize;
//!     type Cell = usize;
//!     type Scalar = f64;
//!     type Position = [f64; 2];
//!
//!     fn points(&self) -> impl Iterator<Item = usize> + '_ { 0..self.points.len() }
//!     fn cells(&self) -> impl Iterator<Item = usize> + '_ { 0..self.triangles.len() }
//!     fn number_of_points(&self) -> usize { self.points.len() }
//!     fn number_of_cells(&self) -> usize { self.triangles.len() }
//!     fn cell_points(&self, cell: &usize) -> impl Iterator<Item = usize> + '_ {
//!         self.triangles[*cell].into_iter()
//!     }
//!     fn point_coordinates(&self, point: &usize) -> [f64; 2] { self.points[*point] }
//!     fn point_id(&self, point: &usize) -> usize { *point }
//!     fn cell_type(&self, _: &usize) -> CellType { CellType::Triangle }
//! }
//! ```

mod cell_type;
mod image;
mod unstructured;

pub use cell_type::{reorder_lexicographic_corners, CellType};
pub use image::{ImageCell, ImageGrid, ImagePoint};
pub use unstructured::UnstructuredMesh;

use crate::precision::Numeric;

/// Capabilities every writable grid has to provide
pub trait Grid {
    /// handle to a point of the grid
    type Point;
    /// handle to a cell of the grid
    type Cell;
    /// scalar type of the point coordinates
    type Scalar: Numeric;
    /// coordinates of a single point, 1 to 3 values
    type Position: AsRef<[Self::Scalar]>;

    fn points(&self) -> impl Iterator<Item = Self::Point> + '_;

    fn cells(&self) -> impl Iterator<Item = Self::Cell> + '_;

    /// must equal the number of items yielded by [`points`](Grid::points)
    fn number_of_points(&self) -> usize;

    /// must equal the number of items yielded by [`cells`](Grid::cells)
    fn number_of_cells(&self) -> usize;

    /// the corners of `cell` in the canonical order of its [`CellType`]
    fn cell_points(&self, cell: &Self::Cell) -> impl Iterator<Item = Self::Point> + '_;

    fn number_of_cell_points(&self, cell: &Self::Cell) -> usize {
        self.cell_points(cell).count()
    }

    fn point_coordinates(&self, point: &Self::Point) -> Self::Position;

    /// Unique, non-negative id of a point. Only has to be unique for the
    /// duration of a single write.
    fn point_id(&self, point: &Self::Point) -> usize;

    fn cell_type(&self, cell: &Self::Cell) -> CellType;
}

/// A grid whose entities are arranged on a (up to) three dimensional lattice.
///
/// Axes that the grid does not use have an extent of zero cells.
pub trait StructuredGrid: Grid {
    /// number of cells along each axis
    fn extents(&self) -> [usize; 3];

    /// lattice index of a point, each entry in `0..=extents[axis]`
    fn point_location(&self, point: &Self::Point) -> [usize; 3];

    /// lattice index of a cell, each entry in `0..extents[axis]`
    fn cell_location(&self, cell: &Self::Cell) -> [usize; 3];
}

/// A structured grid with axis aligned cells of varying size
pub trait RectilinearGrid: StructuredGrid {
    /// Coordinates of the point layers along `axis`. Has `extents[axis] + 1`
    /// entries for used axes.
    fn ordinates(&self, axis: usize) -> Vec<Self::Scalar>;
}

/// A structured grid with equally sized, axis aligned cells
pub trait UniformGrid: StructuredGrid {
    /// position of the point at location `[0, 0, 0]`
    fn origin(&self) -> [Self::Scalar; 3];

    /// cell size along each axis
    fn spacing(&self) -> [Self::Scalar; 3];
}

/// Number of points along each axis of a structured grid (unused axes have one)
pub(crate) fn point_counts(extents: [usize; 3]) -> [usize; 3] {
    [extents[0] + 1, extents[1] + 1, extents[2] + 1]
}

/// Number of cells along each axis of a structured grid, where unused axes
/// count as a single layer
pub(crate) fn cell_counts(extents: [usize; 3]) -> [usize; 3] {
    [extents[0].max(1), extents[1].max(1), extents[2].max(1)]
}

/// Position of a lattice location in VTK's x-fastest ordering
pub(crate) fn flat_index(location: [usize; 3], counts: [usize; 3]) -> usize {
    location[0] + counts[0] * (location[1] + counts[1] * location[2])
}
