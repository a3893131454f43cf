//! Reconstruction of the global index space from structured pieces.
//!
//! Every piece only knows its own origin and extents. Along each axis, pieces
//! are ordered by their origin coordinate, and pieces that share an origin
//! coordinate form one layer that must have the same number of cells. The
//! offset of a layer is the sum of the cells of all layers below it.

use crate::error::StructuredLayout;
use crate::formats::{PieceLayout, Placement};

const RELATIVE_TOLERANCE: f64 = 1e-9;

fn same_coordinate(a: f64, b: f64) -> bool {
    (a - b).abs() <= RELATIVE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Distinct layers along one axis: (origin coordinate, number of cells)
fn layers(placements: &[Placement], axis: usize) -> Result<Vec<(f64, usize)>, StructuredLayout> {
    let mut layers: Vec<(f64, usize)> = Vec::new();

    for placement in placements {
        let origin = placement.origin[axis];
        let extent = placement.extents[axis];

        match layers.iter().find(|(coordinate, _)| same_coordinate(*coordinate, origin)) {
            Some((_, cells)) if *cells != extent => {
                return Err(StructuredLayout::new(format!(
                    "pieces starting at {} along axis {} have {} and {} cells",
                    origin, axis, cells, extent
                )));
            }
            Some(_) => (),
            None => layers.push((origin, extent)),
        }
    }

    layers.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(layers)
}

/// Compute the layout of every piece from the placements of all pieces, given
/// in rank order.
pub(crate) fn reconstruct(placements: &[Placement]) -> Result<Vec<PieceLayout>, StructuredLayout> {
    let mut offsets = vec![[0usize; 3]; placements.len()];
    let mut whole_extents = [0usize; 3];

    for axis in 0..3 {
        let layers = layers(placements, axis)?;

        for (offset, placement) in offsets.iter_mut().zip(placements) {
            offset[axis] = layers
                .iter()
                .take_while(|(coordinate, _)| !same_coordinate(*coordinate, placement.origin[axis]))
                .map(|(_, cells)| cells)
                .sum();
        }

        whole_extents[axis] = layers.iter().map(|(_, cells)| cells).sum();
    }

    // pieces tile the whole extent if their cells add up and none of them overlap
    let volume = |extents: &[usize; 3]| -> usize { extents.iter().map(|e| (*e).max(1)).product() };
    let covered: usize = placements.iter().map(|p| volume(&p.extents)).sum();
    if covered != volume(&whole_extents) {
        return Err(StructuredLayout::new(format!(
            "pieces cover {} cells of a whole extent of {:?} cells",
            covered, whole_extents
        )));
    }

    let layouts: Vec<PieceLayout> = offsets
        .into_iter()
        .zip(placements)
        .map(|(offset, placement)| PieceLayout {
            offset,
            extents: placement.extents,
            whole_extents,
        })
        .collect();

    for (i, a) in layouts.iter().enumerate() {
        for b in &layouts[i + 1..] {
            if overlap(a, b) {
                return Err(StructuredLayout::new(format!(
                    "pieces at offsets {:?} and {:?} overlap",
                    a.offset, b.offset
                )));
            }
        }
    }

    Ok(layouts)
}

fn overlap(a: &PieceLayout, b: &PieceLayout) -> bool {
    (0..3).all(|axis| {
        let a_end = a.offset[axis] + a.extents[axis].max(1);
        let b_end = b.offset[axis] + b.extents[axis].max(1);
        a.offset[axis] < b_end && b.offset[axis] < a_end
    })
}
