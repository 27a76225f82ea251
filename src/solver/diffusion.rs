//! Density-gradient diffusion force
//!
//! For a cell, the force is the sum over every neighbour within the diffusion
//! radius of `(own density - neighbour density) * decay(ring) * direction`,
//! where `direction` is the L1-normalized offset from the neighbour back to the
//! cell. Neighbours outside the grid are skipped.

use bevy::prelude::IVec2;

use crate::core::{CellId, NeighborTopology, SpatialGrid};
use crate::error::SimError;
use crate::math::{Real, Vector, l1_direction, zero_vector};

#[derive(Clone, Copy, Debug)]
struct Tap {
    offset: IVec2,
    weight: Real,
    direction: Vector,
}

/// Precomputed diffusion kernel: one tap per neighbour offset within the radius.
#[derive(Clone, Debug)]
pub struct DiffusionSolver {
    taps: Vec<Tap>,
    radius: usize,
    strength: Real,
}

impl DiffusionSolver {
    pub fn new(
        topology: &NeighborTopology,
        radius: usize,
        decay: &[Real],
        strength: Real,
    ) -> Result<Self, SimError> {
        if decay.len() <= radius {
            return Err(SimError::DecayTable(format!(
                "radius {radius} needs {} weights, got {}",
                radius + 1,
                decay.len()
            )));
        }

        let mut taps = Vec::new();
        for d in 1..=radius {
            for &offset in topology.ring(d)? {
                // Ring offsets are never zero.
                let Some(direction) = l1_direction(-offset.as_vec2()) else {
                    continue;
                };
                taps.push(Tap {
                    offset,
                    weight: decay[d],
                    direction,
                });
            }
        }

        Ok(Self {
            taps,
            radius,
            strength,
        })
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Number of neighbour offsets the kernel visits for an interior cell.
    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    /// Diffusion force for one cell, from the current densities.
    pub fn vector_for(&self, grid: &SpatialGrid, cell: CellId) -> Vector {
        let Some(center) = grid.cell(cell) else {
            return zero_vector();
        };

        let mut force = zero_vector();
        for tap in &self.taps {
            if let Some(neighbor) = grid.cell_at(center.coord + tap.offset) {
                force += (center.density - neighbor.density) * tap.weight * tap.direction;
            }
        }
        force * self.strength
    }

    /// Recompute and store the diffusion vector of each listed cell.
    ///
    /// Densities are not touched, so cells can be written as they are solved.
    pub fn solve<I>(&self, grid: &mut SpatialGrid, cells: I)
    where
        I: IntoIterator<Item = CellId>,
    {
        for id in cells {
            let force = self.vector_for(grid, id);
            if let Some(cell) = grid.cell_mut(id) {
                cell.diffusion = force;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::{UVec2, Vec2};

    fn setup(radius: usize) -> (SpatialGrid, DiffusionSolver) {
        let grid = SpatialGrid::new(UVec2::new(10, 10), 1.0).unwrap();
        let topology = NeighborTopology::new(radius, grid.max_coord());
        let decay: Vec<Real> = (0..=radius).map(|d| 1.0 / (d as Real + 1.0)).collect();
        let solver = DiffusionSolver::new(&topology, radius, &decay, 1.0).unwrap();
        (grid, solver)
    }

    fn id(grid: &SpatialGrid, x: i32, y: i32) -> CellId {
        grid.id_at(IVec2::new(x, y)).unwrap()
    }

    #[test]
    fn uniform_density_has_no_force() {
        let (mut grid, solver) = setup(2);
        for cell in grid.cells_mut() {
            cell.density = 3.0;
        }
        for cell in 0..grid.len() {
            assert_eq!(solver.vector_for(&grid, cell), Vec2::ZERO);
        }
    }

    #[test]
    fn neighbours_of_a_dense_cell_point_at_it() {
        let (mut grid, solver) = setup(1);
        let center = id(&grid, 5, 5);
        grid.cell_mut(center).unwrap().density = 10.0;

        assert_eq!(solver.vector_for(&grid, center), Vec2::ZERO);

        let decay1 = 0.5;
        let right = solver.vector_for(&grid, id(&grid, 6, 5));
        assert_eq!(right, Vec2::new(-10.0 * decay1, 0.0));

        let diagonal = solver.vector_for(&grid, id(&grid, 4, 6));
        assert_eq!(diagonal, Vec2::new(5.0 * decay1, -5.0 * decay1));
    }

    #[test]
    fn edge_cells_skip_missing_neighbours() {
        let (mut grid, solver) = setup(1);
        let corner = id(&grid, 0, 0);
        grid.cell_mut(corner).unwrap().density = 4.0;
        let force = solver.vector_for(&grid, corner);
        // Only (1,0), (0,1) and (1,1) exist, all emptier than the corner.
        assert!(force.x < 0.0 && force.y < 0.0);
        assert!(force.is_finite());
    }

    #[test]
    fn solve_writes_only_listed_cells() {
        let (mut grid, solver) = setup(1);
        let center = id(&grid, 5, 5);
        let right = id(&grid, 6, 5);
        let left = id(&grid, 4, 5);
        grid.cell_mut(center).unwrap().density = 2.0;
        solver.solve(&mut grid, [right]);
        assert_ne!(grid.cell(right).unwrap().diffusion, Vec2::ZERO);
        assert_eq!(grid.cell(left).unwrap().diffusion, Vec2::ZERO);
    }

    #[test]
    fn kernel_covers_all_rings() {
        let (_, solver) = setup(3);
        assert_eq!(solver.tap_count(), 8 + 16 + 24);
    }
}
