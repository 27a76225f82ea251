use crate::core::{Membership, Particle, SpatialGrid};
use crate::math::Real;

/// Hand part of each occupied cell's stored momentum back to its residents.
///
/// `momentum * distribution * dt` leaves the cell and is split evenly; every
/// resident also receives the cell's diffusion vector in full.
///
/// # Panics
///
/// If the membership index lists an empty or unknown cell.
pub fn distribute_momentum(
    grid: &mut SpatialGrid,
    particles: &mut [Particle],
    membership: &Membership,
    distribution: Real,
    dt: Real,
) {
    for (cell_id, residents) in membership.iter() {
        assert!(
            !residents.is_empty(),
            "membership index holds an empty entry for cell {cell_id}"
        );
        let Some(cell) = grid.cell_mut(cell_id) else {
            panic!("membership index references unknown cell {cell_id}");
        };

        let distributed = cell.momentum * distribution * dt;
        cell.momentum -= distributed;

        let push = distributed / residents.len() as Real + cell.diffusion;
        for &particle in residents {
            particles[particle].velocity += push;
        }
    }
}
