//! Particle integration
//!
//! Per particle and tick, in order: viscosity damping, gravity, intra-cell
//! repulsion, speed capping, position update, boundary reflection.
//!
//! Repulsion only looks at particles sharing a cell, so its cost is bounded by
//! the square of the per-cell population rather than the whole set. The
//! forces are gathered in a read-only pass before the parallel update.

use std::f32::consts::FRAC_PI_2;

use rayon::prelude::*;

use crate::config::{SimParams, TickFlags};
use crate::core::{Membership, Particle, SpatialGrid, TickStats, slice_len};
use crate::math::{Real, Vector, l1_direction, zero_vector};

/// Scalars needed by the per-particle update, resolved once per tick.
#[derive(Clone, Copy, Debug)]
pub struct StepConstants {
    pub dt: Real,
    pub damping: Real,
    pub gravity_step: Vector,
    pub soft_cap: Real,
    pub hard_cap: Real,
    pub extent: Vector,
    pub bounce: Real,
}

impl StepConstants {
    pub fn new(params: &SimParams, dt: Real, flags: TickFlags) -> Self {
        let mut gravity_step = zero_vector();
        if flags.gravity {
            gravity_step.y -= params.gravity * dt;
        }
        if flags.x_gravity {
            gravity_step.x += params.x_gravity * dt;
        }

        Self {
            dt,
            damping: 1.0 - params.viscosity,
            gravity_step,
            soft_cap: params.soft_speed_cap,
            hard_cap: params.hard_speed_cap,
            extent: params.reflect_extent(),
            bounce: -1.0 + params.bounce_dampening,
        }
    }
}

/// Shape of the intra-cell repulsion for one cell.
#[derive(Clone, Copy, Debug)]
pub struct LocalForceParams {
    /// Distance at which the falloff reaches zero
    pub max_distance: Real,
    pub density_factor: Real,
    /// `dt / reference_dt`
    pub dt_ratio: Real,
}

impl LocalForceParams {
    pub fn for_cell(params: &SimParams, grid: &SpatialGrid, cell_density: Real, dt: Real) -> Self {
        Self {
            max_distance: grid.cell_diagonal() * (params.diffusion_radius as Real + 1.0),
            density_factor: params.repulsion_strength * cell_density.max(1.0),
            dt_ratio: dt / params.reference_dt,
        }
    }
}

/// Force pushing `velocity`'s owner back along its path when two particles
/// sit on exactly the same point.
#[inline]
pub fn overlap_fallback(velocity: Vector, density_factor: Real) -> Vector {
    -velocity * density_factor.min(1.0)
}

/// Repulsion felt by the particle at `position` from one at `other`.
///
/// The distance is mapped onto `[0, pi/2]` against `max_distance` and the
/// falloff is `cos^3` of that angle. The direction is the L1-normalized
/// offset away from `other`.
pub fn calc_local_force(
    position: Vector,
    other: Vector,
    velocity: Vector,
    shape: &LocalForceParams,
    stats: &mut TickStats,
) -> Vector {
    let offset = position - other;
    if offset == zero_vector() {
        stats.overlaps += 1;
        return overlap_fallback(velocity, shape.density_factor);
    }

    // A subnormal offset has a usable L1 direction but its squared length
    // underflows; treat it as touching.
    let distance = offset.length();
    if distance == 0.0 {
        stats.degenerate_offsets += 1;
    }

    let Some(direction) = l1_direction(offset) else {
        stats.degenerate_offsets += 1;
        return zero_vector();
    };
    let angle = (distance / shape.max_distance).min(1.0) * FRAC_PI_2;
    let magnitude = angle.cos().powi(3);
    direction * magnitude * shape.density_factor * shape.dt_ratio
}

/// Summed repulsion per particle, indexed like `particles`.
pub fn local_forces(
    grid: &SpatialGrid,
    particles: &[Particle],
    membership: &Membership,
    params: &SimParams,
    dt: Real,
    stats: &mut TickStats,
) -> Vec<Vector> {
    let mut forces = vec![zero_vector(); particles.len()];

    for (cell_id, residents) in membership.iter() {
        if residents.len() < 2 {
            continue;
        }
        let density = grid.cell(cell_id).map_or(0.0, |cell| cell.density);
        let shape = LocalForceParams::for_cell(params, grid, density, dt);

        for (i, &a) in residents.iter().enumerate() {
            for &b in residents.iter().skip(i + 1) {
                let (pa, pb) = (&particles[a], &particles[b]);
                let overlaps_before = stats.overlaps;
                let force = calc_local_force(pa.position, pb.position, pa.velocity, &shape, stats);
                forces[a] += force;
                forces[b] += if stats.overlaps > overlaps_before {
                    overlap_fallback(pb.velocity, shape.density_factor)
                } else {
                    -force
                };
            }
        }
    }

    forces
}

#[inline]
fn cap_axis(component: &mut Real, soft: Real, hard: Real, stats: &mut TickStats) {
    let speed = component.abs();
    if speed > hard {
        *component = 0.0;
        stats.hard_caps += 1;
    } else if speed > soft {
        *component *= 0.5;
        stats.soft_caps += 1;
    }
}

/// Cap each velocity axis independently: zero above `hard`, halve above `soft`.
pub fn apply_speed_cap(velocity: &mut Vector, soft: Real, hard: Real, stats: &mut TickStats) {
    cap_axis(&mut velocity.x, soft, hard, stats);
    cap_axis(&mut velocity.y, soft, hard, stats);
}

#[inline]
fn reflect_axis(position: &mut Real, velocity: &mut Real, extent: Real, bounce: Real) -> bool {
    if *position > extent {
        *position = extent;
    } else if *position < 0.0 {
        *position = (-*position).min(extent);
    } else {
        return false;
    }
    *velocity *= bounce;
    true
}

/// Keep a particle inside `[0, extent]` on both axes, reversing and scaling
/// the velocity of each axis that crossed.
pub fn reflect_boundary(
    position: &mut Vector,
    velocity: &mut Vector,
    extent: Vector,
    bounce: Real,
    stats: &mut TickStats,
) {
    if reflect_axis(&mut position.x, &mut velocity.x, extent.x, bounce) {
        stats.reflections += 1;
    }
    if reflect_axis(&mut position.y, &mut velocity.y, extent.y, bounce) {
        stats.reflections += 1;
    }
}

#[inline]
pub fn step_particle(particle: &mut Particle, force: Vector, step: &StepConstants, stats: &mut TickStats) {
    let mut velocity = particle.velocity * step.damping;
    velocity += step.gravity_step;
    velocity += force;
    apply_speed_cap(&mut velocity, step.soft_cap, step.hard_cap, stats);

    let mut position = particle.position + velocity * step.dt;
    reflect_boundary(&mut position, &mut velocity, step.extent, step.bounce, stats);

    particle.position = position;
    particle.velocity = velocity;
}

/// Advance every particle, split into `workers` contiguous slices.
pub fn integrate(
    particles: &mut [Particle],
    forces: &[Vector],
    step: &StepConstants,
    workers: usize,
) -> TickStats {
    assert_eq!(particles.len(), forces.len(), "one force per particle");

    let len = slice_len(particles.len(), workers);
    particles
        .par_chunks_mut(len)
        .zip(forces.par_chunks(len))
        .map(|(chunk, chunk_forces)| {
            let mut stats = TickStats::default();
            for (particle, &force) in chunk.iter_mut().zip(chunk_forces) {
                step_particle(particle, force, step, &mut stats);
            }
            stats
        })
        .reduce(TickStats::default, |a, b| a + b)
}
