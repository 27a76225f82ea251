//! Particle → cell transitions
//!
//! Three stages per tick:
//!
//! * scan: find particles whose position left the bounds of their cell
//! * aggregate: fold those crossings into one [`CellDelta`] per cell
//! * apply: commit every delta to the grid, the particles and the membership index
//!
//! The scan is read-only and runs over contiguous particle slices in parallel.
//! Per-slice [`DeltaMap`]s are merged with [`DeltaMap::combine`], which is
//! associative and commutative, so the result does not depend on how the
//! particles were sliced.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::core::{CellId, Membership, Particle, ParticleId, SpatialGrid, slice_len};
use crate::math::{Real, Vector};

/// One particle crossing from `from` (unset on first placement) into `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub particle: ParticleId,
    pub from: Option<CellId>,
    pub to: CellId,
}

/// Net change to one cell for one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellDelta {
    pub added: BTreeSet<ParticleId>,
    pub removed: BTreeSet<ParticleId>,
    /// `|added| - |removed|`
    pub density: i64,
}

impl CellDelta {
    pub fn combine(&mut self, other: CellDelta) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);
        self.density += other.density;
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.density == 0
    }
}

/// Per-cell deltas, keyed by cell id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeltaMap {
    cells: BTreeMap<CellId, CellDelta>,
}

impl DeltaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transitions<I>(transitions: I) -> Self
    where
        I: IntoIterator<Item = Transition>,
    {
        let mut map = Self::new();
        for transition in transitions {
            map.record(transition);
        }
        map
    }

    pub fn record(&mut self, transition: Transition) {
        if let Some(from) = transition.from {
            let delta = self.cells.entry(from).or_default();
            delta.removed.insert(transition.particle);
            delta.density -= 1;
        }
        let delta = self.cells.entry(transition.to).or_default();
        delta.added.insert(transition.particle);
        delta.density += 1;
    }

    /// Merge two maps: union of the particle sets, sum of the densities.
    pub fn combine(mut self, other: DeltaMap) -> DeltaMap {
        if self.cells.len() < other.cells.len() {
            return other.combine(self);
        }
        for (cell, delta) in other.cells {
            self.cells.entry(cell).or_default().combine(delta);
        }
        self
    }

    pub fn get(&self, cell: CellId) -> Option<&CellDelta> {
        self.cells.get(&cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellId, &CellDelta)> {
        self.cells.iter().map(|(&cell, delta)| (cell, delta))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of particles that changed cell. Each crossing adds to exactly one cell.
    pub fn transition_count(&self) -> usize {
        self.cells.values().map(|delta| delta.added.len()).sum()
    }

    pub fn net_density(&self) -> i64 {
        self.cells.values().map(|delta| delta.density).sum()
    }
}

impl IntoIterator for DeltaMap {
    type Item = (CellId, CellDelta);
    type IntoIter = std::collections::btree_map::IntoIter<CellId, CellDelta>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

/// Crossing for one particle, if its position left its recorded cell.
///
/// # Panics
///
/// If the position maps outside the grid. Integration clamps positions into
/// the box, so this only fires on a broken integrator.
#[inline]
pub fn detect_transition(grid: &SpatialGrid, id: ParticleId, particle: &Particle) -> Option<Transition> {
    debug_assert!(particle.is_finite(), "particle {id} has a non-finite state");

    if let Some(cell) = particle.cell {
        if grid.contains(cell, particle.position) {
            return None;
        }
    }

    let Some(to) = grid.id_from_position(particle.position) else {
        panic!(
            "particle {id} at {} maps to {} outside the {} grid",
            particle.position,
            grid.coord_from_position(particle.position),
            grid.dimensions()
        );
    };

    Some(Transition {
        particle: id,
        from: particle.cell,
        to,
    })
}

/// Scan one contiguous slice whose first particle has id `first_id`.
pub fn scan_slice(grid: &SpatialGrid, first_id: ParticleId, particles: &[Particle]) -> Vec<Transition> {
    particles
        .iter()
        .enumerate()
        .filter_map(|(offset, particle)| detect_transition(grid, first_id + offset, particle))
        .collect()
}

/// Scan every particle over `workers` contiguous slices and aggregate.
pub fn scan(grid: &SpatialGrid, particles: &[Particle], workers: usize) -> DeltaMap {
    let len = slice_len(particles.len(), workers);
    particles
        .par_chunks(len)
        .enumerate()
        .map(|(slice, chunk)| DeltaMap::from_transitions(scan_slice(grid, slice * len, chunk)))
        .reduce(DeltaMap::new, DeltaMap::combine)
}

/// Commit `deltas` to the grid, the particles and the membership index.
///
/// Each entering particle hands `momentum_transfer` of its velocity to the
/// cell; the amount leaving the particle is exactly the amount the cell
/// gains. A cell left without residents drops its stored momentum. Returns
/// the number of particles that changed cell.
pub fn apply(
    deltas: DeltaMap,
    grid: &mut SpatialGrid,
    particles: &mut [Particle],
    membership: &mut Membership,
    momentum_transfer: Real,
) -> usize {
    let mut moved = 0;

    for (cell_id, delta) in deltas {
        let Some(cell) = grid.cell_mut(cell_id) else {
            panic!("transition delta targets unknown cell {cell_id}");
        };
        cell.density += delta.density as Real;

        for &particle_id in &delta.added {
            let particle = &mut particles[particle_id];
            particle.cell = Some(cell_id);

            let transfer: Vector = particle.velocity * momentum_transfer;
            particle.velocity -= transfer;
            cell.momentum += transfer;
        }
        moved += delta.added.len();

        if membership.update(cell_id, delta.removed, delta.added) {
            cell.momentum = Vector::ZERO;
        }
    }

    moved
}
