use bevy::log::{debug, info, warn};
use bevy::prelude::*;

use crate::config::{SimParams, TickFlags};
use crate::core::{
    CellId, CellView, Membership, NeighborTopology, Particle, ParticleId, ParticleSet, Residents,
    SpatialGrid, TickStats,
};
use crate::error::SimError;
use crate::math::{Real, Vector};
use crate::solver::integrator::StepConstants;
use crate::solver::{DiffusionSolver, distribute_momentum, integrate, local_forces, transition};

/// Aggregate simulation state: grid, particles and the membership index that ties them.
///
/// Ticks are driven by the caller and run to completion. External cell writes
/// (`mutate_*`, `paint_density`, `push_momentum`) must happen between ticks.
#[derive(Resource, Clone, Debug)]
pub struct FluidState {
    params: SimParams,
    grid: SpatialGrid,
    topology: NeighborTopology,
    diffusion: DiffusionSolver,
    particles: ParticleSet,
    membership: Membership,
    totals: TickStats,
    tick_count: u64,
}

impl FluidState {
    /// Validate `params`, build the grid and place the initial lattice.
    pub fn initialize(params: SimParams) -> Result<Self, SimError> {
        params.validate()?;

        let grid = SpatialGrid::from_params(&params)?;
        let topology = NeighborTopology::new(params.neighbor_table_radius, grid.max_coord());
        let diffusion = DiffusionSolver::new(
            &topology,
            params.diffusion_radius,
            &params.decay,
            params.diffusion_strength,
        )?;

        let mut state = Self {
            particles: ParticleSet::new(),
            membership: Membership::new(),
            totals: TickStats::default(),
            tick_count: 0,
            params,
            grid,
            topology,
            diffusion,
        };
        state.reset();

        info!(
            "fluid grid {} cells at resolution {}, {} particles in {} cells",
            state.grid.dimensions(),
            state.grid.resolution(),
            state.particles.len(),
            state.membership.occupied_count()
        );
        Ok(state)
    }

    /// Rebuild the particle lattice and clear every cell.
    pub fn reset(&mut self) {
        self.grid.zero_all();
        self.membership.clear();
        self.particles = ParticleSet::from_lattice(&self.params);
        self.totals = TickStats::default();
        self.tick_count = 0;
        self.process_transitions();
        info!("fluid reset: {} particles", self.particles.len());
    }

    /// Advance one step: integrate, transitions, diffusion, momentum.
    pub fn tick(&mut self, dt: Real, flags: TickFlags) -> TickStats {
        let mut stats = self.integrate_particles(dt, flags);
        stats.transitions = self.process_transitions() as u64;
        self.update_diffusion();
        self.distribute_momentum(dt);

        debug_assert_eq!(self.membership.particle_count(), self.particles.len());

        self.tick_count += 1;
        self.totals += stats;

        debug!(
            "tick {}: {} transitions, {} soft / {} hard caps, {} overlaps, {} reflections",
            self.tick_count,
            stats.transitions,
            stats.soft_caps,
            stats.hard_caps,
            stats.overlaps,
            stats.reflections
        );
        if !stats.is_quiet() {
            warn!(
                "tick {}: {} hard speed caps, {} exact overlaps",
                self.tick_count, stats.hard_caps, stats.overlaps
            );
        }
        stats
    }

    pub fn integrate_particles(&mut self, dt: Real, flags: TickFlags) -> TickStats {
        let mut stats = TickStats::default();
        let forces = local_forces(
            &self.grid,
            self.particles.particles(),
            &self.membership,
            &self.params,
            dt,
            &mut stats,
        );
        let step = StepConstants::new(&self.params, dt, flags);
        stats + integrate(
            self.particles.particles_mut(),
            &forces,
            &step,
            self.params.worker_count,
        )
    }

    /// Scan, aggregate and apply cell crossings. Returns how many particles moved.
    pub fn process_transitions(&mut self) -> usize {
        let deltas = transition::scan(&self.grid, self.particles.particles(), self.params.worker_count);
        transition::apply(
            deltas,
            &mut self.grid,
            self.particles.particles_mut(),
            &mut self.membership,
            self.params.momentum_transfer,
        )
    }

    /// Recompute the diffusion vector of every occupied cell.
    pub fn update_diffusion(&mut self) {
        self.diffusion.solve(&mut self.grid, self.membership.occupied());
    }

    pub fn distribute_momentum(&mut self, dt: Real) {
        distribute_momentum(
            &mut self.grid,
            self.particles.particles_mut(),
            &self.membership,
            self.params.momentum_distribution,
            dt,
        );
    }

    pub fn cell_at(&self, ix: i32, iy: i32) -> Option<CellView> {
        self.grid.cell_at(IVec2::new(ix, iy)).map(|cell| cell.view())
    }

    pub fn cell_id_at(&self, ix: i32, iy: i32) -> Option<CellId> {
        self.grid.id_at(IVec2::new(ix, iy))
    }

    pub fn cell(&self, cell: CellId) -> Option<CellView> {
        self.grid.cell(cell).map(|cell| cell.view())
    }

    /// Every in-grid cell within Chebyshev `radius` of `cell`, excluding it.
    pub fn neighbors(&self, cell: CellId, radius: usize) -> Result<Vec<CellView>, SimError> {
        let coord = self.grid.coord_of(cell).ok_or(SimError::UnknownCell(cell))?;
        Ok(self
            .topology
            .all_rings_at(radius, coord)?
            .into_iter()
            .filter_map(|coord| self.grid.cell_at(coord).map(|cell| cell.view()))
            .collect())
    }

    pub fn mutate_cell_density(&mut self, cell: CellId, delta: Real) -> Result<(), SimError> {
        let cell = self.grid.cell_mut(cell).ok_or(SimError::UnknownCell(cell))?;
        cell.density += delta;
        Ok(())
    }

    pub fn mutate_cell_momentum(&mut self, cell: CellId, delta: Vector) -> Result<(), SimError> {
        let cell = self.grid.cell_mut(cell).ok_or(SimError::UnknownCell(cell))?;
        cell.momentum += delta;
        Ok(())
    }

    /// Add `amount` to the density of `center` and every cell within `radius`.
    /// Returns the number of cells touched.
    pub fn paint_density(&mut self, center: CellId, radius: usize, amount: Real) -> Result<usize, SimError> {
        let cells = self.brush(center, radius)?;
        for &id in &cells {
            self.mutate_cell_density(id, amount)?;
        }
        Ok(cells.len())
    }

    /// Add `impulse` to the momentum of `center` and every cell within `radius`.
    pub fn push_momentum(&mut self, center: CellId, radius: usize, impulse: Vector) -> Result<usize, SimError> {
        let cells = self.brush(center, radius)?;
        for &id in &cells {
            self.mutate_cell_momentum(id, impulse)?;
        }
        Ok(cells.len())
    }

    fn brush(&self, center: CellId, radius: usize) -> Result<Vec<CellId>, SimError> {
        let coord = self.grid.coord_of(center).ok_or(SimError::UnknownCell(center))?;
        let mut cells = vec![center];
        cells.extend(
            self.topology
                .all_rings_at(radius, coord)?
                .into_iter()
                .filter_map(|coord| self.grid.id_at(coord)),
        );
        Ok(cells)
    }

    pub fn particle_snapshot(&self) -> Vec<(Vector, Vector)> {
        self.particles.snapshot()
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    /// Direct particle access for collaborators and tests. Call between ticks.
    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.particles()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn residents(&self, cell: CellId) -> Option<&Residents> {
        self.membership.residents(cell)
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.membership.occupied_count()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn topology(&self) -> &NeighborTopology {
        &self.topology
    }

    pub fn diffusion_solver(&self) -> &DiffusionSolver {
        &self.diffusion
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Counters summed over every tick since the last reset.
    pub fn stats(&self) -> TickStats {
        self.totals
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn total_density(&self) -> Real {
        self.grid.total_density()
    }

    pub fn total_cell_momentum(&self) -> Vector {
        self.grid.total_momentum()
    }

    pub fn total_particle_momentum(&self) -> Vector {
        self.particles.total_momentum()
    }

    pub fn max_particle_speed(&self) -> Real {
        self.particles.max_speed()
    }

    /// Check that particles, cells and the membership index agree.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (id, particle) in self.particles.iter().enumerate() {
            let Some(cell) = particle.cell else {
                return Err(format!("particle {id} has no cell"));
            };
            if !self.grid.contains(cell, particle.position) {
                return Err(format!(
                    "particle {id} at {} is not inside its cell {cell}",
                    particle.position
                ));
            }
            if !self.membership.contains(cell, id) {
                return Err(format!("particle {id} missing from residents of cell {cell}"));
            }
        }

        let listed = self.membership.particle_count();
        if listed != self.particles.len() {
            return Err(format!(
                "membership lists {listed} particles, {} exist",
                self.particles.len()
            ));
        }
        for (cell, residents) in self.membership.iter() {
            if residents.is_empty() {
                return Err(format!("cell {cell} has an empty resident set"));
            }
        }
        Ok(())
    }
}
