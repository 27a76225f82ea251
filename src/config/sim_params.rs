use bevy::prelude::*;

use crate::error::SimError;
use crate::math::{Real, Vector, cell_coord};

use super::constants::*;

/// Per-tick switches supplied by the caller alongside `dt`.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickFlags {
    pub gravity: bool,
    pub x_gravity: bool,
}

impl TickFlags {
    pub fn with_gravity() -> Self {
        Self {
            gravity: true,
            x_gravity: false,
        }
    }
}

/// Scalar parameters controlling the grid-coupled fluid.
#[derive(Resource, Clone, Debug)]
pub struct SimParams {
    /// Extent of the reflective box. The grid covers `[0, box_size]`.
    pub box_size: Vector,

    /// Edge length of one grid cell
    pub resolution: Real,

    /// Collision radius used by boundary reflection
    pub particle_radius: Real,

    /// Number of particles along each axis of the initial lattice
    pub lattice_dimensions: UVec2,
    pub lattice_origin: Vector,
    pub lattice_spacing: Real,
    /// Maximum random offset applied to each lattice point on reset (0 = none)
    pub lattice_jitter: Real,
    /// Seed for the jitter; `None` draws from the thread RNG
    pub seed: Option<u64>,

    /// Radius (in rings) the diffusion force looks at
    pub diffusion_radius: usize,

    /// Weight per ring distance, indexed `0..=diffusion_radius`
    pub decay: Vec<Real>,

    /// Scale applied to the summed diffusion vector
    pub diffusion_strength: Real,

    /// Largest ring the neighbor tables are built for
    pub neighbor_table_radius: usize,

    /// Fraction of velocity a particle hands to the cell it enters (0 < f < 1)
    pub momentum_transfer: Real,

    /// Fraction per second of stored cell momentum handed back to residents (0 < g < 1)
    pub momentum_distribution: Real,

    /// Multiplicative velocity damping per tick
    pub viscosity: Real,

    pub gravity: Real,
    pub x_gravity: Real,

    /// 0 reverses the velocity unchanged, 1 absorbs it
    pub bounce_dampening: Real,

    pub soft_speed_cap: Real,
    pub hard_speed_cap: Real,

    /// Strength of intra-cell repulsion at `reference_dt`
    pub repulsion_strength: Real,
    pub reference_dt: Real,

    /// Number of contiguous particle slices processed in parallel
    pub worker_count: usize,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            box_size: DEFAULT_BOX_SIZE,
            resolution: DEFAULT_RESOLUTION,
            particle_radius: DEFAULT_PARTICLE_RADIUS,
            lattice_dimensions: DEFAULT_LATTICE,
            lattice_origin: DEFAULT_LATTICE_ORIGIN,
            lattice_spacing: DEFAULT_LATTICE_SPACING,
            lattice_jitter: 0.0,
            seed: None,
            diffusion_radius: DIFFUSION_RADIUS,
            decay: halving_decay(DIFFUSION_RADIUS),
            diffusion_strength: DIFFUSION_STRENGTH,
            neighbor_table_radius: NEIGHBOR_TABLE_RADIUS,
            momentum_transfer: MOMENTUM_TRANSFER,
            momentum_distribution: MOMENTUM_DISTRIBUTION,
            viscosity: VISCOSITY,
            gravity: GRAVITY,
            x_gravity: X_GRAVITY,
            bounce_dampening: BOUNCE_DAMPENING,
            soft_speed_cap: SOFT_SPEED_CAP,
            hard_speed_cap: HARD_SPEED_CAP,
            repulsion_strength: REPULSION_STRENGTH,
            reference_dt: REFERENCE_DT,
            worker_count: WORKER_COUNT,
        }
    }
}

/// Decay table where each ring weighs half of the previous one.
pub fn halving_decay(radius: usize) -> Vec<Real> {
    (0..=radius).map(|d| 0.5f32.powi(d as i32)).collect()
}

impl SimParams {
    /// Square box of `cells * resolution` with a `lattice` particle block in the middle.
    pub fn square(cells: u32, resolution: Real, lattice: UVec2) -> Self {
        let extent = cells as Real * resolution;
        let spacing = resolution * 0.5;
        let block = lattice.as_vec2() * spacing;
        Self {
            box_size: Vec2::splat(extent),
            resolution,
            lattice_dimensions: lattice,
            lattice_spacing: spacing,
            lattice_origin: ((Vec2::splat(extent) - block) * 0.5).max(Vec2::splat(resolution * 0.25)),
            ..Self::default()
        }
    }

    /// Thick, slow fluid: heavy damping and strong momentum coupling.
    pub fn viscous() -> Self {
        Self {
            viscosity: 0.08,
            momentum_transfer: 0.6,
            bounce_dampening: 0.7,
            ..Self::default()
        }
    }

    /// Lively fluid: little damping, wide diffusion.
    pub fn splashy() -> Self {
        Self {
            viscosity: 0.002,
            bounce_dampening: 0.1,
            ..Self::default().with_diffusion_radius(4)
        }
    }

    pub fn with_lattice(mut self, dimensions: UVec2, origin: Vector, spacing: Real) -> Self {
        self.lattice_dimensions = dimensions;
        self.lattice_origin = origin;
        self.lattice_spacing = spacing;
        self
    }

    /// Set the diffusion radius and regenerate the default halving decay table.
    pub fn with_diffusion_radius(mut self, radius: usize) -> Self {
        self.diffusion_radius = radius;
        self.decay = halving_decay(radius);
        self.neighbor_table_radius = self.neighbor_table_radius.max(radius);
        self
    }

    pub fn with_decay(mut self, decay: Vec<Real>) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_momentum_transfer(mut self, fraction: Real) -> Self {
        self.momentum_transfer = fraction.clamp(Real::EPSILON, 1.0 - Real::EPSILON);
        self
    }

    pub fn with_momentum_distribution(mut self, fraction: Real) -> Self {
        self.momentum_distribution = fraction.clamp(Real::EPSILON, 1.0 - Real::EPSILON);
        self
    }

    pub fn with_viscosity(mut self, viscosity: Real) -> Self {
        self.viscosity = viscosity.clamp(0.0, 1.0 - Real::EPSILON);
        self
    }

    pub fn with_bounce_dampening(mut self, dampening: Real) -> Self {
        self.bounce_dampening = dampening.clamp(0.0, 1.0);
        self
    }

    /// Set both speed caps. The soft cap is kept positive and the hard cap is
    /// clamped into `(soft, 2 * soft]`.
    pub fn with_speed_caps(mut self, soft: Real, hard: Real) -> Self {
        let soft = soft.max(Real::EPSILON);
        // One ulp above `soft` at least.
        let floor = soft * (1.0 + Real::EPSILON);
        self.soft_speed_cap = soft;
        self.hard_speed_cap = hard.clamp(floor, soft * 2.0);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.worker_count = workers.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cells per axis: whole cells plus one correction cell for a remainder.
    pub fn grid_dimensions(&self) -> UVec2 {
        UVec2::new(
            axis_cells(self.box_size.x, self.resolution),
            axis_cells(self.box_size.y, self.resolution),
        )
    }

    pub fn particle_count(&self) -> usize {
        self.lattice_dimensions.x as usize * self.lattice_dimensions.y as usize
    }

    /// Unjittered position of lattice point `(i, j)`.
    pub fn lattice_position(&self, i: u32, j: u32) -> Vector {
        self.lattice_origin + Vec2::new(i as Real, j as Real) * self.lattice_spacing
    }

    /// Largest coordinate a particle centre may reach on each axis.
    pub fn reflect_extent(&self) -> Vector {
        self.box_size - Vec2::splat(self.particle_radius)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.resolution > 0.0 && self.resolution.is_finite()) {
            return Err(SimError::invalid("resolution", "must be positive and finite"));
        }
        if !(self.box_size.x > 0.0 && self.box_size.y > 0.0 && self.box_size.is_finite()) {
            return Err(SimError::invalid("box_size", "extents must be positive and finite"));
        }
        let dims = self.grid_dimensions();
        if dims.x == 0 || dims.y == 0 {
            return Err(SimError::EmptyGrid);
        }
        if !(self.particle_radius > 0.0 && self.particle_radius < self.box_size.min_element() * 0.5)
        {
            return Err(SimError::invalid(
                "particle_radius",
                "must be positive and below half the smallest box extent",
            ));
        }
        let far = cell_coord(self.reflect_extent(), self.resolution);
        if far.x >= dims.x as i32 || far.y >= dims.y as i32 {
            return Err(SimError::invalid(
                "particle_radius",
                format!(
                    "reflection extent {} maps to cell {far}, outside the {dims} grid",
                    self.reflect_extent()
                ),
            ));
        }
        unit_open("momentum_transfer", self.momentum_transfer)?;
        unit_open("momentum_distribution", self.momentum_distribution)?;
        if !(0.0..1.0).contains(&self.viscosity) {
            return Err(SimError::invalid("viscosity", "must be in [0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.bounce_dampening) {
            return Err(SimError::invalid("bounce_dampening", "must be in [0, 1]"));
        }
        if !(self.soft_speed_cap > 0.0
            && self.soft_speed_cap < self.hard_speed_cap
            && self.hard_speed_cap <= 2.0 * self.soft_speed_cap)
        {
            return Err(SimError::invalid(
                "hard_speed_cap",
                format!(
                    "caps must satisfy 0 < soft < hard <= 2 * soft (soft {}, hard {})",
                    self.soft_speed_cap, self.hard_speed_cap
                ),
            ));
        }
        if !self.gravity.is_finite() || !self.x_gravity.is_finite() {
            return Err(SimError::invalid("gravity", "must be finite"));
        }
        if !(self.repulsion_strength >= 0.0 && self.repulsion_strength.is_finite()) {
            return Err(SimError::invalid("repulsion_strength", "must be non-negative"));
        }
        if !(self.diffusion_strength >= 0.0 && self.diffusion_strength.is_finite()) {
            return Err(SimError::invalid("diffusion_strength", "must be non-negative"));
        }
        if !(self.reference_dt > 0.0) {
            return Err(SimError::invalid("reference_dt", "must be positive"));
        }
        if self.worker_count == 0 {
            return Err(SimError::invalid("worker_count", "need at least one worker"));
        }
        if self.diffusion_radius == 0 {
            return Err(SimError::invalid("diffusion_radius", "must be at least 1"));
        }
        if self.diffusion_radius > self.neighbor_table_radius {
            return Err(SimError::RadiusOutOfRange {
                requested: self.diffusion_radius,
                max: self.neighbor_table_radius,
            });
        }
        self.validate_decay()?;
        self.validate_lattice()
    }

    fn validate_decay(&self) -> Result<(), SimError> {
        if self.decay.len() <= self.diffusion_radius {
            return Err(SimError::DecayTable(format!(
                "need {} entries for radius {}, got {}",
                self.diffusion_radius + 1,
                self.diffusion_radius,
                self.decay.len()
            )));
        }
        if self.decay[0] != 1.0 {
            return Err(SimError::DecayTable(format!(
                "decay(0) must be 1.0, got {}",
                self.decay[0]
            )));
        }
        for (d, pair) in self.decay.windows(2).enumerate() {
            if !(pair[1].is_finite() && pair[1] >= 0.0) {
                return Err(SimError::DecayTable(format!("decay({}) is not a weight", d + 1)));
            }
            if pair[1] > pair[0] {
                return Err(SimError::DecayTable(format!(
                    "decay({}) = {} exceeds decay({}) = {}",
                    d + 1,
                    pair[1],
                    d,
                    pair[0]
                )));
            }
        }
        Ok(())
    }

    fn validate_lattice(&self) -> Result<(), SimError> {
        if !(self.lattice_spacing >= 0.0 && self.lattice_jitter >= 0.0) {
            return Err(SimError::invalid("lattice_spacing", "must be non-negative"));
        }
        let extent = self.reflect_extent();
        let dims = self.lattice_dimensions;
        for j in 0..dims.y {
            for i in 0..dims.x {
                let position = self.lattice_position(i, j);
                let inside = position.x >= 0.0
                    && position.y >= 0.0
                    && position.x <= extent.x
                    && position.y <= extent.y;
                if !inside {
                    return Err(SimError::LatticeOutsideBox {
                        index: (j * dims.x + i) as usize,
                        position,
                    });
                }
            }
        }
        Ok(())
    }
}

fn axis_cells(extent: Real, resolution: Real) -> u32 {
    if !(resolution > 0.0) || !(extent > 0.0) {
        return 0;
    }
    let exact = extent / resolution;
    let whole = exact.floor();
    let correction = if exact - whole > 1e-6 { 1 } else { 0 };
    whole as u32 + correction
}

fn unit_open(name: &'static str, value: Real) -> Result<(), SimError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SimError::invalid(name, format!("must be in (0, 1), got {value}")))
    }
}
