// Default simulation constants
use bevy::prelude::*;

// Domain
pub const DEFAULT_BOX_SIZE: Vec2 = Vec2::new(64.0, 64.0);
pub const DEFAULT_RESOLUTION: f32 = 2.0;
pub const DEFAULT_PARTICLE_RADIUS: f32 = 0.05;

// Initial lattice
pub const DEFAULT_LATTICE: UVec2 = UVec2::new(40, 40);
pub const DEFAULT_LATTICE_ORIGIN: Vec2 = Vec2::new(12.0, 12.0);
pub const DEFAULT_LATTICE_SPACING: f32 = 0.5;

// Global forces, per second
pub const GRAVITY: f32 = 9.8;
pub const X_GRAVITY: f32 = 4.0;

// Grid coupling
pub const DIFFUSION_RADIUS: usize = 2;
pub const NEIGHBOR_TABLE_RADIUS: usize = 8;
pub const MOMENTUM_TRANSFER: f32 = 0.3;
pub const MOMENTUM_DISTRIBUTION: f32 = 0.5;
pub const DIFFUSION_STRENGTH: f32 = 0.02;

// Particle response
pub const VISCOSITY: f32 = 0.01;
pub const BOUNCE_DAMPENING: f32 = 0.3;
pub const SOFT_SPEED_CAP: f32 = 40.0;
pub const HARD_SPEED_CAP: f32 = 80.0;
pub const REPULSION_STRENGTH: f32 = 0.05;

/// Timestep the repulsion strength is tuned against.
pub const REFERENCE_DT: f32 = 1.0 / 60.0;

pub const WORKER_COUNT: usize = 4;
