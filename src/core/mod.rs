pub mod diagnostics;
pub mod grid;
pub mod membership;
pub mod particle;
pub mod particle_set;
pub mod topology;

pub use diagnostics::TickStats;
pub use grid::{Cell, CellId, CellView, SpatialGrid};
pub use membership::{Membership, Residents};
pub use particle::{Particle, ParticleId};
pub use particle_set::{ParticleSet, slice_len};
pub use topology::{NeighborTopology, ring_offsets};
