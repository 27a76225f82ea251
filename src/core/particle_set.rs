use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimParams;
use crate::core::Particle;
use crate::core::particle::ParticleId;
use crate::math::{Real, Vector, repeat_vector};
use bevy::prelude::Vec2;

/// Fixed particle population, addressed by dense `ParticleId`.
#[derive(Clone, Debug, Default)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    /// One particle per lattice point, optionally jittered, all at rest and
    /// not yet placed in any cell.
    pub fn from_lattice(params: &SimParams) -> Self {
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let dims = params.lattice_dimensions;
        let jitter = params.lattice_jitter;
        let extent = params.reflect_extent();
        let mut particles = Vec::with_capacity(params.particle_count());

        for j in 0..dims.y {
            for i in 0..dims.x {
                let mut position = params.lattice_position(i, j);
                if jitter > 0.0 {
                    position += Vec2::new(
                        rng.random_range(-jitter..=jitter),
                        rng.random_range(-jitter..=jitter),
                    );
                    position = position.clamp(repeat_vector(0.0), extent);
                }
                particles.push(Particle::new(position));
            }
        }

        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn snapshot(&self) -> Vec<(Vector, Vector)> {
        self.particles
            .iter()
            .map(|particle| (particle.position, particle.velocity))
            .collect()
    }

    pub fn total_momentum(&self) -> Vector {
        self.particles.iter().map(|particle| particle.velocity).sum()
    }

    pub fn max_speed(&self) -> Real {
        self.particles
            .iter()
            .map(|particle| particle.velocity.length())
            .fold(0.0, Real::max)
    }
}

/// Length of each contiguous slice when `len` items are split across
/// `workers`. Never zero.
pub fn slice_len(len: usize, workers: usize) -> usize {
    len.div_ceil(workers.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::UVec2;

    #[test]
    fn lattice_places_one_particle_per_point() {
        let params = SimParams::default().with_lattice(UVec2::new(3, 2), Vec2::new(1.0, 2.0), 0.5);
        let set = ParticleSet::from_lattice(&params);
        assert_eq!(set.len(), 6);
        assert_eq!(set.get(0).unwrap().position, Vec2::new(1.0, 2.0));
        assert_eq!(set.get(5).unwrap().position, Vec2::new(2.0, 2.5));
        assert!(set.iter().all(|p| p.cell.is_none() && p.velocity == Vec2::ZERO));
    }

    #[test]
    fn seeded_jitter_is_reproducible_and_stays_in_box() {
        let mut params = SimParams::default()
            .with_lattice(UVec2::new(8, 8), Vec2::new(0.0, 0.0), 0.25)
            .with_seed(7);
        params.lattice_jitter = 0.2;
        let a = ParticleSet::from_lattice(&params);
        let b = ParticleSet::from_lattice(&params);
        assert_eq!(a.snapshot(), b.snapshot());
        assert!(a.iter().all(|p| p.position.x >= 0.0 && p.position.y >= 0.0));
    }

    #[test]
    fn slices_cover_everything() {
        assert_eq!(slice_len(10, 3), 4);
        assert_eq!(slice_len(0, 4), 1);
        assert_eq!(slice_len(5, 0), 5);
    }
}
