//! End-to-end tests over `FluidState::tick`
//!
//! Exercise the full phase order against small boxes and check the
//! bookkeeping between particles, cells and the membership index.

use bevy::prelude::{UVec2, Vec2};
use cellfluid2d::{FluidState, SimError, SimParams, TickFlags};

const DT: f32 = 1.0 / 60.0;

fn state(cells: u32, lattice: u32) -> FluidState {
    let mut params = SimParams::square(cells, 1.0, UVec2::splat(lattice)).with_seed(7);
    params.lattice_jitter = 0.1;
    FluidState::initialize(params).unwrap()
}

/// Every particle stays listed in exactly one cell across many ticks
#[test]
fn membership_tracks_every_particle() {
    let mut state = state(24, 16);
    let count = state.particle_count();

    for tick in 0..240 {
        let flags = TickFlags {
            gravity: tick < 120,
            x_gravity: tick >= 120,
        };
        state.tick(DT, flags);

        assert_eq!(state.membership().particle_count(), count);
        assert_eq!(state.total_density(), count as f32, "tick {tick}");
        if let Err(err) = state.check_invariants() {
            panic!("tick {tick}: {err}");
        }
    }
    assert_eq!(state.tick_count(), 240);
}

/// Particles stay inside the reflective box and keep finite state
#[test]
fn particles_stay_in_the_box() {
    let mut state = state(12, 10);
    let extent = state.params().reflect_extent();
    for _ in 0..300 {
        state.tick(DT, TickFlags::with_gravity());
    }
    for (position, velocity) in state.particle_snapshot() {
        assert!(position.is_finite() && velocity.is_finite());
        assert!(position.x >= 0.0 && position.x <= extent.x);
        assert!(position.y >= 0.0 && position.y <= extent.y);
    }
    assert!(state.stats().reflections > 0, "gravity should drive particles into the floor");
}

/// A particle crossing a cell edge is re-homed in the same tick
#[test]
fn crossing_particle_changes_cell_within_one_tick() {
    let mut state = FluidState::initialize(SimParams::square(10, 1.0, UVec2::ONE)).unwrap();
    let old = state.cell_id_at(4, 4).unwrap();
    let new = state.cell_id_at(5, 4).unwrap();
    assert_eq!(state.particle(0).unwrap().cell, Some(old));

    {
        let particle = state.particle_mut(0).unwrap();
        particle.position = Vec2::new(4.95, 4.5);
        particle.velocity = Vec2::new(6.0, 0.0);
    }
    let stats = state.tick(DT, TickFlags::default());

    assert_eq!(stats.transitions, 1);
    assert_eq!(state.particle(0).unwrap().cell, Some(new));
    assert!(state.residents(old).is_none_or(|residents| !residents.contains(&0)));
    assert!(state.residents(new).unwrap().contains(&0));
    assert_eq!(state.cell(old).unwrap().density, 0.0);
    assert_eq!(state.cell(new).unwrap().density, 1.0);
    assert_eq!(state.cell(old).unwrap().momentum, Vec2::ZERO);
}

/// Two particles on the same point push apart without producing NaNs
#[test]
fn exact_overlap_is_recovered() {
    let params = SimParams::square(10, 1.0, UVec2::new(2, 1));
    let mut state = FluidState::initialize(params).unwrap();
    let shared = state.particle(0).unwrap().position;
    {
        let particle = state.particle_mut(1).unwrap();
        particle.position = shared;
    }
    // Re-home particle 1 onto particle 0's cell before the pair is evaluated.
    state.process_transitions();
    state.particle_mut(0).unwrap().velocity = Vec2::new(1.0, 0.5);
    state.particle_mut(1).unwrap().velocity = Vec2::new(-0.5, 1.0);

    let stats = state.tick(DT, TickFlags::default());

    assert!(stats.overlaps >= 1);
    for (position, velocity) in state.particle_snapshot() {
        assert!(position.is_finite() && velocity.is_finite());
    }
    assert_eq!(state.check_invariants(), Ok(()));
}

/// Entering a cell moves momentum from the particle into the cell
#[test]
fn entering_a_cell_stores_momentum() {
    let mut state = FluidState::initialize(SimParams::square(10, 1.0, UVec2::ONE)).unwrap();
    state.particle_mut(0).unwrap().position = Vec2::new(4.5, 4.5);
    state.particle_mut(0).unwrap().velocity = Vec2::new(0.0, -3.0);
    state.process_transitions();

    let before = state.particle(0).unwrap().velocity;
    state.particle_mut(0).unwrap().position = Vec2::new(4.5, 3.5);
    let moved = state.process_transitions();

    let transfer = before * state.params().momentum_transfer;
    let cell = state.cell_id_at(4, 3).unwrap();
    assert_eq!(moved, 1);
    assert_eq!(state.particle(0).unwrap().velocity, before - transfer);
    assert_eq!(state.cell(cell).unwrap().momentum, transfer);
}

/// Painted density drives a diffusion force on the occupied cells around it
#[test]
fn painted_density_pushes_neighbours() {
    let mut state = state(16, 8);
    let center = state.cell_id_at(8, 8).unwrap();
    state.paint_density(center, 0, 50.0).unwrap();
    state.update_diffusion();

    let right = state.cell_id_at(9, 8).unwrap();
    let diffusion = state.grid().cell(right).unwrap().diffusion;
    assert!(
        state.membership().is_occupied(right),
        "lattice should cover the painted area"
    );
    assert!(diffusion.x < 0.0, "force should point back at the dense cell: {diffusion}");
}

#[test]
fn external_writes_reject_unknown_cells() {
    let mut state = state(8, 4);
    let missing = state.grid().len();
    assert_eq!(state.mutate_cell_density(missing, 1.0), Err(SimError::UnknownCell(missing)));
    assert_eq!(
        state.mutate_cell_momentum(missing, Vec2::ONE),
        Err(SimError::UnknownCell(missing))
    );
    assert!(state.cell_at(-1, 0).is_none());
    assert!(state.cell_at(0, 8).is_none());
}

#[test]
fn malformed_decay_table_is_rejected() {
    let params = SimParams::default().with_decay(vec![1.0]);
    assert!(matches!(FluidState::initialize(params), Err(SimError::DecayTable(_))));

    let params = SimParams::default().with_decay(vec![1.0, 0.5, 0.75]);
    assert!(matches!(FluidState::initialize(params), Err(SimError::DecayTable(_))));
}

#[test]
fn lattice_outside_the_box_is_rejected() {
    let params = SimParams::square(4, 1.0, UVec2::splat(2)).with_lattice(
        UVec2::splat(2),
        Vec2::new(3.5, 3.5),
        1.0,
    );
    assert!(matches!(
        FluidState::initialize(params),
        Err(SimError::LatticeOutsideBox { .. })
    ));
}

/// Resolutions that do not divide evenly in binary keep cells and positions in agreement
#[test]
fn invariants_hold_at_uneven_resolutions() {
    for (cells, resolution) in [(40, 0.1), (30, 0.3), (20, 0.7), (12, 1.1)] {
        let mut params = SimParams::square(cells, resolution, UVec2::splat(10)).with_seed(3);
        params.lattice_jitter = resolution * 0.2;
        let mut state = FluidState::initialize(params).unwrap();
        let count = state.particle_count();

        for tick in 0..120 {
            let flags = TickFlags {
                gravity: true,
                x_gravity: tick % 40 < 20,
            };
            state.tick(DT, flags);
            if let Err(err) = state.check_invariants() {
                panic!("resolution {resolution}, tick {tick}: {err}");
            }
        }
        assert_eq!(state.total_density(), count as f32);
    }
}

/// A box that is not a whole number of cells gets a correction cell per axis
#[test]
fn correction_cell_box_runs_cleanly() {
    let params = SimParams {
        box_size: Vec2::splat(10.0),
        resolution: 3.0,
        ..SimParams::default()
    }
    .with_lattice(UVec2::splat(6), Vec2::splat(2.0), 0.75)
    .with_seed(9);
    let mut state = FluidState::initialize(params).unwrap();
    assert_eq!(state.grid().dimensions(), UVec2::new(4, 4));

    for tick in 0..200 {
        state.tick(DT, TickFlags::with_gravity());
        if let Err(err) = state.check_invariants() {
            panic!("tick {tick}: {err}");
        }
    }
}

/// A tiny particle radius still reflects inside the last cell
#[test]
fn small_radius_reflects_inside_the_grid() {
    let mut params = SimParams::square(32, 2.0, UVec2::splat(4));
    params.particle_radius = 1e-6;
    assert!(matches!(
        FluidState::initialize(params.clone()),
        Err(SimError::InvalidParameter { name: "particle_radius", .. })
    ));

    params.particle_radius = 1e-3;
    let mut state = FluidState::initialize(params).unwrap();
    {
        let particle = state.particle_mut(0).unwrap();
        particle.position = Vec2::new(63.9, 30.5);
        particle.velocity = Vec2::new(30.0, 0.0);
    }
    state.tick(DT, TickFlags::default());

    let particle = state.particle(0).unwrap();
    assert!(particle.position.x < 64.0);
    assert_eq!(particle.cell, state.cell_id_at(31, 15));
    assert_eq!(state.check_invariants(), Ok(()));
}
