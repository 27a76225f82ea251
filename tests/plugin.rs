//! Headless app tests for `FluidGridPlugin`

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use cellfluid2d::{FluidGridPlugin, FluidState, SimParams, TickFlags};

fn app(params: SimParams) -> App {
    let step = Duration::from_secs_f32(1.0 / 60.0);
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(FluidGridPlugin {
            params,
            timestep: step,
        })
        .insert_resource(TimeUpdateStrategy::ManualDuration(step));
    app.finish();
    app.cleanup();
    app
}

#[test]
fn plugin_ticks_on_the_fixed_schedule() {
    let mut app = app(SimParams::square(16, 1.0, UVec2::splat(6)));
    *app.world_mut().resource_mut::<TickFlags>() = TickFlags::with_gravity();

    for _ in 0..20 {
        app.update();
    }

    let state = app.world().resource::<FluidState>();
    assert!(state.tick_count() > 0);
    assert_eq!(state.check_invariants(), Ok(()));
}

#[test]
fn invalid_params_leave_no_state() {
    let params = SimParams {
        resolution: -1.0,
        ..SimParams::default()
    };
    let mut app = app(params);
    app.update();
    app.update();
    assert!(app.world().get_resource::<FluidState>().is_none());
}
