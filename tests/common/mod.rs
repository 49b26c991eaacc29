//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `shot_patterns::game::configure_headless` to install gameplay plugins.
//! - every `app.update()` advances time by exactly [`FRAME`].

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use shot_patterns::common::tunables::Tunables;

pub const FRAME: Duration = Duration::from_micros(16_667);

pub fn app_headless() -> App {
    app_headless_with(Tunables::default())
}

pub fn app_headless_with(tunables: Tunables) -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app.insert_resource(tunables);

    shot_patterns::game::configure_headless(&mut app);
    // Run plugin `finish`/`cleanup` hooks, as `App::run` would.
    app.finish();
    app.cleanup();
    app
}

/// Run `frames` updates.
pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}
