//! Headless App Builder
//!
//! Builds a windowless Bevy app running `PenaltyPlugin` on a fixed schedule.
//! Used by the interactive host binary and plugin-level tests.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use std::time::Duration;

use crate::difficulty::Difficulty;
use crate::plugin::PenaltyPlugin;
use crate::tuning::PenaltyTuning;

/// Builder for creating headless Bevy apps
pub struct HeadlessAppBuilder {
    tuning: Option<PenaltyTuning>,
    difficulty: Difficulty,
    seed: Option<u64>,
    fps: f32,
    minimal_threads: bool,
    tick_every_frames: u64,
}

impl Default for HeadlessAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessAppBuilder {
    pub fn new() -> Self {
        Self {
            tuning: None,
            difficulty: Difficulty::default(),
            seed: None,
            fps: 60.0,
            minimal_threads: false,
            tick_every_frames: 0,
        }
    }

    /// Use this tuning instead of the config file
    pub fn with_tuning(mut self, tuning: PenaltyTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Seed spin, keeper decisions and weather for a reproducible session
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the target FPS (default: 60)
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    /// Enable minimal thread mode (task pools = 1)
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Emit a Tick event every N fixed steps (0 = never)
    pub fn with_tick_every_frames(mut self, frames: u64) -> Self {
        self.tick_every_frames = frames;
        self
    }

    /// Build the app with minimal plugins and the penalty plugin.
    ///
    /// The fixed timestep matches `fps`. Callers add logging, an
    /// `EventLogger` and their own input systems.
    pub fn build(self) -> App {
        let fps = if self.fps.is_finite() && self.fps > 0.0 { self.fps } else { 60.0 };
        let frame = Duration::from_secs_f32(1.0 / fps);

        let mut app = App::new();
        if self.minimal_threads {
            app.add_plugins(
                MinimalPlugins
                    .set(ScheduleRunnerPlugin::run_loop(frame))
                    .set(TaskPoolPlugin {
                        task_pool_options: TaskPoolOptions::with_num_threads(1),
                    }),
            );
        } else {
            app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)));
        }

        app.insert_resource(Time::<Fixed>::from_hz(fps as f64));
        app.add_plugins(PenaltyPlugin {
            tuning: self.tuning,
            difficulty: self.difficulty,
            seed: self.seed,
            auto_reset: true,
            tick_every_frames: self.tick_every_frames,
        });
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::SimCommands;
    use crate::scoring::Score;
    use crate::sim::PenaltySim;

    #[test]
    fn test_builder_creates_app() {
        let app = HeadlessAppBuilder::new()
            .with_tuning(PenaltyTuning::default())
            .with_difficulty(Difficulty::Hard)
            .with_seed(4)
            .build();
        assert!(app.world().contains_resource::<Score>());
        assert!(app.world().contains_resource::<SimCommands>());
        let sim = app.world().resource::<PenaltySim>();
        assert_eq!(sim.difficulty(), Difficulty::Hard);
        assert!(!sim.is_shot_active());
    }

    #[test]
    fn test_minimal_threads_creates_app() {
        let mut app = HeadlessAppBuilder::new()
            .with_tuning(PenaltyTuning::default())
            .with_minimal_threads()
            .with_fps(30.0)
            .build();
        app.update();
        assert!(app.world().contains_resource::<PenaltySim>());
        let step = app.world().resource::<Time<Fixed>>().timestep();
        assert!((step.as_secs_f64() - 1.0 / 30.0).abs() < 1e-6);
    }
}
