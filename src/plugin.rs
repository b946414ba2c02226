//! Bevy wiring for `PenaltySim`
//!
//! Hosts queue shots, resets and difficulty changes on `SimCommands`; the
//! fixed-step systems apply them, advance the simulation and publish the
//! result as components, resources and bus events.

use bevy::prelude::*;
use std::collections::VecDeque;

use crate::ai::{Goalkeeper, GoalkeeperState};
use crate::ball::{Ball, BallPose};
use crate::difficulty::Difficulty;
use crate::events::{
    EmitterConfig, EventBus, EventLogger, PenaltyEvent, SessionConfig, frame_events, shot_event,
    sync_event_clock, tick_event,
};
use crate::scoring::Score;
use crate::shooting::{Aim, LastShotInfo, ShotCharge, ShotCommand};
use crate::sim::{FrameResult, PenaltySim};
use crate::tuning::{PenaltyTuning, load_global_tuning};

/// Requests from the host, applied at the start of the next fixed step
#[derive(Resource, Debug, Default)]
pub struct SimCommands {
    shots: VecDeque<ShotCommand>,
    reset: bool,
    difficulty: Option<Difficulty>,
}

impl SimCommands {
    pub fn shoot(&mut self, command: ShotCommand) {
        self.shots.push_back(command);
    }

    pub fn reset(&mut self) {
        self.reset = true;
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = Some(difficulty);
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty() && !self.reset && self.difficulty.is_none()
    }
}

/// Most recent fixed-step result
#[derive(Resource, Debug, Default)]
pub struct LastFrame(pub FrameResult);

/// Countdown to the automatic reset after a shot ends
#[derive(Resource, Debug, Default)]
pub struct ResetTimer {
    pub enabled: bool,
    pub remaining: Option<f32>,
}

pub struct PenaltyPlugin {
    pub tuning: Option<PenaltyTuning>,
    pub difficulty: Difficulty,
    pub seed: Option<u64>,
    pub auto_reset: bool,
    /// Sample a Tick event every N fixed steps (0 = never)
    pub tick_every_frames: u64,
}

impl Default for PenaltyPlugin {
    fn default() -> Self {
        Self {
            tuning: None,
            difficulty: Difficulty::default(),
            seed: None,
            auto_reset: true,
            tick_every_frames: 0,
        }
    }
}

impl Plugin for PenaltyPlugin {
    fn build(&self, app: &mut App) {
        let tuning = self.tuning.clone().unwrap_or_else(load_global_tuning);
        let config = SessionConfig::from_tuning(&tuning, self.difficulty, self.seed);

        let mut sim = PenaltySim::new(tuning, self.difficulty);
        if let Some(seed) = self.seed {
            sim = sim.with_seed(seed);
        }

        let mut bus = EventBus::new();
        bus.emit(PenaltyEvent::Config(config));

        app.insert_resource(sim)
            .insert_resource(bus)
            .insert_resource(EmitterConfig {
                tick_every_frames: self.tick_every_frames,
            })
            .insert_resource(ResetTimer {
                enabled: self.auto_reset,
                remaining: None,
            })
            .init_resource::<SimCommands>()
            .init_resource::<LastFrame>()
            .init_resource::<LastShotInfo>()
            .init_resource::<Score>()
            .init_resource::<ShotCharge>()
            .init_resource::<Aim>()
            .add_systems(Startup, spawn_pieces)
            .add_systems(Update, (sync_event_clock, tick_shot_charge))
            .add_systems(
                FixedUpdate,
                (apply_commands, step_simulation, sync_pieces, auto_reset).chain(),
            )
            .add_systems(PostUpdate, write_event_log);
    }
}

fn spawn_pieces(mut commands: Commands, sim: Res<PenaltySim>) {
    commands.spawn((Ball, sim.ball().pose()));
    commands.spawn((Goalkeeper, *sim.keeper_state()));
}

/// Advance the charge meter while the shot button is held
pub fn tick_shot_charge(mut charge: ResMut<ShotCharge>, time: Res<Time>) {
    if charge.is_charging() {
        charge.tick(time.delta_secs());
    }
}

/// Release the charge meter into a shot along the current aim.
/// Returns false when no charge was running.
pub fn release_shot(charge: &mut ShotCharge, aim: &Aim, commands: &mut SimCommands) -> bool {
    let Some(power) = charge.release() else {
        return false;
    };
    commands.shoot(ShotCommand::new(aim.horizontal_deg, aim.vertical_deg, power));
    true
}

pub fn apply_commands(
    mut requests: ResMut<SimCommands>,
    mut sim: ResMut<PenaltySim>,
    mut bus: ResMut<EventBus>,
    mut last_shot: ResMut<LastShotInfo>,
    mut timer: ResMut<ResetTimer>,
) {
    if let Some(difficulty) = requests.difficulty.take()
        && difficulty != sim.difficulty()
    {
        sim.set_difficulty(difficulty);
        bus.emit(PenaltyEvent::DifficultyChange { difficulty });
    }

    if std::mem::take(&mut requests.reset) {
        sim.reset();
        timer.remaining = None;
        bus.emit(PenaltyEvent::Reset);
    }

    while let Some(command) = requests.shots.pop_front() {
        if sim.shoot(command.horizontal_angle_deg, command.vertical_angle_deg, command.power)
            && let Some(info) = sim.last_shot()
        {
            *last_shot = *info;
            timer.remaining = None;
            bus.emit(shot_event(info));
        }
    }
}

pub fn step_simulation(
    mut sim: ResMut<PenaltySim>,
    mut bus: ResMut<EventBus>,
    mut score: ResMut<Score>,
    mut last_frame: ResMut<LastFrame>,
    mut timer: ResMut<ResetTimer>,
    emitter: Res<EmitterConfig>,
    time: Res<Time>,
) {
    let frame = sim.step(time.delta_secs());

    *score = sim.score();
    bus.extend(frame_events(&frame, *score));
    if let Some(tick) = tick_event(&emitter, &frame, sim.keeper_state()) {
        bus.emit(tick);
    }

    if frame.outcome().is_some() && timer.enabled {
        timer.remaining = Some(sim.tuning().shot.reset_delay);
    }
    last_frame.0 = frame;
}

pub fn sync_pieces(
    sim: Res<PenaltySim>,
    mut balls: Query<&mut BallPose, With<Ball>>,
    mut keepers: Query<&mut GoalkeeperState, With<Goalkeeper>>,
) {
    for mut pose in &mut balls {
        *pose = sim.ball().pose();
    }
    for mut state in &mut keepers {
        *state = *sim.keeper_state();
    }
}

pub fn auto_reset(
    mut timer: ResMut<ResetTimer>,
    mut sim: ResMut<PenaltySim>,
    mut bus: ResMut<EventBus>,
    time: Res<Time>,
) {
    let Some(remaining) = timer.remaining else {
        return;
    };
    let remaining = remaining - time.delta_secs();
    if remaining > 0.0 {
        timer.remaining = Some(remaining);
        return;
    }
    timer.remaining = None;
    if !sim.is_shot_active() {
        sim.reset();
        bus.emit(PenaltyEvent::Reset);
    }
}

/// Drain the bus into the session log, if one is open
pub fn write_event_log(mut bus: ResMut<EventBus>, logger: Option<ResMut<EventLogger>>) {
    let events = bus.take();
    let Some(mut logger) = logger else {
        return;
    };
    for event in events {
        logger.log(event.time_ms, event.event);
    }
}
