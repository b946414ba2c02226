//! Shared event emission for the plugin, the scenario runner and batch runs
//!
//! Turns a `FrameResult` into the `PenaltyEvent`s it implies so every host
//! logs the same thing.

use bevy::prelude::*;

use super::types::PenaltyEvent;
use crate::ai::{GoalkeeperState, KeeperStatus};
use crate::scoring::{Score, ShotOutcome};
use crate::shooting::LastShotInfo;
use crate::sim::FrameResult;

/// Tick sampling state
#[derive(Resource, Debug, Clone, Default)]
pub struct EmitterConfig {
    /// Sample a Tick event every N frames (0 = never)
    pub tick_every_frames: u64,
}

fn triple(v: Vec3) -> (f32, f32, f32) {
    (v.x, v.y, v.z)
}

/// Event for a shot that was just taken
pub fn shot_event(info: &LastShotInfo) -> PenaltyEvent {
    PenaltyEvent::Shot {
        horizontal_deg: info.command.horizontal_angle_deg,
        vertical_deg: info.command.vertical_angle_deg,
        power: info.command.power,
        speed: info.speed,
    }
}

/// Outcome event carrying the score after the outcome was counted
pub fn outcome_event(outcome: ShotOutcome, score: Score) -> PenaltyEvent {
    let (player, keeper) = (score.player, score.goalkeeper);
    match outcome {
        ShotOutcome::Goal => PenaltyEvent::Goal { player, keeper },
        ShotOutcome::Save => PenaltyEvent::Save { player, keeper },
        ShotOutcome::Miss(reason) => PenaltyEvent::Miss {
            reason,
            player,
            keeper,
        },
    }
}

/// Collision, dive and outcome events for one frame, in that order
pub fn frame_events(frame: &FrameResult, score: Score) -> Vec<PenaltyEvent> {
    let mut events: Vec<PenaltyEvent> = frame
        .collisions
        .iter()
        .map(|c| PenaltyEvent::Collision {
            kind: c.kind,
            point: triple(c.contact_point),
            impulse: c.impulse,
        })
        .collect();

    if let Some(dive) = frame.dive {
        events.push(PenaltyEvent::Dive {
            direction: dive.direction,
            probability: dive.probability,
            will_save: dive.will_save,
        });
    }

    events.extend(frame.events.iter().map(|o| outcome_event(*o, score)));
    events
}

/// Sampled position event, if this frame is due
pub fn tick_event(config: &EmitterConfig, frame: &FrameResult, keeper: &GoalkeeperState) -> Option<PenaltyEvent> {
    if config.tick_every_frames == 0 || frame.frame % config.tick_every_frames != 0 {
        return None;
    }
    Some(PenaltyEvent::Tick {
        frame: frame.frame,
        ball_pos: triple(frame.ball_position),
        keeper_pos: triple(frame.keeper_position),
        keeper_state: match keeper.status {
            KeeperStatus::Idle => 'I',
            KeeperStatus::Diving => 'D',
        },
    })
}
