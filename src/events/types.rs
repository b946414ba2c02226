//! Event type definitions for the logging system

use serde::{Deserialize, Serialize};

use crate::ai::DiveDirection;
use crate::ball::CollisionKind;
use crate::difficulty::Difficulty;
use crate::scoring::MissReason;
use crate::tuning::PenaltyTuning;

/// Configuration snapshot for analytics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    pub seed: Option<u64>,
    // Shot
    pub min_shot_speed: f32,
    pub max_shot_speed: f32,
    pub speed_multiplier: f32,
    pub max_spin: f32,
    // Goal frame
    pub goal_width: f32,
    pub goal_height: f32,
    pub goal_z: f32,
    // Keeper
    pub keeper_start_z: f32,
    pub dive_trigger_z: f32,
    pub recovery_time: f32,
}

impl SessionConfig {
    pub fn from_tuning(tuning: &PenaltyTuning, difficulty: Difficulty, seed: Option<u64>) -> Self {
        Self {
            difficulty,
            seed,
            min_shot_speed: tuning.shot.min_shot_speed,
            max_shot_speed: tuning.shot.max_shot_speed,
            speed_multiplier: tuning.shot.speed_multiplier,
            max_spin: tuning.shot.max_spin,
            goal_width: tuning.field.goal_width,
            goal_height: tuning.field.goal_height,
            goal_z: tuning.field.goal_z,
            keeper_start_z: tuning.field.keeper_start_z,
            dive_trigger_z: tuning.keeper.dive_trigger_z,
            recovery_time: tuning.keeper.recovery_time,
        }
    }
}

/// All events that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PenaltyEvent {
    // === Session Events ===
    /// Session started (generated once per launch)
    SessionStart {
        session_id: String, // UUID v4
        timestamp: String,
    },
    /// Configuration snapshot (logged after session start)
    Config(SessionConfig),
    /// Difficulty applied to the next shot
    DifficultyChange { difficulty: Difficulty },

    // === Shot Events ===
    /// Ball struck
    Shot {
        horizontal_deg: f32,
        vertical_deg: f32,
        power: f32,
        speed: f32,
    },
    /// Collision resolved
    Collision {
        kind: CollisionKind,
        point: (f32, f32, f32),
        impulse: f32,
    },
    /// Keeper committed to a dive
    Dive {
        direction: DiveDirection,
        probability: f32,
        will_save: bool,
    },

    // === Outcome Events ===
    Goal { player: u32, keeper: u32 },
    Save { player: u32, keeper: u32 },
    Miss {
        reason: MissReason,
        player: u32,
        keeper: u32,
    },

    /// Ball back on the spot
    Reset,

    // === Debug/Tick Events ===
    /// Sampled positions
    Tick {
        frame: u64,
        ball_pos: (f32, f32, f32),
        keeper_pos: (f32, f32, f32),
        keeper_state: char, // I=Idle, D=Diving
    },
}

impl PenaltyEvent {
    /// Get the event type code for compact serialization
    pub fn type_code(&self) -> &'static str {
        match self {
            PenaltyEvent::SessionStart { .. } => "SE",
            PenaltyEvent::Config(_) => "CF",
            PenaltyEvent::DifficultyChange { .. } => "DC",
            PenaltyEvent::Shot { .. } => "SH",
            PenaltyEvent::Collision { .. } => "CO",
            PenaltyEvent::Dive { .. } => "KD",
            PenaltyEvent::Goal { .. } => "G",
            PenaltyEvent::Save { .. } => "SV",
            PenaltyEvent::Miss { .. } => "MI",
            PenaltyEvent::Reset => "RB",
            PenaltyEvent::Tick { .. } => "T",
        }
    }

    /// Name used by scenario files
    pub fn name(&self) -> &'static str {
        match self {
            PenaltyEvent::SessionStart { .. } => "SessionStart",
            PenaltyEvent::Config(_) => "Config",
            PenaltyEvent::DifficultyChange { .. } => "DifficultyChange",
            PenaltyEvent::Shot { .. } => "Shot",
            PenaltyEvent::Collision { .. } => "Collision",
            PenaltyEvent::Dive { .. } => "Dive",
            PenaltyEvent::Goal { .. } => "Goal",
            PenaltyEvent::Save { .. } => "Save",
            PenaltyEvent::Miss { .. } => "Miss",
            PenaltyEvent::Reset => "Reset",
            PenaltyEvent::Tick { .. } => "Tick",
        }
    }
}
