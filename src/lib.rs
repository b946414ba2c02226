//! Penaltykick - An arcade penalty shootout core built with Bevy
//!
//! This crate provides the ball physics, collision resolver, goal detector and
//! goalkeeper agent, plus the plugin and tools that drive them.

// Core modules
pub mod constants;
pub mod difficulty;
pub mod events;
pub mod plugin;
pub mod sim;
pub mod simulation;
pub mod testing;
pub mod tuning;

// Game logic modules
pub mod ai;
pub mod ball;
pub mod scoring;
pub mod shooting;

// Re-export commonly used types for convenience
pub use ai::{
    DiveDirection, FixedRoll, Goalkeeper, GoalkeeperAgent, GoalkeeperState, KeeperStatus,
    RandomSource, SaveDecision, SeededRandom, expected_save_probability,
};
pub use ball::{
    Ball, BallPose, BallState, CalmWeather, CollisionEvent, CollisionKind, SimulatedWeather,
    WallClockWeather, Weather,
};
pub use difficulty::{Difficulty, DifficultyProfile, GoalkeeperAiParams, PhysicsParams};
pub use events::{EventBuffer, EventBus, EventLogConfig, EventLogger, PenaltyEvent, SessionConfig};
pub use plugin::{PenaltyPlugin, SimCommands};
pub use scoring::{GoalDetector, MissReason, Score, ShotOutcome};
pub use shooting::{Aim, LastShotInfo, ShotCharge, ShotCommand};
pub use sim::{FrameResult, PenaltySim};
pub use tuning::{PenaltyTuning, load_global_tuning};
