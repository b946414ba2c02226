//! Tunable constants for penaltykick
//!
//! Defaults for every value in `PenaltyTuning`. Units are meters and seconds,
//! with the goal line on the negative z axis.

use bevy::prelude::*;

// =============================================================================
// FIELD GEOMETRY
// =============================================================================

pub const FIELD_WIDTH: f32 = 40.0;
pub const FIELD_LENGTH: f32 = 60.0;
pub const FIELD_EXIT_Z: f32 = 30.0; // Shot ends once |z| passes this

pub const GOAL_WIDTH: f32 = 7.32; // FIFA regulation
pub const GOAL_HEIGHT: f32 = 2.44;
pub const GOAL_DEPTH: f32 = 2.0;
pub const GOAL_Z: f32 = -20.0; // Goal line

pub const BALL_RADIUS: f32 = 0.11;
pub const BALL_REST_POSITION: Vec3 = Vec3::new(0.0, 0.2, -1.0); // Penalty spot + start height

pub const GOALKEEPER_WIDTH: f32 = 1.4;
pub const GOALKEEPER_HEIGHT: f32 = 1.5;
pub const GOALKEEPER_START_Z: f32 = -18.0;
pub const GOALKEEPER_MOVE_RANGE_X: f32 = 3.5;
pub const GOALKEEPER_MOVE_RANGE_Y: f32 = 1.8;

pub const GOAL_DETECTION_TOLERANCE: f32 = 0.1;
pub const COLLISION_TOLERANCE: f32 = 0.1; // Post contact slack

// =============================================================================
// SHOT CONSTANTS
// =============================================================================

pub const MIN_SHOT_SPEED: f32 = 10.0;
pub const MAX_SHOT_SPEED: f32 = 50.0;
pub const MAX_SHOT_ANGLE_DEG: f32 = 45.0; // Aim input range, either side
pub const SHOT_ANGLE_SCALE: f32 = std::f32::consts::PI / 90.0; // Radians per aim unit
pub const SHOT_SPEED_MULTIPLIER: f32 = 1.0; // Scales simulated time during integration
pub const SHOT_MAX_SPIN: f32 = 1.0; // Per-axis bound for the sampled spin vector
pub const SHOT_SETTLE_SPEED: f32 = 0.5; // Below this on the ground the shot is over
pub const SHOT_MAX_FLIGHT_TIME: f32 = 6.0;

pub const SHOT_CHARGE_STEP: f32 = 2.0; // Charge points per interval
pub const SHOT_CHARGE_INTERVAL: f32 = 0.05; // Seconds
pub const SHOT_CHARGE_MAX: f32 = 100.0;
pub const AIM_STEP_DEG: f32 = 5.0;
pub const AIM_DEFAULT_DEG: f32 = 7.0;
pub const SHOT_RESET_DELAY: f32 = 3.0; // Auto-reset after a shot (host side)

// =============================================================================
// BALL PHYSICS
// =============================================================================

pub const AIR_DENSITY: f32 = 1.225;
pub const DRAG_COEFFICIENT: f32 = 0.47;
pub const DRAG_DAMPING: f32 = 0.05;
pub const SPIN_SCALE: f32 = 1.5; // Magnus term multiplier
pub const MASS_DAMPING: f32 = 0.05; // velocity *= 1 / (1 + mass * MASS_DAMPING)
pub const WIND_DIRECTION: Vec3 = Vec3::X;
pub const BALL_ROLL_FACTOR: f32 = 0.5; // Cosmetic roll radians per unit lateral velocity

// Collision response
pub const GROUND_EXTRA_DAMPING: f32 = 0.8;
pub const GROUND_REST_SNAP: f32 = 0.1; // |vy| below this snaps to 0
pub const BOUNDARY_DAMPING: f32 = 0.7;
pub const POST_DAMPING: f32 = 0.7;
pub const KEEPER_DAMPING: f32 = 0.6;
pub const KEEPER_PUSH_OUT: f32 = 1.5; // Multiples of ball radius

/// Fallback collision normal for zero-length separations
pub const FALLBACK_NORMAL: Vec3 = Vec3::NEG_Z;
pub const NORMAL_EPSILON: f32 = 1e-6;

pub const TRAJECTORY_HISTORY_MAX: usize = 50;

// =============================================================================
// GOALKEEPER AI
// =============================================================================

pub const KEEPER_LERP_FACTOR: f32 = 0.1; // Tracking smoothing per tick
pub const KEEPER_DIVE_LERP_FACTOR: f32 = 0.35; // Dive smoothing per tick after lock
pub const KEEPER_DIVE_TRIGGER_Z: f32 = -7.0; // Absolute z the ball must pass
pub const KEEPER_INTERCEPT_MARGIN: f32 = 1.0; // Beyond each post
pub const KEEPER_RECOVERY_TIME: f32 = 2.0;
pub const KEEPER_SAVE_DEADLINE: f32 = 0.8; // Save dive lands by this share of the predicted arrival time
pub const KEEPER_SAVE_REACTION_SHARE: f32 = 0.5; // Reaction never uses more of that deadline than this
pub const KEEPER_BUCKET_SIDE: f32 = 0.1;
pub const KEEPER_BUCKET_HIGH: f32 = 1.0;
pub const KEEPER_OBSERVATION_BUFFER: usize = 10;
pub const KEEPER_HISTORY_MAX: usize = 20;
pub const KEEPER_CACHE_SIZE: usize = 64;
pub const KEEPER_CACHE_POSITION_QUANTUM: f32 = 0.05; // Cache key grid, world units
pub const KEEPER_CACHE_VELOCITY_QUANTUM: f32 = 0.25; // Units per second
pub const KEEPER_CACHE_STEP_QUANTUM: f32 = 1e-4; // Seconds
pub const KEEPER_PREDICTION_STEP: f32 = 1.0 / 120.0;
pub const KEEPER_PREDICTION_MAX_STEPS: usize = 720;
pub const SAVE_JITTER: f32 = 0.1; // +/-10%

pub const GOAL_COOLDOWN: f32 = 2.0; // Detector debounce, simulated seconds

// =============================================================================
// SIMULATION STEP
// =============================================================================

pub const MAX_SUBSTEP: f32 = 1.0 / 60.0; // Longer host ticks are split into sub-steps of at most this
pub const MAX_SUBSTEPS_PER_TICK: u32 = 120; // Past this the sub-steps lengthen instead
