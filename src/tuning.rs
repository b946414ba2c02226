//! Loaded configuration: field geometry, shot limits, collision response and keeper AI

use bevy::log::warn;
use bevy::prelude::{Resource, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::difficulty::{Difficulty, DifficultyProfile};

/// Path to the tuning config
pub const PENALTY_TUNING_FILE: &str = "config/penalty_tuning.json";

// Serde default functions for fields added after the first config shipped
fn default_reset_delay() -> f32 {
    SHOT_RESET_DELAY
}
fn default_dive_lerp_factor() -> f32 {
    KEEPER_DIVE_LERP_FACTOR
}
fn default_cache_size() -> usize {
    KEEPER_CACHE_SIZE
}

/// Static dimensions of the pitch, goal frame and goalkeeper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldGeometry {
    pub field_width: f32,
    pub field_length: f32,
    pub goal_width: f32,
    pub goal_height: f32,
    pub goal_depth: f32,
    pub goal_z: f32,
    pub ball_radius: f32,
    pub ball_rest_position: [f32; 3],
    pub keeper_width: f32,
    pub keeper_height: f32,
    pub keeper_start_z: f32,
    pub keeper_move_range_x: f32,
    pub keeper_move_range_y: f32,
    pub goal_detection_tolerance: f32,
    pub collision_tolerance: f32,
}

impl Default for FieldGeometry {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_length: FIELD_LENGTH,
            goal_width: GOAL_WIDTH,
            goal_height: GOAL_HEIGHT,
            goal_depth: GOAL_DEPTH,
            goal_z: GOAL_Z,
            ball_radius: BALL_RADIUS,
            ball_rest_position: BALL_REST_POSITION.to_array(),
            keeper_width: GOALKEEPER_WIDTH,
            keeper_height: GOALKEEPER_HEIGHT,
            keeper_start_z: GOALKEEPER_START_Z,
            keeper_move_range_x: GOALKEEPER_MOVE_RANGE_X,
            keeper_move_range_y: GOALKEEPER_MOVE_RANGE_Y,
            goal_detection_tolerance: GOAL_DETECTION_TOLERANCE,
            collision_tolerance: COLLISION_TOLERANCE,
        }
    }
}

impl FieldGeometry {
    pub fn half_goal_width(&self) -> f32 {
        self.goal_width / 2.0
    }

    pub fn half_field_width(&self) -> f32 {
        self.field_width / 2.0
    }

    pub fn rest_position(&self) -> Vec3 {
        Vec3::from_array(self.ball_rest_position)
    }

    /// Keeper anchor (feet, centered) before any movement
    pub fn keeper_start(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.keeper_start_z)
    }

    /// Post contact points: mid-height on each side of the goal line
    pub fn post_positions(&self) -> [Vec3; 2] {
        let y = self.goal_height / 2.0;
        [
            Vec3::new(-self.half_goal_width(), y, self.goal_z),
            Vec3::new(self.half_goal_width(), y, self.goal_z),
        ]
    }
}

/// Shot conversion and lifecycle limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotTuning {
    pub min_shot_speed: f32,
    pub max_shot_speed: f32,
    pub max_angle_deg: f32,
    pub speed_multiplier: f32,
    pub max_spin: f32,
    pub field_exit_z: f32,
    pub settle_speed: f32,
    pub max_flight_time: f32,
    #[serde(default = "default_reset_delay")]
    pub reset_delay: f32,
}

impl Default for ShotTuning {
    fn default() -> Self {
        Self {
            min_shot_speed: MIN_SHOT_SPEED,
            max_shot_speed: MAX_SHOT_SPEED,
            max_angle_deg: MAX_SHOT_ANGLE_DEG,
            speed_multiplier: SHOT_SPEED_MULTIPLIER,
            max_spin: SHOT_MAX_SPIN,
            field_exit_z: FIELD_EXIT_Z,
            settle_speed: SHOT_SETTLE_SPEED,
            max_flight_time: SHOT_MAX_FLIGHT_TIME,
            reset_delay: default_reset_delay(),
        }
    }
}

/// Force model and collision response coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallTuning {
    pub air_density: f32,
    pub drag_coefficient: f32,
    pub drag_damping: f32,
    pub spin_scale: f32,
    pub mass_damping: f32,
    pub wind_direction: [f32; 3],
    pub ground_extra_damping: f32,
    pub ground_rest_snap: f32,
    pub boundary_damping: f32,
    pub post_damping: f32,
    pub keeper_damping: f32,
    pub keeper_push_out: f32,
}

impl Default for BallTuning {
    fn default() -> Self {
        Self {
            air_density: AIR_DENSITY,
            drag_coefficient: DRAG_COEFFICIENT,
            drag_damping: DRAG_DAMPING,
            spin_scale: SPIN_SCALE,
            mass_damping: MASS_DAMPING,
            wind_direction: WIND_DIRECTION.to_array(),
            ground_extra_damping: GROUND_EXTRA_DAMPING,
            ground_rest_snap: GROUND_REST_SNAP,
            boundary_damping: BOUNDARY_DAMPING,
            post_damping: POST_DAMPING,
            keeper_damping: KEEPER_DAMPING,
            keeper_push_out: KEEPER_PUSH_OUT,
        }
    }
}

impl BallTuning {
    pub fn wind(&self) -> Vec3 {
        Vec3::from_array(self.wind_direction).normalize_or_zero()
    }
}

/// Goalkeeper agent and goal detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperTuning {
    pub lerp_factor: f32,
    #[serde(default = "default_dive_lerp_factor")]
    pub dive_lerp_factor: f32,
    /// Absolute z the ball must pass before the keeper commits
    pub dive_trigger_z: f32,
    /// Interception window beyond each post
    pub intercept_margin: f32,
    pub recovery_time: f32,
    pub bucket_side_threshold: f32,
    pub bucket_high_threshold: f32,
    pub observation_buffer: usize,
    pub history_max: usize,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    pub save_jitter: f32,
    pub goal_cooldown: f32,
}

impl Default for KeeperTuning {
    fn default() -> Self {
        Self {
            lerp_factor: KEEPER_LERP_FACTOR,
            dive_lerp_factor: default_dive_lerp_factor(),
            dive_trigger_z: KEEPER_DIVE_TRIGGER_Z,
            intercept_margin: KEEPER_INTERCEPT_MARGIN,
            recovery_time: KEEPER_RECOVERY_TIME,
            bucket_side_threshold: KEEPER_BUCKET_SIDE,
            bucket_high_threshold: KEEPER_BUCKET_HIGH,
            observation_buffer: KEEPER_OBSERVATION_BUFFER,
            history_max: KEEPER_HISTORY_MAX,
            cache_size: default_cache_size(),
            save_jitter: SAVE_JITTER,
            goal_cooldown: GOAL_COOLDOWN,
        }
    }
}

/// Per-difficulty parameter sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTable {
    pub easy: DifficultyProfile,
    pub medium: DifficultyProfile,
    pub hard: DifficultyProfile,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            easy: DifficultyProfile::for_difficulty(Difficulty::Easy),
            medium: DifficultyProfile::for_difficulty(Difficulty::Medium),
            hard: DifficultyProfile::for_difficulty(Difficulty::Hard),
        }
    }
}

impl DifficultyTable {
    pub fn get(&self, difficulty: Difficulty) -> &DifficultyProfile {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

/// Everything the simulation core reads from config
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyTuning {
    pub field: FieldGeometry,
    pub shot: ShotTuning,
    pub ball: BallTuning,
    pub keeper: KeeperTuning,
    pub difficulty: DifficultyTable,
}

impl PenaltyTuning {
    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.shot.min_shot_speed > self.shot.max_shot_speed {
            return Err(format!(
                "min_shot_speed ({}) exceeds max_shot_speed ({})",
                self.shot.min_shot_speed, self.shot.max_shot_speed
            ));
        }
        if self.field.ball_radius <= 0.0 {
            return Err("ball_radius must be positive".to_string());
        }
        if self.field.goal_width <= 0.0 || self.field.goal_height <= 0.0 {
            return Err("goal dimensions must be positive".to_string());
        }
        if self.keeper.observation_buffer < 2 {
            return Err("observation_buffer needs at least 2 samples".to_string());
        }
        Ok(())
    }
}

pub fn load_tuning_from_file(path: &str) -> Result<PenaltyTuning, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    let tuning: PenaltyTuning =
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))?;
    tuning.validate().map_err(|e| format!("Invalid {}: {}", path, e))?;
    Ok(tuning)
}

/// Load the global tuning file into `tuning`, leaving defaults on failure
pub fn apply_global_tuning(tuning: &mut PenaltyTuning) -> Result<(), String> {
    match load_tuning_from_file(PENALTY_TUNING_FILE) {
        Ok(loaded) => {
            *tuning = loaded;
            Ok(())
        }
        Err(err) => {
            *tuning = PenaltyTuning::default();
            Err(err)
        }
    }
}

/// Global tuning or defaults, with a warning when the file is unusable
pub fn load_global_tuning() -> PenaltyTuning {
    let mut tuning = PenaltyTuning::default();
    if let Err(err) = apply_global_tuning(&mut tuning) {
        warn!("{}, using defaults", err);
    }
    tuning
}
