//! Keeper decision model: dive buckets, save probability and the save roll

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::difficulty::GoalkeeperAiParams;
use crate::tuning::{FieldGeometry, KeeperTuning};

/// Region of the goal face a dive targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiveDirection {
    Left,
    Right,
    #[default]
    Center,
    LeftUp,
    RightUp,
}

impl DiveDirection {
    pub fn name(&self) -> &'static str {
        match self {
            DiveDirection::Left => "left",
            DiveDirection::Right => "right",
            DiveDirection::Center => "center",
            DiveDirection::LeftUp => "left_up",
            DiveDirection::RightUp => "right_up",
        }
    }
}

/// Deterministic bucket for a point on the goal face
pub fn dive_direction(x: f32, y: f32, keeper: &KeeperTuning) -> DiveDirection {
    let high = y > keeper.bucket_high_threshold;
    if x < -keeper.bucket_side_threshold {
        if high { DiveDirection::LeftUp } else { DiveDirection::Left }
    } else if x > keeper.bucket_side_threshold {
        if high { DiveDirection::RightUp } else { DiveDirection::Right }
    } else {
        DiveDirection::Center
    }
}

/// Uniform draws in [0, 1) for keeper decisions
pub trait RandomSource: Send + Sync {
    fn next_unit(&mut self) -> f32;
}

/// Seedable source for replays
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f32 {
        self.rng.r#gen::<f32>()
    }
}

/// Always returns the same value; pins the decision in tests
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(pub f32);

impl RandomSource for FixedRoll {
    fn next_unit(&mut self) -> f32 {
        self.0
    }
}

/// Horizontal and vertical reach factors, each in [0, 1]
pub fn reach_factors(x: f32, y: f32, field: &FieldGeometry) -> (f32, f32) {
    let tolerance = field.goal_detection_tolerance;
    let horizontal = 1.0 - (x.abs() / (field.half_goal_width() + tolerance)).min(1.0);
    let vertical = 1.0 - (y.abs() / (field.goal_height + tolerance)).min(1.0);
    (horizontal, vertical)
}

/// Save probability with the jitter held at its mean
pub fn expected_save_probability(
    x: f32,
    y: f32,
    params: &GoalkeeperAiParams,
    field: &FieldGeometry,
) -> f32 {
    let (horizontal, vertical) = reach_factors(x, y, field);
    (params.base_save_probability * horizontal * vertical).clamp(0.0, 1.0)
}

/// Multiplier in [1 - jitter, 1 + jitter] for a unit draw
pub fn jitter_multiplier(unit: f32, jitter: f32) -> f32 {
    1.0 + (unit * 2.0 - 1.0) * jitter
}

/// Result of the keeper's one roll per shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaveDecision {
    pub probability: f32,
    pub roll: f32,
    pub will_save: bool,
    pub direction: DiveDirection,
}

/// Jitter the expected probability, then compare one roll against it
pub fn decide_save(
    expected_probability: f32,
    direction: DiveDirection,
    jitter: f32,
    rng: &mut dyn RandomSource,
) -> SaveDecision {
    let probability = (expected_probability * jitter_multiplier(rng.next_unit(), jitter)).clamp(0.0, 1.0);
    let roll = rng.next_unit();
    SaveDecision {
        probability,
        roll,
        will_save: roll < probability,
        direction,
    }
}
