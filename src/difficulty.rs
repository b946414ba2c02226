//! Difficulty levels and the parameter sets they select

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Difficulty level chosen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "e" => Ok(Difficulty::Easy),
            "medium" | "m" | "normal" => Ok(Difficulty::Medium),
            "hard" | "h" => Ok(Difficulty::Hard),
            other => Err(format!("Unknown difficulty '{}' (expected easy, medium or hard)", other)),
        }
    }
}

/// Ball physics coefficients, fixed for the duration of a shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    pub gravity: f32,
    pub air_resistance: f32,
    pub spin_factor: f32,
    pub bounce_factor: f32,
    pub wind_factor: f32,
    pub friction_coefficient: f32,
    pub mass: f32,
}

impl PhysicsParams {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                gravity: 9.81,
                air_resistance: 0.05,
                spin_factor: 0.02,
                bounce_factor: 0.6,
                wind_factor: 0.001,
                friction_coefficient: 0.2,
                mass: 0.4,
            },
            Difficulty::Medium => Self {
                gravity: 9.81,
                air_resistance: 0.06,
                spin_factor: 0.025,
                bounce_factor: 0.55,
                wind_factor: 0.0015,
                friction_coefficient: 0.3,
                mass: 0.45,
            },
            Difficulty::Hard => Self {
                gravity: 9.81,
                air_resistance: 0.08,
                spin_factor: 0.03,
                bounce_factor: 0.5,
                wind_factor: 0.002,
                friction_coefficient: 0.4,
                mass: 0.5,
            },
        }
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::default())
    }
}

/// Goalkeeper behaviour coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalkeeperAiParams {
    /// Save probability for a ball aimed straight at the keeper's feet
    pub base_save_probability: f32,
    /// Seconds between committing to a dive and the dive moving
    pub reaction_time: f32,
    /// 0 = tracks the predicted arrival point, 1 = tracks the ball's current x
    pub prediction_variance: f32,
}

impl GoalkeeperAiParams {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                base_save_probability: 0.4,
                reaction_time: 0.5,
                prediction_variance: 0.5,
            },
            Difficulty::Medium => Self {
                base_save_probability: 0.5,
                reaction_time: 0.3,
                prediction_variance: 0.3,
            },
            Difficulty::Hard => Self {
                base_save_probability: 0.6,
                reaction_time: 0.2,
                prediction_variance: 0.1,
            },
        }
    }
}

impl Default for GoalkeeperAiParams {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::default())
    }
}

/// Both parameter sets for one difficulty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub physics: PhysicsParams,
    pub keeper: GoalkeeperAiParams,
}

impl DifficultyProfile {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            physics: PhysicsParams::for_difficulty(difficulty),
            keeper: GoalkeeperAiParams::for_difficulty(difficulty),
        }
    }
}
