//! Shot command: the input contract from the host UI

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::tuning::ShotTuning;

/// Requested shot: aim in angle units (+/-45, two degrees each) and normalized power
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShotCommand {
    pub horizontal_angle_deg: f32,
    pub vertical_angle_deg: f32,
    pub power: f32,
}

impl ShotCommand {
    pub fn new(horizontal_angle_deg: f32, vertical_angle_deg: f32, power: f32) -> Self {
        Self {
            horizontal_angle_deg,
            vertical_angle_deg,
            power,
        }
    }

    /// Clamp into the valid domain; NaN and infinities become 0
    pub fn sanitized(&self, shot: &ShotTuning) -> Self {
        let max_angle = shot.max_angle_deg;
        Self {
            horizontal_angle_deg: finite_or_zero(self.horizontal_angle_deg).clamp(-max_angle, max_angle),
            vertical_angle_deg: finite_or_zero(self.vertical_angle_deg).clamp(-max_angle, max_angle),
            power: finite_or_zero(self.power).clamp(0.0, 1.0),
        }
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

/// Information about the last shot taken (for debug display and logs)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LastShotInfo {
    pub command: ShotCommand,
    pub speed: f32,
    pub spin: [f32; 3],
}
