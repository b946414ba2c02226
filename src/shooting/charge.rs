//! Shot charging and aiming, as driven by a hold-to-charge control

use bevy::prelude::*;

use crate::constants::*;

/// Power meter that fills while the shoot control is held
#[derive(Resource, Debug, Clone, Default)]
pub struct ShotCharge {
    charging: bool,
    held_time: f32,
}

impl ShotCharge {
    pub fn begin(&mut self) {
        self.charging = true;
        self.held_time = 0.0;
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    /// Accumulate hold time
    pub fn tick(&mut self, dt: f32) {
        if self.charging {
            self.held_time += dt.max(0.0);
        }
    }

    /// Meter reading in points: +2 every 50ms, capped at 100
    pub fn points(&self) -> f32 {
        let steps = (self.held_time / SHOT_CHARGE_INTERVAL).floor();
        (steps * SHOT_CHARGE_STEP).min(SHOT_CHARGE_MAX)
    }

    /// Stop charging and return normalized power in [0, 1]
    pub fn release(&mut self) -> Option<f32> {
        if !self.charging {
            return None;
        }
        let power = self.points() / SHOT_CHARGE_MAX;
        self.charging = false;
        self.held_time = 0.0;
        Some(power)
    }
}

/// Aim in angle units (two degrees each), nudged in fixed steps
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    pub horizontal_deg: f32,
    pub vertical_deg: f32,
}

impl Default for Aim {
    fn default() -> Self {
        Self {
            horizontal_deg: AIM_DEFAULT_DEG,
            vertical_deg: AIM_DEFAULT_DEG,
        }
    }
}

impl Aim {
    pub fn nudge_left(&mut self) {
        self.horizontal_deg = (self.horizontal_deg - AIM_STEP_DEG).max(-MAX_SHOT_ANGLE_DEG);
    }

    pub fn nudge_right(&mut self) {
        self.horizontal_deg = (self.horizontal_deg + AIM_STEP_DEG).min(MAX_SHOT_ANGLE_DEG);
    }

    pub fn nudge_up(&mut self) {
        self.vertical_deg = (self.vertical_deg + AIM_STEP_DEG).min(MAX_SHOT_ANGLE_DEG);
    }

    pub fn nudge_down(&mut self) {
        self.vertical_deg = (self.vertical_deg - AIM_STEP_DEG).max(0.0);
    }
}
