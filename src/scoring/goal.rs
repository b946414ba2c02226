//! Goal volume predicate and debounced detector

use bevy::prelude::Vec3;

use crate::tuning::FieldGeometry;

/// Inclusive goal volume: inside the frame, between the goal line and the net
pub fn in_goal(position: Vec3, field: &FieldGeometry) -> bool {
    let half_width = field.half_goal_width();
    (-half_width..=half_width).contains(&position.x)
        && (0.0..=field.goal_height).contains(&position.y)
        && (field.goal_z - field.goal_depth..=field.goal_z).contains(&position.z)
}

/// Fires once per continuous dwell in the goal volume.
///
/// After firing the detector stays quiet until the ball has been seen outside
/// the volume and the cooldown has run out.
#[derive(Debug, Clone)]
pub struct GoalDetector {
    cooldown: f32,
    remaining: f32,
    armed: bool,
}

impl GoalDetector {
    pub fn new(cooldown: f32) -> Self {
        Self {
            cooldown,
            remaining: 0.0,
            armed: true,
        }
    }

    /// Evaluate one tick; true exactly on the tick a goal is scored
    pub fn update(&mut self, position: Vec3, field: &FieldGeometry, dt: f32) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);

        if !in_goal(position, field) {
            self.armed = true;
            return false;
        }

        if self.armed && self.remaining <= 0.0 {
            self.armed = false;
            self.remaining = self.cooldown;
            return true;
        }
        false
    }

    pub fn is_cooling_down(&self) -> bool {
        self.remaining > 0.0
    }

    /// Re-arm for a new shot
    pub fn reset(&mut self) {
        self.remaining = 0.0;
        self.armed = true;
    }
}
