//! Ball state and the ECS components that mirror it

use bevy::prelude::*;
use std::collections::VecDeque;

use crate::constants::TRAJECTORY_HISTORY_MAX;

/// Marker for the ball entity spawned by the plugin
#[derive(Component)]
pub struct Ball;

/// Published ball pose for render hosts
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct BallPose {
    pub position: Vec3,
    /// Cosmetic roll around the z axis (radians)
    pub roll: f32,
    pub active: bool,
}

/// Simulated ball
#[derive(Debug, Clone)]
pub struct BallState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub spin: Vec3,
    pub is_active: bool,
    /// Accumulated cosmetic rotation, never read by physics
    pub roll_angle: f32,
    trajectory: VecDeque<Vec3>,
}

impl BallState {
    /// Ball at rest on the penalty spot
    pub fn at_rest(rest: Vec3) -> Self {
        Self {
            position: rest,
            velocity: Vec3::ZERO,
            spin: Vec3::ZERO,
            is_active: false,
            roll_angle: 0.0,
            trajectory: VecDeque::with_capacity(TRAJECTORY_HISTORY_MAX),
        }
    }

    /// Back to rest: zero motion, cleared history
    pub fn reset_to(&mut self, rest: Vec3) {
        self.position = rest;
        self.velocity = Vec3::ZERO;
        self.spin = Vec3::ZERO;
        self.is_active = false;
        self.roll_angle = 0.0;
        self.trajectory.clear();
    }

    /// Stop the current shot where the ball is
    pub fn deactivate(&mut self) {
        self.velocity = Vec3::ZERO;
        self.is_active = false;
    }

    /// Append to the bounded trajectory history (oldest dropped first)
    pub fn record_trajectory(&mut self, point: Vec3) {
        if self.trajectory.len() == TRAJECTORY_HISTORY_MAX {
            self.trajectory.pop_front();
        }
        self.trajectory.push_back(point);
    }

    pub fn trajectory(&self) -> impl Iterator<Item = &Vec3> {
        self.trajectory.iter()
    }

    pub fn trajectory_len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// False once NaN or infinity has leaked into position or velocity
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    pub fn pose(&self) -> BallPose {
        BallPose {
            position: self.position,
            roll: self.roll_angle,
            active: self.is_active,
        }
    }
}
