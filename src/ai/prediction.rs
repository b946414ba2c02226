//! Where the keeper expects the ball to cross its plane

use bevy::prelude::*;

use crate::ball::{BallState, CollisionContext, IntegrationContext, integrate, resolve_ground};
use crate::constants::{KEEPER_PREDICTION_MAX_STEPS, KEEPER_PREDICTION_STEP};
use crate::difficulty::PhysicsParams;
use crate::tuning::PenaltyTuning;

/// Predicted crossing of the keeper plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalPrediction {
    pub point: Vec3,
    /// Seconds from now
    pub time: f32,
}

/// Velocity implied by two consecutive observed positions
pub fn estimate_velocity(previous: Vec3, current: Vec3, dt: f32, speed_multiplier: f32) -> Option<Vec3> {
    let scale = dt * speed_multiplier;
    if scale <= f32::EPSILON {
        return None;
    }
    let velocity = (current - previous) / scale;
    velocity.is_finite().then_some(velocity)
}

/// Roll the ball model forward (no spin or weather, which the keeper cannot
/// see) until it crosses `plane_z`. None if it never gets there.
pub fn predict_arrival(
    position: Vec3,
    velocity: Vec3,
    plane_z: f32,
    physics: &PhysicsParams,
    tuning: &PenaltyTuning,
    step: f32,
) -> Option<ArrivalPrediction> {
    if position.z <= plane_z {
        return Some(ArrivalPrediction { point: position, time: 0.0 });
    }
    if velocity.z >= 0.0 {
        return None;
    }

    let step = if step > 0.0 { step } else { KEEPER_PREDICTION_STEP };
    let ctx = IntegrationContext {
        params: physics,
        ball: &tuning.ball,
        shot: &tuning.shot,
        radius: tuning.field.ball_radius,
        perturbation: Vec3::ZERO,
    };
    let ground = CollisionContext {
        params: physics,
        field: &tuning.field,
        ball: &tuning.ball,
        keeper: None,
    };

    let mut ghost = BallState::at_rest(position);
    ghost.velocity = velocity;

    for i in 1..=KEEPER_PREDICTION_MAX_STEPS {
        let previous = ghost.position;
        integrate(&mut ghost, &ctx, step);
        resolve_ground(&mut ghost, &ground);

        if ghost.position.z <= plane_z {
            let span = ghost.position.z - previous.z;
            let t = if span.abs() > f32::EPSILON {
                ((plane_z - previous.z) / span).clamp(0.0, 1.0)
            } else {
                1.0
            };
            return Some(ArrivalPrediction {
                point: previous.lerp(ghost.position, t),
                time: (i as f32 - 1.0 + t) * step,
            });
        }
        if ghost.velocity.z >= 0.0 {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;

    #[test]
    fn test_estimate_velocity() {
        let v = estimate_velocity(Vec3::new(0.0, 1.0, -5.0), Vec3::new(0.1, 1.1, -5.5), 0.1, 1.0);
        let v = v.unwrap();
        assert!((v - Vec3::new(1.0, 1.0, -5.0)).length() < 1e-4);
        assert!(estimate_velocity(Vec3::ZERO, Vec3::ONE, 0.0, 1.0).is_none());
    }

    #[test]
    fn test_straight_shot_arrives_centered() {
        let tuning = PenaltyTuning::default();
        let physics = PhysicsParams::for_difficulty(Difficulty::Medium);
        let prediction = predict_arrival(
            Vec3::new(0.0, 1.0, -5.0),
            Vec3::new(0.0, 3.0, -35.0),
            -18.0,
            &physics,
            &tuning,
            1.0 / 60.0,
        )
        .unwrap();
        assert!((prediction.point.z + 18.0).abs() < 1e-3);
        assert!(prediction.point.x.abs() < 0.05); // wind drift only
        assert!(prediction.point.y >= tuning.field.ball_radius);
        assert!(prediction.time > 0.3 && prediction.time < 2.0);
    }

    #[test]
    fn test_receding_ball_never_arrives() {
        let tuning = PenaltyTuning::default();
        let physics = PhysicsParams::default();
        let prediction = predict_arrival(
            Vec3::new(0.0, 1.0, -5.0),
            Vec3::new(0.0, 0.0, 10.0),
            -18.0,
            &physics,
            &tuning,
            1.0 / 60.0,
        );
        assert!(prediction.is_none());
    }

    #[test]
    fn test_weak_roll_stops_short() {
        let tuning = PenaltyTuning::default();
        let physics = PhysicsParams::for_difficulty(Difficulty::Hard);
        // Mass damping alone caps travel well short of 17 units
        let prediction = predict_arrival(
            Vec3::new(0.0, 0.11, -1.0),
            Vec3::new(0.0, 0.0, -5.0),
            -18.0,
            &physics,
            &tuning,
            1.0 / 60.0,
        );
        assert!(prediction.is_none());
    }
}
