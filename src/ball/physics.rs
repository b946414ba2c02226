//! Shot conversion and per-tick force integration

use bevy::prelude::*;
use rand::Rng;

use crate::ball::components::BallState;
use crate::constants::{BALL_ROLL_FACTOR, FALLBACK_NORMAL, SHOT_ANGLE_SCALE};
use crate::difficulty::PhysicsParams;
use crate::shooting::ShotCommand;
use crate::tuning::{BallTuning, ShotTuning};

/// Launch speed for a normalized power, clamped to the shot speed range
pub fn shot_speed(power: f32, shot: &ShotTuning) -> f32 {
    (power * shot.max_shot_speed).clamp(shot.min_shot_speed, shot.max_shot_speed)
}

/// Initial velocity for a sanitized command. Forward is -z.
///
/// Aim units turn the shot by `SHOT_ANGLE_SCALE` radians each, so the +/-45
/// input range spans a quarter turn either side. The direction is normalized
/// before scaling, which keeps the launch speed equal to `shot_speed`.
pub fn shot_velocity(command: &ShotCommand, shot: &ShotTuning) -> Vec3 {
    let speed = shot_speed(command.power, shot);
    let h = command.horizontal_angle_deg * SHOT_ANGLE_SCALE;
    let v = command.vertical_angle_deg * SHOT_ANGLE_SCALE;
    Vec3::new(h.sin(), v.sin(), -h.cos()).normalize_or(FALLBACK_NORMAL) * speed
}

/// Random spin vector, each axis uniform in [-max_spin, max_spin]
pub fn sample_spin(rng: &mut impl Rng, max_spin: f32) -> Vec3 {
    if max_spin <= 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(
        rng.gen_range(-max_spin..=max_spin),
        rng.gen_range(-max_spin..=max_spin),
        rng.gen_range(-max_spin..=max_spin),
    )
}

/// Quadratic drag force opposing the velocity
pub fn drag_force(velocity: Vec3, radius: f32, ball: &BallTuning) -> Vec3 {
    let speed = velocity.length();
    if speed <= f32::EPSILON {
        return Vec3::ZERO;
    }
    let area = std::f32::consts::PI * radius * radius;
    let magnitude = 0.5 * ball.air_density * ball.drag_coefficient * area * speed * speed;
    -velocity / speed * magnitude
}

/// Magnus term: spin (x, y, z) pushes velocity along (y, -x, z)
pub fn magnus_delta(spin: Vec3, params: &PhysicsParams, ball: &BallTuning) -> Vec3 {
    Vec3::new(spin.y, -spin.x, spin.z) * params.spin_factor * ball.spin_scale
}

/// Inputs for one integration step
pub struct IntegrationContext<'a> {
    pub params: &'a PhysicsParams,
    pub ball: &'a BallTuning,
    pub shot: &'a ShotTuning,
    pub radius: f32,
    /// Environmental nudge sampled for this tick
    pub perturbation: Vec3,
}

/// Advance velocity and position by one tick.
///
/// Order: mass scaling, spin, drag, gravity, ground friction, environment and
/// wind, then position. Collision response runs after this returns.
pub fn integrate(state: &mut BallState, ctx: &IntegrationContext, dt: f32) {
    let params = ctx.params;

    state.velocity *= 1.0 / (1.0 + params.mass * ctx.ball.mass_damping);

    state.velocity += magnus_delta(state.spin, params, ctx.ball);

    let drag = drag_force(state.velocity, ctx.radius, ctx.ball);
    state.velocity += drag * params.air_resistance * ctx.ball.drag_damping;

    state.velocity.y -= params.gravity * dt;

    // Rolling friction while resting on the ground
    let on_ground = state.position.y <= ctx.radius + 1e-3 && state.velocity.y <= 0.0;
    if on_ground {
        let keep = (1.0 - params.friction_coefficient * dt).max(0.0);
        state.velocity.x *= keep;
        state.velocity.z *= keep;
    }

    state.velocity += ctx.perturbation;
    state.velocity += ctx.ball.wind() * params.wind_factor;

    state.position += state.velocity * dt * ctx.shot.speed_multiplier;
}

/// Cosmetic roll proportional to lateral velocity
pub fn apply_roll(state: &mut BallState, dt: f32) {
    state.roll_angle -= state.velocity.x * BALL_ROLL_FACTOR * dt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_shot_speed_clamped() {
        let shot = ShotTuning::default();
        assert_eq!(shot_speed(0.0, &shot), shot.min_shot_speed);
        assert_eq!(shot_speed(1.0, &shot), shot.max_shot_speed);
        assert_eq!(shot_speed(5.0, &shot), shot.max_shot_speed);
        assert_eq!(shot_speed(-1.0, &shot), shot.min_shot_speed);
        assert!((shot_speed(0.5, &shot) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_straight_shot_goes_forward() {
        let shot = ShotTuning::default();
        let v = shot_velocity(&ShotCommand::new(0.0, 0.0, 1.0), &shot);
        assert!(v.x.abs() < 1e-5);
        assert!(v.y.abs() < 1e-5);
        assert!((v.z + 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_launch_speed_matches_power() {
        let shot = ShotTuning::default();
        for (h, v, p) in [(15.0, 5.0, 0.2), (-22.5, 30.0, 0.9), (0.0, 44.5, 0.0), (45.0, 45.0, 1.0)] {
            let vel = shot_velocity(&ShotCommand::new(h, v, p), &shot);
            let speed = shot_speed(p, &shot);
            assert!((vel.length() - speed).abs() < 1e-3, "aim ({h}, {v}) gave {}", vel.length());
        }
    }

    #[test]
    fn test_aim_unit_turns_two_degrees() {
        let shot = ShotTuning::default();
        let v = shot_velocity(&ShotCommand::new(10.0, 0.0, 0.5), &shot);
        assert!(v.x > 0.0);
        assert!(v.z < 0.0);
        let heading = v.x.atan2(-v.z).to_degrees();
        assert!((heading - 20.0).abs() < 1e-3);

        // Full deflection is a quarter turn: straight along +x
        let v = shot_velocity(&ShotCommand::new(45.0, 0.0, 0.5), &shot);
        assert!(v.z.abs() < 1e-4);
        assert!((v.x - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_spin_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let s = sample_spin(&mut rng, 0.5);
            assert!(s.abs().max_element() <= 0.5);
        }
        assert_eq!(sample_spin(&mut rng, 0.0), Vec3::ZERO);
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let ball = BallTuning::default();
        let v = Vec3::new(3.0, 4.0, -20.0);
        let drag = drag_force(v, 0.11, &ball);
        assert!(drag.dot(v) < 0.0);
        assert_eq!(drag_force(Vec3::ZERO, 0.11, &ball), Vec3::ZERO);
    }

    #[test]
    fn test_integration_decelerates_and_falls() {
        let params = PhysicsParams::for_difficulty(Difficulty::Hard);
        let ball = BallTuning::default();
        let shot = ShotTuning::default();
        let ctx = IntegrationContext {
            params: &params,
            ball: &ball,
            shot: &shot,
            radius: 0.11,
            perturbation: Vec3::ZERO,
        };
        let mut state = BallState::at_rest(Vec3::new(0.0, 2.0, -1.0));
        state.velocity = Vec3::new(0.0, 0.0, -30.0);
        state.is_active = true;

        integrate(&mut state, &ctx, 1.0 / 60.0);
        assert!(state.velocity.z > -30.0);
        assert!(state.velocity.y < 0.0);
        assert!(state.position.z < -1.0);
        assert!(state.position.y < 2.0);
    }

    #[test]
    fn test_integration_is_deterministic() {
        let params = PhysicsParams::default();
        let ball = BallTuning::default();
        let shot = ShotTuning::default();
        let ctx = IntegrationContext {
            params: &params,
            ball: &ball,
            shot: &shot,
            radius: 0.11,
            perturbation: Vec3::new(0.001, 0.0, 0.002),
        };
        let mut a = BallState::at_rest(Vec3::new(0.0, 0.2, -1.0));
        a.velocity = Vec3::new(2.0, 5.0, -40.0);
        a.spin = Vec3::new(0.3, -0.2, 0.1);
        let mut b = a.clone();
        for _ in 0..20 {
            integrate(&mut a, &ctx, 1.0 / 60.0);
            integrate(&mut b, &ctx, 1.0 / 60.0);
        }
        assert_eq!(a.position, b.position);
        assert_eq!(a.velocity, b.velocity);
    }
}
