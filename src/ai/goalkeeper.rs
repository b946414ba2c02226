//! Goalkeeper agent: tracking, dive commitment and recovery
//!
//! State machine is Idle -> Diving -> Idle. Tracking lerps the keeper toward
//! a blend of the ball's x and its predicted arrival x. Once the ball passes
//! the trigger line inside the interception window the keeper rolls once for
//! a save, picks a dive target, holds still through its reaction time, then
//! dives. After the recovery window it is Idle again. One dive per shot.
//!
//! The roll settles the shot. A keeper that rolled a save follows the latest
//! prediction and is on the arrival point before the ball gets there. A keeper
//! that rolled a goal dives wrong and its body is out of play for the shot.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::ai::cache::{BoundedCache, quantize};
use crate::constants::{
    KEEPER_CACHE_POSITION_QUANTUM, KEEPER_CACHE_STEP_QUANTUM, KEEPER_CACHE_VELOCITY_QUANTUM,
    KEEPER_SAVE_DEADLINE, KEEPER_SAVE_REACTION_SHARE,
};
use crate::ai::decision::{
    DiveDirection, RandomSource, SaveDecision, decide_save, dive_direction,
    expected_save_probability,
};
use crate::ai::memory::{KeeperMemory, ShotMemory};
use crate::ai::prediction::{ArrivalPrediction, estimate_velocity, predict_arrival};
use crate::difficulty::{DifficultyProfile, GoalkeeperAiParams, PhysicsParams};
use crate::scoring::ShotOutcome;
use crate::tuning::PenaltyTuning;

/// Marker for the keeper entity spawned by the plugin
#[derive(Component)]
pub struct Goalkeeper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeeperStatus {
    #[default]
    Idle,
    Diving,
}

/// Published keeper state
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct GoalkeeperState {
    /// Feet, centered
    pub position: Vec3,
    pub status: KeeperStatus,
    pub dive_direction: DiveDirection,
    /// Probability rolled against on the last dive, in [0, 1]
    pub save_probability: f32,
}

/// What the keeper sees of the ball this tick
#[derive(Debug, Clone, Copy)]
pub struct BallSnapshot {
    pub position: Vec3,
    pub active: bool,
}

#[derive(Debug, Clone, Copy)]
struct DivePlan {
    target: Vec3,
    elapsed: f32,
    /// Seconds held still before moving
    reaction: f32,
    /// Elapsed time by which a save dive must be on target
    deadline: Option<f32>,
}

/// Quantized position, velocity and prediction step
type PredictionKey = [i32; 7];

pub struct GoalkeeperAgent {
    state: GoalkeeperState,
    params: GoalkeeperAiParams,
    physics: PhysicsParams,
    observations: VecDeque<Vec3>,
    velocity_estimate: Option<Vec3>,
    prediction: Option<ArrivalPrediction>,
    dive: Option<DivePlan>,
    committed: bool,
    last_decision: Option<SaveDecision>,
    frozen: bool,
    predictions: BoundedCache<PredictionKey, Option<ArrivalPrediction>>,
    save_odds: BoundedCache<(i32, i32), f32>,
    memory: KeeperMemory,
    rng: Box<dyn RandomSource>,
}

impl GoalkeeperAgent {
    pub fn new(tuning: &PenaltyTuning, profile: &DifficultyProfile, rng: Box<dyn RandomSource>) -> Self {
        let keeper = &tuning.keeper;
        Self {
            state: GoalkeeperState {
                position: tuning.field.keeper_start(),
                status: KeeperStatus::Idle,
                dive_direction: DiveDirection::Center,
                save_probability: 0.0,
            },
            params: profile.keeper,
            physics: profile.physics,
            observations: VecDeque::with_capacity(keeper.observation_buffer),
            velocity_estimate: None,
            prediction: None,
            dive: None,
            committed: false,
            last_decision: None,
            frozen: false,
            predictions: BoundedCache::new(keeper.cache_size),
            save_odds: BoundedCache::new(keeper.cache_size),
            memory: KeeperMemory::new(keeper.history_max),
            rng,
        }
    }

    pub fn state(&self) -> &GoalkeeperState {
        &self.state
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn status(&self) -> KeeperStatus {
        self.state.status
    }

    pub fn prediction(&self) -> Option<ArrivalPrediction> {
        self.prediction
    }

    pub fn last_decision(&self) -> Option<SaveDecision> {
        self.last_decision
    }

    pub fn memory(&self) -> &KeeperMemory {
        &self.memory
    }

    pub fn params(&self) -> &GoalkeeperAiParams {
        &self.params
    }

    /// Hold the keeper in place (no tracking, no dives)
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// True once this shot's roll went against the keeper. The ball is not
    /// tested against the keeper's body for the rest of the shot.
    pub fn concedes(&self) -> bool {
        self.committed && self.last_decision.is_some_and(|d| !d.will_save)
    }

    pub fn set_random_source(&mut self, rng: Box<dyn RandomSource>) {
        self.rng = rng;
    }

    /// Swap parameter sets; cached predictions no longer apply
    pub fn set_profile(&mut self, profile: &DifficultyProfile) {
        self.params = profile.keeper;
        self.physics = profile.physics;
        self.predictions.clear();
        self.save_odds.clear();
    }

    /// Back to the line, Idle, ready for a new shot
    pub fn reset(&mut self, tuning: &PenaltyTuning) {
        self.state.position = tuning.field.keeper_start();
        self.state.status = KeeperStatus::Idle;
        self.state.dive_direction = DiveDirection::Center;
        self.state.save_probability = 0.0;
        self.observations.clear();
        self.velocity_estimate = None;
        self.prediction = None;
        self.dive = None;
        self.committed = false;
        self.last_decision = None;
    }

    pub fn record_outcome(&mut self, outcome: ShotOutcome) {
        self.memory.record(ShotMemory {
            outcome,
            direction: self.last_decision.map(|d| d.direction),
            save_probability: self.last_decision.map(|d| d.probability),
        });
    }

    /// Advance one tick. Returns the save decision on the tick the keeper commits.
    pub fn update(&mut self, ball: BallSnapshot, dt: f32, tuning: &PenaltyTuning) -> Option<SaveDecision> {
        if self.frozen {
            return None;
        }
        let dt = dt.max(0.0);

        self.observe(ball, dt, tuning);

        match self.state.status {
            KeeperStatus::Idle => {
                self.track(ball, tuning);
                if self.should_commit(ball, tuning) {
                    return Some(self.commit(ball, tuning));
                }
                None
            }
            KeeperStatus::Diving => {
                self.advance_dive(ball, dt, tuning);
                None
            }
        }
    }

    fn observe(&mut self, ball: BallSnapshot, dt: f32, tuning: &PenaltyTuning) {
        if !ball.active {
            self.observations.clear();
            self.velocity_estimate = None;
            self.prediction = None;
            return;
        }

        if self.observations.len() >= tuning.keeper.observation_buffer {
            self.observations.pop_front();
        }
        self.observations.push_back(ball.position);

        let n = self.observations.len();
        if n < 2 {
            return;
        }
        let previous = self.observations[n - 2];
        let current = self.observations[n - 1];
        self.velocity_estimate = estimate_velocity(previous, current, dt, tuning.shot.speed_multiplier);

        self.prediction = match self.velocity_estimate {
            Some(velocity) => {
                let key = [
                    quantize(current.x, KEEPER_CACHE_POSITION_QUANTUM),
                    quantize(current.y, KEEPER_CACHE_POSITION_QUANTUM),
                    quantize(current.z, KEEPER_CACHE_POSITION_QUANTUM),
                    quantize(velocity.x, KEEPER_CACHE_VELOCITY_QUANTUM),
                    quantize(velocity.y, KEEPER_CACHE_VELOCITY_QUANTUM),
                    quantize(velocity.z, KEEPER_CACHE_VELOCITY_QUANTUM),
                    quantize(dt, KEEPER_CACHE_STEP_QUANTUM),
                ];
                let physics = self.physics;
                let plane_z = tuning.field.keeper_start_z;
                self.predictions.get_or_insert_with(key, || {
                    predict_arrival(current, velocity, plane_z, &physics, tuning, dt)
                })
            }
            None => None,
        };
    }

    fn track(&mut self, ball: BallSnapshot, tuning: &PenaltyTuning) {
        let field = &tuning.field;
        let predicted_x = self.prediction.map(|p| p.point.x).unwrap_or(ball.position.x);
        let variance = self.params.prediction_variance.clamp(0.0, 1.0);
        let target_x = (ball.position.x * variance + predicted_x * (1.0 - variance))
            .clamp(-field.keeper_move_range_x, field.keeper_move_range_x);

        let lerp = tuning.keeper.lerp_factor;
        let position = &mut self.state.position;
        position.x += (target_x - position.x) * lerp;
        position.y += (0.0 - position.y) * lerp;
    }

    fn should_commit(&self, ball: BallSnapshot, tuning: &PenaltyTuning) -> bool {
        if !ball.active || self.committed {
            return false;
        }
        let approaching = self.velocity_estimate.is_some_and(|v| v.z < 0.0);
        let window = tuning.field.half_goal_width() + tuning.keeper.intercept_margin;
        approaching && ball.position.z < tuning.keeper.dive_trigger_z && ball.position.x.abs() <= window
    }

    fn commit(&mut self, ball: BallSnapshot, tuning: &PenaltyTuning) -> SaveDecision {
        let field = &tuning.field;
        let point = self.prediction.map(|p| p.point).unwrap_or(ball.position);

        let direction = dive_direction(point.x, point.y, &tuning.keeper);
        let params = self.params;
        let odds_key = (
            quantize(point.x, KEEPER_CACHE_POSITION_QUANTUM),
            quantize(point.y, KEEPER_CACHE_POSITION_QUANTUM),
        );
        let expected = self
            .save_odds
            .get_or_insert_with(odds_key, || expected_save_probability(point.x, point.y, &params, field));
        let decision = decide_save(expected, direction, tuning.keeper.save_jitter, self.rng.as_mut());

        let range_x = field.keeper_move_range_x;
        let mut reaction = self.params.reaction_time.max(0.0);
        let mut deadline = None;
        let target = if decision.will_save {
            // Be on the point before the ball reaches the box
            if let Some(arrival) = self.prediction {
                let by = arrival.time * KEEPER_SAVE_DEADLINE;
                reaction = reaction.min(by * KEEPER_SAVE_REACTION_SHARE);
                deadline = Some(by);
            }
            save_target(point, tuning)
        } else {
            // Wrong way: clear of the ball by a body width
            let offset = field.keeper_width + 2.0 * field.ball_radius;
            let side = if decision.roll < 0.5 { -1.0 } else { 1.0 };
            let mut x = point.x + side * offset;
            if x.abs() > range_x {
                x = point.x - side * offset;
            }
            Vec3::new(x.clamp(-range_x, range_x), 0.0, field.keeper_start_z)
        };

        debug!(
            "Keeper commits {} (p={:.2}, roll={:.2}, save={})",
            direction.name(),
            decision.probability,
            decision.roll,
            decision.will_save
        );

        self.state.status = KeeperStatus::Diving;
        self.state.dive_direction = direction;
        self.state.save_probability = decision.probability;
        self.dive = Some(DivePlan {
            target,
            elapsed: 0.0,
            reaction,
            deadline,
        });
        self.committed = true;
        self.last_decision = Some(decision);
        decision
    }

    fn advance_dive(&mut self, ball: BallSnapshot, dt: f32, tuning: &PenaltyTuning) {
        let Some(mut plan) = self.dive else {
            self.state.status = KeeperStatus::Idle;
            return;
        };
        plan.elapsed += dt;

        let saving = self.last_decision.is_some_and(|d| d.will_save);
        let latest = if saving && ball.active { self.prediction } else { None };
        if let Some(arrival) = latest {
            plan.target = save_target(arrival.point, tuning);
        }

        if plan.elapsed >= plan.reaction {
            let lerp = tuning.keeper.dive_lerp_factor;
            let step = match plan.deadline {
                Some(deadline) => {
                    let remaining = deadline - plan.elapsed;
                    if remaining <= dt { 1.0 } else { (dt / remaining).max(lerp) }
                }
                None => lerp,
            };
            self.state.position += (plan.target - self.state.position) * step;
        }

        if plan.elapsed >= plan.reaction + tuning.keeper.recovery_time {
            self.state.status = KeeperStatus::Idle;
            self.dive = None;
        } else {
            self.dive = Some(plan);
        }
    }
}

/// Keeper anchor that puts the middle of its box on `point`, within reach
fn save_target(point: Vec3, tuning: &PenaltyTuning) -> Vec3 {
    let field = &tuning.field;
    let range_x = field.keeper_move_range_x;
    Vec3::new(
        point.x.clamp(-range_x, range_x),
        (point.y - field.keeper_height / 2.0).clamp(0.0, field.keeper_move_range_y),
        field.keeper_start_z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::decision::FixedRoll;
    use crate::difficulty::Difficulty;

    const DT: f32 = 1.0 / 60.0;

    fn agent(difficulty: Difficulty, roll: f32) -> (GoalkeeperAgent, PenaltyTuning) {
        let tuning = PenaltyTuning::default();
        let profile = *tuning.difficulty.get(difficulty);
        let agent = GoalkeeperAgent::new(&tuning, &profile, Box::new(FixedRoll(roll)));
        (agent, tuning)
    }

    /// Feed a straight-line approach and return the decision, if any
    fn approach(agent: &mut GoalkeeperAgent, tuning: &PenaltyTuning, x: f32, y: f32) -> Option<SaveDecision> {
        let mut decision = None;
        for i in 0..30 {
            let z = -1.0 - i as f32 * 0.5;
            let ball = BallSnapshot {
                position: Vec3::new(x, y, z),
                active: true,
            };
            if let Some(d) = agent.update(ball, DT, tuning) {
                decision = Some(d);
            }
        }
        decision
    }

    #[test]
    fn test_idle_until_trigger_line() {
        let (mut keeper, tuning) = agent(Difficulty::Medium, 0.0);
        for i in 0..10 {
            let ball = BallSnapshot {
                position: Vec3::new(1.0, 0.5, -1.0 - i as f32 * 0.5),
                active: true,
            };
            assert!(keeper.update(ball, DT, &tuning).is_none());
        }
        assert_eq!(keeper.status(), KeeperStatus::Idle);
    }

    #[test]
    fn test_commits_once_per_shot() {
        let (mut keeper, tuning) = agent(Difficulty::Hard, 0.0);
        let decision = approach(&mut keeper, &tuning, 1.0, 0.5).unwrap();
        assert!(decision.will_save);
        assert_eq!(keeper.status(), KeeperStatus::Diving);
        assert_eq!(decision.direction, DiveDirection::Right);
        // Further approach ticks do not re-roll
        assert!(approach(&mut keeper, &tuning, 1.0, 0.5).is_none());
    }

    #[test]
    fn test_no_commit_outside_window() {
        let (mut keeper, tuning) = agent(Difficulty::Hard, 0.0);
        assert!(approach(&mut keeper, &tuning, 8.0, 0.5).is_none());
        assert_eq!(keeper.status(), KeeperStatus::Idle);
    }

    #[test]
    fn test_tracking_stays_in_range() {
        let (mut keeper, tuning) = agent(Difficulty::Easy, 0.0);
        for _ in 0..200 {
            let ball = BallSnapshot {
                position: Vec3::new(15.0, 0.11, -1.0),
                active: false,
            };
            keeper.update(ball, DT, &tuning);
        }
        let x = keeper.position().x;
        assert!(x <= tuning.field.keeper_move_range_x + 1e-4);
        assert!(x > 3.0);
    }

    #[test]
    fn test_save_dive_reaches_target_after_reaction() {
        let (mut keeper, tuning) = agent(Difficulty::Hard, 0.0);
        approach(&mut keeper, &tuning, 2.0, 1.2).unwrap();
        let idle = BallSnapshot {
            position: Vec3::new(2.0, 1.2, -17.0),
            active: true,
        };
        for _ in 0..40 {
            keeper.update(idle, DT, &tuning);
        }
        let pos = keeper.position();
        assert!((pos.x - 2.0).abs() < 0.2);
        assert!(pos.y >= 0.0 && pos.y <= tuning.field.keeper_move_range_y);
        assert_eq!(keeper.status(), KeeperStatus::Diving);
    }

    #[test]
    fn test_failed_dive_goes_wrong_way() {
        let (mut keeper, tuning) = agent(Difficulty::Hard, 0.99);
        let decision = approach(&mut keeper, &tuning, 0.0, 0.5).unwrap();
        assert!(!decision.will_save);
        let ball = BallSnapshot {
            position: Vec3::new(0.0, 0.5, -17.0),
            active: true,
        };
        for _ in 0..60 {
            keeper.update(ball, DT, &tuning);
        }
        let clearance = tuning.field.keeper_width / 2.0 + tuning.field.ball_radius;
        assert!(keeper.position().x.abs() > clearance);
    }

    /// Straight approach at 30 units/s that stops short of the keeper.
    /// Returns the keeper position on the commit tick.
    fn commit_then_follow(
        keeper: &mut GoalkeeperAgent,
        tuning: &PenaltyTuning,
        x: f32,
        y: f32,
        ticks_after: usize,
    ) -> Vec3 {
        let mut z = -1.0;
        let mut at_commit = None;
        let mut after = 0;
        while after < ticks_after {
            let ball = BallSnapshot {
                position: Vec3::new(x, y, z),
                active: true,
            };
            let decision = keeper.update(ball, DT, tuning);
            if at_commit.is_some() {
                after += 1;
            } else if decision.is_some() {
                at_commit = Some(keeper.position());
            } else {
                assert!(z > -17.0, "keeper never committed");
            }
            z = (z - 0.5).max(-17.5);
        }
        at_commit.unwrap()
    }

    #[test]
    fn test_failed_roll_holds_still_through_reaction() {
        let (mut keeper, tuning) = agent(Difficulty::Hard, 0.99);
        // Half the hard keeper's reaction time
        let at_commit = commit_then_follow(&mut keeper, &tuning, 1.0, 0.5, 6);
        assert!(keeper.concedes());
        assert_eq!(keeper.position(), at_commit);
    }

    #[test]
    fn test_saving_keeper_beats_its_reaction_time() {
        // Easy reacts in 0.5 s, longer than this ball takes to arrive
        let (mut keeper, tuning) = agent(Difficulty::Easy, 0.0);
        commit_then_follow(&mut keeper, &tuning, 1.5, 1.8, 1);
        assert!(keeper.last_decision().unwrap().will_save);
        let arrival = keeper.prediction().unwrap();
        assert!(arrival.time < keeper.params().reaction_time);
        assert!(!keeper.concedes());

        for _ in 0..30 {
            let ball = BallSnapshot {
                position: Vec3::new(1.5, 1.8, -17.5),
                active: true,
            };
            keeper.update(ball, DT, &tuning);
        }
        let pos = keeper.position();
        assert!((pos.x - 1.5).abs() < 0.1);
        assert!(pos.y > 0.5);
        assert_eq!(keeper.status(), KeeperStatus::Diving);
    }

    #[test]
    fn test_prediction_cache_keys_on_tick_size() {
        let (mut keeper, tuning) = agent(Difficulty::Medium, 0.5);
        let end = Vec3::new(0.0, 1.0, -5.0);
        let mut predict_with = |dt: f32| {
            keeper.reset(&tuning);
            // Same end state, 30 units/s, sampled at this tick size
            for i in (0..3).rev() {
                let ball = BallSnapshot {
                    position: end + Vec3::Z * (30.0 * dt * i as f32),
                    active: true,
                };
                keeper.update(ball, dt, &tuning);
            }
            keeper.prediction().unwrap()
        };

        let coarse_dt = 1.0 / 30.0;
        let fine = predict_with(1.0 / 60.0);
        let coarse = predict_with(coarse_dt);
        assert_ne!(fine.time, coarse.time);

        // Computed fresh at the coarse step, not served from the fine entry
        let previous = end + Vec3::Z * (30.0 * coarse_dt * 1.0);
        let velocity = estimate_velocity(previous, end, coarse_dt, tuning.shot.speed_multiplier).unwrap();
        let physics = PhysicsParams::for_difficulty(Difficulty::Medium);
        let expected = predict_arrival(end, velocity, tuning.field.keeper_start_z, &physics, &tuning, coarse_dt);
        assert_eq!(Some(coarse), expected);
    }

    #[test]
    fn test_recovers_to_idle() {
        let (mut keeper, tuning) = agent(Difficulty::Medium, 0.0);
        approach(&mut keeper, &tuning, -1.0, 0.5).unwrap();
        let ball = BallSnapshot {
            position: Vec3::new(-1.0, 0.11, -19.0),
            active: false,
        };
        let ticks = ((0.3 + tuning.keeper.recovery_time) / DT) as usize + 5;
        for _ in 0..ticks {
            keeper.update(ball, DT, &tuning);
        }
        assert_eq!(keeper.status(), KeeperStatus::Idle);
    }

    #[test]
    fn test_frozen_keeper_holds() {
        let (mut keeper, tuning) = agent(Difficulty::Hard, 0.0);
        keeper.set_frozen(true);
        assert!(approach(&mut keeper, &tuning, 2.0, 0.5).is_none());
        assert_eq!(keeper.position(), tuning.field.keeper_start());
    }

    #[test]
    fn test_reset_restores_start() {
        let (mut keeper, tuning) = agent(Difficulty::Hard, 0.0);
        approach(&mut keeper, &tuning, 2.0, 0.5);
        keeper.reset(&tuning);
        assert_eq!(keeper.position(), tuning.field.keeper_start());
        assert_eq!(keeper.status(), KeeperStatus::Idle);
        assert!(keeper.last_decision().is_none());
    }

    #[test]
    fn test_memory_records_outcomes() {
        let (mut keeper, tuning) = agent(Difficulty::Hard, 0.0);
        approach(&mut keeper, &tuning, 0.0, 0.5);
        keeper.record_outcome(ShotOutcome::Save);
        keeper.reset(&tuning);
        keeper.record_outcome(ShotOutcome::Goal);
        assert_eq!(keeper.memory().len(), 2);
        assert!((keeper.memory().prediction_accuracy() - 0.5).abs() < 1e-6);
    }
}
