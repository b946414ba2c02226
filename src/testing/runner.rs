//! Scenario runner: drives `PenaltySim` directly at a fixed step

use super::assertions::{
    AssertionError, CapturedEvent, WorldState, check_forbidden, check_sequence, check_state,
};
use super::parser::{FrameInput, TestDefinition, TestSetup};
use crate::ai::FixedRoll;
use crate::ball::{CalmWeather, SimulatedWeather, WallClockWeather, Weather};
use crate::difficulty::Difficulty;
use crate::events::{PenaltyEvent, frame_events, shot_event};
use crate::sim::PenaltySim;
use crate::tuning::PenaltyTuning;

/// Result of running a test
#[derive(Debug)]
pub enum TestResult {
    Pass { frames: u64 },
    Fail { error: AssertionError },
    Error { message: String },
}

fn parse_difficulty(name: &str) -> Result<Difficulty, String> {
    name.parse()
}

fn build_sim(setup: &TestSetup) -> Result<PenaltySim, String> {
    let difficulty = parse_difficulty(&setup.difficulty)?;
    let mut tuning = PenaltyTuning::default();
    if let Some(max_spin) = setup.max_spin {
        tuning.shot.max_spin = max_spin.max(0.0);
    }

    let weather: Box<dyn Weather> = match setup.weather.as_str() {
        "calm" => Box::new(CalmWeather),
        "simulated" => Box::new(SimulatedWeather::default()),
        "wallclock" => Box::new(WallClockWeather),
        other => return Err(format!("Unknown weather '{}' (expected calm, simulated or wallclock)", other)),
    };

    let mut sim = PenaltySim::new(tuning, difficulty);
    if let Some(seed) = setup.seed {
        sim = sim.with_seed(seed);
    }
    sim = sim.with_weather(weather).hold_keeper(setup.hold_keeper);
    if let Some(roll) = setup.keeper_roll {
        sim = sim.with_keeper_random(Box::new(FixedRoll(roll.clamp(0.0, 1.0))));
    }
    Ok(sim)
}

fn apply_input(sim: &mut PenaltySim, input: &FrameInput, frame: u64, captured: &mut Vec<CapturedEvent>) -> Result<(), String> {
    let mut record = |event: PenaltyEvent| {
        captured.extend(CapturedEvent::from_penalty_event(frame, &event));
    };

    if let Some(name) = &input.difficulty {
        let difficulty = parse_difficulty(name)?;
        sim.set_difficulty(difficulty);
        record(PenaltyEvent::DifficultyChange { difficulty });
    }
    if input.reset {
        sim.reset();
        record(PenaltyEvent::Reset);
    }
    if let Some(shot) = input.shoot
        && sim.shoot(shot.h, shot.v, shot.power)
        && let Some(info) = sim.last_shot()
    {
        record(shot_event(info));
    }
    Ok(())
}

/// Run a single test and return the result.
///
/// Inputs for frame N are applied before step N; events from step N are
/// captured with frame N. Frames start at 1.
pub fn run_test(test: &TestDefinition) -> TestResult {
    let mut sim = match build_sim(&test.setup) {
        Ok(sim) => sim,
        Err(message) => return TestResult::Error { message },
    };

    let dt = test.setup.dt;
    if !(dt.is_finite() && dt > 0.0) {
        return TestResult::Error {
            message: format!("Invalid dt {}", dt),
        };
    }

    let last_frame = test.last_frame();
    let mut state_checks: Vec<_> = test.expect.state.iter().collect();
    state_checks.sort_by_key(|s| s.after_frame);
    let mut next_check = 0;

    let mut captured = Vec::new();
    for frame in 1..=last_frame {
        for input in test.input.iter().filter(|i| i.frame == frame) {
            if let Err(message) = apply_input(&mut sim, input, frame, &mut captured) {
                return TestResult::Error { message };
            }
        }

        let result = sim.step(dt);
        for event in frame_events(&result, sim.score()) {
            captured.extend(CapturedEvent::from_penalty_event(frame, &event));
        }

        while let Some(assertion) = state_checks.get(next_check)
            && assertion.after_frame <= frame
        {
            if let Err(error) = check_state(assertion, &WorldState::from_sim(&sim)) {
                return TestResult::Fail { error };
            }
            next_check += 1;
        }
    }

    if let Err(error) = check_sequence(&test.expect.sequence, &captured) {
        return TestResult::Fail { error };
    }
    if let Err(error) = check_forbidden(&test.expect.forbid, &captured) {
        return TestResult::Fail { error };
    }

    TestResult::Pass { frames: last_frame }
}
