//! TOML test file parsing

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Complete test definition from TOML file
#[derive(Debug, Deserialize)]
pub struct TestDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub setup: TestSetup,
    #[serde(default)]
    pub input: Vec<FrameInput>,
    pub expect: TestExpectations,
}

/// Test setup configuration
#[derive(Debug, Deserialize)]
pub struct TestSetup {
    /// easy, medium or hard
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    pub seed: Option<u64>,
    /// Pin every keeper draw to this value in [0, 1)
    pub keeper_roll: Option<f32>,
    #[serde(default)]
    pub hold_keeper: bool,
    /// Override the random spin range (0 = no spin)
    pub max_spin: Option<f32>,
    /// calm, simulated or wallclock
    #[serde(default = "default_weather")]
    pub weather: String,
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Stop after this many frames (default: last referenced frame + 60)
    pub frames: Option<u64>,
}

impl Default for TestSetup {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            seed: None,
            keeper_roll: None,
            hold_keeper: false,
            max_spin: None,
            weather: default_weather(),
            dt: default_dt(),
            frames: None,
        }
    }
}

fn default_difficulty() -> String {
    "medium".to_string()
}

fn default_weather() -> String {
    "calm".to_string()
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

/// Host actions applied before the step of `frame`
#[derive(Debug, Deserialize)]
pub struct FrameInput {
    pub frame: u64,
    pub shoot: Option<ShotInput>,
    #[serde(default)]
    pub reset: bool,
    pub difficulty: Option<String>,
}

/// A shot request in degrees and normalized power
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ShotInput {
    #[serde(default)]
    pub h: f32,
    #[serde(default)]
    pub v: f32,
    #[serde(default = "default_power")]
    pub power: f32,
}

fn default_power() -> f32 {
    1.0
}

/// Expected test outcomes
#[derive(Debug, Default, Deserialize)]
pub struct TestExpectations {
    #[serde(default)]
    pub sequence: Vec<ExpectedEvent>,
    /// Multiple state assertions at different frames (uses [[expect.state]] TOML syntax)
    #[serde(default)]
    pub state: Vec<StateAssertion>,
    /// Event names that must never appear
    #[serde(default)]
    pub forbid: Vec<String>,
}

/// Expected event in sequence
#[derive(Debug, Deserialize)]
pub struct ExpectedEvent {
    pub event: String,
    /// Miss reason, collision kind or dive direction
    pub detail: Option<String>,
    pub frame_min: Option<u64>,
    pub frame_max: Option<u64>,
}

/// State assertion after a frame has been stepped
#[derive(Debug, Clone, Deserialize)]
pub struct StateAssertion {
    pub after_frame: u64,
    #[serde(default)]
    pub checks: Vec<String>,
}

impl TestDefinition {
    /// Last frame the test needs to simulate
    pub fn last_frame(&self) -> u64 {
        if let Some(frames) = self.setup.frames {
            return frames;
        }
        let inputs = self.input.iter().map(|i| i.frame);
        let states = self.expect.state.iter().map(|s| s.after_frame);
        let events = self
            .expect
            .sequence
            .iter()
            .filter_map(|e| e.frame_max.or(e.frame_min));
        inputs.chain(states).chain(events).max().unwrap_or(0) + 60
    }
}

/// Parse a test file from path
pub fn parse_test_file(path: &Path) -> Result<TestDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}
