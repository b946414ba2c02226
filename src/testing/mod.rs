//! Scenario testing system for deterministic shot testing
//!
//! Runs TOML-scripted shots against the simulation core and checks the
//! resulting event sequence and state.

pub mod assertions;
pub mod parser;
pub mod runner;

pub use assertions::{AssertionError, CapturedEvent, WorldState, check_forbidden, check_sequence, check_state};
pub use parser::{ExpectedEvent, FrameInput, ShotInput, StateAssertion, TestDefinition, TestExpectations, TestSetup};
pub use runner::{TestResult, run_test};

/// Default path for test scenarios
pub const SCENARIOS_DIR: &str = "tests/scenarios";
