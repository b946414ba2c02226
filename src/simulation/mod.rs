//! Headless batch simulation for keeper tuning
//!
//! Plays many seeded shots against the goalkeeper without rendering,
//! aggregates outcome rates per difficulty and persists them.

mod app_builder;
mod config;
pub mod db;
mod metrics;
mod parallel;
mod runner;

pub use app_builder::HeadlessAppBuilder;
pub use config::{SIM_SETTINGS_FILE, SIM_SETTINGS_TEMPLATE, SimConfig, SimMode, print_help};
pub use db::SimDatabase;
pub use metrics::{DifficultySummary, ShotResult, SimReport};
pub use parallel::{init_parallel, run_shots_parallel};
pub use runner::{
    ShotJob, grid_commands, plan_shots, random_commands, run_shot, run_shots, run_simulation,
    write_event_logs,
};
