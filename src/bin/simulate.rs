//! Penalty Simulation Tool - Headless shot batches for keeper tuning
//!
//! Plays seeded shots against the goalkeeper without rendering to collect
//! goal, save and miss rates per difficulty.
//!
//! Usage:
//!   cargo run --bin simulate -- --help
//!   cargo run --bin simulate -- --shots 500 --difficulty hard
//!   cargo run --bin simulate -- --sweep 1000 --parallel 8 --db results.db
//!   cargo run --bin simulate -- --grid 15 --hold-keeper

use penaltykick::simulation::{SimConfig, run_simulation};

fn main() {
    let config = SimConfig::from_args();
    run_simulation(config);
}
