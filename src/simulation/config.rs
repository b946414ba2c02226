//! Simulation configuration

use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;

/// Simulation mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimMode {
    /// Random shots against one difficulty
    Batch { shots: u32 },
    /// The same random shot plan against every difficulty
    Sweep { shots_per_difficulty: u32 },
    /// Every aim on a grid over the shooting range, full power
    AimGrid { steps: u32 },
}

impl Default for SimMode {
    fn default() -> Self {
        SimMode::Batch { shots: 100 }
    }
}

/// Configuration for a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub mode: SimMode,
    /// Difficulty for Batch and AimGrid
    pub difficulty: Difficulty,
    /// RNG seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Horizontal aim drawn from [-h, h] aim units
    pub max_horizontal_deg: f32,
    /// Vertical aim drawn from [0, v] aim units
    pub max_vertical_deg: f32,
    /// Power drawn from [min_power, 1]
    pub min_power: f32,
    /// Simulated tick length (seconds)
    pub tick: f32,
    /// Give up on a shot after this many ticks
    pub max_ticks: u32,
    /// Keeper stands still on its line
    pub hold_keeper: bool,
    /// Output file path (None = stdout)
    pub output_file: Option<String>,
    /// Suppress progress output
    pub quiet: bool,
    /// Number of parallel threads (0 = sequential, N = N threads)
    pub parallel: usize,
    /// Path to SQLite database for storing results
    pub db_path: Option<String>,
    /// Write each shot's event log into this directory
    pub evlog_dir: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mode: SimMode::default(),
            difficulty: Difficulty::Medium,
            seed: None,
            max_horizontal_deg: 6.0,
            max_vertical_deg: 6.0,
            min_power: 0.5,
            tick: 1.0 / 60.0,
            max_ticks: 600,
            hold_keeper: false,
            output_file: None,
            quiet: false,
            parallel: 0, // Sequential by default
            db_path: None,
            evlog_dir: None,
        }
    }
}

/// Template simulation settings (checked into git)
pub const SIM_SETTINGS_TEMPLATE: &str = "config/simulation_settings.template.json";
/// Local simulation settings (gitignored, user's custom settings)
pub const SIM_SETTINGS_FILE: &str = "config/simulation_settings.json";

impl SimConfig {
    /// Load configuration from a JSON settings file
    pub fn from_file(path: &str) -> Result<Self, String> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
    }

    /// Load configuration from default config files
    /// Priority: local settings > template settings > built-in defaults
    pub fn from_config_files() -> Self {
        if let Ok(config) = Self::from_file(SIM_SETTINGS_FILE) {
            return config;
        }
        if let Ok(config) = Self::from_file(SIM_SETTINGS_TEMPLATE) {
            return config;
        }
        Self::default()
    }

    /// Parse configuration from the process command line
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        if args.iter().any(|a| a == "--help" || a == "-h") {
            print_help();
            std::process::exit(0);
        }
        Self::from_arg_list(Self::from_config_files(), &args)
    }

    /// Apply `--settings` and CLI overrides on top of `base`.
    /// `args[0]` is the program name.
    pub fn from_arg_list(base: Self, args: &[String]) -> Self {
        let mut config = base;

        // Explicit settings file replaces the base before overrides apply
        if let Some(path) = args
            .iter()
            .position(|a| a == "--settings")
            .and_then(|i| args.get(i + 1))
        {
            match Self::from_file(path) {
                Ok(loaded) => config = loaded,
                Err(e) => eprintln!("Warning: {}", e),
            }
        }

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1);
            let takes_value = match args[i].as_str() {
                "--settings" => true,
                "--shots" => {
                    if let Some(v) = value {
                        config.mode = SimMode::Batch {
                            shots: v.parse().unwrap_or(100),
                        };
                    }
                    true
                }
                "--sweep" => {
                    let shots = match value {
                        Some(v) if !v.starts_with('-') => {
                            i += 1;
                            v.parse().unwrap_or(100)
                        }
                        _ => 100,
                    };
                    config.mode = SimMode::Sweep {
                        shots_per_difficulty: shots,
                    };
                    false
                }
                "--grid" => {
                    let steps = match value {
                        Some(v) if !v.starts_with('-') => {
                            i += 1;
                            v.parse().unwrap_or(9)
                        }
                        _ => 9,
                    };
                    config.mode = SimMode::AimGrid { steps };
                    false
                }
                "--difficulty" => {
                    if let Some(v) = value {
                        match v.parse() {
                            Ok(d) => config.difficulty = d,
                            Err(e) => eprintln!("Warning: {}", e),
                        }
                    }
                    true
                }
                "--seed" => {
                    if let Some(v) = value {
                        config.seed = v.parse().ok();
                    }
                    true
                }
                "--max-h" => {
                    if let Some(v) = value {
                        config.max_horizontal_deg = v.parse().unwrap_or(config.max_horizontal_deg);
                    }
                    true
                }
                "--max-v" => {
                    if let Some(v) = value {
                        config.max_vertical_deg = v.parse().unwrap_or(config.max_vertical_deg);
                    }
                    true
                }
                "--min-power" => {
                    if let Some(v) = value {
                        config.min_power = v.parse().unwrap_or(config.min_power);
                    }
                    true
                }
                "--hold-keeper" => {
                    config.hold_keeper = true;
                    false
                }
                "--output" => {
                    if let Some(v) = value {
                        config.output_file = Some(v.clone());
                    }
                    true
                }
                "--quiet" | "-q" => {
                    config.quiet = true;
                    false
                }
                "--parallel" => {
                    if let Some(v) = value {
                        config.parallel = v.parse().unwrap_or(0);
                    }
                    true
                }
                "--db" => {
                    if let Some(v) = value {
                        config.db_path = Some(v.clone());
                    }
                    true
                }
                "--evlog" => {
                    if let Some(v) = value {
                        config.evlog_dir = Some(v.clone());
                    }
                    true
                }
                other => {
                    eprintln!("Warning: ignoring unknown argument '{}'", other);
                    false
                }
            };
            i += if takes_value { 2 } else { 1 };
        }

        config
    }
}

pub fn print_help() {
    println!(
        r#"Penalty Simulation Tool - Headless shot batches for keeper tuning

USAGE:
    cargo run --bin simulate -- [OPTIONS]

OPTIONS:
    --settings <FILE>     Load settings from JSON file (CLI args override file settings)
    --shots <N>           Run N random shots at one difficulty (default mode, 100)
    --sweep [N]           Run N random shots at every difficulty (default: 100)
    --grid [N]            Shoot an N x N aim grid at full power (default: 9)
    --difficulty <D>      easy, medium or hard (default: medium)
    --seed <N>            RNG seed for reproducibility
    --max-h <UNITS>       Horizontal aim range, +/- aim units (default: 6)
    --max-v <UNITS>       Vertical aim range, 0..UNITS (default: 6)
    --min-power <P>       Lowest random power in [0, 1] (default: 0.5)
    --hold-keeper         Keeper stays on its line
    --output <FILE>       Output JSON to file (default: stdout)
    --quiet, -q           Suppress progress output
    --parallel <N>        Run shots in parallel with N threads
    --db <FILE>           Store results in SQLite database
    --evlog <DIR>         Write one .evlog per shot into DIR
    --help, -h            Show this help

EXAMPLES:
    # 500 shots against the hard keeper
    cargo run --bin simulate -- --shots 500 --difficulty hard --seed 7

    # Compare difficulties on the same shot plan, in parallel, stored in SQLite
    cargo run --bin simulate -- --sweep 1000 --parallel 8 --db results.db

    # Where does an unmoving keeper get beaten?
    cargo run --bin simulate -- --grid 15 --hold-keeper --output grid.json

SETTINGS FILE FORMAT (JSON):
    {{
      "mode": {{ "Sweep": {{ "shots_per_difficulty": 200 }} }},
      "seed": 42,
      "parallel": 8
    }}
"#
    );
}
