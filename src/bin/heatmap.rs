//! Heatmap generator for the goal face
//!
//! Generates heatmaps per difficulty:
//! - **save** (default): expected keeper save probability at each point of the
//!   goal mouth, with the decision jitter held at its mean
//! - **score**: goal rate by aim, via seeded shots through the full simulation
//!
//! Usage:
//!   cargo run --bin heatmap                          # Save heatmaps, all difficulties
//!   cargo run --bin heatmap -- score                 # Monte Carlo goal rate by aim
//!   cargo run --bin heatmap -- score --samples 40 --steps 15
//!   cargo run --bin heatmap -- save --difficulty hard
//!
//! Outputs land in showcase/heatmaps as:
//!   heatmap_<type>_<difficulty>.png
//!   heatmap_<type>_<difficulty>.txt (x,y,value)

use image::{Rgb, RgbImage};
use rayon::prelude::*;
use std::fmt::Write as FmtWrite;
use std::fs;

use penaltykick::ai::expected_save_probability;
use penaltykick::difficulty::Difficulty;
use penaltykick::scoring::ShotOutcome;
use penaltykick::simulation::{ShotJob, SimConfig, grid_commands, run_shot};
use penaltykick::tuning::{PenaltyTuning, load_global_tuning};

const OUTPUT_DIR: &str = "showcase/heatmaps";
const CELL_SIZE: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
enum HeatmapKind {
    Save,
    Score,
}

impl HeatmapKind {
    fn label(&self) -> &'static str {
        match self {
            HeatmapKind::Save => "save",
            HeatmapKind::Score => "score",
        }
    }
}

struct HeatmapConfig {
    kind: HeatmapKind,
    difficulties: Vec<Difficulty>,
    /// Cells per axis
    steps: u32,
    /// Shots per cell for the score heatmap
    samples: u32,
    seed: u64,
}

fn parse_args() -> HeatmapConfig {
    let mut config = HeatmapConfig {
        kind: HeatmapKind::Save,
        difficulties: Difficulty::ALL.to_vec(),
        steps: 21,
        samples: 20,
        seed: 1,
    };
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "save" => config.kind = HeatmapKind::Save,
            "score" => config.kind = HeatmapKind::Score,
            "--difficulty" => match args.next().map(|v| v.parse::<Difficulty>()) {
                Some(Ok(d)) => config.difficulties = vec![d],
                Some(Err(e)) => eprintln!("Warning: {}", e),
                None => {}
            },
            "--steps" => {
                if let Some(v) = args.next().and_then(|v| v.parse().ok()) {
                    config.steps = v;
                }
            }
            "--samples" => {
                if let Some(v) = args.next().and_then(|v| v.parse().ok()) {
                    config.samples = v;
                }
            }
            "--seed" => {
                if let Some(v) = args.next().and_then(|v| v.parse().ok()) {
                    config.seed = v;
                }
            }
            other => eprintln!("Warning: ignoring unknown argument '{}'", other),
        }
    }
    config.steps = config.steps.clamp(2, 100);
    config.samples = config.samples.max(1);
    config
}

/// Row-major grid, row 0 at the top of the image
struct Grid {
    steps: u32,
    values: Vec<f32>,
    /// World (or aim) coordinates per cell
    coords: Vec<(f32, f32)>,
}

fn main() {
    let config = parse_args();
    if let Err(e) = fs::create_dir_all(OUTPUT_DIR) {
        eprintln!("Failed to create {}: {}", OUTPUT_DIR, e);
        std::process::exit(1);
    }

    let tuning = load_global_tuning();
    println!(
        "Generating {} heatmaps: {}x{} cells ({} pixels)",
        config.kind.label(),
        config.steps,
        config.steps,
        CELL_SIZE
    );

    for difficulty in &config.difficulties {
        let grid = match config.kind {
            HeatmapKind::Save => save_grid(&tuning, *difficulty, config.steps),
            HeatmapKind::Score => score_grid(&tuning, *difficulty, &config),
        };
        match write_heatmap(config.kind.label(), *difficulty, &grid) {
            Ok((image_path, data_path)) => println!("Saved {} and {}", image_path, data_path),
            Err(e) => eprintln!("Warning: {}", e),
        }
        report_stats(config.kind.label(), *difficulty, &grid.values);
    }
}

/// Expected save probability over the goal mouth (plus detection tolerance)
fn save_grid(tuning: &PenaltyTuning, difficulty: Difficulty, steps: u32) -> Grid {
    let field = &tuning.field;
    let params = tuning.difficulty.get(difficulty).keeper;
    let half_width = field.half_goal_width() + field.goal_detection_tolerance;
    let height = field.goal_height + field.goal_detection_tolerance;

    let mut values = Vec::with_capacity((steps * steps) as usize);
    let mut coords = Vec::with_capacity(values.capacity());
    for cy in 0..steps {
        let y = height * (1.0 - cy as f32 / (steps - 1) as f32);
        for cx in 0..steps {
            let x = -half_width + 2.0 * half_width * cx as f32 / (steps - 1) as f32;
            values.push(expected_save_probability(x, y, &params, field));
            coords.push((x, y));
        }
    }
    Grid { steps, values, coords }
}

/// Goal rate per aim over `samples` seeded shots
fn score_grid(tuning: &PenaltyTuning, difficulty: Difficulty, config: &HeatmapConfig) -> Grid {
    let sim_config = SimConfig {
        difficulty,
        quiet: true,
        ..Default::default()
    };
    // grid_commands runs bottom-up; flip rows so the top of the image is the highest aim
    let commands = grid_commands(&sim_config, config.steps);
    let steps = config.steps;
    let commands = &commands;
    let cells: Vec<_> = (0..steps)
        .rev()
        .flat_map(|row| (0..steps).map(move |col| commands[(row * steps + col) as usize]))
        .collect();

    let values: Vec<f32> = cells
        .par_iter()
        .map(|command| {
            let goals = (0..config.samples)
                .filter(|i| {
                    let job = ShotJob {
                        index: *i,
                        difficulty,
                        seed: config.seed.wrapping_add(*i as u64),
                        command: *command,
                    };
                    run_shot(&job, tuning, &sim_config).outcome == Some(ShotOutcome::Goal)
                })
                .count();
            goals as f32 / config.samples as f32
        })
        .collect();

    let coords = cells
        .iter()
        .map(|c| (c.horizontal_angle_deg, c.vertical_angle_deg))
        .collect();
    Grid { steps, values, coords }
}

fn write_heatmap(label: &str, difficulty: Difficulty, grid: &Grid) -> Result<(String, String), String> {
    let base_name = format!("heatmap_{}_{}", label, difficulty.name());
    let image_path = format!("{}/{}.png", OUTPUT_DIR, base_name);
    let data_path = format!("{}/{}.txt", OUTPUT_DIR, base_name);

    let size = grid.steps * CELL_SIZE;
    let mut img = RgbImage::new(size, size);
    let mut data = String::from("x,y,value\n");

    for cy in 0..grid.steps {
        for cx in 0..grid.steps {
            let i = (cy * grid.steps + cx) as usize;
            let value = grid.values[i].clamp(0.0, 1.0);
            fill_cell(&mut img, cx, cy, value_to_color(value));
            let (x, y) = grid.coords[i];
            let _ = writeln!(&mut data, "{:.2},{:.2},{:.3}", x, y, value);
        }
    }

    img.save(&image_path)
        .map_err(|e| format!("Failed to save {}: {}", image_path, e))?;
    fs::write(&data_path, data).map_err(|e| format!("Failed to write {}: {}", data_path, e))?;
    Ok((image_path, data_path))
}

fn report_stats(label: &str, difficulty: Difficulty, values: &[f32]) {
    if values.is_empty() {
        return;
    }
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    println!(
        "{:>6} {:>6}: min {:.3}  mean {:.3}  max {:.3}",
        label,
        difficulty.name(),
        min,
        mean,
        max
    );
}

/// Red -> Yellow -> Green gradient
fn value_to_color(value: f32) -> Rgb<u8> {
    let r = ((1.0 - value) * 2.0).min(1.0);
    let g = (value * 2.0).min(1.0);
    Rgb([(r * 255.0) as u8, (g * 255.0) as u8, 50])
}

/// Fill a cell with a solid color
fn fill_cell(img: &mut RgbImage, cx: u32, cy: u32, color: Rgb<u8>) {
    let x_start = cx * CELL_SIZE;
    let y_start = cy * CELL_SIZE;

    for dy in 0..CELL_SIZE {
        for dx in 0..CELL_SIZE {
            img.put_pixel(x_start + dx, y_start + dy, color);
        }
    }
}
