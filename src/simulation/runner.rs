//! Batch shot runner
//!
//! Plays planned shots against a fresh `PenaltySim` each, without a Bevy app.
//! The pure core is stepped directly at `SimConfig::tick`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::difficulty::Difficulty;
use crate::events::{EventBuffer, PenaltyEvent, SessionConfig, frame_events, serialize_event, shot_event};
use crate::shooting::ShotCommand;
use crate::sim::PenaltySim;
use crate::tuning::{PenaltyTuning, load_global_tuning};

use super::config::{SimConfig, SimMode};
use super::db::SimDatabase;
use super::metrics::{ShotResult, SimReport};
use super::parallel::{init_parallel, run_shots_parallel};

/// One planned shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotJob {
    pub index: u32,
    pub difficulty: Difficulty,
    pub seed: u64,
    pub command: ShotCommand,
}

/// Random shot commands within the configured aim and power ranges
pub fn random_commands(config: &SimConfig, count: u32, seed: u64) -> Vec<ShotCommand> {
    let mut rng = StdRng::seed_from_u64(seed);
    let min_power = config.min_power.clamp(0.0, 1.0);
    (0..count)
        .map(|_| {
            let h = (rng.r#gen::<f32>() * 2.0 - 1.0) * config.max_horizontal_deg;
            let v = rng.r#gen::<f32>() * config.max_vertical_deg;
            let power = min_power + rng.r#gen::<f32>() * (1.0 - min_power);
            ShotCommand::new(h, v, power)
        })
        .collect()
}

/// `steps` x `steps` full-power aims covering the shooting range
pub fn grid_commands(config: &SimConfig, steps: u32) -> Vec<ShotCommand> {
    let steps = steps.max(1);
    let fraction = |i: u32| {
        if steps == 1 {
            0.5
        } else {
            i as f32 / (steps - 1) as f32
        }
    };
    let mut commands = Vec::with_capacity((steps * steps) as usize);
    for row in 0..steps {
        let v = fraction(row) * config.max_vertical_deg;
        for col in 0..steps {
            let h = (fraction(col) * 2.0 - 1.0) * config.max_horizontal_deg;
            commands.push(ShotCommand::new(h, v, 1.0));
        }
    }
    commands
}

/// Expand the configured mode into shot jobs.
/// A sweep replays the same commands and seeds against every difficulty.
pub fn plan_shots(config: &SimConfig, base_seed: u64) -> Vec<ShotJob> {
    let jobs_for = |difficulty: Difficulty, commands: &[ShotCommand], offset: u32| {
        commands
            .iter()
            .enumerate()
            .map(move |(i, command)| ShotJob {
                index: offset + i as u32,
                difficulty,
                seed: base_seed.wrapping_add(i as u64 + 1),
                command: *command,
            })
            .collect::<Vec<_>>()
    };

    match config.mode {
        SimMode::Batch { shots } => {
            jobs_for(config.difficulty, &random_commands(config, shots, base_seed), 0)
        }
        SimMode::Sweep { shots_per_difficulty } => {
            let commands = random_commands(config, shots_per_difficulty, base_seed);
            Difficulty::ALL
                .iter()
                .enumerate()
                .flat_map(|(d, difficulty)| {
                    jobs_for(*difficulty, &commands, d as u32 * shots_per_difficulty)
                })
                .collect()
        }
        SimMode::AimGrid { steps } => jobs_for(config.difficulty, &grid_commands(config, steps), 0),
    }
}

/// Play one shot to its outcome or the tick limit
pub fn run_shot(job: &ShotJob, tuning: &PenaltyTuning, config: &SimConfig) -> ShotResult {
    let mut sim = PenaltySim::new(tuning.clone(), job.difficulty)
        .with_seed(job.seed)
        .hold_keeper(config.hold_keeper);

    let mut buffer = EventBuffer::new();
    buffer.start_session(&chrono::Utc::now().to_rfc3339());
    buffer.log(
        0,
        PenaltyEvent::Config(SessionConfig::from_tuning(tuning, job.difficulty, Some(job.seed))),
    );

    let mut result = ShotResult {
        index: job.index,
        difficulty: job.difficulty,
        seed: job.seed,
        command: job.command,
        outcome: None,
        ticks: 0,
        flight_time: 0.0,
        end_position: [0.0; 3],
        keeper_dive: None,
        save_probability: None,
        collisions: 0,
        events: Vec::new(),
    };

    sim.shoot(
        job.command.horizontal_angle_deg,
        job.command.vertical_angle_deg,
        job.command.power,
    );
    if let Some(info) = sim.last_shot() {
        buffer.log(0, shot_event(info));
    }

    while result.ticks < config.max_ticks && sim.is_shot_active() {
        let frame = sim.step(config.tick);
        result.ticks += 1;
        let time_ms = (result.ticks as f32 * config.tick * 1000.0) as u32;

        buffer.log_all(time_ms, frame_events(&frame, sim.score()));
        result.collisions += frame.collisions.len() as u32;
        if let Some(dive) = frame.dive {
            result.keeper_dive = Some(dive.direction);
            result.save_probability = Some(dive.probability);
        }
        if let Some(outcome) = frame.outcome() {
            result.outcome = Some(outcome);
            break;
        }
    }

    let end = sim.ball().position;
    result.end_position = [end.x, end.y, end.z];
    result.flight_time = sim.shot_time();
    result.events = buffer.events().to_vec();
    result
}

/// Play jobs in order on the current thread
pub fn run_shots(jobs: &[ShotJob], tuning: &PenaltyTuning, config: &SimConfig) -> Vec<ShotResult> {
    let mut results = Vec::with_capacity(jobs.len());
    for (i, job) in jobs.iter().enumerate() {
        if !config.quiet {
            print!("\rShot {}/{}...", i + 1, jobs.len());
            std::io::stdout().flush().ok();
        }
        results.push(run_shot(job, tuning, config));
    }
    if !config.quiet {
        println!("\rCompleted {} shots.", jobs.len());
    }
    results
}

/// Main simulation entry point
pub fn run_simulation(config: SimConfig) -> SimReport {
    let tuning = load_global_tuning();
    let base_seed = config.seed.unwrap_or_else(|| rand::thread_rng().r#gen());
    let jobs = plan_shots(&config, base_seed);

    if !config.quiet {
        println!(
            "Running {} shots ({:?}, seed: {})",
            jobs.len(),
            config.mode,
            base_seed
        );
    }

    let results = if config.parallel > 0 {
        init_parallel(config.parallel);
        run_shots_parallel(&jobs, &tuning, &config)
    } else {
        run_shots(&jobs, &tuning, &config)
    };

    let report = SimReport::new(base_seed, results);
    println!("{}", report.format_table());

    if let Some(dir) = &config.evlog_dir {
        match write_event_logs(Path::new(dir), &report.shots) {
            Ok(count) => println!("Wrote {} event logs to {}", count, dir),
            Err(e) => eprintln!("Warning: {}", e),
        }
    }
    if let Some(db_path) = &config.db_path {
        match store_results(Path::new(db_path), &config, &report) {
            Ok(session_id) => println!("Stored session {} in {}", session_id, db_path),
            Err(e) => eprintln!("Warning: Failed to store results in {}: {}", db_path, e),
        }
    }
    if let Err(e) = output_report(&report, &config) {
        eprintln!("Warning: {}", e);
    }

    report
}

fn output_report(report: &SimReport, config: &SimConfig) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;

    match &config.output_file {
        Some(output_file) => {
            fs::write(output_file, &json)
                .map_err(|e| format!("Failed to write {}: {}", output_file, e))?;
            println!("Results written to {}", output_file);
        }
        None if !config.quiet => println!("{}", json),
        None => {}
    }
    Ok(())
}

/// Write one `.evlog` per shot, named by index and difficulty
pub fn write_event_logs(dir: &Path, results: &[ShotResult]) -> Result<usize, String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;

    for result in results {
        let path = dir.join(format!("shot_{:05}_{}.evlog", result.index, result.difficulty.name()));
        let content = result
            .events
            .iter()
            .map(|(ts, e)| serialize_event(*ts, e))
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&path, content).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    }
    Ok(results.len())
}

fn store_results(path: &Path, config: &SimConfig, report: &SimReport) -> rusqlite::Result<String> {
    let db = SimDatabase::open(path)?;
    let session_type = match config.mode {
        SimMode::Batch { .. } => "batch",
        SimMode::Sweep { .. } => "sweep",
        SimMode::AimGrid { .. } => "grid",
    };
    let config_json = serde_json::to_string(config).ok();
    let session_id = db.create_session(session_type, report.seed, config_json.as_deref())?;
    db.insert_shots(&session_id, &report.shots)?;
    Ok(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ShotOutcome;

    fn calm_config() -> (PenaltyTuning, SimConfig) {
        let mut tuning = PenaltyTuning::default();
        tuning.shot.max_spin = 0.0;
        let config = SimConfig {
            quiet: true,
            ..Default::default()
        };
        (tuning, config)
    }

    #[test]
    fn test_plan_batch_is_seeded() {
        let config = SimConfig {
            mode: SimMode::Batch { shots: 20 },
            ..Default::default()
        };
        let a = plan_shots(&config, 11);
        let b = plan_shots(&config, 11);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        for job in &a {
            assert!(job.command.horizontal_angle_deg.abs() <= config.max_horizontal_deg);
            assert!((0.0..=config.max_vertical_deg).contains(&job.command.vertical_angle_deg));
            assert!((config.min_power..=1.0).contains(&job.command.power));
        }
        assert_ne!(a, plan_shots(&config, 12));
    }

    #[test]
    fn test_sweep_replays_plan_per_difficulty() {
        let config = SimConfig {
            mode: SimMode::Sweep { shots_per_difficulty: 4 },
            ..Default::default()
        };
        let jobs = plan_shots(&config, 3);
        assert_eq!(jobs.len(), 12);
        let easy: Vec<_> = jobs.iter().filter(|j| j.difficulty == Difficulty::Easy).collect();
        let hard: Vec<_> = jobs.iter().filter(|j| j.difficulty == Difficulty::Hard).collect();
        for (e, h) in easy.iter().zip(&hard) {
            assert_eq!(e.command, h.command);
            assert_eq!(e.seed, h.seed);
            assert_ne!(e.index, h.index);
        }
    }

    #[test]
    fn test_grid_covers_corners() {
        let config = SimConfig::default();
        let commands = grid_commands(&config, 3);
        assert_eq!(commands.len(), 9);
        assert_eq!(commands[0], ShotCommand::new(-6.0, 0.0, 1.0));
        assert_eq!(commands[8], ShotCommand::new(6.0, 6.0, 1.0));
        assert_eq!(grid_commands(&config, 1), vec![ShotCommand::new(0.0, 3.0, 1.0)]);
    }

    #[test]
    fn test_held_keeper_concedes_center_shot() {
        let (tuning, mut config) = calm_config();
        config.hold_keeper = true;
        let job = ShotJob {
            index: 0,
            difficulty: Difficulty::Hard,
            seed: 5,
            command: ShotCommand::new(0.0, 5.0, 1.0),
        };
        let result = run_shot(&job, &tuning, &config);
        assert_eq!(result.outcome, Some(ShotOutcome::Goal));
        assert!(result.ticks < 60);
        assert!(result.keeper_dive.is_none());
        // Config, shot, ..., goal
        let names: Vec<_> = result.events.iter().map(|(_, e)| e.name()).collect();
        assert_eq!(names.first(), Some(&"SessionStart"));
        assert!(names.contains(&"Shot"));
        assert_eq!(names.last(), Some(&"Goal"));
    }

    #[test]
    fn test_run_shot_is_reproducible() {
        let (tuning, config) = calm_config();
        let job = ShotJob {
            index: 2,
            difficulty: Difficulty::Medium,
            seed: 77,
            command: ShotCommand::new(-3.0, 4.0, 0.9),
        };
        let a = run_shot(&job, &tuning, &config);
        let b = run_shot(&job, &tuning, &config);
        assert!(a.outcome.is_some());
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.ticks, b.ticks);
        assert_eq!(a.end_position, b.end_position);
        assert_eq!(a.save_probability, b.save_probability);
    }

    #[test]
    fn test_tick_limit_leaves_shot_unfinished() {
        let (tuning, mut config) = calm_config();
        config.max_ticks = 3;
        let job = ShotJob {
            index: 0,
            difficulty: Difficulty::Easy,
            seed: 1,
            command: ShotCommand::new(0.0, 5.0, 1.0),
        };
        let result = run_shot(&job, &tuning, &config);
        assert_eq!(result.outcome, None);
        assert_eq!(result.ticks, 3);
        assert_eq!(result.outcome_label(), "Unfinished");
    }

    #[test]
    fn test_event_logs_written_per_shot() {
        let (tuning, config) = calm_config();
        let job = ShotJob {
            index: 7,
            difficulty: Difficulty::Hard,
            seed: 9,
            command: ShotCommand::new(1.5, 3.0, 1.0),
        };
        let result = run_shot(&job, &tuning, &config);

        let dir = std::env::temp_dir().join(format!("penaltykick_evlog_{}", uuid::Uuid::new_v4()));
        assert_eq!(write_event_logs(&dir, &[result]).unwrap(), 1);
        let text = fs::read_to_string(dir.join("shot_00007_hard.evlog")).unwrap();
        assert!(text.starts_with("T:00000|SE|"));
        assert!(text.contains("|SH|"));
        fs::remove_dir_all(&dir).ok();
    }
}
