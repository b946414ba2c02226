//! Analytics Tool - Summarize stored simulation results
//!
//! Reads the SQLite database written by `simulate --db` and prints outcome
//! rates per difficulty, miss reasons and recent sessions.
//!
//! Usage:
//!   cargo run --bin analyze -- results.db
//!   cargo run --bin analyze -- results.db --session <ID>
//!   cargo run --bin analyze -- results.db --sessions 20

use std::path::PathBuf;

use penaltykick::simulation::SimDatabase;

/// Configuration for the analyze tool
struct AnalyzeConfig {
    db_path: PathBuf,
    session: Option<String>,
    recent_sessions: u32,
    show_help: bool,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("results.db"),
            session: None,
            recent_sessions: 5,
            show_help: false,
        }
    }
}

impl AnalyzeConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--session" => {
                    if i + 1 < args.len() {
                        config.session = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--sessions" => {
                    if i + 1 < args.len() {
                        config.recent_sessions = args[i + 1].parse().unwrap_or(config.recent_sessions);
                        i += 1;
                    }
                }
                "--help" | "-h" => config.show_help = true,
                arg if !arg.starts_with('-') => config.db_path = PathBuf::from(arg),
                other => eprintln!("Warning: ignoring unknown argument '{}'", other),
            }
            i += 1;
        }

        config
    }
}

fn print_help() {
    println!(
        r#"Penalty Analytics Tool - Summarize stored simulation results

USAGE:
    cargo run --bin analyze -- [DB_FILE] [OPTIONS]

OPTIONS:
    --session <ID>     Only count shots from this session
    --sessions <N>     List the N most recent sessions (default: 5)
    --help, -h         Show this help

To generate results, run simulations with --db:
    cargo run --bin simulate -- --sweep 500 --db results.db
"#
    );
}

fn main() {
    let config = AnalyzeConfig::from_args();
    if config.show_help {
        print_help();
        return;
    }

    if !config.db_path.exists() {
        println!("No database found at {}", config.db_path.display());
        println!("\nTo generate results, run simulations with --db:");
        println!("  cargo run --bin simulate -- --sweep 500 --db results.db");
        return;
    }

    if let Err(e) = run(&config) {
        eprintln!("Failed to read {}: {}", config.db_path.display(), e);
        std::process::exit(1);
    }
}

fn run(config: &AnalyzeConfig) -> rusqlite::Result<()> {
    let db = SimDatabase::open(&config.db_path)?;
    println!(
        "{} sessions, {} shots in {}\n",
        db.session_count()?,
        db.shot_count()?,
        config.db_path.display()
    );

    let stats = db.difficulty_stats(config.session.as_deref())?;
    if stats.is_empty() {
        println!("No shots recorded.");
        return Ok(());
    }

    println!("============================================================");
    println!(
        "{:>8} | {:>6} | {:>7} | {:>7} | {:>7} | {:>8} | {:>7}",
        "Level", "Shots", "Goal", "Save", "Miss", "Avg p", "Flight"
    );
    println!(
        "{:-<8}-+-{:-<6}-+-{:-<7}-+-{:-<7}-+-{:-<7}-+-{:-<8}-+-{:-<7}",
        "", "", "", "", "", "", ""
    );
    for s in &stats {
        let miss_rate = if s.shots == 0 {
            0.0
        } else {
            s.misses as f64 / s.shots as f64
        };
        println!(
            "{:>8} | {:>6} | {:>6.1}% | {:>6.1}% | {:>6.1}% | {:>8.3} | {:>6.2}s",
            s.difficulty,
            s.shots,
            s.goal_rate() * 100.0,
            s.save_rate() * 100.0,
            miss_rate * 100.0,
            s.avg_save_probability,
            s.avg_flight_time
        );
    }

    println!("\nMiss reasons:");
    for s in &stats {
        let reasons = db.miss_reasons(&s.difficulty)?;
        if reasons.is_empty() {
            continue;
        }
        let line: Vec<String> = reasons.iter().map(|(r, n)| format!("{} {}", r, n)).collect();
        println!("  {:>8}: {}", s.difficulty, line.join(", "));
    }

    println!("\nRecent sessions:");
    for session in db.sessions(config.recent_sessions)? {
        println!(
            "  {}  {}  {:<6} seed {:<20} {} shots",
            &session.id[..session.id.len().min(8)],
            session.created_at,
            session.session_type,
            session.seed,
            session.shots
        );
    }
    Ok(())
}
