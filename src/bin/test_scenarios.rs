//! Scenario test runner CLI
//!
//! Usage:
//!   cargo run --bin test-scenarios                      # Run all scenarios
//!   cargo run --bin test-scenarios -- keeper/           # Run one directory
//!   cargo run --bin test-scenarios -- keeper/hard_save  # Run a single scenario
//!   cargo run --bin test-scenarios -- --verbose         # Full assertion output
//!   cargo run --bin test-scenarios -- --list            # List without running

use std::fs;
use std::path::{Path, PathBuf};

use penaltykick::testing::{SCENARIOS_DIR, TestResult, parser::parse_test_file, runner::run_test};

#[derive(Default)]
struct Options {
    verbose: bool,
    list: bool,
    filters: Vec<String>,
}

#[derive(Default)]
struct Tally {
    passed: u32,
    failed: Vec<String>,
    errors: Vec<String>,
}

fn parse_options() -> Options {
    let mut options = Options::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--verbose" | "-v" => options.verbose = true,
            "--list" | "-l" => options.list = true,
            a if !a.starts_with('-') => options.filters.push(a.to_string()),
            other => eprintln!("Warning: ignoring unknown argument '{}'", other),
        }
    }
    options
}

fn main() {
    let options = parse_options();
    let base = Path::new(SCENARIOS_DIR);
    if !base.is_dir() {
        eprintln!("No scenarios directory at {}", SCENARIOS_DIR);
        std::process::exit(1);
    }

    let scenarios: Vec<PathBuf> = find_scenarios(base)
        .into_iter()
        .filter(|p| {
            let rel = relative_name(base, p);
            options.filters.is_empty() || options.filters.iter().any(|f| rel.contains(f.as_str()))
        })
        .collect();

    if scenarios.is_empty() {
        eprintln!("No scenarios matched {:?}", options.filters);
        std::process::exit(1);
    }

    if options.list {
        for path in &scenarios {
            println!("{}", relative_name(base, path));
        }
        return;
    }

    println!("Penalty scenarios ({})\n", scenarios.len());
    let mut tally = Tally::default();
    for path in &scenarios {
        let name = relative_name(base, path);
        let result = match parse_test_file(path) {
            Ok(test) => run_test(&test),
            Err(message) => TestResult::Error { message },
        };
        report(&name, &result, options.verbose);
        match result {
            TestResult::Pass { .. } => tally.passed += 1,
            TestResult::Fail { .. } => tally.failed.push(name),
            TestResult::Error { .. } => tally.errors.push(name),
        }
    }

    println!(
        "\n{} passed, {} failed, {} errors",
        tally.passed,
        tally.failed.len(),
        tally.errors.len()
    );
    for name in tally.failed.iter().chain(&tally.errors) {
        println!("  rerun: cargo run --bin test-scenarios -- {} --verbose", name);
    }
    if !tally.failed.is_empty() || !tally.errors.is_empty() {
        std::process::exit(1);
    }
}

/// Scenario path relative to the base directory, without extension
fn relative_name(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path).with_extension("");
    rel.to_string_lossy().replace('\\', "/")
}

/// All .toml files under `dir`, sorted
fn find_scenarios(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|e| e == "toml") {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

fn report(name: &str, result: &TestResult, verbose: bool) {
    let width = 44usize.saturating_sub(name.len()).max(2);
    let dots = ".".repeat(width);
    match result {
        TestResult::Pass { frames } => println!("  {} {} ok ({} frames)", name, dots, frames),
        TestResult::Fail { error } => {
            println!("  {} {} FAIL", name, dots);
            if verbose {
                println!("    {}", error);
            } else {
                println!("    {}", error.message);
            }
        }
        TestResult::Error { message } => {
            println!("  {} {} ERROR", name, dots);
            println!("    {}", message);
        }
    }
}
