//! Penaltykick - headless penalty shootout host
//!
//! Runs the simulation on a fixed schedule with a scripted kicker that aims,
//! charges and releases the way a player would. Every session is written to
//! an `.evlog` under `logs/`.
//!
//! Usage:
//!   cargo run -- --difficulty hard --kicks 10 --seed 3
//!   cargo run -- --no-log

use bevy::log::LogPlugin;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use penaltykick::difficulty::Difficulty;
use penaltykick::events::{EventLogConfig, EventLogger};
use penaltykick::plugin::{ResetTimer, SimCommands, release_shot};
use penaltykick::scoring::Score;
use penaltykick::shooting::{Aim, ShotCharge};
use penaltykick::sim::PenaltySim;
use penaltykick::simulation::HeadlessAppBuilder;

struct HostArgs {
    difficulty: Difficulty,
    seed: Option<u64>,
    kicks: u32,
    log: bool,
}

fn parse_args() -> HostArgs {
    let args: Vec<String> = std::env::args().collect();
    let value = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
    };

    let difficulty = match value("--difficulty").map(|v| v.parse::<Difficulty>()) {
        Some(Ok(d)) => d,
        Some(Err(e)) => {
            eprintln!("Warning: {}", e);
            Difficulty::default()
        }
        None => Difficulty::default(),
    };

    HostArgs {
        difficulty,
        seed: value("--seed").and_then(|v| v.parse().ok()),
        kicks: value("--kicks").and_then(|v| v.parse().ok()).unwrap_or(5),
        log: !args.iter().any(|a| a == "--no-log"),
    }
}

/// Where the scripted kicker is in its routine
#[derive(Debug, Clone, Copy, PartialEq)]
enum KickPhase {
    /// Waiting for the ball to be back on the spot
    Ready,
    /// Nudging the aim one step per frame toward a target in aim steps
    Aiming { right: i32, up: i32 },
    /// Holding the shoot control
    Charging { hold: f32 },
    /// Shot taken; waiting for its outcome and the reset
    Watching { shots_before: u32 },
}

#[derive(Resource)]
struct Kicker {
    phase: KickPhase,
    remaining: u32,
    rng: StdRng,
}

fn main() {
    let args = parse_args();

    let mut builder = HeadlessAppBuilder::new()
        .with_difficulty(args.difficulty)
        .with_tick_every_frames(EventLogConfig::default().tick_every_frames);
    if let Some(seed) = args.seed {
        builder = builder.with_seed(seed);
    }

    let mut app = builder.build();
    app.add_plugins(LogPlugin::default());

    let mut logger = EventLogger::new(EventLogConfig {
        enabled: args.log,
        ..default()
    });
    logger.start_session(&chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        "Penalty session: {} kicks against the {} keeper",
        args.kicks, args.difficulty
    );

    app.insert_resource(logger)
        .insert_resource(Kicker {
            phase: KickPhase::Ready,
            remaining: args.kicks,
            rng,
        })
        .add_systems(Update, (scripted_kicker, finish_session).chain())
        .run();
}

fn scripted_kicker(
    mut kicker: ResMut<Kicker>,
    mut aim: ResMut<Aim>,
    mut charge: ResMut<ShotCharge>,
    mut commands: ResMut<SimCommands>,
    sim: Res<PenaltySim>,
    timer: Res<ResetTimer>,
    score: Res<Score>,
    time: Res<Time>,
) {
    let phase = kicker.phase;
    match phase {
        KickPhase::Ready => {
            if kicker.remaining == 0 || sim.is_shot_active() || timer.remaining.is_some() {
                return;
            }
            let right = kicker.rng.gen_range(-1..=1);
            let up = kicker.rng.gen_range(0..=1);
            *aim = Aim {
                horizontal_deg: 0.0,
                vertical_deg: 0.0,
            };
            kicker.phase = KickPhase::Aiming { right, up };
        }
        KickPhase::Aiming { right, up } => {
            if right == 0 && up == 0 {
                let hold = kicker.rng.gen_range(1.75..2.5);
                charge.begin();
                kicker.phase = KickPhase::Charging { hold };
                return;
            }
            if right > 0 {
                aim.nudge_right();
            } else if right < 0 {
                aim.nudge_left();
            }
            if up > 0 {
                aim.nudge_up();
            } else if up < 0 {
                aim.nudge_down();
            }
            kicker.phase = KickPhase::Aiming {
                right: right - right.signum(),
                up: up - up.signum(),
            };
        }
        KickPhase::Charging { hold } => {
            let hold = hold - time.delta_secs();
            if hold > 0.0 {
                kicker.phase = KickPhase::Charging { hold };
                return;
            }
            let power = charge.points() / 100.0;
            if release_shot(&mut charge, &aim, &mut commands) {
                info!(
                    "Kick: aim ({:.0}, {:.0}) power {:.2}",
                    aim.horizontal_deg, aim.vertical_deg, power
                );
                kicker.remaining -= 1;
            }
            kicker.phase = KickPhase::Watching {
                shots_before: score.shots(),
            };
        }
        KickPhase::Watching { shots_before } => {
            if score.shots() > shots_before && !sim.is_shot_active() && timer.remaining.is_none() {
                kicker.phase = KickPhase::Ready;
            }
        }
    }
}

fn finish_session(
    kicker: Res<Kicker>,
    sim: Res<PenaltySim>,
    mut logger: ResMut<EventLogger>,
    mut exit: MessageWriter<AppExit>,
    mut finished: Local<bool>,
) {
    if *finished || kicker.remaining > 0 || kicker.phase != KickPhase::Ready || sim.is_shot_active() {
        return;
    }
    *finished = true;
    let score = sim.score();
    info!(
        "Session over: player {} - {} keeper ({:.0}% keeper accuracy)",
        score.player,
        score.goalkeeper,
        sim.keeper().memory().prediction_accuracy() * 100.0
    );
    if let Some(path) = logger.path() {
        info!("Event log: {}", path.display());
    }
    logger.end_session();
    exit.write(AppExit::Success);
}
