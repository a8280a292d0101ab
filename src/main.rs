//! Headless simulation driver
//!
//! Runs the game without a renderer: a scripted pilot holds movement
//! commands, events are logged as they fire, and a JSON summary of the run
//! is printed or written at the end. Useful for soak-testing level layouts
//! and eyeballing balance.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use serde::Serialize;

use maze_chase::level::CLASSIC_LEVEL;
use maze_chase::sim::{GameEvent, GamePhase, GameState, MazeGrid, TickInput, tick};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// RNG seed for the run
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Simulated seconds to run
    #[arg(long, default_value_t = 120.0)]
    seconds: f64,
    /// Write the JSON run summary to this path instead of stdout
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    simulated_seconds: f64,
    dots_eaten: u64,
    power_pellets_eaten: u64,
    ghosts_eaten: u64,
    deaths: u64,
    rounds_won: u64,
    lives_left: u32,
    game_over: bool,
}

const DT: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let maze = MazeGrid::parse(CLASSIC_LEVEL).context("decoding built-in level")?;
    let mut state = GameState::new(maze, cli.seed);
    let mut summary = RunSummary {
        seed: cli.seed,
        ..Default::default()
    };

    log::info!("running {}s with seed {}", cli.seconds, cli.seed);

    // Scripted pilot: hold forward, and steer by turning whenever a wall
    // has stopped the player
    let mut input = TickInput {
        move_forward: true,
        ..Default::default()
    };
    let mut last_position = state.player.position;

    while state.clock < cli.seconds && !state.game_over() {
        tick(&mut state, &input, DT)?;
        summary.ticks += 1;

        input.turn_left =
            state.phase == GamePhase::Playing && stalled(last_position, state.player.position);
        last_position = state.player.position;

        for event in state.drain_events() {
            match event {
                GameEvent::DotEaten => summary.dots_eaten += 1,
                GameEvent::PowerPelletEaten => summary.power_pellets_eaten += 1,
                GameEvent::GhostSpawned { id } => log::debug!("ghost {id} entered the maze"),
                GameEvent::GhostEaten { id } => {
                    summary.ghosts_eaten += 1;
                    log::info!("ate ghost {id}");
                }
                GameEvent::PlayerDied => summary.deaths += 1,
                GameEvent::LifeLost { remaining } => log::info!("{remaining} lives left"),
                GameEvent::RoundWon => summary.rounds_won += 1,
            }
        }
    }

    summary.simulated_seconds = state.clock;
    summary.lives_left = state.lives;
    summary.game_over = state.game_over();

    let json = serde_json::to_string_pretty(&summary)?;
    match cli.summary_out {
        Some(path) => {
            fs::write(&path, &json).with_context(|| format!("writing {}", path.display()))?;
            log::info!("summary written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// The pilot considers itself stalled once holding forward stops
/// producing movement
fn stalled(before: Vec2, after: Vec2) -> bool {
    before.distance_squared(after) < 1e-10
}
