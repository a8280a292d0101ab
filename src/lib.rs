//! Maze Chase - a grid-maze pursuit game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (maze grid, movement, collisions, game state)
//! - `level`: Built-in maze layout
//!
//! Rendering, audio, and input devices are deliberately absent: hosts feed
//! [`sim::TickInput`] in, read the state back out, and drain [`sim::GameEvent`]s.

pub mod level;
pub mod sim;

pub use sim::{GameEvent, GamePhase, GameState, MazeGrid, TickInput, tick};

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Largest timestep a single tick will integrate. Oversized host frames
    /// are clamped to this so agents cannot tunnel through one-cell walls.
    pub const MAX_TICK_DT: f32 = 1.0 / 30.0;

    /// Player collision radius in grid units (cells are 1x1)
    pub const PLAYER_RADIUS: f32 = 0.25;
    /// Ghost collision radius in grid units
    pub const GHOST_RADIUS: f32 = 0.25;

    /// Player speed at the start of a game, grid units per second
    pub const PLAYER_BASE_SPEED: f32 = 2.0;
    /// Ghost speed at the start of a game, grid units per second
    pub const GHOST_BASE_SPEED: f32 = 1.5;
    /// Added to both speeds each time a round is won
    pub const SPEED_INCREMENT: f32 = 0.1;

    /// Angular rate of the player's heading while a turn command is held,
    /// radians per second
    pub const PLAYER_TURN_RATE: f32 = std::f32::consts::PI;
    /// Scale between distance travelled and the accumulated movement
    /// counter that drives chomp animation elsewhere
    pub const DISTANCE_SCALE: f32 = 0.55;

    /// How long a power pellet keeps ghosts afraid, seconds
    pub const FRIGHT_DURATION: f64 = 10.0;
    /// Pause between a round ending (won or lost) and play resuming, seconds
    pub const ROUND_TRANSITION_DELAY: f64 = 3.0;

    /// Minimum interval between ghost spawns, seconds
    pub const GHOST_SPAWN_INTERVAL: f64 = 8.0;
    /// Ghost population cap
    pub const MAX_GHOSTS: usize = 4;

    /// Lives at the start of a game
    pub const STARTING_LIVES: u32 = 3;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Round a continuous position to the nearest grid cell.
///
/// Nearest, not floor: at a cell boundary the owning cell flips exactly
/// halfway across, which is what the junction detection relies on.
#[inline]
pub fn round_to_cell(pos: Vec2) -> IVec2 {
    IVec2::new(pos.x.round() as i32, pos.y.round() as i32)
}

/// Center of a grid cell in continuous coordinates
#[inline]
pub fn cell_center(cell: IVec2) -> Vec2 {
    Vec2::new(cell.x as f32, cell.y as f32)
}
