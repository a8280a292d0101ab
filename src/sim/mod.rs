//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One single-writer tick with a clamped timestep
//! - Seeded RNG only
//! - Stable iteration order (ghosts in spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod ghost;
pub mod maze;
pub mod state;
pub mod tick;

pub use collision::{circles_overlap, resolve_wall_collision};
pub use ghost::{SimError, move_ghost};
pub use maze::{CellKind, GridBounds, LevelError, MazeGrid};
pub use state::{Direction, GameEvent, GamePhase, GameState, Ghost, GhostMode, Player, TickInput};
pub use tick::tick;
