//! Game state and core simulation types
//!
//! Everything the tick mutates lives here; render/UI layers only ever read it.

use glam::{IVec2, Vec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::maze::MazeGrid;

/// One of the four axis-aligned movement directions. Agents never move or
/// face diagonally; the player's continuous heading is snapped to one of
/// these before it touches the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector in grid coordinates (+Y is up)
    #[inline]
    pub fn to_vec(self) -> Vec2 {
        match self {
            Self::Up => Vec2::new(0.0, 1.0),
            Self::Down => Vec2::new(0.0, -1.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// Whole-cell offset in grid coordinates
    #[inline]
    pub fn offset(self) -> IVec2 {
        match self {
            Self::Up => IVec2::new(0, 1),
            Self::Down => IVec2::new(0, -1),
            Self::Left => IVec2::new(-1, 0),
            Self::Right => IVec2::new(1, 0),
        }
    }

    /// Rotated 90° counter-clockwise
    #[inline]
    pub fn turned_left(self) -> Self {
        match self {
            Self::Right => Self::Up,
            Self::Up => Self::Left,
            Self::Left => Self::Down,
            Self::Down => Self::Right,
        }
    }

    /// Rotated 90° clockwise
    #[inline]
    pub fn turned_right(self) -> Self {
        match self {
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
            Self::Up => Self::Right,
        }
    }

    /// Snap a continuous heading angle to the nearest axis direction.
    /// Ties at exact diagonals resolve to the horizontal axis.
    pub fn from_heading(heading: f32) -> Self {
        let (sin, cos) = heading.sin_cos();
        if cos.abs() >= sin.abs() {
            if cos >= 0.0 { Self::Right } else { Self::Left }
        } else if sin >= 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// Heading angle of this direction in radians
    pub fn heading(self) -> f32 {
        let v = self.to_vec();
        v.y.atan2(v.x)
    }
}

/// The player-controlled agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    /// Continuous position in grid units
    pub position: Vec2,
    /// Continuous heading driven by turn input (radians)
    pub heading: f32,
    /// Heading snapped to an axis, sampled fresh each tick; this is the
    /// vector movement and wall collision actually use
    pub facing: Direction,
    /// Cumulative distance travelled, scaled for animation timing; also
    /// how observers detect active movement
    pub distance_moved: f32,
    /// Collision radius
    pub radius: f32,
    /// Set for exactly the tick in which a power pellet was consumed;
    /// the ghost pass reads it in the same tick
    pub ate_pellet_this_tick: bool,
    /// Simulation time at which the player was caught, cleared on respawn
    pub dying_since: Option<f64>,
}

impl Player {
    /// Player standing at its spawn point, facing left
    pub fn at_spawn(spawn: Vec2) -> Self {
        let facing = Direction::Left;
        Self {
            position: spawn,
            heading: facing.heading(),
            facing,
            distance_moved: 0.0,
            radius: PLAYER_RADIUS,
            ate_pellet_this_tick: false,
            dying_since: None,
        }
    }

    /// Put the player back at spawn with movement state zeroed
    pub fn respawn(&mut self, spawn: Vec2) {
        *self = Self::at_spawn(spawn);
    }

    pub fn is_alive(&self) -> bool {
        self.dying_since.is_none()
    }
}

/// Ghost behaviour mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GhostMode {
    /// Lethal to the player on contact
    Normal,
    /// Fleeing after a power pellet; edible. `since` is the simulation
    /// time the fear (most recently) began.
    Afraid { since: f64 },
}

impl GhostMode {
    #[inline]
    pub fn is_afraid(&self) -> bool {
        matches!(self, Self::Afraid { .. })
    }
}

/// An adversary agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ghost {
    /// Identity used only for removal bookkeeping
    pub id: u32,
    /// Continuous position in grid units
    pub position: Vec2,
    /// Current travel direction; only re-decided at cell boundaries
    pub direction: Direction,
    /// Collision radius
    pub radius: f32,
    pub mode: GhostMode,
}

impl Ghost {
    /// Freshly spawned ghost at the maze's ghost spawn point
    pub fn spawned(id: u32, spawn: Vec2) -> Self {
        Self {
            id,
            position: spawn,
            direction: Direction::Left,
            radius: GHOST_RADIUS,
            mode: GhostMode::Normal,
        }
    }
}

/// Current phase of gameplay. Holding the transition timestamps inside the
/// variants keeps the won/lost flags mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GamePhase {
    /// Active play
    Playing,
    /// All dots eaten; the next round begins a few seconds after `at`
    Won { at: f64 },
    /// Player caught; respawn (or game over) a few seconds after `at`
    Lost { at: f64 },
}

/// Input commands for a single tick: the currently-held abstract commands.
/// The core knows nothing about physical keys or devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub turn_left: bool,
    pub turn_right: bool,
    pub move_forward: bool,
    pub move_backward: bool,
}

/// Discrete side-channel signals for audio/UI collaborators. Accumulated
/// during a tick and drained by the host; simulation correctness never
/// depends on them being observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameEvent {
    DotEaten,
    PowerPelletEaten,
    GhostSpawned { id: u32 },
    GhostEaten { id: u32 },
    PlayerDied,
    LifeLost { remaining: u32 },
    RoundWon,
}

/// Complete game state. Single-writer: only [`crate::sim::tick`] mutates it.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Simulation clock in seconds, accumulated from clamped tick deltas.
    /// Monotonic; every lifecycle timestamp compares against it.
    pub clock: f64,
    pub phase: GamePhase,
    pub lives: u32,
    /// Dots eaten this round; the round is won when it reaches the maze's
    /// dot total
    pub dots_eaten: u32,
    pub player: Player,
    /// Active ghosts; the live set, iterated in spawn order
    pub ghosts: Vec<Ghost>,
    /// Current player speed, grid units per second; ramps up each round
    pub player_speed: f32,
    /// Current ghost speed, grid units per second; ramps up each round
    pub ghost_speed: f32,
    /// Simulation time of the most recent ghost spawn
    pub last_spawn_time: f64,
    /// The maze being played
    pub maze: MazeGrid,
    pub(crate) rng: Pcg32,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new game on the given maze with the given seed
    pub fn new(maze: MazeGrid, seed: u64) -> Self {
        Self {
            seed,
            clock: 0.0,
            phase: GamePhase::Playing,
            lives: STARTING_LIVES,
            dots_eaten: 0,
            player: Player::at_spawn(maze.player_spawn()),
            ghosts: Vec::new(),
            player_speed: PLAYER_BASE_SPEED,
            ghost_speed: GHOST_BASE_SPEED,
            last_spawn_time: 0.0,
            maze,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Full game restart: collectibles restored, lives and the difficulty
    /// ramp reset. The only path that undoes the per-round speed increases.
    pub fn restart(&mut self, seed: u64) {
        let mut maze = std::mem::replace(&mut self.maze, MazeGrid::empty());
        maze.restore_collectibles();
        *self = Self::new(maze, seed);
    }

    /// True once the player has lost the last life; the `Lost` phase is
    /// terminal and only [`GameState::restart`] leaves it.
    pub fn game_over(&self) -> bool {
        matches!(self.phase, GamePhase::Lost { .. }) && self.lives == 0
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events accumulated since the previous drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
