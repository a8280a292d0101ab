//! Maze grid: static wall layout plus mutable collectible visibility
//!
//! The grid is decoded from a symbolic level description (see [`crate::level`]
//! for the format). Walls never change after load; dots and power pellets are
//! never removed, only hidden once eaten, so a round reset is a cheap
//! visibility sweep instead of a rebuild.

use std::collections::HashMap;

use glam::{IVec2, Vec2};
use serde::Serialize;
use thiserror::Error;

use crate::round_to_cell;

/// What occupies a grid cell. `OutOfBounds` is the sentinel for positions
/// where no cell exists at all; rows of differing width and the holes
/// between disconnected corridors make such positions legal to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CellKind {
    Wall,
    Dot,
    PowerPellet,
    Empty,
    OutOfBounds,
}

impl CellKind {
    /// Dots and power pellets are the only things the player can eat
    #[inline]
    pub fn is_collectible(self) -> bool {
        matches!(self, Self::Dot | Self::PowerPellet)
    }
}

/// Level decode failures. Both are content defects: fix the level text,
/// there is nothing to recover at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level description has no rows")]
    Empty,
    #[error("level has no player spawn marker 'P'")]
    MissingPlayerSpawn,
    #[error("unrecognized glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph { glyph: char, row: usize, column: usize },
}

/// Min/max integer coordinates spanned by the grid. Hosts that implement
/// edge teleports drive them from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridBounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    kind: CellKind,
    visible: bool,
}

/// The decoded maze
#[derive(Debug, Clone, PartialEq)]
pub struct MazeGrid {
    cells: HashMap<IVec2, Cell>,
    bounds: GridBounds,
    total_dots: u32,
    player_spawn: Vec2,
    ghost_spawn: Option<Vec2>,
}

impl MazeGrid {
    /// Decode a level description.
    ///
    /// Rows are listed top-down, so row index `r` lands at world Y `-r`
    /// (world Y increases upward). Every second character in a row is a
    /// separator and is skipped; column index `c` lands at world X `c / 2`.
    ///
    /// A `P` marker is required; without it the player has nowhere to
    /// exist. A missing `G` merely leaves the maze with no ghost spawn
    /// configured, which disables spawning.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, LevelError> {
        if rows.is_empty() {
            return Err(LevelError::Empty);
        }

        let mut cells = HashMap::new();
        let mut total_dots = 0;
        let mut player_spawn = None;
        let mut ghost_spawn = None;
        let mut right = 0;

        for (row, line) in rows.iter().enumerate() {
            let y = -(row as i32);
            for (column, glyph) in line.as_ref().chars().enumerate() {
                // Odd columns are separators
                if column % 2 != 0 {
                    continue;
                }
                let x = (column / 2) as i32;
                right = right.max(x);
                let here = IVec2::new(x, y);

                let kind = match glyph {
                    '#' => CellKind::Wall,
                    '.' => {
                        total_dots += 1;
                        CellKind::Dot
                    }
                    'o' => CellKind::PowerPellet,
                    'P' => {
                        player_spawn = Some(crate::cell_center(here));
                        CellKind::Empty
                    }
                    'G' => {
                        ghost_spawn = Some(crate::cell_center(here));
                        CellKind::Empty
                    }
                    ' ' => CellKind::Empty,
                    _ => return Err(LevelError::UnknownGlyph { glyph, row, column }),
                };

                cells.insert(
                    here,
                    Cell {
                        kind,
                        visible: true,
                    },
                );
            }
        }

        Ok(Self {
            cells,
            bounds: GridBounds {
                left: 0,
                right,
                top: 0,
                bottom: -(rows.len() as i32 - 1),
            },
            total_dots,
            player_spawn: player_spawn.ok_or(LevelError::MissingPlayerSpawn)?,
            ghost_spawn,
        })
    }

    /// Placeholder grid used only while swapping the real one out
    pub(crate) fn empty() -> Self {
        Self {
            cells: HashMap::new(),
            bounds: GridBounds {
                left: 0,
                right: 0,
                top: 0,
                bottom: 0,
            },
            total_dots: 0,
            player_spawn: Vec2::ZERO,
            ghost_spawn: None,
        }
    }

    /// Content of the cell nearest to a continuous position
    #[inline]
    pub fn cell_at(&self, position: Vec2) -> CellKind {
        self.cell_kind(round_to_cell(position))
    }

    /// Content of a cell by integer coordinates
    #[inline]
    pub fn cell_kind(&self, cell: IVec2) -> CellKind {
        self.cells
            .get(&cell)
            .map_or(CellKind::OutOfBounds, |c| c.kind)
    }

    /// Whether the cell nearest to a continuous position is a wall
    #[inline]
    pub fn is_wall(&self, position: Vec2) -> bool {
        self.cell_at(position) == CellKind::Wall
    }

    /// Whether the cell at integer coordinates is a wall
    #[inline]
    pub fn is_wall_cell(&self, cell: IVec2) -> bool {
        self.cell_kind(cell) == CellKind::Wall
    }

    /// Eat the collectible at the cell nearest to `position`, hiding it
    /// and reporting what was eaten. `None` when the cell holds nothing
    /// edible or the collectible was already eaten; calling again on the
    /// same cell is a no-op.
    pub fn consume_at(&mut self, position: Vec2) -> Option<CellKind> {
        let cell = self.cells.get_mut(&round_to_cell(position))?;
        if !cell.kind.is_collectible() || !cell.visible {
            return None;
        }
        cell.visible = false;
        Some(cell.kind)
    }

    /// Make every dot and power pellet visible again (round reset)
    pub fn restore_collectibles(&mut self) {
        for cell in self.cells.values_mut() {
            if cell.kind.is_collectible() {
                cell.visible = true;
            }
        }
    }

    /// Whether the collectible at a cell is still uneaten. True for
    /// non-collectible cells, whose visibility never changes.
    pub fn is_visible(&self, cell: IVec2) -> bool {
        self.cells.get(&cell).is_none_or(|c| c.visible)
    }

    /// Iterate every cell with its content and visibility, for renderers
    pub fn cells(&self) -> impl Iterator<Item = (IVec2, CellKind, bool)> + '_ {
        self.cells.iter().map(|(&at, c)| (at, c.kind, c.visible))
    }

    /// Number of plain dots in the layout. Power pellets do not count
    /// toward the win condition.
    pub fn total_dots(&self) -> u32 {
        self.total_dots
    }

    pub fn player_spawn(&self) -> Vec2 {
        self.player_spawn
    }

    /// Where ghosts appear, if the level configured a spawn at all
    pub fn ghost_spawn(&self) -> Option<Vec2> {
        self.ghost_spawn
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &[&str] = &[
        "# # # # #",
        "# P . o #",
        "# # # # #",
    ];

    #[test]
    fn test_parse_decodes_cells_and_spawn() {
        let maze = MazeGrid::parse(TINY).unwrap();
        assert_eq!(maze.total_dots(), 1);
        assert_eq!(maze.player_spawn(), Vec2::new(1.0, -1.0));
        assert_eq!(maze.ghost_spawn(), None);
        assert_eq!(maze.cell_kind(IVec2::new(0, 0)), CellKind::Wall);
        assert_eq!(maze.cell_kind(IVec2::new(1, -1)), CellKind::Empty);
        assert_eq!(maze.cell_kind(IVec2::new(2, -1)), CellKind::Dot);
        assert_eq!(maze.cell_kind(IVec2::new(3, -1)), CellKind::PowerPellet);
        let bounds = maze.bounds();
        assert_eq!((bounds.left, bounds.right), (0, 4));
        assert_eq!((bounds.top, bounds.bottom), (0, -2));
    }

    #[test]
    fn test_parse_rejects_missing_player_spawn() {
        let rows = ["# # #", "# . #", "# # #"];
        assert_eq!(
            MazeGrid::parse(&rows),
            Err(LevelError::MissingPlayerSpawn)
        );
    }

    #[test]
    fn test_parse_rejects_unknown_glyph() {
        let rows = ["# P X #"];
        assert!(matches!(
            MazeGrid::parse(&rows),
            Err(LevelError::UnknownGlyph { glyph: 'X', .. })
        ));
    }

    #[test]
    fn test_cell_at_rounds_to_nearest() {
        let maze = MazeGrid::parse(TINY).unwrap();
        // 1.4 is still cell 1; 1.6 already belongs to cell 2
        assert_eq!(maze.cell_at(Vec2::new(1.4, -1.0)), CellKind::Empty);
        assert_eq!(maze.cell_at(Vec2::new(1.6, -1.0)), CellKind::Dot);
        assert!(maze.is_wall(Vec2::new(1.0, -0.2)));
    }

    #[test]
    fn test_positions_off_grid_are_out_of_bounds() {
        let maze = MazeGrid::parse(TINY).unwrap();
        assert_eq!(maze.cell_at(Vec2::new(40.0, -1.0)), CellKind::OutOfBounds);
        assert_eq!(maze.cell_at(Vec2::new(1.0, 5.0)), CellKind::OutOfBounds);
        assert!(!maze.is_wall(Vec2::new(40.0, -1.0)));
    }

    #[test]
    fn test_consume_is_idempotent_and_restores() {
        let mut maze = MazeGrid::parse(TINY).unwrap();
        let dot = Vec2::new(2.0, -1.0);

        assert_eq!(maze.consume_at(dot), Some(CellKind::Dot));
        assert!(!maze.is_visible(IVec2::new(2, -1)));
        // Already eaten: nothing further happens
        assert_eq!(maze.consume_at(dot), None);
        // Walls and floor are never consumable
        assert_eq!(maze.consume_at(Vec2::new(0.0, 0.0)), None);
        assert_eq!(maze.consume_at(Vec2::new(1.0, -1.0)), None);

        maze.restore_collectibles();
        assert!(maze.is_visible(IVec2::new(2, -1)));
        assert_eq!(maze.consume_at(dot), Some(CellKind::Dot));
    }
}
