//! Ghost movement and turn decisions
//!
//! Ghosts travel in straight lines and only reconsider their direction at the
//! moment they cross from one grid cell into the next. The crossing is
//! detected with a half-step probe: a point half a cell ahead of the ghost,
//! rounded to a cell. When the probe's cell changes between the start and end
//! of a movement step, the ghost center has just passed a cell center and a
//! turn decision is due.

use glam::IVec2;
use rand::Rng;
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::sim::maze::MazeGrid;
use crate::sim::state::Ghost;
use crate::{cell_center, round_to_cell};

/// Fatal simulation faults. These indicate broken level content, not
/// recoverable runtime conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// A ghost reached a junction with walls ahead, left, and right.
    /// Mazes are authored so that never happens; freezing the ghost
    /// silently would just hide the defect.
    #[error("ghost {id} has no open cell at junction ({}, {})", .cell.x, .cell.y)]
    GhostStuck { id: u32, cell: IVec2 },
}

/// Advance a ghost by one tick's travel, turning at cell boundaries.
///
/// At a boundary crossing the ghost re-decides its direction whenever the
/// cell ahead is a wall or a side corridor is open; in a plain corridor
/// (forward open, both sides walled) it keeps going. Candidates are the
/// open cells among forward/left/right - never the cell behind - and the
/// choice among them is uniform from the injected RNG. On a turn the ghost
/// snaps to the cell center it is crossing and re-advances by this tick's
/// travel along the new direction, so it never stalls on the corner.
pub fn move_ghost(
    ghost: &mut Ghost,
    maze: &MazeGrid,
    rng: &mut Pcg32,
    speed: f32,
    dt: f32,
) -> Result<(), SimError> {
    let step = speed * dt;

    let probe_before = round_to_cell(ghost.position + ghost.direction.to_vec() * 0.5);
    ghost.position += ghost.direction.to_vec() * step;
    let probe_after = round_to_cell(ghost.position + ghost.direction.to_vec() * 0.5);

    if probe_after == probe_before {
        return Ok(());
    }

    // Crossing a boundary: the ghost center is at the junction cell's
    // center, and the half-step probe is the cell ahead of it.
    let junction = round_to_cell(ghost.position);
    let left = ghost.direction.turned_left();
    let right = ghost.direction.turned_right();

    let forward_wall = maze.is_wall_cell(junction + ghost.direction.offset());
    let left_wall = maze.is_wall_cell(junction + left.offset());
    let right_wall = maze.is_wall_cell(junction + right.offset());

    if forward_wall || !left_wall || !right_wall {
        let mut candidates = Vec::with_capacity(3);
        if !forward_wall {
            candidates.push(ghost.direction);
        }
        if !left_wall {
            candidates.push(left);
        }
        if !right_wall {
            candidates.push(right);
        }

        if candidates.is_empty() {
            return Err(SimError::GhostStuck {
                id: ghost.id,
                cell: junction,
            });
        }
        let choice = candidates[rng.random_range(0..candidates.len())];

        ghost.direction = choice;
        ghost.position = cell_center(junction) + choice.to_vec() * step;
    }

    Ok(())
}
