//! Collision resolution between circular agents and grid-aligned walls
//!
//! Positions are continuous but walls live on integer cells, so collision is
//! probe-based: sample the four points on the agent's rim along each cardinal
//! axis and push the agent out of whichever wall cells those probes landed in.

use glam::Vec2;

use crate::round_to_cell;
use crate::sim::maze::MazeGrid;

/// Half the width of a wall cell; a wall's face sits this far from its center
const WALL_HALF_EXTENT: f32 = 0.5;

/// Resolve an agent's position against the maze walls.
///
/// Each side is clamped independently, in the order left, right, top,
/// bottom: a probe that landed in a wall only corrects the axis component
/// pointing at that wall, leaving the other free. That is what lets an
/// agent slide along a wall it is pressed against instead of stopping
/// dead, and at corners it behaves differently from rejecting the whole
/// movement vector, so the per-side passes must stay separate.
///
/// After a probe hits, the position component is set so the agent's rim is
/// exactly flush with the wall face (half a cell plus the radius from the
/// wall's center).
pub fn resolve_wall_collision(maze: &MazeGrid, position: Vec2, radius: f32) -> Vec2 {
    let mut pos = position;

    let left = round_to_cell(pos - Vec2::new(radius, 0.0));
    if maze.is_wall_cell(left) {
        pos.x = left.x as f32 + WALL_HALF_EXTENT + radius;
    }

    let right = round_to_cell(pos + Vec2::new(radius, 0.0));
    if maze.is_wall_cell(right) {
        pos.x = right.x as f32 - WALL_HALF_EXTENT - radius;
    }

    let top = round_to_cell(pos + Vec2::new(0.0, radius));
    if maze.is_wall_cell(top) {
        pos.y = top.y as f32 - WALL_HALF_EXTENT - radius;
    }

    let bottom = round_to_cell(pos - Vec2::new(0.0, radius));
    if maze.is_wall_cell(bottom) {
        pos.y = bottom.y as f32 + WALL_HALF_EXTENT + radius;
    }

    pos
}

/// Circle-vs-circle overlap test used for agent contact
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) < reach * reach
}
