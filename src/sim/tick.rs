//! Per-tick simulation update
//!
//! One call to [`tick`] advances the whole game by one timestep, in a fixed
//! internal order that the mechanics depend on: player movement, timed
//! lifecycle transitions, wall clamping, collectible consumption, the ghost
//! pass, the spawner, and finally deferred removal of eaten ghosts. The
//! pellet flag set during consumption is read by the ghost pass of the same
//! tick, and the ghost pass iterates the live ghost set, which is why eaten
//! ghosts are only collected during the scan and removed at the end.

use crate::consts::*;
use crate::sim::collision::{circles_overlap, resolve_wall_collision};
use crate::sim::ghost::{self, SimError};
use crate::sim::maze::CellKind;
use crate::sim::state::{Direction, GameEvent, GamePhase, GameState, Ghost, GhostMode, TickInput};

/// Advance the game state by one timestep.
///
/// `dt` is the host frame delta in seconds; anything above
/// [`MAX_TICK_DT`] is clamped so a stalled host cannot step agents
/// through walls. Returns the fatal [`SimError`] if a ghost is boxed in
/// by defective level geometry.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Result<(), SimError> {
    let dt = dt.min(MAX_TICK_DT);
    if dt <= 0.0 {
        return Ok(());
    }
    state.clock += f64::from(dt);
    let now = state.clock;

    state.player.ate_pellet_this_tick = false;

    // Held commands only steer the player during active play
    if state.phase == GamePhase::Playing {
        apply_input(state, input, dt);
    }

    // Timed lifecycle transitions
    match state.phase {
        GamePhase::Won { at } if now - at >= ROUND_TRANSITION_DELAY => begin_next_round(state),
        GamePhase::Lost { at } if now - at >= ROUND_TRANSITION_DELAY && state.lives > 0 => {
            respawn_player(state);
        }
        _ => {}
    }

    if state.phase == GamePhase::Playing {
        state.player.position =
            resolve_wall_collision(&state.maze, state.player.position, state.player.radius);
        eat_at_player(state, now);
    }

    // Ghost pass: fear bookkeeping, movement, then contact with the player.
    // Ghosts keep wandering through the won/lost windows; only the contact
    // check is gated on active play.
    let pellet_eaten = state.player.ate_pellet_this_tick;
    let mut eaten: Vec<u32> = Vec::new();
    for i in 0..state.ghosts.len() {
        if pellet_eaten {
            state.ghosts[i].mode = GhostMode::Afraid { since: now };
        } else if let GhostMode::Afraid { since } = state.ghosts[i].mode {
            if now - since >= FRIGHT_DURATION {
                state.ghosts[i].mode = GhostMode::Normal;
            }
        }

        {
            let GameState {
                ghosts,
                maze,
                rng,
                ghost_speed,
                ..
            } = state;
            ghost::move_ghost(&mut ghosts[i], maze, rng, *ghost_speed, dt)?;
        }

        resolve_player_contact(state, i, now, &mut eaten);
    }

    maybe_spawn_ghost(state, now);

    // Deferred removal, applied as a batch after the scan
    if !eaten.is_empty() {
        state.ghosts.retain(|g| !eaten.contains(&g.id));
    }

    Ok(())
}

/// Integrate held turn/move commands into the player
fn apply_input(state: &mut GameState, input: &TickInput, dt: f32) {
    let step = state.player_speed * dt;
    let player = &mut state.player;

    if input.turn_left {
        player.heading = crate::normalize_angle(player.heading + PLAYER_TURN_RATE * dt);
    }
    if input.turn_right {
        player.heading = crate::normalize_angle(player.heading - PLAYER_TURN_RATE * dt);
    }
    // The movement axis is re-derived from the heading every tick; the
    // heading itself never touches the grid
    player.facing = Direction::from_heading(player.heading);

    if input.move_forward {
        player.position += player.facing.to_vec() * step;
        player.distance_moved += step * DISTANCE_SCALE;
    }
    if input.move_backward {
        player.position -= player.facing.to_vec() * step;
        player.distance_moved += step * DISTANCE_SCALE;
    }
}

/// Consume whatever collectible sits under the player
fn eat_at_player(state: &mut GameState, now: f64) {
    match state.maze.consume_at(state.player.position) {
        Some(CellKind::Dot) => {
            state.dots_eaten += 1;
            state.push_event(GameEvent::DotEaten);
            if state.dots_eaten == state.maze.total_dots() {
                state.phase = GamePhase::Won { at: now };
                state.push_event(GameEvent::RoundWon);
                log::info!("round won at t={now:.2}s");
            }
        }
        Some(CellKind::PowerPellet) => {
            state.player.ate_pellet_this_tick = true;
            state.push_event(GameEvent::PowerPelletEaten);
            log::debug!("power pellet eaten at t={now:.2}s");
        }
        _ => {}
    }
}

/// Contact between one ghost and the player: an afraid ghost dies, a
/// normal one kills
fn resolve_player_contact(state: &mut GameState, index: usize, now: f64, eaten: &mut Vec<u32>) {
    if state.phase != GamePhase::Playing {
        return;
    }
    let ghost = &state.ghosts[index];
    if !circles_overlap(
        ghost.position,
        ghost.radius,
        state.player.position,
        state.player.radius,
    ) {
        return;
    }

    if ghost.mode.is_afraid() {
        let id = ghost.id;
        eaten.push(id);
        state.push_event(GameEvent::GhostEaten { id });
        log::debug!("ghost {id} eaten");
    } else {
        state.lives = state.lives.saturating_sub(1);
        state.player.dying_since = Some(now);
        state.phase = GamePhase::Lost { at: now };
        state.push_event(GameEvent::PlayerDied);
        state.push_event(GameEvent::LifeLost {
            remaining: state.lives,
        });
        log::info!("player caught; {} lives remain", state.lives);
    }
}

/// Start the next round after a win: same maze, everything refilled,
/// everyone faster
fn begin_next_round(state: &mut GameState) {
    state.maze.restore_collectibles();
    let spawn = state.maze.player_spawn();
    state.player.respawn(spawn);
    state.ghosts.clear();
    state.player_speed += SPEED_INCREMENT;
    state.ghost_speed += SPEED_INCREMENT;
    state.dots_eaten = 0;
    state.phase = GamePhase::Playing;
    log::info!(
        "next round: player speed {:.1}, ghost speed {:.1}",
        state.player_speed,
        state.ghost_speed
    );
}

/// Put the player back after a lost life. Only called while lives remain;
/// at zero lives the lost phase is terminal.
fn respawn_player(state: &mut GameState) {
    let spawn = state.maze.player_spawn();
    state.player.respawn(spawn);
    state.phase = GamePhase::Playing;
    log::info!("player respawned; {} lives", state.lives);
}

/// Introduce one ghost at the spawn point when the population is below the
/// cap and the spawn interval has elapsed. Runs every tick regardless of
/// phase; a round reset clears whatever accumulated during the window.
fn maybe_spawn_ghost(state: &mut GameState, now: f64) {
    let Some(spawn) = state.maze.ghost_spawn() else {
        return;
    };
    if state.ghosts.len() >= MAX_GHOSTS || now - state.last_spawn_time <= GHOST_SPAWN_INTERVAL {
        return;
    }

    let id = state.next_entity_id();
    state.ghosts.push(Ghost::spawned(id, spawn));
    state.last_spawn_time = now;
    state.push_event(GameEvent::GhostSpawned { id });
    log::info!("ghost {id} spawned ({} active)", state.ghosts.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::CLASSIC_LEVEL;
    use crate::sim::maze::MazeGrid;
    use glam::{IVec2, Vec2};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 64.0;

    fn forward() -> TickInput {
        TickInput {
            move_forward: true,
            ..Default::default()
        }
    }

    fn run(state: &mut GameState, input: &TickInput, ticks: u32) {
        for _ in 0..ticks {
            tick(state, input, DT).unwrap();
        }
    }

    fn run_seconds(state: &mut GameState, input: &TickInput, seconds: f64) {
        let start = state.clock;
        while state.clock - start < seconds {
            tick(state, input, DT).unwrap();
        }
    }

    /// 3x3 open floor ringed by walls, a single dot right of the player
    fn dot_room() -> MazeGrid {
        MazeGrid::parse(&[
            "# # # # #",
            "#       #",
            "# P .   #",
            "#       #",
            "# # # # #",
        ])
        .unwrap()
    }

    /// Small open room with no collectibles
    fn open_room() -> MazeGrid {
        MazeGrid::parse(&[
            "# # # # #",
            "# P     #",
            "#       #",
            "# # # # #",
        ])
        .unwrap()
    }

    /// Walled-off player pocket next to a ring corridor the ghosts own;
    /// the two can never meet
    fn ghost_ring() -> MazeGrid {
        MazeGrid::parse(&[
            "# # # # # # #",
            "# P #       #",
            "# # #   #   #",
            "# # # G     #",
            "# # # # # # #",
        ])
        .unwrap()
    }

    #[test]
    fn test_oversized_dt_is_clamped() {
        let mut state = GameState::new(open_room(), 1);
        tick(&mut state, &TickInput::default(), 1.0).unwrap();
        assert_eq!(state.clock, f64::from(MAX_TICK_DT));
    }

    #[test]
    fn test_single_dot_win() {
        let mut state = GameState::new(dot_room(), 42);
        assert_eq!(state.maze.total_dots(), 1);

        // Walk right onto the dot
        state.player.heading = Direction::Right.heading();
        run(&mut state, &forward(), 20);

        assert_eq!(state.dots_eaten, 1);
        assert!(!state.maze.is_visible(IVec2::new(2, -2)));
        assert!(matches!(state.phase, GamePhase::Won { .. }));
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::DotEaten));
        assert!(events.contains(&GameEvent::RoundWon));
    }

    #[test]
    fn test_round_reset_after_win() {
        let mut state = GameState::new(dot_room(), 42);
        state.player.heading = Direction::Right.heading();
        run(&mut state, &forward(), 20);
        assert!(matches!(state.phase, GamePhase::Won { .. }));

        // Nothing changes during the celebration window...
        run_seconds(&mut state, &TickInput::default(), 2.5);
        assert!(matches!(state.phase, GamePhase::Won { .. }));
        assert_eq!(state.dots_eaten, 1);

        // ...then the next round starts: refilled maze, faster agents,
        // player back home, lives untouched
        run_seconds(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.dots_eaten, 0);
        assert!(state.maze.is_visible(IVec2::new(2, -2)));
        assert_eq!(state.player.position, state.maze.player_spawn());
        assert_eq!(state.player.distance_moved, 0.0);
        assert_eq!(state.lives, STARTING_LIVES);
        assert!((state.player_speed - (PLAYER_BASE_SPEED + SPEED_INCREMENT)).abs() < 1e-6);
        assert!((state.ghost_speed - (GHOST_BASE_SPEED + SPEED_INCREMENT)).abs() < 1e-6);
    }

    #[test]
    fn test_restart_resets_difficulty_ramp() {
        let mut state = GameState::new(dot_room(), 42);
        state.player.heading = Direction::Right.heading();
        run(&mut state, &forward(), 20);
        run_seconds(&mut state, &TickInput::default(), 3.5);
        assert!((state.player_speed - (PLAYER_BASE_SPEED + SPEED_INCREMENT)).abs() < 1e-6);

        state.restart(7);
        assert_eq!(state.player_speed, PLAYER_BASE_SPEED);
        assert_eq!(state.ghost_speed, GHOST_BASE_SPEED);
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.clock, 0.0);
        assert_eq!(state.dots_eaten, 0);
        assert!(state.maze.is_visible(IVec2::new(2, -2)));
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_dots_eaten_is_monotonic_within_round() {
        let mut state = GameState::new(dot_room(), 42);
        state.player.heading = Direction::Right.heading();
        let mut last = 0;
        for _ in 0..20 {
            tick(&mut state, &forward(), DT).unwrap();
            assert!(state.dots_eaten >= last);
            last = state.dots_eaten;
        }
    }

    #[test]
    fn test_afraid_timer_expires_after_ten_seconds() {
        let mut state = GameState::new(ghost_ring(), 5);
        let id = state.next_entity_id();
        let mut ghost = Ghost::spawned(id, Vec2::new(4.0, -1.0));
        ghost.mode = GhostMode::Afraid { since: 0.0 };
        state.ghosts.push(ghost);

        // 633 ticks of 1/64 s: t = 9.890625, still afraid
        run(&mut state, &TickInput::default(), 633);
        assert!(state.ghosts[0].mode.is_afraid());

        // 14 more: t = 10.109375, fear has expired
        run(&mut state, &TickInput::default(), 14);
        assert_eq!(state.ghosts[0].mode, GhostMode::Normal);
    }

    #[test]
    fn test_last_life_is_terminal() {
        let mut state = GameState::new(open_room(), 3);
        state.lives = 1;
        let id = state.next_entity_id();
        state.ghosts.push(Ghost::spawned(id, state.player.position));

        run(&mut state, &TickInput::default(), 1);
        assert_eq!(state.lives, 0);
        assert!(matches!(state.phase, GamePhase::Lost { .. }));
        assert!(state.game_over());
        assert!(!state.player.is_alive());
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PlayerDied));
        assert!(events.contains(&GameEvent::LifeLost { remaining: 0 }));

        // The respawn window passes without effect: lost for good
        run_seconds(&mut state, &TickInput::default(), 3.5);
        assert!(matches!(state.phase, GamePhase::Lost { .. }));
        assert!(state.game_over());
    }

    #[test]
    fn test_losing_a_life_respawns_while_lives_remain() {
        let mut state = GameState::new(open_room(), 3);
        let id = state.next_entity_id();
        state.ghosts.push(Ghost::spawned(id, state.player.position));

        run(&mut state, &TickInput::default(), 1);
        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert!(matches!(state.phase, GamePhase::Lost { .. }));
        assert!(!state.game_over());

        // Keep the respawn clean of a second instant collision
        state.ghosts.clear();
        run_seconds(&mut state, &TickInput::default(), 3.5);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.player.is_alive());
        assert_eq!(state.player.position, state.maze.player_spawn());
        assert_eq!(state.player.distance_moved, 0.0);
    }

    #[test]
    fn test_power_pellet_frightens_every_ghost_at_once() {
        let maze = MazeGrid::parse(&[
            "# # # # # #",
            "# P o     #",
            "#         #",
            "# # # # # #",
        ])
        .unwrap();
        let mut state = GameState::new(maze, 11);
        for x in [3.0, 4.0] {
            let id = state.next_entity_id();
            state.ghosts.push(Ghost::spawned(id, Vec2::new(x, -2.0)));
        }

        // Walk right onto the pellet at (2, -1)
        state.player.heading = Direction::Right.heading();
        run(&mut state, &forward(), 16);

        assert!(state.player.ate_pellet_this_tick);
        assert!(state.ghosts.iter().all(|g| g.mode.is_afraid()));
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::PowerPelletEaten)
        );

        // The flag lives for exactly the tick of consumption
        run(&mut state, &TickInput::default(), 1);
        assert!(!state.player.ate_pellet_this_tick);
        assert!(state.ghosts.iter().all(|g| g.mode.is_afraid()));
    }

    #[test]
    fn test_eating_afraid_ghost_removes_it() {
        let mut state = GameState::new(open_room(), 11);
        for x in [2.0, 3.0] {
            let id = state.next_entity_id();
            let mut ghost = Ghost::spawned(id, Vec2::new(x, -2.0));
            ghost.mode = GhostMode::Afraid { since: 0.0 };
            state.ghosts.push(ghost);
        }
        let victim = state.ghosts[0].id;
        let survivor = state.ghosts[1].id;

        state.ghosts[0].position = state.player.position;
        run(&mut state, &TickInput::default(), 1);

        assert_eq!(state.ghosts.len(), 1);
        assert_eq!(state.ghosts[0].id, survivor);
        assert_eq!(state.lives, STARTING_LIVES);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::GhostEaten { id: victim })
        );
    }

    #[test]
    fn test_spawner_caps_at_four() {
        let mut state = GameState::new(ghost_ring(), 9);

        run_seconds(&mut state, &TickInput::default(), 40.0);
        assert_eq!(state.ghosts.len(), MAX_GHOSTS);

        let spawned = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GhostSpawned { .. }))
            .count();
        assert_eq!(spawned, MAX_GHOSTS);

        // The cap holds from here on
        run_seconds(&mut state, &TickInput::default(), 10.0);
        assert_eq!(state.ghosts.len(), MAX_GHOSTS);
    }

    #[test]
    fn test_no_ghost_spawn_configured_means_no_ghosts() {
        let mut state = GameState::new(open_room(), 9);
        run_seconds(&mut state, &TickInput::default(), 20.0);
        assert!(state.ghosts.is_empty());
    }

    #[test]
    fn test_determinism() {
        let maze = MazeGrid::parse(CLASSIC_LEVEL).unwrap();
        let mut a = GameState::new(maze.clone(), 99);
        let mut b = GameState::new(maze, 99);

        let script = [
            forward(),
            TickInput {
                turn_left: true,
                move_forward: true,
                ..Default::default()
            },
            TickInput {
                turn_right: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        // Long enough for a ghost to spawn and wander
        for i in 0..600 {
            let input = script[i % script.len()];
            tick(&mut a, &input, DT).unwrap();
            tick(&mut b, &input, DT).unwrap();
        }

        assert_eq!(a.clock, b.clock);
        assert_eq!(a.player, b.player);
        assert_eq!(a.ghosts, b.ghosts);
        assert_eq!(a.dots_eaten, b.dots_eaten);
        assert!(!a.ghosts.is_empty());
    }

    /// Worst rim overreach into any wall the four cardinal probes detect
    fn wall_penetration(state: &GameState) -> f32 {
        let pos = state.player.position;
        let r = state.player.radius;
        let maze = &state.maze;
        let mut worst = 0.0f32;

        let left = crate::round_to_cell(pos - Vec2::new(r, 0.0));
        if maze.is_wall_cell(left) {
            worst = worst.max((left.x as f32 + 0.5) - (pos.x - r));
        }
        let right = crate::round_to_cell(pos + Vec2::new(r, 0.0));
        if maze.is_wall_cell(right) {
            worst = worst.max((pos.x + r) - (right.x as f32 - 0.5));
        }
        let top = crate::round_to_cell(pos + Vec2::new(0.0, r));
        if maze.is_wall_cell(top) {
            worst = worst.max((pos.y + r) - (top.y as f32 - 0.5));
        }
        let bottom = crate::round_to_cell(pos - Vec2::new(0.0, r));
        if maze.is_wall_cell(bottom) {
            worst = worst.max((bottom.y as f32 + 0.5) - (pos.y - r));
        }
        worst
    }

    proptest! {
        #[test]
        fn prop_player_never_ends_a_tick_inside_a_wall(
            seed in 0u64..512,
            cmds in proptest::collection::vec(0u8..16, 1..200),
        ) {
            let maze = MazeGrid::parse(CLASSIC_LEVEL).unwrap();
            let mut state = GameState::new(maze, seed);

            for cmd in cmds {
                let input = TickInput {
                    turn_left: cmd & 1 != 0,
                    turn_right: cmd & 2 != 0,
                    move_forward: cmd & 4 != 0,
                    move_backward: cmd & 8 != 0,
                };
                tick(&mut state, &input, DT).unwrap();
                prop_assert!(wall_penetration(&state) <= 1e-4);
            }
        }
    }
}
