/// Level initialization.
///
/// A level is procedural: fresh bordered grid, player on the top
/// border's midpoint, the Boss loose in the middle, and
/// `base_minions + level` minions scattered over interior Void cells.
/// Score and lives are session state and deliberately not touched
/// here — only starting a new session resets them.

use rand::Rng;

use crate::domain::entity::{Enemy, Player};
use crate::domain::grid::Grid;
use crate::sim::world::{Phase, WorldState};

/// Minimum cell distance between a spawned minion and the player
/// spawn, so a fresh level never opens with an instant threat.
const MINION_CLEARANCE: f32 = 6.0;

pub fn minion_count(base: usize, level: usize) -> usize {
    base + level
}

/// Reset grid, entities, power-ups, timer and status effects, then
/// enter the intro phase. Keeps score/lives/level counters.
pub fn start_level(world: &mut WorldState, level: usize, rng: &mut impl Rng) {
    let w = world.rules.grid_width;
    let h = world.rules.grid_height;

    world.level = level;
    world.grid = Grid::new(w, h);
    world.powerups.clear();
    world.enemies.clear();

    // Player spawns mid-top, on the Claimed border.
    let spawn = (w as f32 / 2.0 + 0.5, 0.5);
    world.player_spawn = spawn;
    world.player = Player::new(spawn.0, spawn.1);

    // The Boss anchors the flood-fill seed; it starts dead center.
    let (bvx, bvy) = random_diagonal(world.speed.boss_speed, rng);
    world
        .enemies
        .push(Enemy::boss(w as f32 / 2.0, h as f32 / 2.0, bvx, bvy));

    for _ in 0..minion_count(world.rules.base_minions, level) {
        let (x, y) = random_interior_cell(w, h, spawn, rng);
        let (vx, vy) = random_diagonal(world.speed.minion_speed, rng);
        world.enemies.push(Enemy::minion(x, y, vx, vy));
    }

    world.sim_time = 0.0;
    world.time_left = world.rules.level_time_secs;
    world.frozen_until = 0.0;
    world.invincible_until = 0.0;
    world.tick = 0;

    world.phase = Phase::LevelIntro;
    world.anim_tick = 0;
    world.set_message(&format!("Sector {}", level + 1), 60);
}

/// Diagonal velocity with random axis signs, classic bouncer style.
fn random_diagonal(speed: f32, rng: &mut impl Rng) -> (f32, f32) {
    let sx = if rng.gen::<bool>() { speed } else { -speed };
    let sy = if rng.gen::<bool>() { speed } else { -speed };
    (sx, sy)
}

/// Uniform interior cell center, rerolled until clear of the player
/// spawn. Interior cells are Void on a fresh grid, so no cell-state
/// check is needed here.
fn random_interior_cell(
    w: usize,
    h: usize,
    spawn: (f32, f32),
    rng: &mut impl Rng,
) -> (f32, f32) {
    loop {
        let x = rng.gen_range(1..w - 1) as f32 + 0.5;
        let y = rng.gen_range(1..h - 1) as f32 + 0.5;
        let (dx, dy) = (x - spawn.0, y - spawn.1);
        if (dx * dx + dy * dy).sqrt() >= MINION_CLEARANCE {
            return (x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::cell::Cell;
    use crate::domain::entity::EnemyKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fresh_world() -> WorldState {
        WorldState::new(&GameConfig::default())
    }

    #[test]
    fn level_has_exactly_one_boss() {
        let mut world = fresh_world();
        let mut rng = StdRng::seed_from_u64(7);
        start_level(&mut world, 0, &mut rng);
        let bosses = world
            .enemies
            .iter()
            .filter(|e| e.kind == EnemyKind::Boss)
            .count();
        assert_eq!(bosses, 1);
    }

    #[test]
    fn minion_count_scales_with_level() {
        let mut world = fresh_world();
        let mut rng = StdRng::seed_from_u64(7);
        for level in [0usize, 2, 5] {
            start_level(&mut world, level, &mut rng);
            let minions = world
                .enemies
                .iter()
                .filter(|e| e.kind == EnemyKind::Minion)
                .count();
            assert_eq!(minions, world.rules.base_minions + level);
        }
    }

    #[test]
    fn start_level_preserves_session_but_resets_status() {
        let mut world = fresh_world();
        let mut rng = StdRng::seed_from_u64(7);
        world.score = 1234;
        world.lives = 5;
        world.frozen_until = 99.0;
        world.invincible_until = 99.0;
        start_level(&mut world, 3, &mut rng);
        assert_eq!(world.score, 1234);
        assert_eq!(world.lives, 5);
        assert!(!world.frozen());
        assert!(!world.invincible());
        assert_eq!(world.time_left, world.rules.level_time_secs);
        assert!(world.powerups.is_empty());
        assert_eq!(world.phase, Phase::LevelIntro);
    }

    #[test]
    fn player_spawns_on_claimed_border() {
        let mut world = fresh_world();
        let mut rng = StdRng::seed_from_u64(7);
        start_level(&mut world, 0, &mut rng);
        let (px, py) = world.player.cell();
        assert_eq!(world.grid.cell(px, py).unwrap(), Cell::Claimed);
        assert_eq!(py, 0);
    }

    #[test]
    fn minions_spawn_in_the_interior_clear_of_the_player() {
        let mut world = fresh_world();
        let mut rng = StdRng::seed_from_u64(42);
        start_level(&mut world, 4, &mut rng);
        for e in world.enemies.iter().filter(|e| e.kind == EnemyKind::Minion) {
            let (x, y) = e.cell();
            assert_eq!(world.grid.cell(x, y).unwrap(), Cell::Void);
            let dx = e.x - world.player_spawn.0;
            let dy = e.y - world.player_spawn.1;
            assert!((dx * dx + dy * dy).sqrt() >= MINION_CLEARANCE);
        }
    }
}
