/// WorldState: the complete snapshot of a running game.
///
/// Owned solely by the simulation loop. One `step()` call advances it
/// to completion; the renderer only reads it between steps, and input
/// reaches it only through `FrameInput`.
///
/// Timed status effects (freeze, invincibility) are future timestamps
/// on the simulation clock, compared against `sim_time` each tick —
/// no scheduled callbacks.

use crate::config::{GameConfig, RulesConfig, SpeedConfig};
use crate::domain::entity::{Enemy, Player, PowerUp};
use crate::domain::grid::Grid;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    /// Shell-side level reveal; the simulation does not run here.
    LevelIntro,
    Playing,
    Victory,
    GameOver,
}

pub struct WorldState {
    // ── Spatial state ──
    pub grid: Grid,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub powerups: Vec<PowerUp>,
    pub player_spawn: (f32, f32),

    // ── Clock / status effects ──
    /// Simulation time in seconds, reset at level start.
    pub sim_time: f32,
    /// Level countdown in seconds; loss when it reaches zero.
    pub time_left: f32,
    pub frozen_until: f32,
    pub invincible_until: f32,

    // ── Session ──
    pub phase: Phase,
    pub score: u32,
    pub lives: u32,
    pub level: usize,
    pub tick: u64,

    // ── Config ──
    pub speed: SpeedConfig,
    pub rules: RulesConfig,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
    pub paused: bool,
}

impl WorldState {
    pub fn new(config: &GameConfig) -> Self {
        WorldState {
            grid: Grid::new(config.rules.grid_width, config.rules.grid_height),
            player: Player::new(0.0, 0.0),
            enemies: vec![],
            powerups: vec![],
            player_spawn: (0.0, 0.0),
            sim_time: 0.0,
            time_left: config.rules.level_time_secs,
            frozen_until: 0.0,
            invincible_until: 0.0,
            phase: Phase::Title,
            score: 0,
            lives: config.rules.starting_lives,
            level: 0,
            tick: 0,
            speed: config.speed,
            rules: config.rules,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
            paused: false,
        }
    }

    /// Enemies neither move nor kill while frozen.
    pub fn frozen(&self) -> bool {
        self.sim_time < self.frozen_until
    }

    /// Player is immune to death checks while invincible.
    pub fn invincible(&self) -> bool {
        self.sim_time < self.invincible_until
    }

    pub fn owned_fraction(&self) -> f64 {
        self.grid.owned_fraction()
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}
