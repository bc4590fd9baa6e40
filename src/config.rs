/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
}

/// Tick cadence and per-tick movement distances.
/// Movement is fixed per tick, deliberately not delta-scaled — the
/// reference feel depends on it. Only the level timer uses wall-clock
/// delta time.
#[derive(Clone, Copy, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_speed: f32, // cells per tick
    pub minion_speed: f32,
    pub boss_speed: f32,
}

/// Level and scoring rules.
#[derive(Clone, Copy, Debug)]
pub struct RulesConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    pub base_minions: usize,   // minion count = base + level index
    pub level_time_secs: f32,
    pub win_fraction: f64,     // owned fraction that ends the level
    pub starting_lives: u32,
    pub powerup_chance: f64,   // per-tick spawn probability
    pub max_powerups: usize,   // live cap
    pub freeze_secs: f32,
    pub invincible_secs: f32,
    pub time_bonus_secs: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub cut: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_minion_speed")]
    minion_speed: f32,
    #[serde(default = "default_boss_speed")]
    boss_speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_grid_width")]
    grid_width: usize,
    #[serde(default = "default_grid_height")]
    grid_height: usize,
    #[serde(default = "default_base_minions")]
    base_minions: usize,
    #[serde(default = "default_level_time")]
    level_time_secs: f32,
    #[serde(default = "default_win_fraction")]
    win_fraction: f64,
    #[serde(default = "default_starting_lives")]
    starting_lives: u32,
    #[serde(default = "default_powerup_chance")]
    powerup_chance: f64,
    #[serde(default = "default_max_powerups")]
    max_powerups: usize,
    #[serde(default = "default_freeze_secs")]
    freeze_secs: f32,
    #[serde(default = "default_invincible_secs")]
    invincible_secs: f32,
    #[serde(default = "default_time_bonus_secs")]
    time_bonus_secs: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_cut")]
    cut: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 50 }
fn default_player_speed() -> f32 { 0.5 }
fn default_minion_speed() -> f32 { 0.35 }
fn default_boss_speed() -> f32 { 0.25 }

fn default_grid_width() -> usize { 64 }
fn default_grid_height() -> usize { 48 }
fn default_base_minions() -> usize { 3 }
fn default_level_time() -> f32 { 120.0 }
fn default_win_fraction() -> f64 { 0.8 }
fn default_starting_lives() -> u32 { 3 }
fn default_powerup_chance() -> f64 { 0.005 }
fn default_max_powerups() -> usize { 3 }
fn default_freeze_secs() -> f32 { 5.0 }
fn default_invincible_secs() -> f32 { 7.0 }
fn default_time_bonus_secs() -> f32 { 30.0 }

fn default_cut() -> Vec<String> { vec!["A".into(), "X".into(), "R1".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_speed: default_player_speed(),
            minion_speed: default_minion_speed(),
            boss_speed: default_boss_speed(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            base_minions: default_base_minions(),
            level_time_secs: default_level_time(),
            win_fraction: default_win_fraction(),
            starting_lives: default_starting_lives(),
            powerup_chance: default_powerup_chance(),
            max_powerups: default_max_powerups(),
            freeze_secs: default_freeze_secs(),
            invincible_secs: default_invincible_secs(),
            time_bonus_secs: default_time_bonus_secs(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            cut: default_cut(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        GameConfig::from_toml(load_toml(&candidate_dirs()))
    }

    /// Convert the raw TOML schema, clamping values the simulation
    /// cannot tolerate: grid dimensions below the border-plus-interior
    /// minimum, and a player speed above one cell per tick (the trail
    /// is deposited on the target cell only, so a faster player would
    /// skip cells and leave gaps in the cut).
    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: t.speed.tick_rate_ms,
                player_speed: t.speed.player_speed.min(1.0),
                minion_speed: t.speed.minion_speed,
                boss_speed: t.speed.boss_speed,
            },
            rules: RulesConfig {
                grid_width: t.rules.grid_width.max(8),
                grid_height: t.rules.grid_height.max(8),
                base_minions: t.rules.base_minions,
                level_time_secs: t.rules.level_time_secs,
                win_fraction: t.rules.win_fraction,
                starting_lives: t.rules.starting_lives,
                powerup_chance: t.rules.powerup_chance,
                max_powerups: t.rules.max_powerups,
                freeze_secs: t.rules.freeze_secs,
                invincible_secs: t.rules.invincible_secs,
                time_bonus_secs: t.rules.time_bonus_secs,
            },
            gamepad: GamepadConfig {
                cut: t.gamepad.cut,
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
                restart: t.gamepad.restart,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_speed_is_capped_at_one_cell_per_tick() {
        let mut t = TomlConfig::default();
        t.speed.player_speed = 2.5;
        let cfg = GameConfig::from_toml(t);
        assert_eq!(cfg.speed.player_speed, 1.0);
    }

    #[test]
    fn player_speed_at_or_below_one_passes_through() {
        let mut t = TomlConfig::default();
        t.speed.player_speed = 0.75;
        let cfg = GameConfig::from_toml(t);
        assert_eq!(cfg.speed.player_speed, 0.75);
    }

    #[test]
    fn grid_dimensions_have_a_floor() {
        let mut t = TomlConfig::default();
        t.rules.grid_width = 2;
        t.rules.grid_height = 0;
        let cfg = GameConfig::from_toml(t);
        assert_eq!(cfg.rules.grid_width, 8);
        assert_eq!(cfg.rules.grid_height, 8);
    }
}
