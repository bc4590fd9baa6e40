/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::GameConfig;
use domain::entity::{Dir, FrameInput};
use sim::event::GameEvent;
use sim::level::start_level;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Minimum gap between trail-tick sounds, so holding a direction while
/// cutting doesn't machine-gun the blip.
const DRAW_SFX_GAP: Duration = Duration::from_millis(60);

fn main() {
    let config = GameConfig::load();

    let mut world = WorldState::new(&config);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Voidcut!");
    println!("Final Score: {}", world.score);
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut rng = StdRng::from_entropy();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    // Cut toggles are edge-triggered and can land between ticks, so
    // latch them here and hand them to the next step.
    let mut pending_cut = false;
    let mut last_draw_sfx = Instant::now() - DRAW_SFX_GAP;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, &gp, sound, config, &mut rng) {
            break;
        }

        if world.phase == Phase::Playing && !world.paused && cut_toggled(&kb, &gp) {
            pending_cut = true;
        }

        if last_tick.elapsed() >= tick_rate {
            // Only the level timer consumes wall-clock time; movement
            // distances stay fixed per tick.
            let dt = last_tick.elapsed().as_secs_f32();
            last_tick = Instant::now();

            if world.paused {
                // Pause blocks simulation but keeps the blink going.
                world.anim_tick = world.anim_tick.wrapping_add(1);
            } else {
                match world.phase {
                    Phase::Playing => {
                        let frame_input = FrameInput {
                            movement: detect_movement(&kb, &gp),
                            toggle_cut: std::mem::take(&mut pending_cut),
                        };
                        world.anim_tick = world.anim_tick.wrapping_add(1);
                        let events = step::step(world, frame_input, dt, &mut rng);
                        process_sound_events(sound, &events, &mut last_draw_sfx);
                    }
                    Phase::LevelIntro => {
                        tick_level_intro(world, sound);
                    }
                    Phase::Victory => {
                        world.anim_tick = world.anim_tick.wrapping_add(1);
                    }
                    _ => {}
                }

                // Message timer runs in every phase outside the sim.
                if world.phase != Phase::Playing && world.message_timer > 0 {
                    world.message_timer -= 1;
                    if world.message_timer == 0 {
                        world.message.clear();
                    }
                }
            }
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(
    sound: Option<&SoundEngine>,
    events: &[GameEvent],
    last_draw_sfx: &mut Instant,
) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::TrailDrawn { .. } => {
                if last_draw_sfx.elapsed() >= DRAW_SFX_GAP {
                    sfx.play_draw();
                    *last_draw_sfx = Instant::now();
                }
            }
            GameEvent::AreaClaimed { .. } => sfx.play_claim(),
            GameEvent::PowerUpCollected { .. } => sfx.play_powerup(),
            GameEvent::PlayerKilled => sfx.play_death(),
            GameEvent::LevelWon => sfx.play_win(),
            GameEvent::TimeUp => sfx.play_death(),
            _ => {}
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_CUT: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Char('x'), KeyCode::Char('X')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];

fn cut_toggled(kb: &InputState, gp: &GamepadState) -> bool {
    kb.any_pressed(KEYS_CUT) || gp.cut_pressed()
}

fn detect_movement(kb: &InputState, gp: &GamepadState) -> Option<Dir> {
    prioritize(
        kb.any_held(KEYS_UP) || kb.any_pressed(KEYS_UP) || gp.up_held(),
        kb.any_held(KEYS_DOWN) || kb.any_pressed(KEYS_DOWN) || gp.down_held(),
        kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) || gp.left_held(),
        kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) || gp.right_held(),
    )
}

/// One direction per tick. When several are active at once the fixed
/// priority is Up, then Down, then Left, then Right.
fn prioritize(up: bool, down: bool, left: bool, right: bool) -> Option<Dir> {
    if up {
        Some(Dir::Up)
    } else if down {
        Some(Dir::Down)
    } else if left {
        Some(Dir::Left)
    } else if right {
        Some(Dir::Right)
    } else {
        None
    }
}

/// Reset to the title screen.
fn return_to_title(world: &mut WorldState, config: &GameConfig) {
    *world = WorldState::new(config);
    world.phase = Phase::Title;
}

/// Fresh session from sector 1: score and lives reset here and only here.
fn start_new_game(world: &mut WorldState, rng: &mut StdRng) {
    world.score = 0;
    world.lives = world.rules.starting_lives;
    start_level(world, 0, rng);
}

fn handle_meta(
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    rng: &mut StdRng,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    let in_game = matches!(world.phase, Phase::Playing | Phase::LevelIntro);

    if in_game || world.paused {
        // F1 / p: Pause toggle
        if kb.any_pressed(&[KeyCode::F(1), KeyCode::Char('p'), KeyCode::Char('P')]) {
            world.paused = !world.paused;
            return false;
        }

        if world.paused {
            if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                world.paused = false;
                start_level(world, world.level, rng);
            } else if esc {
                world.paused = false;
                return_to_title(world, config);
            }
            return false; // block all other input while paused
        }
    }

    match world.phase {
        Phase::Title => {
            if confirm {
                start_new_game(world, rng);
            } else if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) || esc {
                return true;
            }
        }

        Phase::LevelIntro => {
            if confirm {
                world.phase = Phase::Playing;
                if let Some(sfx) = sound {
                    sfx.play_start();
                }
            } else if esc {
                return_to_title(world, config);
            }
        }

        Phase::Playing => {
            if esc {
                return_to_title(world, config);
            } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                start_level(world, world.level, rng);
            }
        }

        Phase::Victory => {
            if confirm {
                // Next sector keeps score and lives.
                let next = world.level + 1;
                start_level(world, next, rng);
            } else if esc {
                return_to_title(world, config);
            }
        }

        Phase::GameOver => {
            if confirm {
                start_new_game(world, rng);
            } else if esc {
                return_to_title(world, config);
            }
        }
    }

    false
}

// ── Intro animation ──

const INTRO_NAME_TICKS: u32 = 8;
const INTRO_ROWS_PER_TICK: u32 = 2;

fn tick_level_intro(world: &mut WorldState, sound: Option<&SoundEngine>) {
    world.anim_tick += 1;
    let reveal_ticks = (world.rules.grid_height as u32).div_ceil(INTRO_ROWS_PER_TICK);
    if world.anim_tick >= INTRO_NAME_TICKS + reveal_ticks + 6 {
        world.phase = Phase::Playing;
        world.anim_tick = 0;
        if let Some(sfx) = sound {
            sfx.play_start();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simultaneous_inputs_resolve_up_down_left_right() {
        assert_eq!(prioritize(true, true, true, true), Some(Dir::Up));
        assert_eq!(prioritize(false, true, true, true), Some(Dir::Down));
        assert_eq!(prioritize(false, false, true, true), Some(Dir::Left));
        assert_eq!(prioritize(false, false, false, true), Some(Dir::Right));
        assert_eq!(prioritize(false, false, false, false), None);
    }

    #[test]
    fn opposing_pairs_pick_the_higher_priority_axis() {
        assert_eq!(prioritize(true, true, false, false), Some(Dir::Up));
        assert_eq!(prioritize(false, true, false, true), Some(Dir::Down));
        assert_eq!(prioritize(true, false, false, true), Some(Dir::Up));
        assert_eq!(prioritize(false, false, true, true), Some(Dir::Left));
    }
}
