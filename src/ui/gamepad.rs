/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   A / X / R1            →  Toggle cut
///   Start                 →  Confirm / Restart
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A, // South
    B, // East
    X, // West
    Y, // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    cut: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            cut: vec![Btn::A, Btn::X, Btn::R1],
            confirm: vec![Btn::Start],
            cancel: vec![Btn::Select],
            restart: vec![Btn::Start],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],

    // D-pad and stick-as-dpad
    dpad: [BtnState; 4], // up, down, left, right
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

const DIR_UP: usize = 0;
const DIR_DOWN: usize = 1;
const DIR_LEFT: usize = 2;
const DIR_RIGHT: usize = 3;

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty lists keep the defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let cut = parse_list(&cfg.cut);
        if !cut.is_empty() {
            map.cut = cut;
        }
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() {
            map.confirm = cf;
        }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() {
            map.cancel = ca;
        }
        let rs = parse_list(&cfg.restart);
        if !rs.is_empty() {
            map.restart = rs;
        }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Derive stick digital states with edge detection.
        let held = [
            self.stick_y > STICK_DEADZONE,
            self.stick_y < -STICK_DEADZONE,
            self.stick_x < -STICK_DEADZONE,
            self.stick_x > STICK_DEADZONE,
        ];
        for (s, now) in self.stick.iter_mut().zip(held) {
            if now && !s.held {
                s.just_pressed = true;
            }
            s.held = now;
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dpad_idx = match gilrs_btn {
            Button::DPadUp => Some(DIR_UP),
            Button::DPadDown => Some(DIR_DOWN),
            Button::DPadLeft => Some(DIR_LEFT),
            Button::DPadRight => Some(DIR_RIGHT),
            _ => None,
        };
        if let Some(i) = dpad_idx {
            if held && !self.dpad[i].held {
                self.dpad[i].just_pressed = true;
            }
            self.dpad[i].held = held;
            return;
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            let s = &mut self.buttons[btn as usize];
            if held && !s.held {
                s.just_pressed = true;
            }
            s.held = held;
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn cut_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cut)
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }

    // Movement (continuous, held)
    pub fn up_held(&self) -> bool {
        self.dpad[DIR_UP].held || self.stick[DIR_UP].held
    }
    pub fn down_held(&self) -> bool {
        self.dpad[DIR_DOWN].held || self.stick[DIR_DOWN].held
    }
    pub fn left_held(&self) -> bool {
        self.dpad[DIR_LEFT].held || self.stick[DIR_LEFT].held
    }
    pub fn right_held(&self) -> bool {
        self.dpad[DIR_RIGHT].held || self.stick[DIR_RIGHT].held
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }
        for b in &mut self.dpad {
            b.just_pressed = false;
        }
        for b in &mut self.stick {
            b.just_pressed = false;
        }
    }

    #[cfg(feature = "gamepad")]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); BTN_COUNT];
        self.dpad = [BtnState::default(); 4];
        self.stick = [BtnState::default(); 4];
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
