/// Keyboard state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered cut toggle (only fires on initial press)
///   - Simultaneous movement + toggle in the same tick
///
/// Terminals that report key Release events (kitty protocol) get exact
/// hold tracking; everywhere else a repeat-timeout approximates it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// After this duration without a Press/Repeat event, consider the key
/// released. Fallback for terminals without Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that transitioned "not held" → "held" during the most
    /// recent drain. Used for edge-triggered actions.
    fresh_presses: Vec<KeyCode>,
    ctrl_c: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            self.apply_key(key);
        }

        // Expire keys that stopped repeating (no-Release terminals).
        let now = Instant::now();
        self.last_active
            .retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply_key(&mut self, key: KeyEvent) {
        match key.kind {
            KeyEventKind::Release => {
                self.last_active.remove(&key.code);
            }
            _ => {
                // Press/Repeat only: a Ctrl-C Release from a terminal
                // that reports releases must not trigger the quit.
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
                {
                    self.ctrl_c = true;
                }
                let was_held = self.held_inner(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Is this key currently held? Used for continuous movement.
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_inner(code)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    fn held_inner(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
