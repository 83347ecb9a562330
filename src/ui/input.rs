/// Input state tracker.
///
/// Tracks which keys are currently held down so both players can move at
/// once from one keyboard:
///   - WASD   → P1
///   - Arrows → P2
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it (only the most recently pressed key repeats there, so
/// simultaneous play is much smoother with enhancement).

use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::{FrameInput, MoveIntent};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

struct Bindings {
    up: &'static [KeyCode],
    down: &'static [KeyCode],
    left: &'static [KeyCode],
    right: &'static [KeyCode],
}

const P1_KEYS: Bindings = Bindings {
    up: &[KeyCode::Char('w'), KeyCode::Char('W')],
    down: &[KeyCode::Char('s'), KeyCode::Char('S')],
    left: &[KeyCode::Char('a'), KeyCode::Char('A')],
    right: &[KeyCode::Char('d'), KeyCode::Char('D')],
};

const P2_KEYS: Bindings = Bindings {
    up: &[KeyCode::Up],
    down: &[KeyCode::Down],
    left: &[KeyCode::Left],
    right: &[KeyCode::Right],
};

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys pressed (not repeated) during the most recent drain. Meta keys
    /// read these so holding `r` restarts once.
    fresh_presses: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new(honor_release: bool) -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            honor_release,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) -> io::Result<()> {
        self.fresh_presses.clear();

        while poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else { continue };

            match key.kind {
                KeyEventKind::Release if self.honor_release => {
                    self.last_active.remove(&key.code);
                }
                KeyEventKind::Release => {}
                KeyEventKind::Press => {
                    let was_held = self.is_held(key.code);
                    self.last_active.insert(key.code, Instant::now());
                    if !was_held {
                        self.fresh_presses.push(key);
                    }
                }
                KeyEventKind::Repeat => {
                    self.last_active.insert(key.code, Instant::now());
                }
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        if !self.honor_release {
            let now = Instant::now();
            self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
        Ok(())
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| self.honor_release || t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Key presses from the most recent drain, in arrival order.
    pub fn presses(&self) -> &[KeyEvent] {
        &self.fresh_presses
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.fresh_presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    /// Movement intents for both players from the held keys.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            p1: self.intent(&P1_KEYS),
            p2: self.intent(&P2_KEYS),
        }
    }

    // ── Internal ──

    fn intent(&self, keys: &Bindings) -> MoveIntent {
        MoveIntent {
            up: self.any_held(keys.up),
            down: self.any_held(keys.down),
            left: self.any_held(keys.left),
            right: self.any_held(keys.right),
        }
    }

    #[cfg(test)]
    fn hold(&mut self, code: KeyCode) {
        self.last_active.insert(code, Instant::now());
    }
}
