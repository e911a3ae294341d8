//! Terminal input translation
//!
//! Maps crossterm key events onto engine key transitions. Terminals without
//! the keyboard enhancement protocol never report key releases, so held
//! movement keys are released after a short timeout unless a repeat event
//! keeps them alive. DAS and ARR themselves run inside the engine.

use crate::game::{Key, KeyEvent};
use crate::settings::KeyBindings as KeyNames;
use crossterm::event::{self as term, KeyCode, KeyEventKind, KeyModifiers, ModifierKeyCode};
use std::time::{Duration, Instant};

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// What a terminal key event means to the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(KeyEvent),
    /// Leave the program
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Game(Key),
    Quit,
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    entries: Vec<(KeyCode, Binding)>,
}

impl KeyBindings {
    /// Parse a key name into a KeyCode
    pub fn parse_key(s: &str) -> Option<KeyCode> {
        let code = match s.to_lowercase().as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "esc" | "escape" => KeyCode::Esc,
            "shift" => KeyCode::Modifier(ModifierKeyCode::LeftShift),
            "ctrl" | "control" => KeyCode::Modifier(ModifierKeyCode::LeftControl),
            "alt" => KeyCode::Modifier(ModifierKeyCode::LeftAlt),
            s => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(code)
    }

    /// Create keybindings from the settings file's key names
    pub fn from_settings(names: &KeyNames) -> Self {
        let groups: [(&[String], Binding); 10] = [
            (names.move_left.as_slice(), Binding::Game(Key::Left)),
            (names.move_right.as_slice(), Binding::Game(Key::Right)),
            (names.soft_drop.as_slice(), Binding::Game(Key::SoftDrop)),
            (names.hard_drop.as_slice(), Binding::Game(Key::HardDrop)),
            (names.rotate_cw.as_slice(), Binding::Game(Key::RotateCw)),
            (names.rotate_ccw.as_slice(), Binding::Game(Key::RotateCcw)),
            (names.hold.as_slice(), Binding::Game(Key::Hold)),
            (names.abort.as_slice(), Binding::Game(Key::Abort)),
            (names.restart.as_slice(), Binding::Game(Key::Restart)),
            (names.quit.as_slice(), Binding::Quit),
        ];

        let mut entries = Vec::new();
        for (keys, binding) in groups {
            for name in keys {
                match Self::parse_key(name) {
                    Some(code) => entries.push((code, binding)),
                    None => tracing::warn!("Ignoring unknown key name {:?}", name),
                }
            }
        }
        Self { entries }
    }

    fn lookup(&self, code: KeyCode) -> Option<Binding> {
        self.entries
            .iter()
            .find(|(bound, _)| *bound == code)
            .map(|&(_, binding)| binding)
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_settings(&KeyNames::default())
    }
}

#[derive(Debug, Clone, Copy)]
struct HeldKey {
    key: Key,
    last_seen: Instant,
}

/// Keys the engine tracks as held rather than acting once
fn is_continuous(key: Key) -> bool {
    matches!(key, Key::Left | Key::Right | Key::SoftDrop)
}

/// Input handler producing engine key transitions
#[derive(Debug, Clone)]
pub struct InputHandler {
    bindings: KeyBindings,
    held: Vec<HeldKey>,
    /// Whether the terminal reports key releases
    release_events: bool,
}

impl InputHandler {
    pub fn new(bindings: KeyBindings, release_events: bool) -> Self {
        Self {
            bindings,
            held: Vec::new(),
            release_events,
        }
    }

    /// Translate a terminal key event
    pub fn handle(&mut self, event: term::KeyEvent) -> Vec<Input> {
        self.handle_at(event, Instant::now())
    }

    fn handle_at(&mut self, event: term::KeyEvent, now: Instant) -> Vec<Input> {
        // Handle Ctrl+C for quit
        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            return vec![Input::Quit];
        }

        let Some(binding) = self.bindings.lookup(normalize_key(event.code)) else {
            return Vec::new();
        };
        let key = match binding {
            Binding::Quit if event.kind == KeyEventKind::Press => return vec![Input::Quit],
            Binding::Quit => return Vec::new(),
            Binding::Game(key) => key,
        };

        match event.kind {
            KeyEventKind::Release => self.release(key).into_iter().collect(),
            _ if is_continuous(key) => {
                if let Some(held) = self.held.iter_mut().find(|held| held.key == key) {
                    held.last_seen = now;
                    return Vec::new();
                }
                self.held.push(HeldKey {
                    key,
                    last_seen: now,
                });
                vec![Input::Key(KeyEvent::down(key))]
            }
            // Holding a discrete key does not repeat it
            KeyEventKind::Repeat => Vec::new(),
            KeyEventKind::Press => vec![
                Input::Key(KeyEvent::down(key)),
                Input::Key(KeyEvent::up(key)),
            ],
        }
    }

    fn release(&mut self, key: Key) -> Option<Input> {
        let position = self.held.iter().position(|held| held.key == key)?;
        self.held.remove(position);
        Some(Input::Key(KeyEvent::up(key)))
    }

    /// Release held keys that have not been seen recently (call every frame)
    pub fn expire(&mut self) -> Vec<Input> {
        self.expire_at(Instant::now())
    }

    fn expire_at(&mut self, now: Instant) -> Vec<Input> {
        if self.release_events {
            return Vec::new();
        }
        let mut released = Vec::new();
        self.held.retain(|held| {
            let alive = now.duration_since(held.last_seen) <= KEY_TIMEOUT;
            if !alive {
                released.push(Input::Key(KeyEvent::up(held.key)));
            }
            alive
        });
        released
    }

    /// Release everything currently held
    pub fn clear(&mut self) -> Vec<Input> {
        self.held
            .drain(..)
            .map(|held| Input::Key(KeyEvent::up(held.key)))
            .collect()
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(code: KeyCode, kind: KeyEventKind) -> term::KeyEvent {
        term::KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    fn press(code: KeyCode) -> term::KeyEvent {
        event(code, KeyEventKind::Press)
    }

    fn handler(release_events: bool) -> InputHandler {
        InputHandler::new(KeyBindings::default(), release_events)
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(KeyBindings::parse_key("Space"), Some(KeyCode::Char(' ')));
        assert_eq!(KeyBindings::parse_key("ESC"), Some(KeyCode::Esc));
        assert_eq!(KeyBindings::parse_key("x"), Some(KeyCode::Char('x')));
        assert_eq!(KeyBindings::parse_key("nonsense"), None);
    }

    #[test]
    fn test_discrete_key_acts_once() {
        let mut input = handler(true);
        let now = Instant::now();
        assert_eq!(
            input.handle_at(press(KeyCode::Char(' ')), now),
            vec![
                Input::Key(KeyEvent::down(Key::HardDrop)),
                Input::Key(KeyEvent::up(Key::HardDrop)),
            ]
        );
        assert!(input
            .handle_at(event(KeyCode::Char(' '), KeyEventKind::Repeat), now)
            .is_empty());
        assert!(input
            .handle_at(event(KeyCode::Char(' '), KeyEventKind::Release), now)
            .is_empty());
    }

    #[test]
    fn test_held_key_with_release_events() {
        let mut input = handler(true);
        let now = Instant::now();
        assert_eq!(
            input.handle_at(press(KeyCode::Left), now),
            vec![Input::Key(KeyEvent::down(Key::Left))]
        );
        assert!(input
            .handle_at(event(KeyCode::Left, KeyEventKind::Repeat), now)
            .is_empty());
        // No timeout when releases are reported
        assert!(input.expire_at(now + Duration::from_secs(5)).is_empty());
        assert_eq!(
            input.handle_at(event(KeyCode::Left, KeyEventKind::Release), now),
            vec![Input::Key(KeyEvent::up(Key::Left))]
        );
    }

    #[test]
    fn test_held_key_times_out() {
        let mut input = handler(false);
        let start = Instant::now();
        input.handle_at(press(KeyCode::Down), start);
        // A repeat keeps it alive
        let later = start + Duration::from_millis(80);
        assert!(input.handle_at(press(KeyCode::Down), later).is_empty());
        assert!(input.expire_at(later + Duration::from_millis(50)).is_empty());
        assert_eq!(
            input.expire_at(later + Duration::from_millis(150)),
            vec![Input::Key(KeyEvent::up(Key::SoftDrop))]
        );
        assert!(input.clear().is_empty());
    }

    #[test]
    fn test_unknown_and_quit_keys() {
        let mut input = handler(false);
        let now = Instant::now();
        assert!(input.handle_at(press(KeyCode::F(5)), now).is_empty());
        assert_eq!(input.handle_at(press(KeyCode::Char('Q')), now), vec![Input::Quit]);
        let ctrl_c = term::KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(input.handle_at(ctrl_c, now), vec![Input::Quit]);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut input = handler(true);
        let now = Instant::now();
        input.handle_at(press(KeyCode::Left), now);
        input.handle_at(press(KeyCode::Right), now);
        let released = input.clear();
        assert_eq!(released.len(), 2);
        assert!(released.contains(&Input::Key(KeyEvent::up(Key::Right))));
    }
}
