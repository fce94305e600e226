//! Keyboard input and accelerators.
//!
//! Keys are named values, never raw key codes: line export reacts to
//! `Key::Enter` and reads `Modifiers::ctrl`, and accelerators are looked up
//! by exact `KeyPress`.

use crate::command::Command;
use crate::config::Config;
use std::collections::HashMap;

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool, // Cmd on macOS, Win on Windows
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Ctrl modifier.
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Shift modifier.
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    /// Returns true if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.meta
    }

    /// Returns true for chords that should never type a character.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }

    /// Parses modifiers from a string like "ctrl+shift".
    pub fn parse(s: &str) -> Self {
        let mut mods = Modifiers::NONE;
        for part in s.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => mods.ctrl = true,
                "alt" | "option" => mods.alt = true,
                "shift" => mods.shift = true,
                "meta" | "cmd" | "win" | "super" => mods.meta = true,
                other => tracing::warn!("Unknown modifier '{}'", other),
            }
        }
        mods
    }
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            #[cfg(target_os = "macos")]
            parts.push("Cmd");
            #[cfg(not(target_os = "macos"))]
            parts.push("Win");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// A named key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Space,
}

impl Key {
    /// Parses a key from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "enter" | "return" => Some(Key::Enter),
            "tab" => Some(Key::Tab),
            "backspace" | "bs" => Some(Key::Backspace),
            "delete" | "del" => Some(Key::Delete),
            "escape" | "esc" => Some(Key::Escape),
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "home" => Some(Key::Home),
            "end" => Some(Key::End),
            "space" => Some(Key::Space),
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c.to_uppercase()),
            Key::Space => write!(f, "Space"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A key press event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    /// Creates a new key press.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A key pressed without modifiers.
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// Parses a binding string like "ctrl+s".
    pub fn parse(s: &str) -> Option<Self> {
        let (mods, key) = match s.rsplit_once('+') {
            Some((mods, key)) => (Modifiers::parse(mods), key),
            None => (Modifiers::NONE, s),
        };
        Some(Self::new(Key::parse(key.trim())?, mods))
    }
}

impl std::fmt::Display for KeyPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// Accelerator table.
///
/// Ctrl+Enter is intentionally left unbound; line export reads it.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<KeyPress, Command>,
}

impl Keymap {
    /// Creates a keymap with the default bindings.
    pub fn new() -> Self {
        let ctrl = |c| KeyPress::new(Key::Char(c), Modifiers::CTRL);
        let bindings = HashMap::from([
            (ctrl('n'), Command::NewFile),
            (ctrl('o'), Command::OpenFile),
            (ctrl('s'), Command::Save),
            (ctrl('w'), Command::CloseTab),
            (ctrl('q'), Command::Quit),
            (ctrl('z'), Command::Undo),
            (ctrl('y'), Command::Redo),
        ]);
        Self { bindings }
    }

    /// Creates a keymap from the defaults plus user bindings.
    pub fn from_config(config: &Config) -> Self {
        let mut keymap = Self::new();

        for (key_str, cmd_str) in &config.keyboard.bindings {
            match (KeyPress::parse(key_str), Command::parse(cmd_str)) {
                (Some(key), Some(cmd)) => {
                    keymap.bind(key, cmd);
                }
                _ => tracing::warn!("Ignoring key binding {} = {}", key_str, cmd_str),
            }
        }

        keymap
    }

    /// Adds or replaces a binding, returning the command it displaced.
    pub fn bind(&mut self, key: KeyPress, command: Command) -> Option<Command> {
        self.bindings.insert(key, command)
    }

    /// Looks up the command bound to a key press.
    pub fn lookup(&self, key: &KeyPress) -> Option<&Command> {
        self.bindings.get(key)
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypress_parse() {
        let kp = KeyPress::parse("ctrl+s").unwrap();
        assert_eq!(kp.key, Key::Char('s'));
        assert!(kp.modifiers.ctrl);

        let kp = KeyPress::parse("Ctrl+Shift+Enter").unwrap();
        assert_eq!(kp.key, Key::Enter);
        assert!(kp.modifiers.ctrl && kp.modifiers.shift);

        assert_eq!(KeyPress::parse("enter"), Some(KeyPress::plain(Key::Enter)));
        assert_eq!(KeyPress::parse("ctrl+nope"), None);
    }

    #[test]
    fn test_enter_variants_are_distinct() {
        let enter = KeyPress::plain(Key::Enter);
        let ctrl_enter = KeyPress::new(Key::Enter, Modifiers::CTRL);
        assert_ne!(enter, ctrl_enter);
        assert_eq!(ctrl_enter.to_string(), "Ctrl+Enter");
    }

    #[test]
    fn test_keymap_defaults() {
        let keymap = Keymap::new();
        let save = KeyPress::new(Key::Char('s'), Modifiers::CTRL);
        assert_eq!(keymap.lookup(&save), Some(&Command::Save));
        assert_eq!(keymap.lookup(&KeyPress::new(Key::Enter, Modifiers::CTRL)), None);
    }

    #[test]
    fn test_keymap_from_config() {
        let mut config = Config::default();
        config
            .keyboard
            .bindings
            .insert("ctrl+shift+n".into(), "file.new".into());
        config
            .keyboard
            .bindings
            .insert("ctrl+s".into(), "no.such.command".into());

        let keymap = Keymap::from_config(&config);
        let chord = KeyPress::parse("ctrl+shift+n").unwrap();
        assert_eq!(keymap.lookup(&chord), Some(&Command::NewFile));
        // Invalid override leaves the default in place
        let save = KeyPress::new(Key::Char('s'), Modifiers::CTRL);
        assert_eq!(keymap.lookup(&save), Some(&Command::Save));
    }
}
