//! Global keyboard shortcuts
//!
//! Shortcuts are written as strings:
//! - `mod+k`: one chord; `mod` is the platform's primary modifier
//!   (Ctrl, or Cmd on macOS), `ctrl`/`cmd`/`meta` are accepted as aliases
//! - `g i`: a sequence of two chords typed one after the other
//!
//! A [`ShortcutResolver`] consumes chords as they are pressed and keeps the
//! pending prefix of a sequence between calls.

use crate::error::KeymapError;
use std::fmt;
use std::str::FromStr;

/// Longest supported chord sequence
pub const MAX_SEQUENCE: usize = 2;

/// Modifier keys held with a chord
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Ctrl / Cmd
    pub primary: bool,
    /// Alt / Option
    pub alt: bool,
    /// Shift
    pub shift: bool,
}

/// One key press with modifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    /// Modifiers
    pub modifiers: Modifiers,
    /// Lowercase key name (`k`, `escape`, `enter`, ...)
    pub key: String,
}

impl Chord {
    /// Bare key
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            modifiers: Modifiers::default(),
            key: normalize_key(&key.into()),
        }
    }

    /// Key with the primary modifier
    #[must_use]
    pub fn primary(key: impl Into<String>) -> Self {
        Self {
            modifiers: Modifiers {
                primary: true,
                ..Modifiers::default()
            },
            ..Self::key(key)
        }
    }
}

impl FromStr for Chord {
    type Err = KeymapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KeymapError::Empty);
        }
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key = parts.pop().unwrap_or_default();
        if key.is_empty() {
            return Err(KeymapError::MissingKey(s.to_string()));
        }

        let mut modifiers = Modifiers::default();
        for part in parts {
            match part.to_ascii_lowercase().as_str() {
                "mod" | "ctrl" | "control" | "cmd" | "meta" => modifiers.primary = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                other => return Err(KeymapError::UnknownModifier(other.to_string())),
            }
        }

        Ok(Self {
            modifiers,
            key: normalize_key(key),
        })
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.primary {
            f.write_str("mod+")?;
        }
        if self.modifiers.alt {
            f.write_str("alt+")?;
        }
        if self.modifiers.shift {
            f.write_str("shift+")?;
        }
        f.write_str(&self.key)
    }
}

fn normalize_key(key: &str) -> String {
    match key.to_lowercase().as_str() {
        "esc" => "escape".to_string(),
        "return" => "enter".to_string(),
        " " | "spacebar" => "space".to_string(),
        other => other.to_string(),
    }
}

/// Chord sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut(Vec<Chord>);

impl Shortcut {
    /// Chords in press order
    #[inline]
    #[must_use]
    pub fn chords(&self) -> &[Chord] {
        &self.0
    }

    fn starts_with(&self, prefix: &[Chord]) -> bool {
        self.0.starts_with(prefix)
    }
}

impl FromStr for Shortcut {
    type Err = KeymapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chords = s
            .split_whitespace()
            .map(Chord::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if chords.is_empty() {
            return Err(KeymapError::Empty);
        }
        if chords.len() > MAX_SEQUENCE {
            return Err(KeymapError::TooLong {
                shortcut: s.to_string(),
                len: chords.len(),
                max: MAX_SEQUENCE,
            });
        }
        Ok(Self(chords))
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{chord}")?;
        }
        Ok(())
    }
}

/// What a shortcut does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open or close the command palette
    TogglePalette,
    /// Navigate to a page
    Navigate(String),
}

/// Shortcut bindings
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<(Shortcut, Command)>,
}

impl Keymap {
    /// Empty keymap
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `shortcut` to `command`
    ///
    /// # Errors
    /// - Parse errors from [`Shortcut::from_str`]
    /// - `KeymapError::Conflict` when the shortcut equals an existing binding
    ///   or one is a prefix of the other
    pub fn bind(&mut self, shortcut: &str, command: Command) -> Result<(), KeymapError> {
        let shortcut: Shortcut = shortcut.parse()?;
        if let Some((existing, _)) = self
            .bindings
            .iter()
            .find(|(bound, _)| bound.starts_with(shortcut.chords()) || shortcut.starts_with(bound.chords()))
        {
            return Err(KeymapError::Conflict {
                new: shortcut.to_string(),
                existing: existing.to_string(),
            });
        }
        self.bindings.push((shortcut, command));
        Ok(())
    }

    /// Bindings in insertion order
    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &[(Shortcut, Command)] {
        &self.bindings
    }

    /// Shortcut bound to `command`, for display
    #[must_use]
    pub fn shortcut_for(&self, command: &Command) -> Option<&Shortcut> {
        self.bindings
            .iter()
            .find(|(_, bound)| bound == command)
            .map(|(shortcut, _)| shortcut)
    }

    fn exact(&self, chords: &[Chord]) -> Option<&Command> {
        self.bindings
            .iter()
            .find(|(shortcut, _)| shortcut.chords() == chords)
            .map(|(_, command)| command)
    }

    fn is_prefix(&self, chords: &[Chord]) -> bool {
        self.bindings
            .iter()
            .any(|(shortcut, _)| shortcut.chords().len() > chords.len() && shortcut.starts_with(chords))
    }
}

/// Outcome of one chord
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A binding fired
    Matched(Command),
    /// Chord started a sequence; waiting for the next one
    Pending,
    /// Nothing bound
    Unbound,
}

/// Stateful chord-to-command resolver
#[derive(Debug, Clone)]
pub struct ShortcutResolver {
    keymap: Keymap,
    pending: Vec<Chord>,
}

impl ShortcutResolver {
    /// Resolver over `keymap`
    #[must_use]
    pub fn new(keymap: Keymap) -> Self {
        Self {
            keymap,
            pending: Vec::new(),
        }
    }

    /// Feed one pressed chord
    ///
    /// A chord that breaks a pending sequence is retried on its own, so
    /// `g x g i` still resolves the trailing `g i`.
    pub fn feed(&mut self, chord: Chord) -> Resolution {
        self.pending.push(chord);

        if let Some(command) = self.keymap.exact(&self.pending) {
            let command = command.clone();
            self.pending.clear();
            return Resolution::Matched(command);
        }
        if self.keymap.is_prefix(&self.pending) {
            return Resolution::Pending;
        }

        let retry = (self.pending.len() > 1).then(|| self.pending.pop()).flatten();
        self.pending.clear();
        match retry {
            Some(chord) => self.feed(chord),
            None => Resolution::Unbound,
        }
    }

    /// Chords typed towards an unfinished sequence
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &[Chord] {
        &self.pending
    }

    /// Drop any pending prefix
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Underlying keymap
    #[inline]
    #[must_use]
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }
}
