//! Error types for the command palette
//!
//! Construction-time only. Runtime palette operations never fail: an
//! out-of-range activation or unbound key is ignored, not reported.

/// Command index construction error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
    /// Two entries share an id
    #[error("duplicate command id `{0}`")]
    DuplicateId(String),

    /// Entry id is empty
    #[error("command `{label}` has an empty id")]
    EmptyId {
        /// Label of the offending entry
        label: String,
    },

    /// Entry id uses the prefix reserved for recent-page views
    #[error("command id `{0}` uses the reserved `recent:` prefix")]
    ReservedId(String),
}

/// Shortcut parsing or binding error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeymapError {
    /// Nothing to parse
    #[error("empty shortcut")]
    Empty,

    /// Modifier name not recognised
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),

    /// Chord has modifiers but no key
    #[error("chord `{0}` has no key")]
    MissingKey(String),

    /// More keys in a sequence than supported
    #[error("shortcut `{shortcut}` has {len} keys, at most {max} supported")]
    TooLong {
        /// Shortcut as given
        shortcut: String,
        /// Number of chords
        len: usize,
        /// Supported maximum
        max: usize,
    },

    /// Shortcut clashes with an existing binding
    #[error("shortcut `{new}` conflicts with `{existing}`")]
    Conflict {
        /// Shortcut being bound
        new: String,
        /// Binding already present
        existing: String,
    },
}
