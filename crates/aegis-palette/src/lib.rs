//! Aegis Palette - command index and keyboard navigator
//!
//! Provides the console's command palette, independent of any UI toolkit:
//! - [`CommandIndex`]: static pages and actions, filtered into grouped results
//! - [`RecentList`]: host-owned recently visited pages
//! - [`CommandPalette`]: query, cursor, activation and key handling
//! - [`ShortcutResolver`]: global shortcuts such as `mod+k` and `g i`
//! - [`catalog`]: the console's built-in pages
//!
//! # Example
//!
//! ```rust
//! use aegis_palette::{catalog, CommandIndex, RecentList};
//!
//! let index = CommandIndex::new(catalog::navigation_entries(), Vec::new()).unwrap();
//! let results = index.filter("cve", &RecentList::new());
//! assert_eq!(results[0].label(), "Vulnerabilities");
//! ```

#![warn(unreachable_pub)]

pub mod catalog;
pub mod entry;
pub mod error;
pub mod index;
pub mod keymap;
pub mod navigator;
pub mod recent;

pub use entry::{
    ActionEntry, CommandEntry, Group, Invoke, NavigationEntry, RecentEntry, RECENT_ID_PREFIX,
};
pub use error::{KeymapError, PaletteError};
pub use index::{CommandIndex, BROWSE_NAVIGATION_LIMIT, RECENT_LIMIT};
pub use keymap::{Chord, Command, Keymap, Modifiers, Resolution, Shortcut, ShortcutResolver};
pub use navigator::{CommandPalette, Direction, Key, PaletteHost};
pub use recent::{RecentList, RECENT_CAPACITY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
