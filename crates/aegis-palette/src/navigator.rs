//! Keyboard navigator
//!
//! [`CommandPalette`] owns the query, the filtered list and a cursor over it.
//! The list is re-filtered and the cursor reset to 0 in the same call that
//! changes the query, so the cursor never points into a stale list.

use crate::entry::CommandEntry;
use crate::index::CommandIndex;
use crate::recent::RecentList;
use std::sync::Arc;
use tracing::debug;

/// Host callbacks
pub trait PaletteHost: Send + Sync {
    /// Navigate to a page
    fn on_navigate(&self, target: &str);

    /// The palette asks to be closed
    fn on_close_requested(&self);
}

/// Cursor movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards index 0
    Up,
    /// Towards the end
    Down,
}

/// Key delivered to the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Arrow up
    Up,
    /// Arrow down
    Down,
    /// Activate the selection
    Enter,
    /// Request close
    Escape,
    /// Delete the last query character
    Backspace,
    /// Printable character
    Char(char),
}

/// Command palette state
pub struct CommandPalette {
    index: CommandIndex,
    recent: RecentList,
    host: Arc<dyn PaletteHost>,
    open: bool,
    query: String,
    results: Vec<CommandEntry>,
    cursor: usize,
}

impl CommandPalette {
    /// Create a closed palette
    #[must_use]
    pub fn new(index: CommandIndex, recent: RecentList, host: Arc<dyn PaletteHost>) -> Self {
        let results = index.filter("", &recent);
        Self {
            index,
            recent,
            host,
            open: false,
            query: String::new(),
            results,
            cursor: 0,
        }
    }

    /// Open with an empty query
    pub fn open(&mut self) {
        self.open = true;
        self.set_query(String::new());
    }

    /// Close
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Open if closed, close if open
    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open();
        }
    }

    /// Check if open
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current query
    #[inline]
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the query, re-filter and reset the cursor
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.refilter();
        self.cursor = 0;
    }

    /// Replace the recent-page snapshot
    ///
    /// The query is unchanged; the cursor is clamped to the new list.
    pub fn set_recent(&mut self, recent: RecentList) {
        self.recent = recent;
        self.refilter();
        self.cursor = self.cursor.min(self.results.len().saturating_sub(1));
    }

    /// Current filtered list
    #[inline]
    #[must_use]
    pub fn results(&self) -> &[CommandEntry] {
        &self.results
    }

    /// Cursor position; 0 when the list is empty
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Entry under the cursor
    #[must_use]
    pub fn selected(&self) -> Option<&CommandEntry> {
        self.results.get(self.cursor)
    }

    /// Static entries
    #[inline]
    #[must_use]
    pub fn index(&self) -> &CommandIndex {
        &self.index
    }

    /// Move the cursor one step, clamped at both ends
    pub fn move_cursor(&mut self, direction: Direction) {
        let last = self.results.len().saturating_sub(1);
        self.cursor = match direction {
            Direction::Up => self.cursor.saturating_sub(1),
            Direction::Down => (self.cursor + 1).min(last),
        };
    }

    /// Activate the entry at `index`
    ///
    /// Actions are invoked; pages are handed to the host. Either way the host
    /// is then asked to close the palette. Returns `false`, doing nothing,
    /// when `index` is out of range.
    pub fn activate(&mut self, index: usize) -> bool {
        let Some(entry) = self.results.get(index) else {
            debug!(index, len = self.results.len(), "activation out of range");
            return false;
        };

        match entry {
            CommandEntry::Action(action) => {
                debug!(id = %action.id, "invoking action");
                action.invoke();
            }
            CommandEntry::Navigation(nav) => {
                debug!(route = %nav.target, "navigating");
                self.host.on_navigate(&nav.target);
            }
            CommandEntry::Recent(recent) => {
                debug!(route = %recent.entry.target, "navigating to recent page");
                self.host.on_navigate(&recent.entry.target);
            }
        }
        self.request_close();
        true
    }

    /// Activate the entry under the cursor
    pub fn activate_selected(&mut self) -> bool {
        self.activate(self.cursor)
    }

    /// Apply a key; returns whether it was consumed
    ///
    /// Keys are ignored while the palette is closed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if !self.open {
            return false;
        }
        match key {
            Key::Up => self.move_cursor(Direction::Up),
            Key::Down => self.move_cursor(Direction::Down),
            Key::Enter => {
                self.activate_selected();
            }
            Key::Escape => self.request_close(),
            Key::Backspace => {
                let mut query = std::mem::take(&mut self.query);
                if query.pop().is_some() {
                    self.set_query(query);
                } else {
                    self.query = query;
                }
            }
            Key::Char(c) if !c.is_control() => {
                let mut query = std::mem::take(&mut self.query);
                query.push(c);
                self.set_query(query);
            }
            Key::Char(_) => return false,
        }
        true
    }

    fn request_close(&mut self) {
        self.host.on_close_requested();
        self.close();
    }

    fn refilter(&mut self) {
        self.results = self.index.filter(&self.query, &self.recent);
    }
}

impl std::fmt::Debug for CommandPalette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPalette")
            .field("open", &self.open)
            .field("query", &self.query)
            .field("results", &self.results.len())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
