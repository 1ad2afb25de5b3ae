//! Command index and filtering
//!
//! Filtering is a pure function of `(query, entries, recent list)`. The
//! result is one flat list in fixed group order:
//!
//! 1. recent pages (browse mode only, at most [`RECENT_LIMIT`])
//! 2. matching actions
//! 3. matching navigation entries
//!
//! Source order is kept inside each group. Browse mode (blank query) shows
//! every action and the first [`BROWSE_NAVIGATION_LIMIT`] navigation entries.

use crate::entry::{ActionEntry, CommandEntry, NavigationEntry, RecentEntry, RECENT_ID_PREFIX};
use crate::error::PaletteError;
use crate::recent::RecentList;
use std::collections::HashSet;

/// Navigation entries shown for a blank query
pub const BROWSE_NAVIGATION_LIMIT: usize = 6;

/// Recent pages shown for a blank query
pub const RECENT_LIMIT: usize = 3;

/// Static palette entries
#[derive(Debug, Clone, Default)]
pub struct CommandIndex {
    navigation: Vec<NavigationEntry>,
    actions: Vec<ActionEntry>,
}

impl CommandIndex {
    /// Build an index
    ///
    /// # Errors
    /// - `PaletteError::EmptyId` for an entry with a blank id
    /// - `PaletteError::ReservedId` for an id starting with `recent:`
    /// - `PaletteError::DuplicateId` when ids collide across both kinds
    pub fn new(
        navigation: Vec<NavigationEntry>,
        actions: Vec<ActionEntry>,
    ) -> Result<Self, PaletteError> {
        let mut seen = HashSet::new();
        let ids = navigation
            .iter()
            .map(|n| (&n.id, &n.label))
            .chain(actions.iter().map(|a| (&a.id, &a.label)));
        for (id, label) in ids {
            if id.trim().is_empty() {
                return Err(PaletteError::EmptyId {
                    label: label.clone(),
                });
            }
            if id.starts_with(RECENT_ID_PREFIX) {
                return Err(PaletteError::ReservedId(id.clone()));
            }
            if !seen.insert(id.as_str()) {
                return Err(PaletteError::DuplicateId(id.clone()));
            }
        }

        Ok(Self {
            navigation,
            actions,
        })
    }

    /// Navigation entries in source order
    #[inline]
    #[must_use]
    pub fn navigation(&self) -> &[NavigationEntry] {
        &self.navigation
    }

    /// Actions in source order
    #[inline]
    #[must_use]
    pub fn actions(&self) -> &[ActionEntry] {
        &self.actions
    }

    /// Total static entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.navigation.len() + self.actions.len()
    }

    /// Check if the index has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Navigation entry for `target`
    #[must_use]
    pub fn find_target(&self, target: &str) -> Option<&NavigationEntry> {
        self.navigation.iter().find(|n| n.target == target)
    }

    /// Recent pages that still have a navigation entry, most recent first
    #[must_use]
    pub fn recent_entries(&self, recent: &RecentList) -> Vec<RecentEntry> {
        recent
            .iter()
            .filter_map(|target| self.find_target(target))
            .take(RECENT_LIMIT)
            .cloned()
            .map(RecentEntry::new)
            .collect()
    }

    /// Entries matching `query`, flattened in group order
    ///
    /// An empty (or blank) query is browse mode. Zero matches yields an empty
    /// list.
    #[must_use]
    pub fn filter(&self, query: &str, recent: &RecentList) -> Vec<CommandEntry> {
        let needle = query.trim().to_lowercase();

        if needle.is_empty() {
            let recent = self.recent_entries(recent).into_iter().map(CommandEntry::Recent);
            let actions = self.actions.iter().cloned().map(CommandEntry::Action);
            let navigation = self
                .navigation
                .iter()
                .take(BROWSE_NAVIGATION_LIMIT)
                .cloned()
                .map(CommandEntry::Navigation);
            return recent.chain(actions).chain(navigation).collect();
        }

        let actions = self
            .actions
            .iter()
            .filter(|a| a.matches(&needle))
            .cloned()
            .map(CommandEntry::Action);
        let navigation = self
            .navigation
            .iter()
            .filter(|n| n.matches(&needle))
            .cloned()
            .map(CommandEntry::Navigation);
        actions.chain(navigation).collect()
    }
}
