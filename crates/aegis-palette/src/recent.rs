//! Recently visited pages
//!
//! Host-owned, capped, most-recent-first list of navigation targets.
//! Re-visiting a target moves it to the front instead of duplicating it.
//! Serializes as a plain JSON array so hosts can persist it.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default capacity
pub const RECENT_CAPACITY: usize = 5;

/// Capped recent-target list, most recent first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RecentList {
    targets: VecDeque<String>,
    capacity: usize,
}

impl RecentList {
    /// Empty list with the default capacity
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(RECENT_CAPACITY)
    }

    /// Empty list holding at most `capacity` targets (at least one)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            targets: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a visit to `target`
    pub fn push(&mut self, target: impl Into<String>) {
        let target = target.into();
        self.targets.retain(|t| *t != target);
        self.targets.push_front(target);
        self.targets.truncate(self.capacity);
    }

    /// Forget `target`; returns whether it was present
    pub fn remove(&mut self, target: &str) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| t != target);
        self.targets.len() != before
    }

    /// Check if `target` is present
    #[must_use]
    pub fn contains(&self, target: &str) -> bool {
        self.targets.iter().any(|t| t == target)
    }

    /// Most recent target
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.targets.front().map(String::as_str)
    }

    /// Targets, most recent first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(String::as_str)
    }

    /// Number of targets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Maximum number of targets kept
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.targets.clear();
    }
}

impl Default for RecentList {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<String>> for RecentList {
    /// First element is the most recent; duplicates and overflow are dropped
    fn from(targets: Vec<String>) -> Self {
        let mut list = Self::new();
        for target in targets.into_iter().rev() {
            list.push(target);
        }
        list
    }
}

impl From<RecentList> for Vec<String> {
    fn from(list: RecentList) -> Self {
        list.targets.into()
    }
}

impl<S: Into<String>> FromIterator<S> for RecentList {
    /// Visits in chronological order; the last item ends up first
    fn from_iter<I: IntoIterator<Item = S>>(visits: I) -> Self {
        let mut list = Self::new();
        for target in visits {
            list.push(target);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn targets(list: &RecentList) -> Vec<&str> {
        list.iter().collect()
    }

    #[test]
    fn revisit_moves_to_front() {
        let mut list = RecentList::new();
        list.push("/incidents");
        list.push("/reports");
        list.push("/incidents");
        assert_eq!(targets(&list), vec!["/incidents", "/reports"]);
    }

    #[test]
    fn oldest_falls_off_at_capacity() {
        let list: RecentList = (1..=7).map(|i| format!("/p{i}")).collect();
        assert_eq!(list.len(), RECENT_CAPACITY);
        assert_eq!(targets(&list), vec!["/p7", "/p6", "/p5", "/p4", "/p3"]);
    }

    #[test]
    fn capacity_is_at_least_one() {
        let mut list = RecentList::with_capacity(0);
        list.push("/a");
        list.push("/b");
        assert_eq!(targets(&list), vec!["/b"]);
    }

    #[test]
    fn remove_reports_presence() {
        let mut list: RecentList = ["/a", "/b"].into_iter().collect();
        assert!(list.remove("/a"));
        assert!(!list.remove("/a"));
        assert_eq!(list.first(), Some("/b"));
    }

    #[test]
    fn serializes_as_array() {
        let list: RecentList = ["/a", "/b"].into_iter().collect();
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["/b","/a"]"#);

        let back: RecentList = serde_json::from_str(r#"["/b","/a","/b"]"#).unwrap();
        assert_eq!(targets(&back), vec!["/b", "/a"]);
    }
}
