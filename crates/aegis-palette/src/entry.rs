//! Command entries
//!
//! Three kinds share one id space:
//! - [`NavigationEntry`]: static link to a console page
//! - [`ActionEntry`]: static command closing over host callbacks
//! - [`RecentEntry`]: view of a navigation entry the user visited recently,
//!   identified by [`RECENT_ID_PREFIX`] + the navigation id

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Id prefix of recent-page views
pub const RECENT_ID_PREFIX: &str = "recent:";

/// Callback run when an action is activated
pub type Invoke = Arc<dyn Fn() + Send + Sync>;

/// Link to a console page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    /// Unique id
    pub id: String,
    /// Display label
    pub label: String,
    /// Route handed to the host on activation
    pub target: String,
    /// Extra search terms
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Optional grouping shown next to the label
    #[serde(default)]
    pub section: Option<String>,
}

impl NavigationEntry {
    /// Create an entry without keywords or section
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            target: target.into(),
            keywords: Vec::new(),
            section: None,
        }
    }

    /// With search keywords
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// With section
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Case-insensitive match; `needle` must already be lowercase
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        contains(&self.label, needle) || self.keywords.iter().any(|k| contains(k, needle))
    }
}

/// Command that runs a host callback
#[derive(Clone)]
pub struct ActionEntry {
    /// Unique id
    pub id: String,
    /// Display label
    pub label: String,
    /// Longer description, also searched
    pub description: Option<String>,
    /// Extra search terms
    pub keywords: Vec<String>,
    invoke: Invoke,
}

impl ActionEntry {
    /// Create an action
    pub fn new<F>(id: impl Into<String>, label: impl Into<String>, invoke: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            invoke: Arc::new(invoke),
        }
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With search keywords
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Run the callback
    pub fn invoke(&self) {
        (self.invoke)();
    }

    /// Case-insensitive match; `needle` must already be lowercase
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        contains(&self.label, needle)
            || self.keywords.iter().any(|k| contains(k, needle))
            || self.description.as_deref().is_some_and(|d| contains(d, needle))
    }
}

impl fmt::Debug for ActionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEntry")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("description", &self.description)
            .field("keywords", &self.keywords)
            .finish_non_exhaustive()
    }
}

/// Recently visited page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentEntry {
    id: String,
    /// Page the view points at
    pub entry: NavigationEntry,
}

impl RecentEntry {
    /// View of `entry`
    #[must_use]
    pub fn new(entry: NavigationEntry) -> Self {
        Self {
            id: format!("{RECENT_ID_PREFIX}{}", entry.id),
            entry,
        }
    }

    /// Prefixed id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Result group, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Group {
    /// Recently visited pages (browse mode only)
    Recent,
    /// Actions
    Actions,
    /// Navigation
    Navigation,
}

impl Group {
    /// Heading shown above the group
    #[inline]
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Group::Recent => "Recent",
            Group::Actions => "Actions",
            Group::Navigation => "Navigation",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One selectable row
#[derive(Debug, Clone)]
pub enum CommandEntry {
    /// Recent page
    Recent(RecentEntry),
    /// Action
    Action(ActionEntry),
    /// Page link
    Navigation(NavigationEntry),
}

impl CommandEntry {
    /// Unique id
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            CommandEntry::Recent(recent) => recent.id(),
            CommandEntry::Action(action) => &action.id,
            CommandEntry::Navigation(nav) => &nav.id,
        }
    }

    /// Display label
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            CommandEntry::Recent(recent) => &recent.entry.label,
            CommandEntry::Action(action) => &action.label,
            CommandEntry::Navigation(nav) => &nav.label,
        }
    }

    /// Navigation target, `None` for actions
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            CommandEntry::Recent(recent) => Some(&recent.entry.target),
            CommandEntry::Action(_) => None,
            CommandEntry::Navigation(nav) => Some(&nav.target),
        }
    }

    /// Group the entry is listed under
    #[inline]
    #[must_use]
    pub fn group(&self) -> Group {
        match self {
            CommandEntry::Recent(_) => Group::Recent,
            CommandEntry::Action(_) => Group::Actions,
            CommandEntry::Navigation(_) => Group::Navigation,
        }
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
