//! Built-in console pages and their default shortcuts

use crate::entry::NavigationEntry;
use crate::error::KeymapError;
use crate::keymap::{Command, Keymap};

/// Shortcut that toggles the palette
pub const PALETTE_SHORTCUT: &str = "mod+k";

struct Page {
    id: &'static str,
    label: &'static str,
    target: &'static str,
    section: &'static str,
    keywords: &'static [&'static str],
    shortcut: Option<&'static str>,
}

const PAGES: &[Page] = &[
    Page {
        id: "dashboard",
        label: "Dashboard",
        target: "/dashboard",
        section: "Overview",
        keywords: &["home", "overview", "metrics"],
        shortcut: Some("g d"),
    },
    Page {
        id: "incidents",
        label: "Incidents",
        target: "/incidents",
        section: "Operations",
        keywords: &["breach", "alert", "response"],
        shortcut: Some("g i"),
    },
    Page {
        id: "vulnerabilities",
        label: "Vulnerabilities",
        target: "/vulnerabilities",
        section: "Operations",
        keywords: &["cve", "scan", "patch"],
        shortcut: Some("g v"),
    },
    Page {
        id: "threat-intel",
        label: "Threat Intelligence",
        target: "/threat-intel",
        section: "Operations",
        keywords: &["ioc", "indicator", "feed"],
        shortcut: Some("g t"),
    },
    Page {
        id: "compliance",
        label: "Compliance",
        target: "/compliance",
        section: "Governance",
        keywords: &["framework", "control", "audit", "soc2", "iso"],
        shortcut: Some("g c"),
    },
    Page {
        id: "evidence",
        label: "Evidence",
        target: "/evidence",
        section: "Governance",
        keywords: &["artifact", "upload", "audit"],
        shortcut: Some("g e"),
    },
    Page {
        id: "training",
        label: "Training",
        target: "/training",
        section: "People",
        keywords: &["course", "awareness", "phishing"],
        shortcut: None,
    },
    Page {
        id: "onboarding",
        label: "Onboarding",
        target: "/onboarding",
        section: "People",
        keywords: &["setup", "getting started"],
        shortcut: None,
    },
    Page {
        id: "reports",
        label: "Reports",
        target: "/reports",
        section: "Overview",
        keywords: &["export", "pdf", "summary"],
        shortcut: Some("g r"),
    },
    Page {
        id: "settings",
        label: "Settings",
        target: "/settings",
        section: "Workspace",
        keywords: &["preferences", "profile", "account", "api key"],
        shortcut: Some("g s"),
    },
];

/// Navigation entries for every console page, in sidebar order
#[must_use]
pub fn navigation_entries() -> Vec<NavigationEntry> {
    PAGES
        .iter()
        .map(|page| {
            NavigationEntry::new(page.id, page.label, page.target)
                .with_keywords(page.keywords.iter().copied())
                .with_section(page.section)
        })
        .collect()
}

/// Palette toggle plus `g <letter>` page shortcuts
///
/// # Errors
/// Only if the built-in table itself is inconsistent.
pub fn default_keymap() -> Result<Keymap, KeymapError> {
    let mut keymap = Keymap::new();
    keymap.bind(PALETTE_SHORTCUT, Command::TogglePalette)?;
    for page in PAGES {
        if let Some(shortcut) = page.shortcut {
            keymap.bind(shortcut, Command::Navigate(page.target.to_string()))?;
        }
    }
    Ok(keymap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::CommandIndex;

    #[test]
    fn catalog_builds_a_valid_index() {
        let index = CommandIndex::new(navigation_entries(), Vec::new()).unwrap();
        assert_eq!(index.len(), PAGES.len());
        assert!(index.find_target("/threat-intel").is_some());
    }

    #[test]
    fn default_keymap_is_consistent() {
        let keymap = default_keymap().unwrap();
        assert_eq!(
            keymap.shortcut_for(&Command::TogglePalette).unwrap().to_string(),
            PALETTE_SHORTCUT
        );
        let targets: Vec<_> = navigation_entries().into_iter().map(|n| n.target).collect();
        for (_, command) in keymap.bindings() {
            if let Command::Navigate(target) = command {
                assert!(targets.contains(target), "{target}");
            }
        }
    }
}
