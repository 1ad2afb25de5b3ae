//! `palette` command: print the filtered command list

use aegis_palette::{catalog, CommandEntry, CommandIndex, Command, Group, Keymap, RecentList};
use std::fmt::Write as _;

/// Render `results` grouped under headings, with page shortcuts
pub(crate) fn render(results: &[CommandEntry], keymap: &Keymap) -> String {
    if results.is_empty() {
        return "No matching commands\n".to_string();
    }

    let width = results.iter().map(|e| e.label().len()).max().unwrap_or(0);
    let mut out = String::new();
    let mut current: Option<Group> = None;

    for entry in results {
        let group = entry.group();
        if current != Some(group) {
            let _ = writeln!(out, "{}", group.title());
            current = Some(group);
        }

        let target = entry.target().unwrap_or("");
        let shortcut = match entry {
            CommandEntry::Navigation(nav) => keymap
                .shortcut_for(&Command::Navigate(nav.target.clone()))
                .map(ToString::to_string)
                .unwrap_or_default(),
            _ => String::new(),
        };
        let line = format!("  {:<width$}  {target:<18} {shortcut}", entry.label());
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

/// Filter the built-in catalog for `query`
pub(crate) fn run(query: &str, recent: &RecentList) -> anyhow::Result<String> {
    let index = CommandIndex::new(catalog::navigation_entries(), Vec::new())?;
    let keymap = catalog::default_keymap()?;
    Ok(render(&index.filter(query, recent), &keymap))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browse_lists_recent_before_pages() {
        let recent: RecentList = ["/reports"].into_iter().collect();
        let out = run("", &recent).unwrap();
        let recent_at = out.find("Recent").unwrap();
        let nav_at = out.find("Navigation").unwrap();
        assert!(recent_at < nav_at);
        assert!(out.contains("g i"));
    }

    #[test]
    fn search_shows_only_matches() {
        let out = run("cve", &RecentList::new()).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("Vulnerabilities"));
        assert!(out.contains("/vulnerabilities"));
    }

    #[test]
    fn empty_state_is_explicit() {
        let out = run("no such page", &RecentList::new()).unwrap();
        assert_eq!(out, "No matching commands\n");
    }
}
