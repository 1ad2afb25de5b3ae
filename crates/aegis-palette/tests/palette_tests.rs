//! Palette behavior through the public API
//!
//! Run with: cargo test --package aegis-palette --test palette_tests

use aegis_palette::{
    catalog, ActionEntry, CommandEntry, CommandIndex, CommandPalette, Direction, Group, Key,
    NavigationEntry, RecentList, RECENT_CAPACITY,
};
use aegis_test_utils::RecordingHost;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn security_index() -> CommandIndex {
    CommandIndex::new(
        vec![
            NavigationEntry::new("incidents", "Incidents", "/incidents").with_keywords(["breach"]),
            NavigationEntry::new("vulnerabilities", "Vulnerabilities", "/vulnerabilities")
                .with_keywords(["cve"]),
        ],
        Vec::new(),
    )
    .unwrap()
}

fn labels(entries: &[CommandEntry]) -> Vec<&str> {
    entries.iter().map(CommandEntry::label).collect()
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

#[test]
fn keyword_query_finds_exactly_one_page() {
    let index = security_index();
    let results = index.filter("cve", &RecentList::new());
    assert_eq!(labels(&results), vec!["Vulnerabilities"]);
}

#[test]
fn empty_query_browses_everything_recent_first() {
    let index = security_index();
    assert_eq!(
        labels(&index.filter("", &RecentList::new())),
        vec!["Incidents", "Vulnerabilities"]
    );

    let recent: RecentList = ["/vulnerabilities"].into_iter().collect();
    let results = index.filter("", &recent);
    assert_eq!(
        labels(&results),
        vec!["Vulnerabilities", "Incidents", "Vulnerabilities"]
    );
    assert_eq!(results[0].group(), Group::Recent);
    assert_eq!(results[0].id(), "recent:vulnerabilities");
}

#[test]
fn catalog_search_spans_actions_and_pages() {
    let actions = vec![ActionEntry::new("export-audit", "Export audit log", || {})
        .with_description("Download compliance evidence as CSV")];
    let index = CommandIndex::new(catalog::navigation_entries(), actions).unwrap();

    let results = index.filter("audit", &RecentList::new());
    assert_eq!(
        labels(&results),
        vec!["Export audit log", "Compliance", "Evidence"]
    );
}

// ---------------------------------------------------------------------------
// Recent list
// ---------------------------------------------------------------------------

#[test]
fn revisiting_a_page_does_not_duplicate_it() {
    let mut recent = RecentList::new();
    recent.push("/incidents");
    recent.push("/incidents");
    assert_eq!(recent.len(), 1);
    assert_eq!(recent.first(), Some("/incidents"));
}

proptest! {
    #[test]
    fn recent_list_stays_unique_and_capped(visits in prop::collection::vec("/[a-e]", 0..40)) {
        let mut recent = RecentList::new();
        for visit in &visits {
            recent.push(visit.clone());
            prop_assert_eq!(recent.first(), Some(visit.as_str()));
        }

        prop_assert!(recent.len() <= RECENT_CAPACITY);
        let targets: Vec<&str> = recent.iter().collect();
        let mut unique = targets.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), targets.len());
    }
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

fn open_palette(recent: RecentList) -> (CommandPalette, Arc<RecordingHost>) {
    let index = CommandIndex::new(catalog::navigation_entries(), Vec::new()).unwrap();
    let host = RecordingHost::new();
    let mut palette = CommandPalette::new(index, recent, host.clone());
    palette.open();
    (palette, host)
}

proptest! {
    #[test]
    fn cursor_stays_in_bounds(moves in prop::collection::vec(any::<bool>(), 0..64), query in "[a-z]{0,2}") {
        let (mut palette, _) = open_palette(RecentList::new());
        palette.set_query(query);
        let len = palette.results().len();

        for down in moves {
            palette.move_cursor(if down { Direction::Down } else { Direction::Up });
            if len == 0 {
                prop_assert_eq!(palette.cursor(), 0);
            } else {
                prop_assert!(palette.cursor() < len);
            }
        }
    }

    #[test]
    fn query_change_resets_cursor(downs in 0usize..20, query in "[a-z]{1,3}") {
        let (mut palette, _) = open_palette(RecentList::new());
        for _ in 0..downs {
            palette.move_cursor(Direction::Down);
        }
        palette.set_query(query);
        prop_assert_eq!(palette.cursor(), 0);
    }
}

#[test]
fn cursor_does_not_wrap() {
    let (mut palette, _) = open_palette(RecentList::new());
    let last = palette.results().len() - 1;

    palette.move_cursor(Direction::Up);
    assert_eq!(palette.cursor(), 0);
    for _ in 0..100 {
        palette.move_cursor(Direction::Down);
    }
    assert_eq!(palette.cursor(), last);
}

// ---------------------------------------------------------------------------
// Activation
// ---------------------------------------------------------------------------

#[test]
fn activating_a_page_navigates_then_requests_close() {
    let (mut palette, host) = open_palette(RecentList::new());
    palette.set_query("cve");
    assert!(palette.activate(0));
    assert_eq!(host.navigations(), vec!["/vulnerabilities"]);
    assert_eq!(host.close_requests(), 1);
}

#[test]
fn activating_a_recent_page_navigates_to_its_target() {
    let recent: RecentList = ["/reports"].into_iter().collect();
    let (mut palette, host) = open_palette(recent);
    assert_eq!(palette.selected().unwrap().group(), Group::Recent);
    assert!(palette.handle_key(Key::Enter));
    assert_eq!(host.navigations(), vec!["/reports"]);
}

#[test]
fn activating_an_action_invokes_it() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let index = CommandIndex::new(
        catalog::navigation_entries(),
        vec![ActionEntry::new("logout", "Log out", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })],
    )
    .unwrap();
    let host = RecordingHost::new();
    let mut palette = CommandPalette::new(index, RecentList::new(), host.clone());
    palette.open();

    for c in "log out".chars() {
        palette.handle_key(Key::Char(c));
    }
    palette.handle_key(Key::Enter);

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(host.navigations().is_empty());
    assert_eq!(host.close_requests(), 1);
    assert!(!palette.is_open());
}

#[test]
fn out_of_range_activation_is_ignored() {
    let (mut palette, host) = open_palette(RecentList::new());
    let len = palette.results().len();
    assert!(!palette.activate(len));
    assert!(!palette.activate(usize::MAX));
    assert!(host.navigations().is_empty());
    assert_eq!(host.close_requests(), 0);
    assert!(palette.is_open());
}

#[test]
fn shrinking_recent_snapshot_clamps_cursor() {
    let recent: RecentList = ["/reports", "/settings", "/evidence"].into_iter().collect();
    let (mut palette, _) = open_palette(recent);
    palette.set_query("settings");
    palette.set_query("");
    for _ in 0..20 {
        palette.move_cursor(Direction::Down);
    }
    let before = palette.results().len();

    palette.set_recent(RecentList::new());
    assert_eq!(palette.results().len(), before - 3);
    assert!(palette.cursor() < palette.results().len());
}
