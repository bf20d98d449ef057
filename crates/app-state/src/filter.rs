//! Event search filtering
//!
//! The browse screen narrows the catalog as the user types. This module is
//! that filter: a pure projection of the current snapshot, recomputed on
//! every query change and never cached, so the visible list always reflects
//! the catalog and nothing else.

use chrono::{DateTime, Utc};
use events_api::Event;

/// Render an event date as the calendar string shown in the UI
///
/// The filter matches against this same rendering, so a query like "march"
/// or "2026" finds events by their displayed date.
pub fn display_date(date: &DateTime<Utc>) -> String {
    date.format("%-d %B %Y").to_string()
}

/// Select the events whose title, college, or displayed date contains `query`
///
/// Matching is a case-insensitive substring test, ORed across the three
/// fields. An empty or whitespace-only query selects the whole catalog.
/// Catalog order is preserved.
pub fn filter(events: &[Event], query: &str) -> Vec<Event> {
    if query.trim().is_empty() {
        return events.to_vec();
    }

    let needle = query.to_lowercase();
    events
        .iter()
        .filter(|event| matches_query(event, &needle))
        .cloned()
        .collect()
}

fn matches_query(event: &Event, needle: &str) -> bool {
    event.title.to_lowercase().contains(needle)
        || event.college.to_lowercase().contains(needle)
        || display_date(&event.date).to_lowercase().contains(needle)
}
