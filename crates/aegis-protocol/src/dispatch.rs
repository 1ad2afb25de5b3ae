//! Event routing
//!
//! [`EventHandler`] has one method per known tag, all defaulting to no-ops,
//! so consumers only implement what they care about. [`dispatch`] is the
//! single exhaustive match that routes an [`Event`] to its method.

use crate::event::{
    ConnectionEstablished, Event, EventKind, Notification, ScanCancelled, ScanCompleted,
    ScanFailed, ScanProgress, UnreadCount,
};

/// Per-tag event callbacks
pub trait EventHandler: Send + Sync {
    /// `connected`
    fn on_connection_established(&self, _payload: &ConnectionEstablished) {}

    /// `notification`
    fn on_notification(&self, _notification: &Notification) {}

    /// `unread_count`
    fn on_unread_count(&self, _count: &UnreadCount) {}

    /// `scan_progress`
    fn on_scan_progress(&self, _progress: &ScanProgress) {}

    /// `scan_completed`
    fn on_scan_completed(&self, _completed: &ScanCompleted) {}

    /// `scan_failed`
    fn on_scan_failed(&self, _failed: &ScanFailed) {}

    /// `scan_cancelled`
    fn on_scan_cancelled(&self, _cancelled: &ScanCancelled) {}
}

/// No-op handler
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreEvents;

impl EventHandler for IgnoreEvents {}

/// Route an event to the matching handler method
///
/// Returns the kind that was delivered, or `None` when the tag is unknown and
/// no method was called.
pub fn dispatch<H: EventHandler + ?Sized>(event: &Event, handler: &H) -> Option<EventKind> {
    match event {
        Event::ConnectionEstablished(p) => handler.on_connection_established(p),
        Event::Notification(p) => handler.on_notification(p),
        Event::UnreadCount(p) => handler.on_unread_count(p),
        Event::ScanProgress(p) => handler.on_scan_progress(p),
        Event::ScanCompleted(p) => handler.on_scan_completed(p),
        Event::ScanFailed(p) => handler.on_scan_failed(p),
        Event::ScanCancelled(p) => handler.on_scan_cancelled(p),
        Event::Unknown { tag, .. } => {
            tracing::debug!(tag = %tag, "ignoring event with unknown tag");
            return None;
        }
    }
    event.kind()
}
