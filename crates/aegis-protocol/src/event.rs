//! Typed event payloads
//!
//! Every known wire tag maps to exactly one [`Event`] variant carrying its
//! decoded payload. Tags this build does not know about are preserved as
//! [`Event::Unknown`] so newer servers do not break older clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Closed set of event tags understood by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Server acknowledged the subscription
    Connected,
    /// A new notification for the user
    Notification,
    /// Unread notification counter changed
    UnreadCount,
    /// Progress update for a running scan
    ScanProgress,
    /// Scan finished successfully
    ScanCompleted,
    /// Scan aborted with an error
    ScanFailed,
    /// Scan was cancelled
    ScanCancelled,
}

impl EventKind {
    /// All known kinds, in wire documentation order
    pub const ALL: [EventKind; 7] = [
        EventKind::Connected,
        EventKind::Notification,
        EventKind::UnreadCount,
        EventKind::ScanProgress,
        EventKind::ScanCompleted,
        EventKind::ScanFailed,
        EventKind::ScanCancelled,
    ];

    /// Wire tag
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::Notification => "notification",
            EventKind::UnreadCount => "unread_count",
            EventKind::ScanProgress => "scan_progress",
            EventKind::ScanCompleted => "scan_completed",
            EventKind::ScanFailed => "scan_failed",
            EventKind::ScanCancelled => "scan_cancelled",
        }
    }

    /// Look up a wire tag
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Terminal kinds end the stream: nothing more will arrive for the
    /// subscription once one of them is delivered.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EventKind::ScanCompleted | EventKind::ScanFailed | EventKind::ScanCancelled
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEstablished {
    /// Free-form greeting
    #[serde(default)]
    pub message: Option<String>,
    /// User the subscription is bound to
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Notification severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    #[default]
    Info,
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Critical
    Critical,
}

/// User-facing notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification id
    pub id: String,
    /// Short title
    pub title: String,
    /// Body text
    #[serde(default)]
    pub message: String,
    /// Severity
    #[serde(default)]
    pub severity: Severity,
    /// Source area (incident, vulnerability, compliance, ...)
    #[serde(default)]
    pub category: Option<String>,
    /// In-app link the notification points at
    #[serde(default)]
    pub link: Option<String>,
    /// Read flag
    #[serde(default)]
    pub read: bool,
    /// Server creation time
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Unread notification counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    /// Number of unread notifications
    pub count: u64,
}

/// Progress of a running scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Scan id
    pub scan_id: String,
    /// Percentage complete, 0..=100
    pub progress: f64,
    /// Backend status label
    #[serde(default)]
    pub status: Option<String>,
    /// Target currently being scanned
    #[serde(default)]
    pub current_target: Option<String>,
    /// Findings so far
    #[serde(default)]
    pub findings_count: u64,
    /// Free-form status message
    #[serde(default)]
    pub message: Option<String>,
}

/// Scan finished successfully
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanCompleted {
    /// Scan id
    pub scan_id: String,
    /// Total findings
    #[serde(default)]
    pub findings_count: u64,
    /// Wall-clock duration
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    /// Opaque result summary computed by the backend
    #[serde(default)]
    pub summary: Option<Value>,
}

/// Scan failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFailed {
    /// Scan id
    pub scan_id: String,
    /// Failure description
    pub error: String,
}

/// Scan cancelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanCancelled {
    /// Scan id
    pub scan_id: String,
    /// Reason given by whoever cancelled
    #[serde(default)]
    pub reason: Option<String>,
    /// Who cancelled
    #[serde(default)]
    pub cancelled_by: Option<String>,
}

/// Decoded event payload, keyed by wire tag
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `connected`
    ConnectionEstablished(ConnectionEstablished),
    /// `notification`
    Notification(Notification),
    /// `unread_count`
    UnreadCount(UnreadCount),
    /// `scan_progress`
    ScanProgress(ScanProgress),
    /// `scan_completed`
    ScanCompleted(ScanCompleted),
    /// `scan_failed`
    ScanFailed(ScanFailed),
    /// `scan_cancelled`
    ScanCancelled(ScanCancelled),
    /// Tag not known to this build
    Unknown {
        /// Tag as received
        tag: String,
        /// Raw payload
        data: Value,
    },
}

impl Event {
    /// Kind of this event, `None` for unknown tags
    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Event::ConnectionEstablished(_) => Some(EventKind::Connected),
            Event::Notification(_) => Some(EventKind::Notification),
            Event::UnreadCount(_) => Some(EventKind::UnreadCount),
            Event::ScanProgress(_) => Some(EventKind::ScanProgress),
            Event::ScanCompleted(_) => Some(EventKind::ScanCompleted),
            Event::ScanFailed(_) => Some(EventKind::ScanFailed),
            Event::ScanCancelled(_) => Some(EventKind::ScanCancelled),
            Event::Unknown { .. } => None,
        }
    }

    /// Wire tag of this event
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Event::Unknown { tag, .. } => tag,
            other => other.kind().map_or("", EventKind::as_str),
        }
    }

    /// Whether this event ends its stream
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.kind().is_some_and(EventKind::is_terminal)
    }

    /// Scan id carried by scan events
    #[must_use]
    pub fn scan_id(&self) -> Option<&str> {
        match self {
            Event::ScanProgress(p) => Some(&p.scan_id),
            Event::ScanCompleted(p) => Some(&p.scan_id),
            Event::ScanFailed(p) => Some(&p.scan_id),
            Event::ScanCancelled(p) => Some(&p.scan_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_lookup() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_tag("scan-completed"), None);
    }

    #[test]
    fn only_scan_outcomes_are_terminal() {
        let terminal: Vec<_> = EventKind::ALL
            .into_iter()
            .filter(|k| k.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                EventKind::ScanCompleted,
                EventKind::ScanFailed,
                EventKind::ScanCancelled
            ]
        );
    }

    #[test]
    fn unknown_event_keeps_its_tag() {
        let event = Event::Unknown {
            tag: "asset_discovered".into(),
            data: Value::Null,
        };
        assert_eq!(event.tag(), "asset_discovered");
        assert_eq!(event.kind(), None);
        assert!(!event.is_terminal());
    }
}
