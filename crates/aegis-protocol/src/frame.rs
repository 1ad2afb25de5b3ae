//! Text frame decoding
//!
//! Inbound frames come in two shapes:
//! - envelopes `{ "event": <tag>, "data": <payload>, "timestamp": <string> }`
//! - control replies `{ "type": "pong" }`
//!
//! The only outbound control frame is `{ "type": "ping" }`.

use crate::error::DecodeError;
use crate::event::{
    ConnectionEstablished, Event, EventKind, Notification, ScanCancelled, ScanCompleted,
    ScanFailed, ScanProgress, UnreadCount,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded unit of transport
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Event and its payload
    pub event: Event,
    /// Server timestamp, advisory only
    pub timestamp: Option<String>,
}

impl Envelope {
    /// Wrap an event without a timestamp
    #[inline]
    #[must_use]
    pub fn new(event: Event) -> Self {
        Self {
            event,
            timestamp: None,
        }
    }

    /// Build from a wire tag and raw payload
    ///
    /// # Errors
    /// `DecodeError::InvalidPayload` when a known tag carries a payload that
    /// does not match its schema. Unknown tags never fail.
    pub fn from_parts(
        tag: &str,
        data: Value,
        timestamp: Option<String>,
    ) -> Result<Self, DecodeError> {
        let event = match EventKind::from_tag(tag) {
            Some(EventKind::Connected) => {
                Event::ConnectionEstablished(payload::<ConnectionEstablished>(tag, data)?)
            }
            Some(EventKind::Notification) => Event::Notification(payload::<Notification>(tag, data)?),
            Some(EventKind::UnreadCount) => Event::UnreadCount(payload::<UnreadCount>(tag, data)?),
            Some(EventKind::ScanProgress) => Event::ScanProgress(payload::<ScanProgress>(tag, data)?),
            Some(EventKind::ScanCompleted) => {
                Event::ScanCompleted(payload::<ScanCompleted>(tag, data)?)
            }
            Some(EventKind::ScanFailed) => Event::ScanFailed(payload::<ScanFailed>(tag, data)?),
            Some(EventKind::ScanCancelled) => {
                Event::ScanCancelled(payload::<ScanCancelled>(tag, data)?)
            }
            None => Event::Unknown {
                tag: tag.to_string(),
                data,
            },
        };

        Ok(Self { event, timestamp })
    }

    /// Serialize back to the wire shape
    #[must_use]
    pub fn to_value(&self) -> Value {
        let data = match &self.event {
            Event::ConnectionEstablished(p) => serde_json::to_value(p),
            Event::Notification(p) => serde_json::to_value(p),
            Event::UnreadCount(p) => serde_json::to_value(p),
            Event::ScanProgress(p) => serde_json::to_value(p),
            Event::ScanCompleted(p) => serde_json::to_value(p),
            Event::ScanFailed(p) => serde_json::to_value(p),
            Event::ScanCancelled(p) => serde_json::to_value(p),
            Event::Unknown { data, .. } => Ok(data.clone()),
        }
        .unwrap_or(Value::Null);

        let mut frame = Map::new();
        frame.insert("event".into(), Value::String(self.event.tag().to_string()));
        frame.insert("data".into(), data);
        if let Some(ts) = &self.timestamp {
            frame.insert("timestamp".into(), Value::String(ts.clone()));
        }
        Value::Object(frame)
    }
}

/// Control frames exchanged for keepalive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlFrame {
    /// Client liveness probe
    Ping,
    /// Server reply to a probe
    Pong,
}

impl ControlFrame {
    /// Wire text of this frame
    #[inline]
    #[must_use]
    pub fn as_text(self) -> &'static str {
        match self {
            ControlFrame::Ping => r#"{"type":"ping"}"#,
            ControlFrame::Pong => r#"{"type":"pong"}"#,
        }
    }
}

/// Anything that can arrive on the socket
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Keepalive reply; carries nothing for dispatch
    Pong,
    /// Application event
    Envelope(Envelope),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    event: Option<String>,
    #[serde(default, rename = "type")]
    control: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Decode one inbound text frame
///
/// # Errors
/// Any [`DecodeError`]; callers drop the frame and keep the connection.
pub fn decode_frame(text: &str) -> Result<Frame, DecodeError> {
    let raw: RawFrame = serde_json::from_str(text)?;

    if let Some(tag) = raw.event {
        return Envelope::from_parts(&tag, raw.data, raw.timestamp).map(Frame::Envelope);
    }

    match raw.control.as_deref() {
        Some("pong") => Ok(Frame::Pong),
        Some(other) => Err(DecodeError::UnexpectedControl(other.to_string())),
        None => Err(DecodeError::MissingEvent),
    }
}

/// Deserialize a payload, treating a missing/null `data` as an empty object
fn payload<T: DeserializeOwned>(tag: &str, data: Value) -> Result<T, DecodeError> {
    let data = if data.is_null() {
        Value::Object(Map::new())
    } else {
        data
    };
    serde_json::from_value(data).map_err(|source| DecodeError::InvalidPayload {
        tag: tag.to_string(),
        source,
    })
}
