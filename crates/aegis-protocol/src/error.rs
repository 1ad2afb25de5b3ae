//! Error types for wire decoding

/// Failure to turn an inbound text frame into a [`Frame`](crate::Frame)
///
/// Decode errors are always local to a single frame: the channel logs and
/// drops the frame, the connection is unaffected.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Frame is not valid JSON (or not a JSON object)
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Frame carries neither an `event` nor a `type` field
    #[error("frame has no event tag")]
    MissingEvent,

    /// Control frame with a `type` other than `pong`
    #[error("unexpected control frame: {0}")]
    UnexpectedControl(String),

    /// Known event tag whose payload does not match its schema
    #[error("invalid payload for `{tag}`: {source}")]
    InvalidPayload {
        /// Event tag as received
        tag: String,
        /// Underlying deserialization failure
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Event tag the error relates to, if one was read
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::InvalidPayload { tag, .. } => Some(tag),
            _ => None,
        }
    }
}
