//! Error types for the event channel
//!
//! Two families:
//! - [`TransportError`]: socket-level failures. Never returned to the caller
//!   of `connect()`; surfaced through `ChannelHandler::on_error` and the
//!   `Error` connection state, then recovered by the reconnect policy.
//! - [`ChannelError`]: configuration mistakes caught when a channel is built.

/// Socket-level failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Could not open the socket
    #[error("connection failed: {0}")]
    Connect(String),

    /// Open did not complete in time
    #[error("connection timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured connect timeout
        timeout_ms: u64,
    },

    /// Writing a frame failed
    #[error("send failed: {0}")]
    Send(String),

    /// Reading from the socket failed
    #[error("receive failed: {0}")]
    Receive(String),

    /// Socket already closed
    #[error("socket closed")]
    Closed,
}

impl TransportError {
    /// Check if a fresh connection attempt may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connect(_) | Self::Timeout { .. } | Self::Receive(_) | Self::Send(_)
        )
    }
}

/// Channel configuration error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Base URL does not parse
    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl {
        /// URL as given
        url: String,
        /// Parser message
        reason: String,
    },

    /// Base URL scheme is not http(s) or ws(s)
    #[error("unsupported url scheme `{0}`")]
    UnsupportedScheme(String),

    /// Base URL has no host
    #[error("base url `{0}` has no host")]
    MissingHost(String),

    /// Configuration values out of range
    #[error("invalid channel configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_socket_is_not_retryable() {
        assert!(TransportError::Connect("refused".into()).is_retryable());
        assert!(TransportError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(!TransportError::Closed.is_retryable());
    }
}
