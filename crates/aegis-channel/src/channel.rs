//! The channel handle
//!
//! [`EventChannel`] is the imperative surface hosts hold on to. Every method
//! is synchronous and non-blocking; network work happens on the session task
//! spawned by [`EventChannel::connect`] and results come back through the
//! registered [`ChannelHandler`].

use crate::config::ChannelConfig;
use crate::endpoint::{ChannelParams, EndpointBuilder};
use crate::error::ChannelError;
use crate::handler::ChannelHandler;
use crate::session::Session;
use crate::state::{ChannelStatus, ConnectionState, SessionHandle, Shared};
use crate::transport::{Transport, WsTransport};
use aegis_protocol::Envelope;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};
use url::Url;

/// Reconnecting event channel for one subscription
///
/// # Example
///
/// ```rust,no_run
/// use aegis_channel::{ChannelConfig, ChannelParams, EventChannel, NoopHandler};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), aegis_channel::ChannelError> {
/// let channel = EventChannel::new(
///     "https://api.aegis.example",
///     ChannelParams::notifications("token"),
///     ChannelConfig::default(),
///     Arc::new(NoopHandler),
/// )?;
/// channel.connect();
/// // ...
/// channel.disconnect();
/// # Ok(())
/// # }
/// ```
pub struct EventChannel {
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    endpoints: EndpointBuilder,
}

impl EventChannel {
    /// Create a channel over the WebSocket transport
    ///
    /// # Errors
    /// Returns `ChannelError` if the base URL or configuration is invalid.
    pub fn new(
        base_url: &str,
        params: ChannelParams,
        config: ChannelConfig,
        handler: Arc<dyn ChannelHandler>,
    ) -> Result<Self, ChannelError> {
        Self::with_transport(base_url, params, config, handler, Arc::new(WsTransport))
    }

    /// Create a channel over a custom transport
    ///
    /// # Errors
    /// Returns `ChannelError` if the base URL or configuration is invalid.
    pub fn with_transport(
        base_url: &str,
        params: ChannelParams,
        config: ChannelConfig,
        handler: Arc<dyn ChannelHandler>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ChannelError> {
        config.validate()?;
        let endpoints = EndpointBuilder::new(base_url)?;
        Ok(Self {
            shared: Arc::new(Shared::new(config, params, handler)),
            transport,
            endpoints,
        })
    }

    /// Start a session
    ///
    /// No-op when a session already exists, the channel is disabled, the
    /// token or subscription id is missing, or no tokio runtime is running.
    pub fn connect(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("connect called outside a tokio runtime, ignoring");
            return;
        };

        let started = self.shared.mutate(|core| {
            if !core.enabled || core.session.is_some() {
                return None;
            }
            if self.endpoints.build(&core.params).is_none() {
                debug!(params = ?core.params, "channel parameters incomplete, not connecting");
                return None;
            }
            core.generation += 1;
            let (cancel, cancel_rx) = oneshot::channel();
            core.session = Some(SessionHandle { cancel });
            core.status = ChannelStatus {
                state: ConnectionState::Connecting,
                ..ChannelStatus::default()
            };
            Some((core.generation, cancel_rx))
        });
        let Some((generation, cancel)) = started else {
            return;
        };

        debug!(generation, "starting session");
        let session = Session {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
            endpoints: self.endpoints.clone(),
            generation,
            cancel,
        };
        runtime.spawn(session.run());
    }

    /// Stop the session, its timers and its socket
    ///
    /// Safe from any state and idempotent. Once this returns no handler
    /// method runs for the stopped session; `on_disconnect` is called here
    /// if the channel was connected.
    pub fn disconnect(&self) {
        self.shared.exclusive(|| {
            let (session, was_connected) = self.shared.mutate(|core| {
                core.generation += 1;
                let was_connected = std::mem::take(&mut core.announced);
                core.socket_gone(ConnectionState::Disconnected);
                core.status.reconnect_attempts = 0;
                core.status.terminal = false;
                core.status.reconnect_pending = false;
                (core.session.take(), was_connected)
            });

            if let Some(session) = session {
                info!("disconnecting");
                // Err means the session already finished
                let _ = session.cancel.send(());
            }
            if was_connected {
                self.shared.handler().on_disconnect();
            }
        });
    }

    /// Tear down and start a fresh session
    pub fn reconnect(&self) {
        self.disconnect();
        self.connect();
    }

    /// Replace token and subscription
    ///
    /// A running session is replaced by a fresh one built from the new
    /// params; params without a token leave the channel disconnected.
    pub fn set_params(&self, params: ChannelParams) {
        let (changed, active) = self.shared.mutate(|core| {
            let changed = core.params != params;
            core.params = params;
            (changed, core.session.is_some())
        });
        if !changed || !active {
            return;
        }
        debug!("channel parameters changed, restarting session");
        self.reconnect();
    }

    /// Enable or disable the channel; disabling disconnects
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.mutate(|core| core.enabled = enabled);
        if enabled {
            self.connect();
        } else {
            self.disconnect();
        }
    }

    /// Register a new handler for subsequent callbacks
    pub fn set_handlers(&self, handler: Arc<dyn ChannelHandler>) {
        self.shared.set_handler(handler);
    }

    /// Queue an application frame on the open socket
    ///
    /// Returns `false` when not connected.
    #[must_use]
    pub fn send_json(&self, value: &serde_json::Value) -> bool {
        let outbound = self.shared.read(|core| {
            if core.status.state == ConnectionState::Connected {
                core.outbound.clone()
            } else {
                None
            }
        });
        outbound.is_some_and(|tx| tx.send(value.to_string()).is_ok())
    }

    /// Current connection state
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.read(|core| core.status.state)
    }

    /// Check if the socket is open
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Snapshot of state, counters and timers
    #[must_use]
    pub fn status(&self) -> ChannelStatus {
        self.shared.read(|core| core.status.clone())
    }

    /// Reconnect attempts spent
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.read(|core| core.status.reconnect_attempts)
    }

    /// Most recent decoded envelope
    #[must_use]
    pub fn last_message(&self) -> Option<Envelope> {
        self.shared.read(|core| core.last_message.clone())
    }

    /// Current params
    #[must_use]
    pub fn params(&self) -> ChannelParams {
        self.shared.read(|core| core.params.clone())
    }

    /// Endpoint the next attempt would use
    #[must_use]
    pub fn endpoint(&self) -> Option<Url> {
        self.shared.read(|core| self.endpoints.build(&core.params))
    }

    /// Subscribe to state transitions
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.shared.subscribe()
    }

    /// Channel configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("base", &self.endpoints.base().as_str())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::NoopHandler;

    fn channel(params: ChannelParams) -> EventChannel {
        EventChannel::new(
            "http://localhost:8000",
            params,
            ChannelConfig::default(),
            Arc::new(NoopHandler),
        )
        .unwrap()
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = ChannelConfig::default().with_connect_timeout(std::time::Duration::ZERO);
        let result = EventChannel::new(
            "http://h",
            ChannelParams::notifications("t"),
            config,
            Arc::new(NoopHandler),
        );
        assert!(matches!(result, Err(ChannelError::InvalidConfig(_))));
    }

    #[test]
    fn connect_outside_runtime_is_ignored() {
        let channel = channel(ChannelParams::notifications("t"));
        channel.connect();
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn missing_token_is_a_silent_no_op() {
        let channel = channel(ChannelParams::new(None, crate::Subscription::Notifications));
        channel.connect();
        assert_eq!(channel.state(), ConnectionState::Disconnected);
        assert!(channel.endpoint().is_none());
    }

    #[test]
    fn disconnect_when_idle_is_harmless() {
        let channel = channel(ChannelParams::notifications("t"));
        channel.disconnect();
        channel.disconnect();
        assert!(channel.status().is_idle());
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn send_json_requires_connection() {
        let channel = channel(ChannelParams::notifications("t"));
        assert!(!channel.send_json(&serde_json::json!({"type": "ack"})));
    }

    #[test]
    fn debug_output_omits_token() {
        let channel = channel(ChannelParams::notifications("secret"));
        assert!(!format!("{channel:?}").contains("secret"));
    }
}
