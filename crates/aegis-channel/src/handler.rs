//! Host callback surface

use crate::error::TransportError;
use aegis_protocol::{Envelope, EventHandler};

/// Callbacks a channel drives
///
/// Per-tag methods come from [`EventHandler`]; this trait adds the connection
/// lifecycle. All methods default to no-ops. Handlers run on the channel's
/// session task and must not block.
pub trait ChannelHandler: EventHandler {
    /// Socket opened
    fn on_connect(&self) {}

    /// A connected socket closed (by either side)
    fn on_disconnect(&self) {}

    /// Transport failure; the channel recovers on its own
    fn on_error(&self, _error: &TransportError) {}

    /// Every decoded envelope, before per-tag dispatch
    fn on_message(&self, _envelope: &Envelope) {}
}

/// Handler that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {}

impl ChannelHandler for NoopHandler {}
