//! Aegis Channel - reconnecting real-time event channel
//!
//! One [`EventChannel`] streams one subscription (user notifications or the
//! progress of a single scan) from the console backend:
//! - Endpoint derived from base URL, subscription and token on every attempt
//! - Typed dispatch of decoded envelopes to a [`ChannelHandler`]
//! - `ping` keepalive while connected
//! - Fixed-delay reconnect after abnormal closes, capped by attempt count
//! - Reconnection frozen once a terminal scan event arrives
//!
//! Transport failures never surface as `Err` from the handle; they show up
//! as [`ConnectionState::Error`] plus [`ChannelHandler::on_error`] and are
//! recovered by the reconnect policy.

#![warn(unreachable_pub)]

pub mod channel;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod handler;
mod session;
pub mod state;
pub mod transport;

pub use channel::EventChannel;
pub use config::ChannelConfig;
pub use endpoint::{redacted, ChannelParams, EndpointBuilder, Subscription};
pub use error::{ChannelError, TransportError};
pub use handler::{ChannelHandler, NoopHandler};
pub use state::{ChannelStatus, ConnectionState};
pub use transport::{CloseCode, Socket, SocketEvent, Transport, WsTransport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
