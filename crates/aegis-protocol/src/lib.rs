//! Aegis Protocol - wire format for real-time console channels
//!
//! Provides the leaf primitives the event channel is built on:
//! - Frame decoding (envelopes and keepalive control frames)
//! - Typed event payloads with a forward-compatible `Unknown` variant
//! - Exhaustive per-tag dispatch to an [`EventHandler`]
//!
//! # Example
//!
//! ```rust
//! use aegis_protocol::{decode_frame, dispatch, EventHandler, Frame, ScanProgress};
//!
//! struct Printer;
//!
//! impl EventHandler for Printer {
//!     fn on_scan_progress(&self, progress: &ScanProgress) {
//!         println!("{}: {:.0}%", progress.scan_id, progress.progress);
//!     }
//! }
//!
//! let text = r#"{"event":"scan_progress","data":{"scan_id":"s-1","progress":42}}"#;
//! if let Ok(Frame::Envelope(envelope)) = decode_frame(text) {
//!     dispatch(&envelope.event, &Printer);
//! }
//! ```

#![warn(unreachable_pub)]

pub mod dispatch;
pub mod error;
pub mod event;
pub mod frame;

pub use dispatch::{dispatch, EventHandler, IgnoreEvents};
pub use error::DecodeError;
pub use event::{
    ConnectionEstablished, Event, EventKind, Notification, ScanCancelled, ScanCompleted,
    ScanFailed, ScanProgress, Severity, UnreadCount,
};
pub use frame::{decode_frame, ControlFrame, Envelope, Frame};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
