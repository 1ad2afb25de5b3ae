//! Connection state and the shared core behind a channel handle
//!
//! All mutable channel state lives in one [`Core`] behind a mutex. Each
//! session task is tagged with the generation it was started under;
//! `disconnect()` bumps the generation, after which every update or handler
//! call attempted by the old session is refused. That is what guarantees no
//! callback fires after `disconnect()` returns.

use crate::config::ChannelConfig;
use crate::endpoint::ChannelParams;
use crate::handler::ChannelHandler;
use crate::transport::CloseCode;
use aegis_protocol::Envelope;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Connection state; exactly one holds at any time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No socket
    #[default]
    Disconnected,
    /// Open in progress
    Connecting,
    /// Socket open
    Connected,
    /// Last attempt or socket failed
    Error,
}

impl ConnectionState {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    /// Connection state
    pub state: ConnectionState,
    /// Reconnect attempts spent since the last stable connection
    pub reconnect_attempts: u32,
    /// A terminal event was delivered; reconnection is frozen
    pub terminal: bool,
    /// A reconnect timer is armed
    pub reconnect_pending: bool,
    /// The keepalive timer is running
    pub keepalive_active: bool,
    /// Most recent transport error
    pub last_error: Option<String>,
    /// Close code of the most recent socket; a failed open records 1006
    pub last_close: Option<CloseCode>,
}

impl ChannelStatus {
    /// No reconnect or keepalive timer armed
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.reconnect_pending && !self.keepalive_active
    }
}

/// Cancellation side of a running session
pub(crate) struct SessionHandle {
    pub(crate) cancel: oneshot::Sender<()>,
}

pub(crate) struct Core {
    pub(crate) generation: u64,
    pub(crate) enabled: bool,
    pub(crate) params: ChannelParams,
    pub(crate) status: ChannelStatus,
    pub(crate) last_message: Option<Envelope>,
    pub(crate) session: Option<SessionHandle>,
    pub(crate) outbound: Option<mpsc::UnboundedSender<String>>,
    /// `on_connect` was delivered and `on_disconnect` is still owed;
    /// whichever path takes it fires the callback
    pub(crate) announced: bool,
}

impl Core {
    /// Connection proved usable: forget earlier failed attempts unless frozen
    ///
    /// Called on the first inbound frame, not on open. A server that accepts
    /// and immediately drops the socket would otherwise reset the counter on
    /// every attempt and never hit the reconnect cap.
    pub(crate) fn mark_stable(&mut self) {
        if !self.status.terminal {
            self.status.reconnect_attempts = 0;
        }
    }

    /// Clear everything tied to an open socket
    pub(crate) fn socket_gone(&mut self, state: ConnectionState) {
        self.status.state = state;
        self.status.keepalive_active = false;
        self.outbound = None;
    }
}

pub(crate) struct Shared {
    pub(crate) config: ChannelConfig,
    /// Held by a session for its whole run; a successor waits for it
    pub(crate) socket_slot: tokio::sync::Mutex<()>,
    core: Mutex<Core>,
    dispatch: ReentrantMutex<()>,
    handler: RwLock<Arc<dyn ChannelHandler>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl Shared {
    pub(crate) fn new(
        config: ChannelConfig,
        params: ChannelParams,
        handler: Arc<dyn ChannelHandler>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            socket_slot: tokio::sync::Mutex::new(()),
            core: Mutex::new(Core {
                generation: 0,
                enabled: true,
                params,
                status: ChannelStatus::default(),
                last_message: None,
                session: None,
                outbound: None,
                announced: false,
            }),
            dispatch: ReentrantMutex::new(()),
            handler: RwLock::new(handler),
            state_tx,
        }
    }

    /// Mutate the core unconditionally, publishing any state change
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut Core) -> R) -> R {
        let mut core = self.core.lock();
        let before = core.status.state;
        let out = f(&mut *core);
        if core.status.state != before {
            self.state_tx.send_replace(core.status.state);
        }
        out
    }

    /// Mutate the core on behalf of session `generation`; `None` if stale
    pub(crate) fn update<R>(&self, generation: u64, f: impl FnOnce(&mut Core) -> R) -> Option<R> {
        self.mutate(|core| (core.generation == generation).then(|| f(core)))
    }

    /// Read the core
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Core) -> R) -> R {
        f(&*self.core.lock())
    }

    /// Invoke the handler for session `generation`; `false` if stale
    ///
    /// Holds the dispatch lock for the duration of the call so a concurrent
    /// `disconnect()` waits for it to finish.
    pub(crate) fn notify(&self, generation: u64, f: impl FnOnce(&dyn ChannelHandler)) -> bool {
        let _dispatching = self.dispatch.lock();
        if self.core.lock().generation != generation {
            return false;
        }
        let handler = self.handler();
        f(handler.as_ref());
        true
    }

    /// Run `f` with handler dispatch excluded
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _dispatching = self.dispatch.lock();
        f()
    }

    pub(crate) fn handler(&self) -> Arc<dyn ChannelHandler> {
        Arc::clone(&self.handler.read())
    }

    pub(crate) fn set_handler(&self, handler: Arc<dyn ChannelHandler>) {
        *self.handler.write() = handler;
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ChannelParams;
    use crate::handler::NoopHandler;

    fn shared() -> Shared {
        Shared::new(
            ChannelConfig::default(),
            ChannelParams::notifications("t"),
            Arc::new(NoopHandler),
        )
    }

    #[test]
    fn stale_generation_is_refused() {
        let shared = shared();
        assert_eq!(shared.update(0, |_| 1), Some(1));
        shared.mutate(|core| core.generation += 1);
        assert_eq!(shared.update(0, |_| 1), None);
        assert!(!shared.notify(0, |_| {}));
        assert!(shared.notify(1, |_| {}));
    }

    #[test]
    fn state_changes_are_published() {
        let shared = shared();
        let rx = shared.subscribe();
        shared.mutate(|core| core.status.state = ConnectionState::Connecting);
        assert_eq!(*rx.borrow(), ConnectionState::Connecting);
    }

    #[test]
    fn terminal_freeze_survives_stable_marks() {
        let shared = shared();
        shared.mutate(|core| {
            core.status.reconnect_attempts = 3;
            core.status.terminal = true;
            core.mark_stable();
        });
        assert_eq!(shared.read(|core| core.status.reconnect_attempts), 3);
    }

    #[test]
    fn disconnect_callback_is_owed_once() {
        let shared = shared();
        shared.mutate(|core| core.announced = true);
        assert!(shared.mutate(|core| std::mem::take(&mut core.announced)));
        assert!(!shared.mutate(|core| std::mem::take(&mut core.announced)));
    }

    #[test]
    fn dispatch_lock_is_reentrant() {
        let shared = shared();
        let nested = shared.exclusive(|| shared.notify(0, |_| {}));
        assert!(nested);
    }
}
