//! Session task: the single owner of a channel's socket
//!
//! One session runs per `connect()`. It loops over connect attempts:
//! 1. build the endpoint from the current params
//! 2. open the socket (bounded by the connect timeout)
//! 3. pump inbound frames, keepalive pings and outbound host frames
//! 4. on close, either stop or sleep the fixed reconnect delay and retry
//!
//! Every await point also waits on the cancel signal sent by `disconnect()`.
//! Attempts are sequential inside one task and a session holds the
//! channel's socket slot for its whole run, so at most one socket exists
//! per channel even while a cancelled session is still closing.

use crate::endpoint::{redacted, EndpointBuilder};
use crate::error::TransportError;
use crate::state::{ConnectionState, Shared};
use crate::transport::{CloseCode, Socket, SocketEvent, Transport};
use aegis_protocol::{decode_frame, dispatch, ControlFrame, Frame};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

const CLIENT_DISCONNECT_REASON: &str = "client disconnect";

enum Exit {
    /// `disconnect()` (or a newer session) took over
    Cancelled,
    /// Socket closed or never opened
    Closed { code: CloseCode },
}

enum Decision {
    Stop { attempts: u32, terminal: bool },
    Retry { attempt: u32 },
}

pub(crate) struct Session {
    pub(crate) shared: Arc<Shared>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) endpoints: EndpointBuilder,
    pub(crate) generation: u64,
    pub(crate) cancel: oneshot::Receiver<()>,
}

impl Session {
    pub(crate) async fn run(mut self) {
        // A cancelled predecessor may still be closing its socket
        let shared = Arc::clone(&self.shared);
        let _slot = tokio::select! {
            _ = &mut self.cancel => return,
            slot = shared.socket_slot.lock() => slot,
        };

        loop {
            match self.attempt().await {
                Exit::Cancelled => {
                    debug!(generation = self.generation, "session cancelled");
                    return;
                }
                Exit::Closed { code } => {
                    if !self.after_close(code).await {
                        return;
                    }
                }
            }
        }
    }

    async fn attempt(&mut self) -> Exit {
        let generation = self.generation;
        let Some(params) = self.shared.update(generation, |core| core.params.clone()) else {
            return Exit::Cancelled;
        };
        let Some(endpoint) = self.endpoints.build(&params) else {
            debug!("channel parameters incomplete, stopping session");
            self.shared.update(generation, |core| {
                core.session = None;
                core.status.reconnect_pending = false;
                core.socket_gone(ConnectionState::Disconnected);
            });
            return Exit::Cancelled;
        };

        let connecting = self.shared.update(generation, |core| {
            core.status.state = ConnectionState::Connecting;
            core.status.reconnect_attempts
        });
        let Some(attempts) = connecting else {
            return Exit::Cancelled;
        };
        info!(
            endpoint = %redacted(&endpoint),
            subscription = %params.subscription,
            attempt = attempts,
            "connecting"
        );

        let connect_timeout = self.shared.config.connect_timeout();
        let opened = tokio::select! {
            _ = &mut self.cancel => return Exit::Cancelled,
            result = timeout(connect_timeout, self.transport.open(&endpoint)) => result,
        };

        match opened {
            Ok(Ok(socket)) => self.drive(socket).await,
            Ok(Err(err)) => {
                self.report_error(err);
                Exit::Closed {
                    code: CloseCode::ABNORMAL,
                }
            }
            Err(_elapsed) => {
                self.report_error(TransportError::Timeout {
                    timeout_ms: self.shared.config.connect_timeout_ms,
                });
                Exit::Closed {
                    code: CloseCode::ABNORMAL,
                }
            }
        }
    }

    async fn drive(&mut self, mut socket: Box<dyn Socket>) -> Exit {
        let generation = self.generation;
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        // State and `on_connect` move together so `disconnect()` sees both or neither
        let live = self.shared.exclusive(|| {
            let live = self
                .shared
                .update(generation, |core| {
                    core.status.state = ConnectionState::Connected;
                    core.status.keepalive_active = true;
                    core.status.last_error = None;
                    core.outbound = Some(outbound_tx);
                    core.announced = true;
                })
                .is_some();
            if live {
                self.shared.notify(generation, |handler| handler.on_connect());
            }
            live
        });
        if !live {
            let _ = socket.close(CloseCode::NORMAL, CLIENT_DISCONNECT_REASON).await;
            return Exit::Cancelled;
        }
        info!("connected");

        let period = self.shared.config.keepalive_interval();
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = &mut self.cancel => {
                    if let Err(err) = socket.close(CloseCode::NORMAL, CLIENT_DISCONNECT_REASON).await {
                        debug!(error = %err, "close after disconnect failed");
                    }
                    return Exit::Cancelled;
                }

                incoming = socket.recv() => match incoming {
                    Some(Ok(SocketEvent::Text(text))) => self.handle_text(&text),
                    Some(Ok(SocketEvent::Closed { code, reason })) => {
                        if code.is_deliberate() {
                            info!(code = %code, reason = %reason, "connection closed");
                        } else {
                            warn!(code = %code, reason = %reason, "connection closed abnormally");
                        }
                        return Exit::Closed { code };
                    }
                    Some(Err(err)) => {
                        self.report_error(err);
                        return Exit::Closed { code: CloseCode::ABNORMAL };
                    }
                    None => {
                        warn!("connection dropped without close frame");
                        return Exit::Closed { code: CloseCode::ABNORMAL };
                    }
                },

                Some(text) = outbound_rx.recv() => {
                    if let Err(err) = socket.send_text(&text).await {
                        self.report_error(err);
                        return Exit::Closed { code: CloseCode::ABNORMAL };
                    }
                }

                _ = keepalive.tick() => {
                    debug!("sending keepalive");
                    if let Err(err) = socket.send_text(ControlFrame::Ping.as_text()).await {
                        self.report_error(err);
                        return Exit::Closed { code: CloseCode::ABNORMAL };
                    }
                }
            }
        }
    }

    fn handle_text(&self, text: &str) {
        let generation = self.generation;
        let frame = match decode_frame(text) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "dropping undecodable frame");
                return;
            }
        };

        match frame {
            Frame::Pong => {
                debug!("keepalive pong");
                // Any inbound frame proves the socket usable
                self.shared.update(generation, |core| core.mark_stable());
            }
            Frame::Envelope(envelope) => {
                let terminal = envelope.event.is_terminal();
                let max = self.shared.config.max_reconnect_attempts;
                let stored = self.shared.update(generation, |core| {
                    if terminal {
                        core.status.terminal = true;
                        core.status.reconnect_attempts = max;
                    } else {
                        core.mark_stable();
                    }
                    core.last_message = Some(envelope.clone());
                });
                if stored.is_none() {
                    return;
                }

                debug!(event = %envelope.event.tag(), "event received");
                if terminal {
                    info!(
                        event = %envelope.event.tag(),
                        "terminal event received, reconnection disabled"
                    );
                }
                self.shared.notify(generation, |handler| {
                    handler.on_message(&envelope);
                    dispatch(&envelope.event, handler);
                });
            }
        }
    }

    fn report_error(&self, err: TransportError) {
        error!(error = %err, "transport error");
        let recorded = self.shared.update(self.generation, |core| {
            core.status.last_error = Some(err.to_string());
            core.socket_gone(ConnectionState::Error);
        });
        if recorded.is_some() {
            self.shared
                .notify(self.generation, |handler| handler.on_error(&err));
        }
    }

    /// Returns `true` when another attempt should follow
    async fn after_close(&mut self, code: CloseCode) -> bool {
        let generation = self.generation;
        let auto_reconnect = self.shared.config.auto_reconnect;
        let max = self.shared.config.max_reconnect_attempts;
        let delay = self.shared.config.reconnect_interval();

        // Under the dispatch lock so a concurrent `disconnect()` either
        // finds the callback still owed or finds it already delivered
        let decision = self.shared.exclusive(|| {
            let (decision, announced) = self.shared.update(generation, |core| {
                core.socket_gone(ConnectionState::Disconnected);
                core.status.last_close = Some(code);
                let attempts = core.status.reconnect_attempts;
                let decision = if code.is_deliberate() || !auto_reconnect || attempts >= max {
                    core.session = None;
                    core.status.reconnect_pending = false;
                    Decision::Stop {
                        attempts,
                        terminal: core.status.terminal,
                    }
                } else {
                    core.status.reconnect_pending = true;
                    Decision::Retry {
                        attempt: attempts + 1,
                    }
                };
                (decision, std::mem::take(&mut core.announced))
            })?;
            if announced {
                self.shared
                    .notify(generation, |handler| handler.on_disconnect());
            }
            Some(decision)
        });
        let Some(decision) = decision else {
            return false;
        };

        match decision {
            Decision::Stop { attempts, terminal } => {
                if terminal {
                    info!("stream finished, not reconnecting");
                } else if code.is_deliberate() || !auto_reconnect {
                    debug!(code = %code, "not reconnecting");
                } else {
                    warn!(attempts, max, "reconnect attempts exhausted");
                }
                false
            }
            Decision::Retry { attempt } => {
                info!(
                    attempt,
                    max,
                    delay_ms = self.shared.config.reconnect_interval_ms,
                    "scheduling reconnect"
                );
                tokio::select! {
                    _ = &mut self.cancel => return false,
                    () = sleep(delay) => {}
                }
                self.shared
                    .update(generation, |core| {
                        core.status.reconnect_pending = false;
                        core.status.reconnect_attempts += 1;
                    })
                    .is_some()
            }
        }
    }
}
