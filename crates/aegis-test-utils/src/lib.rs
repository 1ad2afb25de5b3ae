//! Testing utilities for the Aegis workspace
//!
//! Shared doubles for integration tests:
//! - [`MockTransport`]: scripted transport counting attempts and open sockets
//! - [`MockPeer`]: the server side of an accepted mock socket
//! - [`RecordingHandler`]: channel handler that records every callback
//! - [`RecordingHost`]: palette host that records navigation and close requests

#![allow(missing_docs)]

use aegis_channel::{ChannelHandler, CloseCode, Socket, SocketEvent, Transport, TransportError};
use aegis_palette::PaletteHost;
use aegis_protocol::{
    ConnectionEstablished, Envelope, EventHandler, Notification, ScanCancelled, ScanCompleted,
    ScanFailed, ScanProgress, UnreadCount,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// What the next `open` does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Fail with a connect error
    Refuse,
    /// Open a socket driven by a [`MockPeer`]
    Accept,
    /// Open, then immediately report a close with this code
    AcceptThenClose(CloseCode),
    /// Never complete
    Hang,
}

#[derive(Debug, Default)]
struct MockState {
    plans: VecDeque<Plan>,
    attempts: usize,
    open: usize,
    max_open: usize,
    endpoints: Vec<Url>,
    sent: Vec<String>,
    closes: Vec<CloseCode>,
    peers: Vec<MockPeer>,
}

/// Scripted transport
///
/// Plans queued with [`MockTransport::push`] are consumed one per `open`;
/// once the queue is empty every `open` follows the default plan.
#[derive(Debug, Clone)]
pub struct MockTransport {
    default_plan: Plan,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new(default_plan: Plan) -> Self {
        Self {
            default_plan,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Every open succeeds
    pub fn accepting() -> Self {
        Self::new(Plan::Accept)
    }

    /// Every open fails
    pub fn refusing() -> Self {
        Self::new(Plan::Refuse)
    }

    pub fn push(&self, plan: Plan) -> &Self {
        self.state.lock().plans.push_back(plan);
        self
    }

    /// `open` calls so far
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    /// Sockets currently open
    pub fn open_sockets(&self) -> usize {
        self.state.lock().open
    }

    /// Most sockets ever open at the same time
    pub fn max_open_sockets(&self) -> usize {
        self.state.lock().max_open
    }

    pub fn endpoints(&self) -> Vec<Url> {
        self.state.lock().endpoints.clone()
    }

    /// Text frames written by the client, across all sockets
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    /// Number of `{"type":"ping"}` frames written
    pub fn pings(&self) -> usize {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|text| text.as_str() == r#"{"type":"ping"}"#)
            .count()
    }

    /// Close codes sent by the client
    pub fn closes(&self) -> Vec<CloseCode> {
        self.state.lock().closes.clone()
    }

    /// Peer of the most recently accepted socket
    pub fn peer(&self) -> Option<MockPeer> {
        self.state.lock().peers.last().cloned()
    }

    /// Number of accepted sockets
    pub fn accepted(&self) -> usize {
        self.state.lock().peers.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, endpoint: &Url) -> Result<Box<dyn Socket>, TransportError> {
        let plan = {
            let mut state = self.state.lock();
            state.attempts += 1;
            state.endpoints.push(endpoint.clone());
            state.plans.pop_front().unwrap_or(self.default_plan)
        };

        match plan {
            Plan::Refuse => Err(TransportError::Connect("connection refused".into())),
            Plan::Hang => std::future::pending::<Result<Box<dyn Socket>, TransportError>>().await,
            Plan::Accept | Plan::AcceptThenClose(_) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let peer = MockPeer { tx };
                if let Plan::AcceptThenClose(code) = plan {
                    peer.close(code);
                }
                let mut state = self.state.lock();
                state.open += 1;
                state.max_open = state.max_open.max(state.open);
                state.peers.push(peer);
                Ok(Box::new(MockSocket {
                    inbound: rx,
                    state: Arc::clone(&self.state),
                }))
            }
        }
    }
}

#[derive(Debug)]
enum Inbound {
    Event(SocketEvent),
    Error(TransportError),
    Drop,
}

struct MockSocket {
    inbound: mpsc::UnboundedReceiver<Inbound>,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl Socket for MockSocket {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.state.lock().sent.push(text.to_owned());
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<SocketEvent, TransportError>> {
        match self.inbound.recv().await {
            Some(Inbound::Event(event)) => Some(Ok(event)),
            Some(Inbound::Error(err)) => Some(Err(err)),
            Some(Inbound::Drop) | None => None,
        }
    }

    async fn close(&mut self, code: CloseCode, _reason: &str) -> Result<(), TransportError> {
        self.state.lock().closes.push(code);
        Ok(())
    }
}

impl Drop for MockSocket {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open = state.open.saturating_sub(1);
    }
}

/// Server side of an accepted mock socket
#[derive(Debug, Clone)]
pub struct MockPeer {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl MockPeer {
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.tx.send(Inbound::Event(SocketEvent::Text(text.into())));
    }

    /// Send `{"event": tag, "data": data}`
    pub fn send_event(&self, tag: &str, data: Value) {
        self.send_text(envelope_json(tag, data));
    }

    pub fn pong(&self) {
        self.send_text(r#"{"type":"pong"}"#);
    }

    pub fn close(&self, code: CloseCode) {
        let _ = self.tx.send(Inbound::Event(SocketEvent::Closed {
            code,
            reason: String::new(),
        }));
    }

    pub fn fail(&self, err: TransportError) {
        let _ = self.tx.send(Inbound::Error(err));
    }

    /// End the stream without a close frame
    pub fn drop_connection(&self) {
        let _ = self.tx.send(Inbound::Drop);
    }
}

/// Wire text of an envelope
pub fn envelope_json(tag: &str, data: Value) -> String {
    json!({ "event": tag, "data": data, "timestamp": "2024-01-01T00:00:00Z" }).to_string()
}

// ---------------------------------------------------------------------------
// Channel handler
// ---------------------------------------------------------------------------

/// One recorded callback
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Disconnect,
    Error(TransportError),
    Message(String),
    ConnectionEstablished,
    Notification(String),
    UnreadCount(u64),
    ScanProgress(f64),
    ScanCompleted(String),
    ScanFailed(String),
    ScanCancelled(String),
}

/// Handler recording every callback in order
#[derive(Debug, Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<Call>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| matches(call)).count()
    }

    pub fn connects(&self) -> usize {
        self.count(|call| matches!(call, Call::Connect))
    }

    pub fn disconnects(&self) -> usize {
        self.count(|call| matches!(call, Call::Disconnect))
    }

    pub fn errors(&self) -> usize {
        self.count(|call| matches!(call, Call::Error(_)))
    }

    pub fn messages(&self) -> usize {
        self.count(|call| matches!(call, Call::Message(_)))
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl EventHandler for RecordingHandler {
    fn on_connection_established(&self, _payload: &ConnectionEstablished) {
        self.record(Call::ConnectionEstablished);
    }

    fn on_notification(&self, notification: &Notification) {
        self.record(Call::Notification(notification.id.clone()));
    }

    fn on_unread_count(&self, count: &UnreadCount) {
        self.record(Call::UnreadCount(count.count));
    }

    fn on_scan_progress(&self, progress: &ScanProgress) {
        self.record(Call::ScanProgress(progress.progress));
    }

    fn on_scan_completed(&self, completed: &ScanCompleted) {
        self.record(Call::ScanCompleted(completed.scan_id.clone()));
    }

    fn on_scan_failed(&self, failed: &ScanFailed) {
        self.record(Call::ScanFailed(failed.error.clone()));
    }

    fn on_scan_cancelled(&self, cancelled: &ScanCancelled) {
        self.record(Call::ScanCancelled(cancelled.scan_id.clone()));
    }
}

impl ChannelHandler for RecordingHandler {
    fn on_connect(&self) {
        self.record(Call::Connect);
    }

    fn on_disconnect(&self) {
        self.record(Call::Disconnect);
    }

    fn on_error(&self, error: &TransportError) {
        self.record(Call::Error(error.clone()));
    }

    fn on_message(&self, envelope: &Envelope) {
        self.record(Call::Message(envelope.event.tag().to_owned()));
    }
}

// ---------------------------------------------------------------------------
// Palette host
// ---------------------------------------------------------------------------

/// Palette host recording navigation targets and close requests
#[derive(Debug, Default)]
pub struct RecordingHost {
    navigations: Mutex<Vec<String>>,
    close_requests: Mutex<usize>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }

    pub fn close_requests(&self) -> usize {
        *self.close_requests.lock()
    }
}

impl PaletteHost for RecordingHost {
    fn on_navigate(&self, target: &str) {
        self.navigations.lock().push(target.to_owned());
    }

    fn on_close_requested(&self) {
        *self.close_requests.lock() += 1;
    }
}
