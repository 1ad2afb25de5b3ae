//! Socket transport seam
//!
//! The channel never talks to a WebSocket library directly; it opens
//! [`Socket`]s through a [`Transport`]. Production code uses
//! [`WsTransport`] (tokio-tungstenite); tests plug in scripted transports.

use crate::error::TransportError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::fmt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

/// WebSocket close status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// 1000: deliberate, orderly shutdown
    pub const NORMAL: CloseCode = CloseCode(1000);
    /// 1001: endpoint going away
    pub const GOING_AWAY: CloseCode = CloseCode(1001);
    /// 1005: close frame without status
    pub const NO_STATUS: CloseCode = CloseCode(1005);
    /// 1006: connection dropped without a close frame
    pub const ABNORMAL: CloseCode = CloseCode(1006);

    /// Only a normal closure counts as a deliberate disconnect
    #[inline]
    #[must_use]
    pub fn is_deliberate(self) -> bool {
        self == Self::NORMAL
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a socket yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// UTF-8 text frame
    Text(String),
    /// Peer closed the connection
    Closed {
        /// Close status
        code: CloseCode,
        /// Close reason
        reason: String,
    },
}

/// One open full-duplex connection
#[async_trait]
pub trait Socket: Send {
    /// Send a text frame
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Next inbound event; `None` when the stream ended without a close frame
    async fn recv(&mut self) -> Option<Result<SocketEvent, TransportError>>;

    /// Close with a status code
    async fn close(&mut self, code: CloseCode, reason: &str) -> Result<(), TransportError>;
}

/// Opens sockets
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a socket to `endpoint`
    async fn open(&self, endpoint: &Url) -> Result<Box<dyn Socket>, TransportError>;
}

/// tokio-tungstenite transport
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, endpoint: &Url) -> Result<Box<dyn Socket>, TransportError> {
        let (stream, _response) = connect_async(endpoint.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Box::new(WsSocket { stream }))
    }
}

struct WsSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Socket for WsSocket {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text.to_owned().into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<SocketEvent, TransportError>> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    return Some(Ok(SocketEvent::Text(text.as_str().to_owned())));
                }
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame.map_or((CloseCode::NO_STATUS, String::new()), |f| {
                        (CloseCode(u16::from(f.code)), f.reason.as_str().to_owned())
                    });
                    return Some(Ok(SocketEvent::Closed { code, reason }));
                }
                // Ping/Pong are answered by tungstenite; binary frames are not part of the protocol
                Ok(_) => {}
                Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self, code: CloseCode, reason: &str) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: WsCloseCode::from(code.0),
            reason: reason.to_owned().into(),
        };
        self.stream
            .close(Some(frame))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_normal_closure_is_deliberate() {
        assert!(CloseCode::NORMAL.is_deliberate());
        assert!(!CloseCode::GOING_AWAY.is_deliberate());
        assert!(!CloseCode::NO_STATUS.is_deliberate());
        assert!(!CloseCode::ABNORMAL.is_deliberate());
        assert!(!CloseCode(4001).is_deliberate());
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint =
            Url::parse(&format!("ws://127.0.0.1:{port}/ws/notifications?token=t")).unwrap();
        let result = WsTransport.open(&endpoint).await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
