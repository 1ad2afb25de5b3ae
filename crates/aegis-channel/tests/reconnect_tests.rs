//! Reconnect policy, terminal freeze and keepalive timing
//!
//! All tests run on a paused clock; `sleep` advances virtual time.

use aegis_channel::{
    ChannelConfig, ChannelParams, CloseCode, ConnectionState, EventChannel, TransportError,
};
use aegis_test_utils::{Call, MockTransport, Plan, RecordingHandler};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn scan_channel(
    transport: &MockTransport,
    config: ChannelConfig,
    handler: &Arc<RecordingHandler>,
) -> EventChannel {
    EventChannel::with_transport(
        "https://api.aegis.example",
        ChannelParams::scan("t", "scan-1"),
        config,
        handler.clone(),
        Arc::new(transport.clone()),
    )
    .unwrap()
}

fn config(max_attempts: u32) -> ChannelConfig {
    ChannelConfig::default()
        .with_max_reconnect_attempts(max_attempts)
        .with_reconnect_interval(Duration::from_secs(3))
}

async fn settle() {
    sleep(Duration::from_millis(1)).await;
}

// ---------------------------------------------------------------------------
// Reconnect cap
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn sockets_closing_on_open_cap_attempts_at_max_plus_one() {
    let transport = MockTransport::new(Plan::AcceptThenClose(CloseCode::ABNORMAL));
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(4), &handler);

    channel.connect();
    sleep(Duration::from_secs(120)).await;

    assert_eq!(transport.attempts(), 5);
    assert_eq!(transport.max_open_sockets(), 1);
    assert_eq!(channel.state(), ConnectionState::Disconnected);
    assert_eq!(channel.reconnect_attempts(), 4);
    assert!(channel.status().is_idle());
    assert_eq!(handler.connects(), 5);
    assert_eq!(handler.disconnects(), 5);

    // Abnormal closes leave no transport error behind, only the close code
    let status = channel.status();
    assert_eq!(status.last_close, Some(CloseCode::ABNORMAL));
    assert_eq!(status.last_error, None);
}

#[tokio::test(start_paused = true)]
async fn refused_opens_cap_attempts_at_max_plus_one() {
    let transport = MockTransport::refusing();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(2), &handler);

    channel.connect();
    sleep(Duration::from_secs(120)).await;

    assert_eq!(transport.attempts(), 3);
    assert_eq!(channel.state(), ConnectionState::Disconnected);
    assert_eq!(handler.errors(), 3);
    assert_eq!(handler.connects(), 0);
    assert!(channel.status().is_idle());
}

#[tokio::test(start_paused = true)]
async fn reconnect_waits_the_fixed_delay() {
    let transport = MockTransport::refusing();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5), &handler);

    channel.connect();
    settle().await;
    assert_eq!(transport.attempts(), 1);
    assert!(channel.status().reconnect_pending);

    sleep(Duration::from_millis(2_990)).await;
    assert_eq!(transport.attempts(), 1);

    sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.attempts(), 2);
    assert_eq!(channel.reconnect_attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn maximum_of_three_attempts_scenario() {
    let transport = MockTransport::accepting();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(3), &handler);

    channel.connect();
    settle().await;
    assert!(channel.is_connected());

    // First abnormal close: exactly one reconnect, after the delay
    transport.peer().unwrap().drop_connection();
    settle().await;
    let status = channel.status();
    assert_eq!(status.state, ConnectionState::Disconnected);
    assert!(status.reconnect_pending);
    assert_eq!(transport.attempts(), 1);

    sleep(Duration::from_millis(3_000)).await;
    assert_eq!(transport.attempts(), 2);
    assert_eq!(channel.reconnect_attempts(), 1);
    assert!(channel.is_connected());

    // Three more consecutive abnormal closes
    for expected_attempts in [3, 4] {
        transport.peer().unwrap().close(CloseCode::GOING_AWAY);
        sleep(Duration::from_millis(3_001)).await;
        assert_eq!(transport.attempts(), expected_attempts);
    }
    assert_eq!(channel.reconnect_attempts(), 3);

    transport.peer().unwrap().close(CloseCode::ABNORMAL);
    settle().await;
    let status = channel.status();
    assert_eq!(status.state, ConnectionState::Disconnected);
    assert!(!status.reconnect_pending);
    assert!(status.is_idle());

    sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.attempts() - 1, 3);
    assert_eq!(transport.max_open_sockets(), 1);
}

#[tokio::test(start_paused = true)]
async fn received_frame_resets_attempts() {
    let transport = MockTransport::accepting();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(3), &handler);

    channel.connect();
    settle().await;
    transport.peer().unwrap().drop_connection();
    sleep(Duration::from_millis(3_001)).await;
    assert_eq!(channel.reconnect_attempts(), 1);

    transport
        .peer()
        .unwrap()
        .send_event("scan_progress", json!({"scan_id": "scan-1", "progress": 10}));
    settle().await;
    assert_eq!(channel.reconnect_attempts(), 0);
    assert_eq!(handler.count(|call| *call == Call::ScanProgress(10.0)), 1);
}

#[tokio::test(start_paused = true)]
async fn normal_close_from_server_does_not_reconnect() {
    let transport = MockTransport::accepting();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5), &handler);

    channel.connect();
    settle().await;
    transport.peer().unwrap().close(CloseCode::NORMAL);
    sleep(Duration::from_secs(60)).await;

    assert_eq!(transport.attempts(), 1);
    assert_eq!(channel.state(), ConnectionState::Disconnected);
    assert_eq!(channel.status().last_close, Some(CloseCode::NORMAL));
    assert_eq!(handler.disconnects(), 1);
}

#[tokio::test(start_paused = true)]
async fn auto_reconnect_disabled_stays_down() {
    let transport = MockTransport::accepting();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5).with_auto_reconnect(false), &handler);

    channel.connect();
    settle().await;
    transport.peer().unwrap().drop_connection();
    sleep(Duration::from_secs(60)).await;

    assert_eq!(transport.attempts(), 1);
    assert!(channel.status().is_idle());
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_pending_reconnect() {
    let transport = MockTransport::refusing();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5), &handler);

    channel.connect();
    settle().await;
    assert!(channel.status().reconnect_pending);

    channel.disconnect();
    assert!(channel.status().is_idle());
    assert_eq!(channel.reconnect_attempts(), 0);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_error_on_open_socket_reconnects() {
    let transport = MockTransport::accepting();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5), &handler);

    channel.connect();
    settle().await;
    let err = TransportError::Receive("reset by peer".into());
    transport.peer().unwrap().fail(err.clone());
    settle().await;

    assert_eq!(
        handler.calls(),
        vec![Call::Connect, Call::Error(err), Call::Disconnect]
    );
    sleep(Duration::from_millis(3_000)).await;
    assert_eq!(transport.attempts(), 2);
}

// ---------------------------------------------------------------------------
// Terminal freeze
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn terminal_event_freezes_reconnection() {
    for (tag, data) in [
        ("scan_completed", json!({"scan_id": "scan-1", "findings_count": 2})),
        ("scan_failed", json!({"scan_id": "scan-1", "error": "target unreachable"})),
        ("scan_cancelled", json!({"scan_id": "scan-1", "reason": "operator"})),
    ] {
        let transport = MockTransport::accepting();
        let handler = RecordingHandler::new();
        let channel = scan_channel(&transport, config(5), &handler);

        channel.connect();
        settle().await;
        let peer = transport.peer().unwrap();
        peer.send_event(tag, data);
        settle().await;

        let status = channel.status();
        assert!(status.terminal, "{tag}");
        assert_eq!(status.reconnect_attempts, 5, "{tag}");

        // Later frames do not thaw the counter
        peer.send_event("scan_progress", json!({"scan_id": "scan-1", "progress": 100}));
        peer.drop_connection();
        sleep(Duration::from_secs(60)).await;

        assert_eq!(transport.attempts(), 1, "{tag}");
        assert_eq!(channel.state(), ConnectionState::Disconnected, "{tag}");
        assert_eq!(channel.reconnect_attempts(), 5, "{tag}");
        assert!(channel.status().is_idle(), "{tag}");
        assert_eq!(handler.messages(), 2, "{tag}");
    }
}

#[tokio::test(start_paused = true)]
async fn explicit_connect_after_terminal_starts_fresh() {
    let transport = MockTransport::accepting();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5), &handler);

    channel.connect();
    settle().await;
    let peer = transport.peer().unwrap();
    peer.send_event("scan_failed", json!({"scan_id": "scan-1", "error": "boom"}));
    peer.drop_connection();
    settle().await;
    assert_eq!(
        handler.count(|call| *call == Call::ScanFailed("boom".into())),
        1
    );

    channel.connect();
    settle().await;
    assert_eq!(transport.attempts(), 2);
    let status = channel.status();
    assert!(!status.terminal);
    assert_eq!(status.reconnect_attempts, 0);
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn keepalive_pings_while_connected() {
    let transport = MockTransport::accepting();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5), &handler);

    channel.connect();
    settle().await;
    assert!(channel.status().keepalive_active);
    assert_eq!(transport.pings(), 0);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.pings(), 1);
    sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.pings(), 3);

    channel.disconnect();
    assert!(!channel.status().keepalive_active);
    sleep(Duration::from_secs(300)).await;
    assert_eq!(transport.pings(), 3);
}

#[tokio::test(start_paused = true)]
async fn keepalive_never_pings_without_a_socket() {
    let transport = MockTransport::refusing();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5), &handler);

    channel.connect();
    sleep(Duration::from_secs(300)).await;

    assert_eq!(transport.pings(), 0);
    assert!(!channel.status().keepalive_active);
}

#[tokio::test(start_paused = true)]
async fn keepalive_stops_when_the_socket_drops() {
    let transport = MockTransport::accepting();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5).with_auto_reconnect(false), &handler);

    channel.connect();
    sleep(Duration::from_secs(31)).await;
    assert_eq!(transport.pings(), 1);

    transport.peer().unwrap().drop_connection();
    settle().await;
    assert!(!channel.status().keepalive_active);

    sleep(Duration::from_secs(300)).await;
    assert_eq!(transport.pings(), 1);
}

#[tokio::test(start_paused = true)]
async fn pongs_are_not_dispatched() {
    let transport = MockTransport::accepting();
    let handler = RecordingHandler::new();
    let channel = scan_channel(&transport, config(5), &handler);

    channel.connect();
    settle().await;
    transport.peer().unwrap().pong();
    settle().await;

    assert_eq!(handler.calls(), vec![Call::Connect]);
    assert!(channel.last_message().is_none());
}
