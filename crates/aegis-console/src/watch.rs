//! `watch` command: stream a channel to the log

use aegis_channel::{
    ChannelConfig, ChannelHandler, ChannelParams, ChannelStatus, ConnectionState, EventChannel,
    Subscription, TransportError,
};
use aegis_protocol::{
    ConnectionEstablished, EventHandler, Notification, ScanCancelled, ScanCompleted, ScanFailed,
    ScanProgress, UnreadCount,
};
use anyhow::Context;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// How a stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    Completed,
    Failed,
    Cancelled,
    /// Server closed the channel normally
    Closed,
    /// Reconnects ran out or were not allowed after a failure
    GaveUp,
}

impl Finish {
    fn exit_code(self) -> ExitCode {
        match self {
            Finish::Completed | Finish::Closed => ExitCode::SUCCESS,
            Finish::Failed | Finish::Cancelled | Finish::GaveUp => ExitCode::FAILURE,
        }
    }
}

/// What a channel status means for the command; `None` while it may still recover
///
/// A terminal scan event is reported through the handler instead, so a
/// frozen channel is left to that path.
fn outcome(status: &ChannelStatus) -> Option<Finish> {
    if status.state != ConnectionState::Disconnected || status.reconnect_pending || status.terminal
    {
        return None;
    }
    let clean_close = status.last_close.map_or(true, |code| code.is_deliberate());
    if clean_close && status.last_error.is_none() {
        Some(Finish::Closed)
    } else {
        Some(Finish::GaveUp)
    }
}

/// Logs every event and reports terminal scan events
struct LogHandler {
    finished: mpsc::UnboundedSender<Finish>,
}

impl LogHandler {
    fn finish(&self, finish: Finish) {
        // Receiver gone means the command is already exiting
        let _ = self.finished.send(finish);
    }
}

impl EventHandler for LogHandler {
    fn on_connection_established(&self, payload: &ConnectionEstablished) {
        info!(
            message = payload.message.as_deref().unwrap_or(""),
            user = payload.user_id.as_deref().unwrap_or(""),
            "subscription confirmed"
        );
    }

    fn on_notification(&self, n: &Notification) {
        info!(
            id = %n.id,
            severity = ?n.severity,
            category = n.category.as_deref().unwrap_or("-"),
            "{}: {}",
            n.title,
            n.message
        );
    }

    fn on_unread_count(&self, count: &UnreadCount) {
        info!(unread = count.count, "unread notifications");
    }

    fn on_scan_progress(&self, p: &ScanProgress) {
        info!(
            scan = %p.scan_id,
            progress = p.progress,
            findings = p.findings_count,
            current = p.current_target.as_deref().unwrap_or("-"),
            "scan progress"
        );
    }

    fn on_scan_completed(&self, c: &ScanCompleted) {
        info!(
            scan = %c.scan_id,
            findings = c.findings_count,
            duration_s = c.duration_seconds.unwrap_or_default(),
            "scan completed"
        );
        self.finish(Finish::Completed);
    }

    fn on_scan_failed(&self, f: &ScanFailed) {
        error!(scan = %f.scan_id, error = %f.error, "scan failed");
        self.finish(Finish::Failed);
    }

    fn on_scan_cancelled(&self, c: &ScanCancelled) {
        warn!(
            scan = %c.scan_id,
            reason = c.reason.as_deref().unwrap_or("-"),
            by = c.cancelled_by.as_deref().unwrap_or("-"),
            "scan cancelled"
        );
        self.finish(Finish::Cancelled);
    }
}

impl ChannelHandler for LogHandler {
    fn on_connect(&self) {
        info!("channel open");
    }

    fn on_disconnect(&self) {
        info!("channel closed");
    }

    fn on_error(&self, err: &TransportError) {
        warn!(error = %err, retryable = err.is_retryable(), "channel error");
    }
}

/// Stream `subscription` until a terminal event, the channel gives up, or Ctrl-C
pub(crate) async fn run(
    base_url: &str,
    token: String,
    subscription: Subscription,
    config: ChannelConfig,
) -> anyhow::Result<ExitCode> {
    let (finished_tx, mut finished) = mpsc::unbounded_channel();
    let handler = Arc::new(LogHandler {
        finished: finished_tx,
    });
    let params = ChannelParams::new(Some(token), subscription);
    let channel = EventChannel::new(base_url, params, config, handler)
        .with_context(|| format!("building channel for {base_url}"))?;
    let mut states = channel.state_changes();

    channel.connect();

    let code = loop {
        tokio::select! {
            biased;

            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl-C")?;
                info!("interrupted");
                break ExitCode::SUCCESS;
            }

            Some(finish) = finished.recv() => break finish.exit_code(),

            changed = states.changed() => {
                if changed.is_err() {
                    break ExitCode::FAILURE;
                }
                let status = channel.status();
                match outcome(&status) {
                    Some(Finish::GaveUp) => {
                        error!(
                            error = status.last_error.as_deref().unwrap_or("-"),
                            close_code = status.last_close.map_or(0, |code| code.0),
                            attempts = status.reconnect_attempts,
                            "giving up"
                        );
                        break ExitCode::FAILURE;
                    }
                    Some(finish) => {
                        info!("server closed the channel");
                        break finish.exit_code();
                    }
                    None => {}
                }
            }
        }
    };

    channel.disconnect();
    Ok(code)
}
