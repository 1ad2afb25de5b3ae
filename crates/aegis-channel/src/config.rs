//! Channel configuration

use crate::error::ChannelError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reconnect, keepalive and timeout settings for one channel
///
/// Delays are fixed (no jitter, no exponential growth): a dropped channel
/// retries every `reconnect_interval_ms` until `max_reconnect_attempts`
/// consecutive attempts have been spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Reconnect after abnormal closes
    pub auto_reconnect: bool,
    /// Reconnect attempts allowed before giving up
    pub max_reconnect_attempts: u32,
    /// Delay before each reconnect attempt
    pub reconnect_interval_ms: u64,
    /// Period of the `ping` keepalive frame
    pub keepalive_interval_ms: u64,
    /// Bound on a single open attempt
    pub connect_timeout_ms: u64,
}

impl ChannelConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With auto-reconnect toggled
    #[inline]
    #[must_use]
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// With max reconnect attempts
    #[inline]
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// With reconnect delay
    #[inline]
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval_ms = duration_ms(interval);
        self
    }

    /// With keepalive period
    #[inline]
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval_ms = duration_ms(interval);
        self
    }

    /// With connect timeout
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = duration_ms(timeout);
        self
    }

    /// Reconnect delay
    #[inline]
    #[must_use]
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Keepalive period
    #[inline]
    #[must_use]
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    /// Connect timeout
    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Validate ranges
    ///
    /// # Errors
    /// `ChannelError::InvalidConfig` when the keepalive period or connect
    /// timeout is zero.
    pub fn validate(&self) -> Result<(), ChannelError> {
        if self.keepalive_interval_ms == 0 {
            return Err(ChannelError::InvalidConfig(
                "keepalive_interval_ms must be positive".into(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ChannelError::InvalidConfig(
                "connect_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            max_reconnect_attempts: 5,
            reconnect_interval_ms: 3_000,
            keepalive_interval_ms: 30_000,
            connect_timeout_ms: 10_000,
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
