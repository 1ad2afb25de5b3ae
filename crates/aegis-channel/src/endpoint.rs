//! Endpoint construction
//!
//! The socket address is derived, on every connect attempt, from:
//! - the backend's HTTP base URL (scheme decides `ws` vs `wss`)
//! - the subscription (decides the path)
//! - the bearer token (query parameter `token`)
//!
//! Missing token or subscription id means "not ready yet", not an error.

use crate::error::ChannelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// What a channel streams
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subscription {
    /// Notifications for the authenticated user
    Notifications,
    /// Progress of a single scan
    ScanProgress {
        /// Scan to follow
        scan_id: String,
    },
}

impl Subscription {
    /// Scan progress subscription
    #[inline]
    #[must_use]
    pub fn scan(scan_id: impl Into<String>) -> Self {
        Self::ScanProgress {
            scan_id: scan_id.into(),
        }
    }

    /// Path segments below the base URL; `None` if the id is missing
    #[must_use]
    pub fn segments(&self) -> Option<Vec<&str>> {
        match self {
            Subscription::Notifications => Some(vec!["ws", "notifications"]),
            Subscription::ScanProgress { scan_id } if scan_id.trim().is_empty() => None,
            Subscription::ScanProgress { scan_id } => Some(vec!["ws", "scans", scan_id.as_str()]),
        }
    }

    /// Whether terminal events can arrive on this subscription
    #[inline]
    #[must_use]
    pub fn has_terminal_events(&self) -> bool {
        matches!(self, Subscription::ScanProgress { .. })
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscription::Notifications => f.write_str("notifications"),
            Subscription::ScanProgress { scan_id } => write!(f, "scan:{scan_id}"),
        }
    }
}

/// Inputs a connect attempt is built from
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelParams {
    /// Bearer token; `None` when signed out
    pub token: Option<String>,
    /// What to stream
    pub subscription: Subscription,
}

impl ChannelParams {
    /// Create params
    #[inline]
    #[must_use]
    pub fn new(token: Option<String>, subscription: Subscription) -> Self {
        Self {
            token,
            subscription,
        }
    }

    /// Notifications for `token`
    #[inline]
    #[must_use]
    pub fn notifications(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()), Subscription::Notifications)
    }

    /// Progress of `scan_id` for `token`
    #[inline]
    #[must_use]
    pub fn scan(token: impl Into<String>, scan_id: impl Into<String>) -> Self {
        Self::new(Some(token.into()), Subscription::scan(scan_id))
    }

    /// Same subscription, token removed
    #[inline]
    #[must_use]
    pub fn signed_out(&self) -> Self {
        Self::new(None, self.subscription.clone())
    }

    /// Non-empty token present
    #[inline]
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Token and subscription id both present
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.has_token() && self.subscription.segments().is_some()
    }
}

impl fmt::Debug for ChannelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelParams")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("subscription", &self.subscription)
            .finish()
    }
}

/// Validated base address that endpoints are derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointBuilder {
    base: Url,
}

impl EndpointBuilder {
    /// Parse an HTTP(S) or WS(S) base URL
    ///
    /// # Errors
    /// - `ChannelError::InvalidBaseUrl` if the URL does not parse
    /// - `ChannelError::UnsupportedScheme` for anything but http/https/ws/wss
    /// - `ChannelError::MissingHost` if the URL has no host
    pub fn new(base_url: &str) -> Result<Self, ChannelError> {
        let mut base = Url::parse(base_url).map_err(|e| ChannelError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let ws_scheme = match base.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(ChannelError::UnsupportedScheme(other.to_string())),
        };
        if base.host_str().is_none() {
            return Err(ChannelError::MissingHost(base_url.to_string()));
        }
        base.set_scheme(ws_scheme)
            .map_err(|()| ChannelError::UnsupportedScheme(base.scheme().to_string()))?;
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base })
    }

    /// Base address with its socket scheme
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Whether endpoints use TLS
    #[inline]
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base.scheme() == "wss"
    }

    /// Build the endpoint for `params`
    ///
    /// Returns `None` when the token or subscription id is missing.
    #[must_use]
    pub fn build(&self, params: &ChannelParams) -> Option<Url> {
        if !params.has_token() {
            return None;
        }
        let token = params.token.as_deref()?;
        let segments = params.subscription.segments()?;

        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().ok()?;
            path.pop_if_empty();
            path.extend(segments);
        }
        url.query_pairs_mut().append_pair("token", token);
        Some(url)
    }
}

/// Endpoint with the token masked, for logs
#[must_use]
pub fn redacted(endpoint: &Url) -> String {
    let mut shown = endpoint.clone();
    shown.set_query(None);
    if endpoint.query().is_some() {
        shown.set_query(Some("token=redacted"));
    }
    shown.to_string()
}
