//! Console configuration file
//!
//! Optional TOML file; every key has a default so an empty file is valid.
//!
//! ```toml
//! base_url = "https://api.aegis.example"
//! token = "..."
//! recent = ["/incidents", "/reports"]
//!
//! [channel]
//! max_reconnect_attempts = 10
//! reconnect_interval_ms = 5000
//! ```
//!
//! Command-line flags and environment variables override file values.

use aegis_channel::ChannelConfig;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Backend used when neither flag nor file names one
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConsoleConfig {
    /// Backend HTTP base URL
    pub(crate) base_url: Option<String>,
    /// Bearer token
    pub(crate) token: Option<String>,
    /// Reconnect and keepalive settings
    pub(crate) channel: ChannelConfig,
    /// Recently visited pages, most recent first
    pub(crate) recent: Vec<String>,
}

impl ConsoleConfig {
    /// Read and parse `path`
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config
            .channel
            .validate()
            .with_context(|| format!("invalid [channel] section in {}", path.display()))?;
        Ok(config)
    }

    /// Flag value, else file value, else the default backend
    pub(crate) fn base_url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_owned)
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Flag value, else file value
    pub(crate) fn token(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_owned).or_else(|| self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("");
        let config = ConsoleConfig::load(file.path()).unwrap();
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.channel, ChannelConfig::default());
    }

    #[test]
    fn partial_channel_section_keeps_other_defaults() {
        let file = write_config(
            r#"
            base_url = "https://api.aegis.example"
            recent = ["/incidents"]

            [channel]
            max_reconnect_attempts = 10
            "#,
        );
        let config = ConsoleConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://api.aegis.example"));
        assert_eq!(config.recent, vec!["/incidents".to_string()]);
        assert_eq!(config.channel.max_reconnect_attempts, 10);
        assert_eq!(config.channel.reconnect_interval_ms, 3_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("base_uri = \"typo\"");
        assert!(ConsoleConfig::load(file.path()).is_err());
    }

    #[test]
    fn zero_keepalive_is_rejected() {
        let file = write_config("[channel]\nkeepalive_interval_ms = 0");
        let err = ConsoleConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("keepalive_interval_ms"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConsoleConfig::load(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn flags_override_file_values() {
        let config = ConsoleConfig {
            base_url: Some("https://file.example".into()),
            token: Some("file-token".into()),
            ..ConsoleConfig::default()
        };
        assert_eq!(config.base_url(Some("http://flag")), "http://flag");
        assert_eq!(config.base_url(None), "https://file.example");
        assert_eq!(config.token(None).as_deref(), Some("file-token"));
        assert_eq!(ConsoleConfig::default().base_url(None), DEFAULT_BASE_URL);
    }
}
