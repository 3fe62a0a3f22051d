use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use agenda_sdk::AgendaConfig;

use crate::error::{ServerError, ServerResult};

/// Header carrying the caller identity unless configured otherwise.
pub const DEFAULT_CALLER_HEADER: &str = "x-agenda-caller";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Request header holding the caller identity (hex or handle).
    pub caller_header: String,
    /// Let requests without a caller read appointments and notifications.
    pub allow_anonymous_read: bool,
    pub agenda: AgendaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 7878)),
            caller_header: DEFAULT_CALLER_HEADER.into(),
            allow_anonymous_read: true,
            agenda: AgendaConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:7878".parse::<SocketAddr>().unwrap());
        assert_eq!(c.caller_header, "x-agenda-caller");
        assert!(c.allow_anonymous_read);
        assert!(c.agenda.journal_path.is_none());
    }

    #[test]
    fn nested_agenda_table() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:8080"
            allow_anonymous_read = false

            [agenda]
            journal_path = "agenda.wal"
            time_unit = "millis"
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
        assert!(!c.allow_anonymous_read);
        assert_eq!(c.caller_header, DEFAULT_CALLER_HEADER);
        assert_eq!(c.agenda.journal_path, Some("agenda.wal".into()));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ServerConfig::from_toml_str("bind_addr = 12").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }
}
