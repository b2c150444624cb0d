use std::time::Duration;

use serde::Deserialize;

use crate::utils::{RelayError, Result};

/// Largest inbound message accepted from a peer, in bytes (10 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Top-level configuration settings for the relay.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub hub: HubSettings,
    pub session: SessionSettings,
}

/// Where the relay listens and which upgrade requests it accepts.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// HTTP path on which WebSocket upgrades are accepted.
    pub path: String,
    /// Origins allowed to upgrade. Empty means every origin is accepted.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HubSettings {
    pub event_queue_capacity: usize,
    /// Seconds between registry status log lines; 0 disables them.
    pub status_interval_secs: u64,
}

/// Per-connection limits and timers.
#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    pub mailbox_capacity: usize,
    pub max_message_size: usize,
    pub ping_interval_secs: u64,
    pub write_wait_secs: u64,
}

impl Settings {
    pub fn listen_addr(&self) -> String {
        if self.server.host.contains(':') {
            format!("[{}]:{}", self.server.host, self.server.port)
        } else {
            format!("{}:{}", self.server.host, self.server.port)
        }
    }

    /// Overrides host and port from a `host:port` string.
    ///
    /// An empty host (`:8080`) binds every interface.
    pub fn with_listen_addr(mut self, addr: &str) -> Result<Self> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| RelayError::InvalidAddress(addr.to_string()))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| RelayError::InvalidAddress(addr.to_string()))?;

        self.server.host = if host.is_empty() {
            "0.0.0.0".to_string()
        } else {
            host.trim_start_matches('[').trim_end_matches(']').to_string()
        };
        self.server.port = port;
        self.validate()?;
        Ok(self)
    }

    /// Rejects values the hub and session loops cannot run with.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("hub.event_queue_capacity", self.hub.event_queue_capacity as u64),
            ("session.mailbox_capacity", self.session.mailbox_capacity as u64),
            ("session.max_message_size", self.session.max_message_size as u64),
            ("session.ping_interval_secs", self.session.ping_interval_secs),
            ("session.write_wait_secs", self.session.write_wait_secs),
        ];
        match required.into_iter().find(|(_, value)| *value == 0) {
            Some((key, _)) => Err(RelayError::InvalidSetting(key)),
            None => Ok(()),
        }
    }
}

impl ServerSettings {
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            _ if self.allowed_origins.is_empty() => true,
            None => true,
            Some(origin) => self.allowed_origins.iter().any(|o| o == origin),
        }
    }
}

impl SessionSettings {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_secs)
    }
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub hub: Option<PartialHubSettings>,
    pub session: Option<PartialSessionSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct PartialHubSettings {
    pub event_queue_capacity: Option<usize>,
    pub status_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialSessionSettings {
    pub mailbox_capacity: Option<usize>,
    pub max_message_size: Option<usize>,
    pub ping_interval_secs: Option<u64>,
    pub write_wait_secs: Option<u64>,
}

impl PartialSettings {
    pub fn merge_over(self, default: Settings) -> Settings {
        let server = self.server;
        let hub = self.hub;
        let session = self.session;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
                path: server
                    .as_ref()
                    .and_then(|s| s.path.clone())
                    .unwrap_or(default.server.path),
                allowed_origins: server
                    .as_ref()
                    .and_then(|s| s.allowed_origins.clone())
                    .unwrap_or(default.server.allowed_origins),
            },
            hub: HubSettings {
                event_queue_capacity: hub
                    .as_ref()
                    .and_then(|h| h.event_queue_capacity)
                    .unwrap_or(default.hub.event_queue_capacity),
                status_interval_secs: hub
                    .as_ref()
                    .and_then(|h| h.status_interval_secs)
                    .unwrap_or(default.hub.status_interval_secs),
            },
            session: SessionSettings {
                mailbox_capacity: session
                    .as_ref()
                    .and_then(|s| s.mailbox_capacity)
                    .unwrap_or(default.session.mailbox_capacity),
                max_message_size: session
                    .as_ref()
                    .and_then(|s| s.max_message_size)
                    .unwrap_or(default.session.max_message_size),
                ping_interval_secs: session
                    .as_ref()
                    .and_then(|s| s.ping_interval_secs)
                    .unwrap_or(default.session.ping_interval_secs),
                write_wait_secs: session
                    .as_ref()
                    .and_then(|s| s.write_wait_secs)
                    .unwrap_or(default.session.write_wait_secs),
            },
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                path: "/ws".to_string(),
                allowed_origins: Vec::new(),
            },
            hub: HubSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            event_queue_capacity: 1024,
            status_interval_secs: 60,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mailbox_capacity: 256,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            ping_interval_secs: 50,
            write_wait_secs: 10,
        }
    }
}
