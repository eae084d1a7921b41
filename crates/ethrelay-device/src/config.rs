use std::fmt;
use std::time::Duration;

/// TCP port ETH modules listen on out of the box.
pub const DEFAULT_PORT: u16 = 17494;

/// Connection parameters for a relay module.
#[derive(Clone)]
pub struct ClientConfig {
    /// Hostname or IP address of the module.
    pub host: String,
    /// TCP port. Default: 17494.
    pub port: u16,
    /// TCP/IP password, required only if the module has one enabled.
    /// Sent in plaintext on the wire and never logged.
    pub password: Option<String>,
    /// Bound on the TCP connect. Default: none.
    pub connect_timeout: Option<Duration>,
    /// Socket read timeout. Default: none, a silent module blocks forever.
    pub read_timeout: Option<Duration>,
    /// Socket write timeout. Default: none.
    pub write_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Apply the same bound to connect, read and write.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self.read_timeout = Some(timeout);
        self.write_timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            password: None,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("ClientConfig");
        dbg.field("host", &self.host).field("port", &self.port);
        if let Some(password) = &self.password {
            dbg.field(
                "password",
                &format_args!("<redacted:{} bytes>", password.len()),
            );
        } else {
            dbg.field("password", &Option::<String>::None);
        }
        dbg.field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("10.0.0.5");
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 17494);
        assert!(config.password.is_none());
        assert!(config.read_timeout.is_none());
    }

    #[test]
    fn builder_sets_timeouts() {
        let config = ClientConfig::new("relay.local")
            .with_port(2000)
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.port, 2000);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.write_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn debug_redacts_password() {
        let config = ClientConfig::new("relay.local").with_password("opensesame");
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("opensesame"));
        assert!(dbg.contains("<redacted:10 bytes>"));
    }
}
