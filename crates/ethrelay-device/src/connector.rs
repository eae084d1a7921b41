use ethrelay_transport::tcp;
use tracing::debug;

use crate::client::RelayClient;
use crate::config::ClientConfig;
use crate::error::Result;

/// Connect to a module on the default port.
pub fn connect(host: &str, password: Option<&str>) -> Result<RelayClient> {
    let mut config = ClientConfig::new(host);
    config.password = password.map(str::to_owned);
    connect_with_config(&config)
}

/// Connect, authenticate and load relay states as described by `config`.
pub fn connect_with_config(config: &ClientConfig) -> Result<RelayClient> {
    debug!(host = %config.host, port = config.port, "connecting to relay module");
    let stream = tcp::connect_timeout(&config.host, config.port, config.connect_timeout)?;
    stream.set_read_timeout(config.read_timeout)?;
    stream.set_write_timeout(config.write_timeout)?;

    RelayClient::from_transport(stream, config.password.as_deref().map(str::as_bytes))
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::error::RelayError;
    use crate::handshake::HandshakeOutcome;
    use crate::simulator::{SimulatedModule, SimulatorServer};

    fn spawn_server(module: SimulatedModule) -> (u16, thread::JoinHandle<SimulatedModule>) {
        let mut server = SimulatorServer::bind("127.0.0.1:0", module).unwrap();
        let port = server.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            server.serve_one().unwrap();
            server.module().clone()
        });
        (port, handle)
    }

    #[test]
    fn end_to_end_over_tcp() {
        let (port, server) = spawn_server(SimulatedModule::new(21).with_password("secret"));

        let config = ClientConfig::new("127.0.0.1")
            .with_port(port)
            .with_password("secret")
            .with_timeout(Duration::from_secs(5));
        let mut client = connect_with_config(&config).unwrap();
        assert_eq!(client.handshake(), HandshakeOutcome::PasswordAccepted);

        let seven = client.relay(7).unwrap();
        client.set_single(seven, true, 0, false).unwrap();
        assert!(client.get_single(seven).unwrap());
        client.disconnect();

        let module = server.join().unwrap();
        assert_eq!(module.relays(), [0x40, 0, 0]);
        assert!(!module.is_unlocked());
    }

    #[test]
    fn missing_password_is_reported() {
        let (port, server) = spawn_server(SimulatedModule::new(19).with_password("secret"));

        let config = ClientConfig::new("127.0.0.1")
            .with_port(port)
            .with_timeout(Duration::from_secs(5));
        let err = connect_with_config(&config).unwrap_err();
        assert!(matches!(err, RelayError::PasswordRequired));
        assert!(err.is_authentication());

        server.join().unwrap();
    }

    #[test]
    fn connect_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ClientConfig::new("127.0.0.1").with_port(port);
        let err = connect_with_config(&config).unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
    }
}
