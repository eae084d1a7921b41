use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::RelayStream;

/// Connect to a relay module (blocking, no timeout).
pub fn connect(host: &str, port: u16) -> Result<RelayStream> {
    connect_timeout(host, port, None)
}

/// Connect to a relay module, bounding each address attempt by `timeout`.
///
/// Every address `host` resolves to is tried in order; the last failure is
/// returned if none accepts.
pub fn connect_timeout(host: &str, port: u16, timeout: Option<Duration>) -> Result<RelayStream> {
    let addr = format!("{host}:{port}");
    let candidates = (host, port)
        .to_socket_addrs()
        .map_err(|e| TransportError::Connect {
            addr: addr.clone(),
            source: e,
        })?;

    let mut last_err = None;
    for candidate in candidates {
        let attempt = match timeout {
            Some(limit) => TcpStream::connect_timeout(&candidate, limit),
            None => TcpStream::connect(candidate),
        };
        match attempt {
            Ok(stream) => {
                // Requests are a handful of bytes; don't let Nagle hold them back.
                stream.set_nodelay(true)?;
                debug!(%candidate, "connected to relay module");
                return Ok(RelayStream::from_tcp(stream));
            }
            Err(err) => {
                debug!(%candidate, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    Err(TransportError::Connect {
        addr,
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "host resolved to no addresses",
            )
        }),
    })
}
