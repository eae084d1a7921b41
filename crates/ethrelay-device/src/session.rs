use bytes::Bytes;
use ethrelay_frame::{is_handshake, Command};
use ethrelay_transport::{Connection, Transport, TransportError};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{RelayError, Result};

/// Where a session is in its connect/authenticate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Authenticated,
}

/// A half-duplex request/response session over one connection.
///
/// Each [`exchange`](Session::exchange) writes a full request and reads the
/// full response before returning, so commands never overlap. Only the
/// handshake opcodes are allowed until the session is authenticated.
pub struct Session<T: Transport> {
    conn: Connection<T>,
    state: ConnectionState,
}

impl<T: Transport> Session<T> {
    /// Start a session over an already connected stream.
    pub fn new(stream: T) -> Self {
        Self {
            conn: Connection::new(stream),
            state: ConnectionState::Connected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Remote endpoint of the underlying connection.
    pub fn peer(&self) -> &str {
        self.conn.peer()
    }

    pub(crate) fn mark_authenticated(&mut self) {
        self.state = ConnectionState::Authenticated;
    }

    /// Send `command` and read its complete response.
    ///
    /// Any send or receive failure closes the session; later calls return
    /// `Shutdown`.
    pub fn exchange(&mut self, command: &Command) -> Result<Bytes> {
        match self.state {
            ConnectionState::Disconnected => {
                return Err(RelayError::Transport(TransportError::Shutdown))
            }
            ConnectionState::Connected if !is_handshake(command.opcode()) => {
                return Err(RelayError::NotAuthenticated {
                    command: command.name(),
                })
            }
            _ => {}
        }

        trace!(command = command.name(), payload_len = command.payload().len(), "request");
        let result = self
            .conn
            .send(&command.encode())
            .and_then(|()| self.conn.receive(command.response_len()));
        match result {
            Ok(response) => {
                trace!(command = command.name(), response = ?response.as_ref(), "response");
                Ok(response)
            }
            Err(err) => {
                // A late reply would be read as the answer to the next request.
                warn!(command = command.name(), error = %err, "exchange failed, closing session");
                self.close();
                Err(err.into())
            }
        }
    }

    /// Close the socket without logging out.
    pub fn close(&mut self) {
        self.conn.disconnect();
        self.state = ConnectionState::Disconnected;
    }

    /// Log out if authenticated, then close the socket.
    ///
    /// A failed logout is reported at `warn` and does not keep the socket
    /// open. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Authenticated {
            match self.exchange(&Command::log_out()) {
                Ok(_) => debug!(peer = %self.peer(), "logged out"),
                Err(err) => warn!(peer = %self.peer(), error = %err, "log out failed"),
            }
        }
        self.close();
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("peer", &self.peer())
            .field("state", &self.state)
            .finish()
    }
}
