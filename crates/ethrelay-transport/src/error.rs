/// Errors that can occur in relay transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open a connection to the module.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before the expected byte count arrived.
    #[error("connection closed after {received} of {expected} bytes")]
    ConnectionClosed { expected: usize, received: usize },

    /// The connection has already been shut down locally.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// Returns true if the error was caused by a socket timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Io(err) | TransportError::Connect { source: err, .. } => matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
