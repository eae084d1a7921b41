use std::io::{Read, Write};

/// A byte stream that can carry the relay protocol.
///
/// Implemented by [`RelayStream`](crate::RelayStream) for real modules. Any
/// other `Read + Write` type (a simulated module, a scripted test stream)
/// can implement it to drive the same protocol code.
pub trait Transport: Read + Write {
    /// Close the underlying stream.
    ///
    /// Called at most once by [`Connection::disconnect`](crate::Connection::disconnect).
    /// Errors are reported but the stream is considered closed regardless.
    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    /// Human-readable description of the remote end, for diagnostics.
    fn peer_endpoint(&self) -> String {
        "unknown".to_string()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn close(&mut self) -> std::io::Result<()> {
        (**self).close()
    }

    fn peer_endpoint(&self) -> String {
        (**self).peer_endpoint()
    }
}
