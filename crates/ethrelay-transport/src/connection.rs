use std::io::ErrorKind;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

const READ_CHUNK_SIZE: usize = 64;

/// Exclusive owner of one transport stream.
///
/// Sends complete requests and reads fixed-length responses. Partial reads
/// and interrupted writes are handled internally; callers always see either
/// the full byte count or an error.
pub struct Connection<T: Transport> {
    inner: Option<T>,
    peer: String,
}

impl<T: Transport> Connection<T> {
    /// Take ownership of a connected stream.
    pub fn new(stream: T) -> Self {
        let peer = stream.peer_endpoint();
        Self {
            inner: Some(stream),
            peer,
        }
    }

    /// Write every byte of `bytes` (blocking).
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.inner.as_mut().ok_or(TransportError::Shutdown)?;

        let mut offset = 0usize;
        while offset < bytes.len() {
            match stream.write(&bytes[offset..]) {
                Ok(0) => {
                    return Err(TransportError::Io(std::io::Error::new(
                        ErrorKind::WriteZero,
                        format!("wrote {offset} of {} bytes", bytes.len()),
                    )))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match stream.flush() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        trace!(peer = %self.peer, len = bytes.len(), "sent request");
        Ok(())
    }

    /// Read exactly `n` bytes (blocking).
    ///
    /// Returns `Err(TransportError::ConnectionClosed)` if EOF is reached first.
    /// There is no timeout unless one was set on the underlying socket.
    pub fn receive(&mut self, n: usize) -> Result<Bytes> {
        let stream = self.inner.as_mut().ok_or(TransportError::Shutdown)?;

        let mut buf = BytesMut::with_capacity(n);
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        while buf.len() < n {
            let want = (n - buf.len()).min(READ_CHUNK_SIZE);
            let read = match stream.read(&mut chunk[..want]) {
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return Err(TransportError::ConnectionClosed {
                    expected: n,
                    received: buf.len(),
                });
            }

            buf.extend_from_slice(&chunk[..read]);
        }

        trace!(peer = %self.peer, len = n, "received response");
        Ok(buf.freeze())
    }

    /// Close the stream. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if let Some(mut stream) = self.inner.take() {
            if let Err(err) = stream.close() {
                warn!(peer = %self.peer, error = %err, "error while closing stream");
            }
            debug!(peer = %self.peer, "connection closed");
        }
    }

    /// Whether the stream is still owned and open.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Remote endpoint captured at construction.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Borrow the underlying stream, if still open.
    pub fn get_ref(&self) -> Option<&T> {
        self.inner.as_ref()
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("open", &self.is_open())
            .finish()
    }
}
