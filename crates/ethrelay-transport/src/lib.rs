//! Blocking stream transport for ETH relay modules.
//!
//! This is the lowest layer of ethrelay. It owns one socket and offers
//! exactly four things: connect, send all bytes, receive an exact byte
//! count, and an idempotent disconnect. Everything else builds on the
//! [`Connection`] type provided here.

pub mod connection;
pub mod error;
pub mod stream;
pub mod tcp;
pub mod traits;

pub use connection::Connection;
pub use error::{Result, TransportError};
pub use stream::RelayStream;
pub use tcp::{connect, connect_timeout};
pub use traits::Transport;
