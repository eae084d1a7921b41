//! Session management for Devantech ETH relay modules.
//!
//! This is the "just works" layer. Connect to a module, authenticate,
//! learn what hardware is on the other end, and switch relays by number.
//!
//! ```no_run
//! use ethrelay_device::{connect_with_config, ClientConfig};
//!
//! # fn main() -> ethrelay_device::Result<()> {
//! let config = ClientConfig::new("192.168.0.200").with_password("secret");
//! let mut client = connect_with_config(&config)?;
//!
//! let relay = client.relay(5)?;
//! client.set_single(relay, true, 0, false)?;
//! assert!(client.get_single(relay)?);
//!
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod handshake;
pub mod module;
pub mod relay;
pub mod session;

#[cfg(any(test, feature = "simulator"))]
pub mod simulator;

pub use client::RelayClient;
pub use config::{ClientConfig, DEFAULT_PORT};
pub use connector::{connect, connect_with_config};
pub use error::{RelayError, Result};
pub use handshake::{authenticate, HandshakeOutcome};
pub use module::{resolve_module, ModuleInfo, ModuleProfile, MODULE_PROFILES};
pub use relay::RelayStateManager;
pub use session::{ConnectionState, Session};

pub use ethrelay_frame::{ChannelMap, Pulse, RelayIndex};
