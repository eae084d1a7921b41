//! Client for Devantech ETH relay modules.
//!
//! ethrelay talks to the ETH002, ETH008, ETH484, ETH8020 and ETH044 over
//! their TCP command protocol: authenticate, identify the model, then read
//! and switch relays by number.
//!
//! # Crate Structure
//!
//! - [`transport`]: blocking TCP stream with exact-length reads
//! - [`frame`]: opcodes, command encoding and the relay bit vector
//! - [`device`]: authenticated sessions, module profiles and cached relay state
//!
//! Most callers only need [`connect`] or [`RelayClient`].

/// Re-export transport types.
pub mod transport {
    pub use ethrelay_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ethrelay_frame::*;
}

/// Re-export device types.
pub mod device {
    pub use ethrelay_device::*;
}

pub use ethrelay_device::{
    connect, connect_with_config, ClientConfig, RelayClient, RelayError, Result,
};
