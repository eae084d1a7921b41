//! Opcode framing and channel bit-vector codec for ETH relay modules.
//!
//! Every request is a single opcode byte followed by an optional payload;
//! every response is a fixed number of bytes determined by the opcode.
//! Relay states travel as a 3-byte bit vector, one bit per channel:
//!
//! ```text
//!   byte 0            byte 1            byte 2
//!   b7 .......... b0  b7 .......... b0  b7 .......... b0
//!   ch8  ...   ch1    ch16  ...   ch9   ch24  ...  ch17
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod opcode;

pub use channel::{
    pack_channels, unpack_channels, ChannelBitVector, ChannelMap, RelayIndex, MAX_CHANNELS,
};
pub use codec::{decode_u8, encode_command, Command, ModuleIdentity, Pulse};
pub use error::{FrameError, Result};
pub use opcode::{
    is_handshake, opcode_name, GET_MODULE_INFO, GET_RELAY_STATE, GET_UNLOCK_TIME, LOG_OUT, SEND_PASSWORD,
    SET_RELAY_OFF, SET_RELAY_ON, SET_RELAY_STATE,
};
