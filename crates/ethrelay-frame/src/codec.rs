use std::fmt;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::channel::{ChannelBitVector, RelayIndex, BIT_VECTOR_LEN};
use crate::error::{FrameError, Result};
use crate::opcode::{
    opcode_name, GET_MODULE_INFO, GET_RELAY_STATE, GET_UNLOCK_TIME, LOG_OUT, SEND_PASSWORD,
    SET_RELAY_OFF, SET_RELAY_ON, SET_RELAY_STATE,
};

/// A single request and the length of the response it expects.
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    opcode: u8,
    payload: Bytes,
    response_len: usize,
}

impl Command {
    /// Create a command from raw parts.
    pub fn new(opcode: u8, payload: impl Into<Bytes>, response_len: usize) -> Self {
        Self {
            opcode,
            payload: payload.into(),
            response_len,
        }
    }

    pub fn get_module_info() -> Self {
        Self::new(GET_MODULE_INFO, Bytes::new(), ModuleIdentity::WIRE_LEN)
    }

    pub fn get_relay_state() -> Self {
        Self::new(GET_RELAY_STATE, Bytes::new(), BIT_VECTOR_LEN)
    }

    pub fn set_relay_state(bits: ChannelBitVector) -> Self {
        Self::new(
            SET_RELAY_STATE,
            Bytes::copy_from_slice(bits.as_bytes()),
            1,
        )
    }

    /// Switch one relay with the dedicated on/off opcode.
    ///
    /// The payload is two raw binary bytes: channel number, then pulse.
    pub fn set_relay(index: RelayIndex, on: bool, pulse: Pulse) -> Self {
        let opcode = if on { SET_RELAY_ON } else { SET_RELAY_OFF };
        Self::new(opcode, vec![index.get(), pulse.get()], 1)
    }

    pub fn send_password(password: &[u8]) -> Self {
        Self::new(SEND_PASSWORD, Bytes::copy_from_slice(password), 1)
    }

    pub fn get_unlock_time() -> Self {
        Self::new(GET_UNLOCK_TIME, Bytes::new(), 1)
    }

    pub fn log_out() -> Self {
        Self::new(LOG_OUT, Bytes::new(), 1)
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of bytes the module answers with.
    pub fn response_len(&self) -> usize {
        self.response_len
    }

    /// Diagnostic name of the opcode.
    pub fn name(&self) -> &'static str {
        opcode_name(self.opcode)
    }

    /// The full request as it goes on the wire.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + self.payload.len());
        encode_command(self.opcode, &self.payload, &mut buf);
        buf.freeze()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Command");
        dbg.field("opcode", &format_args!("{:#04x} ({})", self.opcode, self.name()));
        if self.opcode == SEND_PASSWORD {
            dbg.field(
                "payload",
                &format_args!("<redacted:{} bytes>", self.payload.len()),
            );
        } else {
            dbg.field("payload", &self.payload.as_ref());
        }
        dbg.field("response_len", &self.response_len).finish()
    }
}

/// Encode a request into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────────────────┐
/// │ Opcode (1B)  │ Payload (0..n bytes)  │
/// └──────────────┴───────────────────────┘
/// ```
pub fn encode_command(opcode: u8, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(1 + payload.len());
    dst.put_u8(opcode);
    dst.put_slice(payload);
}

/// Interpret the first response byte as an unsigned value.
pub fn decode_u8(command: &'static str, bytes: &[u8]) -> Result<u8> {
    bytes.first().copied().ok_or(FrameError::ShortResponse {
        command,
        expected: 1,
        actual: 0,
    })
}

/// A timed relay activation in 100 ms units; zero means permanent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pulse(u8);

impl Pulse {
    pub const PERMANENT: Pulse = Pulse(0);

    pub fn from_deciseconds(value: u8) -> Self {
        Self(value)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_permanent(self) -> bool {
        self.0 == 0
    }

    /// Wall-clock length of the pulse; `None` for a permanent switch.
    pub fn duration(self) -> Option<Duration> {
        (!self.is_permanent()).then(|| Duration::from_millis(u64::from(self.0) * 100))
    }
}

impl TryFrom<i64> for Pulse {
    type Error = FrameError;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map(Pulse)
            .map_err(|_| FrameError::PulseOutOfRange(value))
    }
}

/// Decoded `get_module_info` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleIdentity {
    pub model_id: u8,
    pub hardware_version: u8,
    pub firmware_version: u8,
}

impl ModuleIdentity {
    pub const WIRE_LEN: usize = 3;

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [model_id, hardware_version, firmware_version, ..] => Ok(Self {
                model_id: *model_id,
                hardware_version: *hardware_version,
                firmware_version: *firmware_version,
            }),
            _ => Err(FrameError::ShortResponse {
                command: "get_module_info",
                expected: Self::WIRE_LEN,
                actual: bytes.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_opcode_only() {
        assert_eq!(Command::get_module_info().encode().as_ref(), &[0x10]);
        assert_eq!(Command::get_unlock_time().encode().as_ref(), &[0x7A]);
        assert_eq!(Command::log_out().encode().as_ref(), &[0x7B]);
        assert_eq!(Command::get_relay_state().encode().as_ref(), &[0x24]);
    }

    #[test]
    fn encode_appends_payload_verbatim() {
        let mut buf = BytesMut::new();
        encode_command(0x79, b"pw", &mut buf);
        encode_command(0x24, b"", &mut buf);
        assert_eq!(buf.as_ref(), &[0x79, b'p', b'w', 0x24]);
    }

    #[test]
    fn set_relay_uses_raw_binary_bytes() {
        let relay = RelayIndex::new(12, 20).unwrap();

        let on = Command::set_relay(relay, true, Pulse::from_deciseconds(25));
        assert_eq!(on.encode().as_ref(), &[0x20, 12, 25]);

        let off = Command::set_relay(relay, false, Pulse::PERMANENT);
        assert_eq!(off.encode().as_ref(), &[0x21, 12, 0]);
        assert_eq!(off.response_len(), 1);
    }

    #[test]
    fn set_relay_state_carries_bit_vector() {
        let cmd = Command::set_relay_state(ChannelBitVector::from_bytes([0x10, 0x00, 0x08]));
        assert_eq!(cmd.encode().as_ref(), &[0x23, 0x10, 0x00, 0x08]);
        assert_eq!(cmd.response_len(), 1);
    }

    #[test]
    fn response_lengths() {
        assert_eq!(Command::get_module_info().response_len(), 3);
        assert_eq!(Command::get_relay_state().response_len(), 3);
        assert_eq!(Command::send_password(b"x").response_len(), 1);
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let dbg = format!("{:?}", Command::send_password(b"hunter2"));
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted:7 bytes>"));
    }

    #[test]
    fn pulse_range() {
        assert_eq!(Pulse::try_from(0i64).unwrap(), Pulse::PERMANENT);
        assert_eq!(Pulse::try_from(255i64).unwrap().get(), 255);
        assert!(matches!(
            Pulse::try_from(256i64),
            Err(FrameError::PulseOutOfRange(256))
        ));
        assert!(matches!(
            Pulse::try_from(-1i64),
            Err(FrameError::PulseOutOfRange(-1))
        ));
    }

    #[test]
    fn pulse_duration() {
        assert_eq!(Pulse::PERMANENT.duration(), None);
        assert_eq!(
            Pulse::from_deciseconds(15).duration(),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn decode_module_identity() {
        let id = ModuleIdentity::decode(&[21, 2, 7]).unwrap();
        assert_eq!(id.model_id, 21);
        assert_eq!(id.hardware_version, 2);
        assert_eq!(id.firmware_version, 7);

        assert!(matches!(
            ModuleIdentity::decode(&[21]),
            Err(FrameError::ShortResponse { actual: 1, .. })
        ));
    }

    #[test]
    fn decode_single_byte() {
        assert_eq!(decode_u8("get_unlock_time", &[0xFF]).unwrap(), 255);
        assert!(decode_u8("get_unlock_time", &[]).is_err());
    }
}
