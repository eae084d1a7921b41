//! Command opcodes.
//!
//! Only the opcodes used by the client have constants here. The remaining
//! entries of the device command table are recognised by [`opcode_name`]
//! so that logs stay readable, but nothing encodes them.

/// Module id, hardware version, firmware version.
pub const GET_MODULE_INFO: u8 = 0x10;

/// Switch one relay on, optionally pulsed.
pub const SET_RELAY_ON: u8 = 0x20;

/// Switch one relay off, optionally pulsed.
pub const SET_RELAY_OFF: u8 = 0x21;

/// Write all relay states as a 3-byte bit vector.
pub const SET_RELAY_STATE: u8 = 0x23;

/// Read all relay states as a 3-byte bit vector.
pub const GET_RELAY_STATE: u8 = 0x24;

/// Submit the TCP/IP password.
pub const SEND_PASSWORD: u8 = 0x79;

/// Seconds until the module relocks (0 locked, 255 no password).
pub const GET_UNLOCK_TIME: u8 = 0x7A;

/// Re-enable password protection immediately.
pub const LOG_OUT: u8 = 0x7B;

/// Returns a human-readable name for an opcode.
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        GET_MODULE_INFO => "get_module_info",
        SET_RELAY_ON => "set_relay_on",
        SET_RELAY_OFF => "set_relay_off",
        SET_RELAY_STATE => "set_relay_state",
        GET_RELAY_STATE => "get_relay_state",
        0x25 => "get_inputs",
        0x32 => "get_analogue_voltage",
        0x3A => "ascii_command",
        0x77 => "get_serial_number",
        0x78 => "get_volts",
        SEND_PASSWORD => "send_password",
        GET_UNLOCK_TIME => "get_unlock_time",
        LOG_OUT => "log_out",
        _ => "unknown",
    }
}

/// Returns true if the opcode may be sent before authentication completes.
pub fn is_handshake(opcode: u8) -> bool {
    matches!(opcode, GET_UNLOCK_TIME | SEND_PASSWORD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_implemented_opcodes() {
        for op in [
            GET_MODULE_INFO,
            SET_RELAY_ON,
            SET_RELAY_OFF,
            SET_RELAY_STATE,
            GET_RELAY_STATE,
            SEND_PASSWORD,
            GET_UNLOCK_TIME,
            LOG_OUT,
        ] {
            assert_ne!(opcode_name(op), "unknown", "opcode {op:#04x}");
        }
        assert_eq!(opcode_name(0xFF), "unknown");
    }

    #[test]
    fn only_auth_opcodes_are_handshake() {
        assert!(is_handshake(GET_UNLOCK_TIME));
        assert!(is_handshake(SEND_PASSWORD));
        assert!(!is_handshake(LOG_OUT));
        assert!(!is_handshake(GET_MODULE_INFO));
    }
}
