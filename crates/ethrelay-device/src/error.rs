/// Errors that can occur while talking to a relay module.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Transport-level error (connect, I/O, early close).
    #[error("transport error: {0}")]
    Transport(#[from] ethrelay_transport::TransportError),

    /// Encoding, decoding or range validation error.
    #[error("frame error: {0}")]
    Frame(#[from] ethrelay_frame::FrameError),

    /// The module rejected the supplied password.
    #[error("authentication failed: password rejected by module")]
    AuthenticationFailed,

    /// The module is locked and no password was configured.
    #[error("authentication failed: module is locked and no password was supplied")]
    PasswordRequired,

    /// The module reported a model id with no known profile.
    #[error("unknown module model id {0}")]
    UnknownModel(u8),

    /// The module answered a command with its failure flag.
    #[error("module reported failure for {command}")]
    CommandFailed { command: &'static str },

    /// A non-handshake command was attempted before authentication.
    #[error("{command} not allowed before authentication")]
    NotAuthenticated { command: &'static str },
}

impl RelayError {
    /// Returns true for wrong or missing password failures.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            RelayError::AuthenticationFailed | RelayError::PasswordRequired
        )
    }

    /// Returns true for relay number or pulse validation failures.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            RelayError::Frame(
                ethrelay_frame::FrameError::RelayOutOfRange { .. }
                    | ethrelay_frame::FrameError::PulseOutOfRange(_)
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
