use ethrelay_frame::{decode_u8, Command};
use ethrelay_transport::Transport;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{RelayError, Result};
use crate::session::Session;

/// `get_unlock_time` value for a locked module.
pub const UNLOCK_LOCKED: u8 = 0;

/// `get_unlock_time` value for a module with password protection disabled.
pub const UNLOCK_NO_PASSWORD: u8 = 255;

/// `send_password` value for a rejected password.
pub const PASSWORD_REJECTED: u8 = 1;

/// How a session became authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandshakeOutcome {
    /// The module has no password set.
    PasswordDisabled,
    /// The module was already unlocked and relocks on its own after
    /// `relock_in_secs`. Not enforced by the client.
    Unlocked { relock_in_secs: u8 },
    /// The supplied password was accepted.
    PasswordAccepted,
}

/// Run the unlock-time/password exchange on a freshly connected session.
///
/// On a rejected or missing password the session is closed before the
/// error is returned.
pub fn authenticate<T: Transport>(
    session: &mut Session<T>,
    password: Option<&[u8]>,
) -> Result<HandshakeOutcome> {
    let reply = session.exchange(&Command::get_unlock_time())?;
    let unlock_time = decode_u8("get_unlock_time", &reply)?;

    let outcome = match unlock_time {
        UNLOCK_NO_PASSWORD => HandshakeOutcome::PasswordDisabled,
        UNLOCK_LOCKED => {
            let Some(password) = password else {
                warn!(peer = %session.peer(), "module is locked and no password was supplied");
                session.close();
                return Err(RelayError::PasswordRequired);
            };

            let reply = session.exchange(&Command::send_password(password))?;
            if decode_u8("send_password", &reply)? == PASSWORD_REJECTED {
                warn!(peer = %session.peer(), "password rejected");
                session.close();
                return Err(RelayError::AuthenticationFailed);
            }
            HandshakeOutcome::PasswordAccepted
        }
        secs => {
            debug!(relock_in_secs = secs, "module already unlocked");
            HandshakeOutcome::Unlocked {
                relock_in_secs: secs,
            }
        }
    };

    session.mark_authenticated();
    info!(peer = %session.peer(), ?outcome, "authenticated");
    Ok(outcome)
}
