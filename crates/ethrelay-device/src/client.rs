use ethrelay_frame::{ChannelMap, RelayIndex};
use ethrelay_transport::{RelayStream, Transport};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::handshake::{authenticate, HandshakeOutcome};
use crate::module::{resolve_module, ModuleInfo, ModuleProfile};
use crate::relay::RelayStateManager;
use crate::session::{ConnectionState, Session};

/// An authenticated session with one relay module.
///
/// Construction connects, authenticates, resolves the module profile and
/// loads the initial relay states; if any step fails the socket is closed
/// and no client is returned. Dropping the client logs out and closes the
/// socket.
pub struct RelayClient<T: Transport = RelayStream> {
    session: Session<T>,
    info: ModuleInfo,
    handshake: HandshakeOutcome,
    relays: RelayStateManager,
}

impl RelayClient<RelayStream> {
    /// Connect over TCP using `config`.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        crate::connector::connect_with_config(config)
    }
}

impl<T: Transport> RelayClient<T> {
    /// Run the full construction sequence over an already connected stream.
    pub fn from_transport(stream: T, password: Option<&[u8]>) -> Result<Self> {
        let mut session = Session::new(stream);
        match Self::establish(&mut session, password) {
            Ok((handshake, info, relays)) => {
                info!(
                    peer = %session.peer(),
                    model = info.profile.name,
                    relays = info.profile.relay_count,
                    "relay client ready"
                );
                Ok(Self {
                    session,
                    info,
                    handshake,
                    relays,
                })
            }
            Err(err) => {
                session.disconnect();
                Err(err)
            }
        }
    }

    fn establish(
        session: &mut Session<T>,
        password: Option<&[u8]>,
    ) -> Result<(HandshakeOutcome, ModuleInfo, RelayStateManager)> {
        let handshake = authenticate(session, password)?;
        let info = resolve_module(session)?;
        let mut relays = RelayStateManager::new(info.profile.relay_count);
        if info.profile.relay_count > 0 {
            relays.get_all(session)?;
        }
        Ok((handshake, info, relays))
    }

    pub fn module_info(&self) -> &ModuleInfo {
        &self.info
    }

    pub fn profile(&self) -> &ModuleProfile {
        &self.info.profile
    }

    pub fn handshake(&self) -> HandshakeOutcome {
        self.handshake
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn peer(&self) -> &str {
        self.session.peer()
    }

    /// Validate a relay number against this module.
    pub fn relay(&self, index: impl Into<i64>) -> Result<RelayIndex> {
        self.info.profile.relay(index)
    }

    /// Last known relay states, without touching the network.
    pub fn cached(&self) -> &ChannelMap {
        self.relays.cached()
    }

    /// Read all relay states from the module.
    pub fn get_all(&mut self) -> Result<ChannelMap> {
        self.relays.get_all(&mut self.session).cloned()
    }

    /// Write all relay states in one command.
    pub fn set_all(&mut self, states: &ChannelMap) -> Result<()> {
        self.relays.set_all(&mut self.session, states)
    }

    /// State of one relay, served from the cache when known.
    pub fn get_single(&mut self, index: RelayIndex) -> Result<bool> {
        self.relays.get_single(&mut self.session, index)
    }

    /// Switch one relay; see [`RelayStateManager::set_single`].
    pub fn set_single(
        &mut self,
        index: RelayIndex,
        on: bool,
        pulse: i64,
        exclusive: bool,
    ) -> Result<()> {
        self.relays
            .set_single(&mut self.session, index, on, pulse, exclusive)
    }

    /// Switch one relay and turn every other relay off.
    pub fn set_only(&mut self, index: RelayIndex, on: bool) -> Result<()> {
        self.relays.set_only(&mut self.session, index, on)
    }

    /// Log out and close the connection. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if self.session.state() != ConnectionState::Disconnected {
            self.session.disconnect();
            info!("relay disconnected");
        }
    }
}

impl<T: Transport> Drop for RelayClient<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<T: Transport> std::fmt::Debug for RelayClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient")
            .field("session", &self.session)
            .field("model", &self.info.profile.name)
            .field("handshake", &self.handshake)
            .finish()
    }
}
