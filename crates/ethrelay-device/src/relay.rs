use ethrelay_frame::{
    decode_u8, pack_channels, unpack_channels, ChannelBitVector, ChannelMap, Command, FrameError,
    Pulse, RelayIndex,
};
use ethrelay_transport::Transport;
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::session::Session;

/// Optimistic local copy of a module's relay states.
///
/// The cache only changes after the module confirms a command, so a failed
/// call never leaves it ahead of the hardware. It can still drift if another
/// client switches relays; [`get_all`](Self::get_all) resynchronises.
#[derive(Debug, Clone)]
pub struct RelayStateManager {
    relay_count: usize,
    cache: ChannelMap,
}

impl RelayStateManager {
    pub fn new(relay_count: usize) -> Self {
        Self {
            relay_count,
            cache: ChannelMap::new(),
        }
    }

    pub fn relay_count(&self) -> usize {
        self.relay_count
    }

    /// Last known states. May be partial after a pulsed switch.
    pub fn cached(&self) -> &ChannelMap {
        &self.cache
    }

    /// Read every relay from the module and replace the cache.
    pub fn get_all<T: Transport>(&mut self, session: &mut Session<T>) -> Result<&ChannelMap> {
        let reply = session.exchange(&Command::get_relay_state())?;
        let bits = ChannelBitVector::from_slice(&reply)?;
        self.cache = unpack_channels(bits, self.relay_count);
        debug!(bits = ?bits.as_bytes(), "relay states refreshed");
        Ok(&self.cache)
    }

    /// Write every relay in one command.
    ///
    /// Channels missing from `states` are switched off; channels beyond the
    /// module's relay count are ignored.
    pub fn set_all<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        states: &ChannelMap,
    ) -> Result<()> {
        let bits = pack_channels(states, self.relay_count);
        let command = Command::set_relay_state(bits);
        let reply = session.exchange(&command)?;
        expect_success(&command, &reply)?;

        self.cache = unpack_channels(bits, self.relay_count);
        debug!(bits = ?bits.as_bytes(), "relay states written");
        Ok(())
    }

    /// Switch one relay.
    ///
    /// With `exclusive`, the dedicated on/off command is used and `pulse`
    /// (0-255, 100 ms units, 0 = permanent) is honoured. Otherwise the cached
    /// map is updated for `index` and written with [`set_all`](Self::set_all);
    /// the grouped command has no pulse. `pulse` is validated before anything
    /// is sent.
    pub fn set_single<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        index: RelayIndex,
        on: bool,
        pulse: i64,
        exclusive: bool,
    ) -> Result<()> {
        let pulse = Pulse::try_from(pulse)?;
        self.check(index)?;

        if exclusive {
            let command = Command::set_relay(index, on, pulse);
            let reply = session.exchange(&command)?;
            expect_success(&command, &reply)?;

            if pulse.is_permanent() {
                self.cache.insert(index, on);
            } else {
                // The module reverts the relay by itself when the pulse ends.
                self.cache.remove(&index);
            }
            debug!(relay = %index, on, pulse = pulse.get(), "relay switched");
            return Ok(());
        }

        if !pulse.is_permanent() {
            debug!(relay = %index, pulse = pulse.get(), "pulse ignored for grouped update");
        }
        if self.cache.len() < self.relay_count {
            self.get_all(session)?;
        }
        let mut next = self.cache.clone();
        next.insert(index, on);
        self.set_all(session, &next)
    }

    /// Switch one relay on or off and every other relay off.
    pub fn set_only<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        index: RelayIndex,
        on: bool,
    ) -> Result<()> {
        self.check(index)?;
        let states = ChannelMap::from([(index, on)]);
        self.set_all(session, &states)
    }

    /// State of one relay, from the cache when known.
    pub fn get_single<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        index: RelayIndex,
    ) -> Result<bool> {
        self.check(index)?;
        if let Some(&on) = self.cache.get(&index) {
            return Ok(on);
        }
        let states = self.get_all(session)?;
        Ok(states.get(&index).copied().unwrap_or(false))
    }

    fn check(&self, index: RelayIndex) -> Result<()> {
        if usize::from(index.get()) > self.relay_count {
            return Err(FrameError::RelayOutOfRange {
                index: i64::from(index.get()),
                relay_count: self.relay_count,
            }
            .into());
        }
        Ok(())
    }
}

fn expect_success(command: &Command, reply: &[u8]) -> Result<()> {
    if decode_u8(command.name(), reply)? == 0 {
        return Err(RelayError::CommandFailed {
            command: command.name(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::authenticate;
    use crate::simulator::{pair, SimulatedModule, SimulatedStream, SimulatorHandle};

    fn session_for(module: SimulatedModule) -> (Session<SimulatedStream>, SimulatorHandle) {
        let (stream, sim) = pair(module);
        let mut session = Session::new(stream);
        authenticate(&mut session, None).unwrap();
        (session, sim)
    }

    fn relay(n: u8) -> RelayIndex {
        RelayIndex::new(n, 20).unwrap()
    }

    #[test]
    fn get_all_sizes_map_to_relay_count() {
        let (mut session, _sim) =
            session_for(SimulatedModule::new(21).with_relays([0x11, 0x00, 0x08]));
        let mut relays = RelayStateManager::new(20);

        let states = relays.get_all(&mut session).unwrap().clone();
        assert_eq!(states.len(), 20);
        assert!(states[&relay(1)]);
        assert!(states[&relay(5)]);
        assert!(states[&relay(20)]);
        assert_eq!(states.values().filter(|&&on| on).count(), 3);
    }

    #[test]
    fn get_single_matches_get_all_for_every_relay() {
        let (mut session, _sim) =
            session_for(SimulatedModule::new(21).with_relays([0xA5, 0x3C, 0x0F]));
        let mut relays = RelayStateManager::new(20);
        let states = relays.get_all(&mut session).unwrap().clone();

        for n in 1..=20u8 {
            let index = relay(n);
            assert_eq!(
                relays.get_single(&mut session, index).unwrap(),
                states[&index],
                "relay {n}"
            );
        }
    }

    #[test]
    fn get_single_uses_cache() {
        let (mut session, sim) =
            session_for(SimulatedModule::new(21).with_relays([0x02, 0, 0]));
        let mut relays = RelayStateManager::new(20);
        relays.get_all(&mut session).unwrap();
        let before = sim.requests().len();

        assert!(relays.get_single(&mut session, relay(2)).unwrap());
        assert_eq!(sim.requests().len(), before);
    }

    #[test]
    fn get_single_loads_when_cache_empty() {
        let (mut session, sim) =
            session_for(SimulatedModule::new(21).with_relays([0x00, 0x01, 0]));
        let mut relays = RelayStateManager::new(20);

        assert!(relays.get_single(&mut session, relay(9)).unwrap());
        assert_eq!(sim.opcodes().last(), Some(&0x24));
    }

    #[test]
    fn set_all_writes_packed_vector_and_updates_cache() {
        let (mut session, sim) = session_for(SimulatedModule::new(21));
        let mut relays = RelayStateManager::new(20);
        let states = ChannelMap::from([(relay(5), true), (relay(17), true)]);

        relays.set_all(&mut session, &states).unwrap();

        assert_eq!(sim.requests().last().unwrap(), &vec![0x23, 0x10, 0x00, 0x01]);
        assert_eq!(sim.relays(), [0x10, 0x00, 0x01]);
        assert_eq!(relays.cached().len(), 20);
        assert!(relays.cached()[&relay(17)]);
        assert!(!relays.cached()[&relay(1)]);
    }

    #[test]
    fn failed_set_all_leaves_cache_unchanged() {
        let (mut session, sim) =
            session_for(SimulatedModule::new(21).with_relays([0x01, 0, 0]));
        let mut relays = RelayStateManager::new(20);
        relays.get_all(&mut session).unwrap();
        let before = relays.cached().clone();

        sim.fail_writes(true);
        let err = relays
            .set_all(&mut session, &ChannelMap::from([(relay(2), true)]))
            .unwrap_err();

        assert!(matches!(
            err,
            RelayError::CommandFailed {
                command: "set_relay_state"
            }
        ));
        assert_eq!(relays.cached(), &before);
    }

    #[test]
    fn non_exclusive_set_keeps_other_relays() {
        let (mut session, sim) =
            session_for(SimulatedModule::new(21).with_relays([0x81, 0, 0]));
        let mut relays = RelayStateManager::new(20);
        relays.get_all(&mut session).unwrap();

        relays.set_single(&mut session, relay(3), true, 0, false).unwrap();

        assert_eq!(sim.requests().last().unwrap(), &vec![0x23, 0x85, 0x00, 0x00]);
        assert!(relays.cached()[&relay(1)]);
        assert!(relays.cached()[&relay(3)]);
        assert!(relays.cached()[&relay(8)]);
    }

    #[test]
    fn non_exclusive_set_refreshes_partial_cache() {
        let (mut session, sim) =
            session_for(SimulatedModule::new(21).with_relays([0x01, 0, 0]));
        let mut relays = RelayStateManager::new(20);

        relays.set_single(&mut session, relay(2), true, 0, false).unwrap();

        let opcodes = sim.opcodes();
        assert_eq!(&opcodes[opcodes.len() - 2..], &[0x24, 0x23]);
        assert_eq!(sim.relays(), [0x03, 0, 0]);
    }

    #[test]
    fn exclusive_set_sends_raw_channel_and_pulse() {
        let (mut session, sim) = session_for(SimulatedModule::new(21));
        let mut relays = RelayStateManager::new(20);
        relays.get_all(&mut session).unwrap();

        relays.set_single(&mut session, relay(12), true, 0, true).unwrap();
        assert_eq!(sim.requests().last().unwrap(), &vec![0x20, 12, 0]);
        assert!(relays.cached()[&relay(12)]);

        relays.set_single(&mut session, relay(12), false, 0, true).unwrap();
        assert_eq!(sim.requests().last().unwrap(), &vec![0x21, 12, 0]);
        assert!(!relays.cached()[&relay(12)]);
    }

    #[test]
    fn pulsed_switch_drops_cache_entry() {
        let (mut session, sim) = session_for(SimulatedModule::new(21));
        let mut relays = RelayStateManager::new(20);
        relays.get_all(&mut session).unwrap();

        relays.set_single(&mut session, relay(4), true, 15, true).unwrap();
        assert_eq!(sim.requests().last().unwrap(), &vec![0x20, 4, 15]);
        assert!(!relays.cached().contains_key(&relay(4)));

        // Next read of that relay goes back to the module.
        assert!(!relays.get_single(&mut session, relay(4)).unwrap());
        assert_eq!(sim.opcodes().last(), Some(&0x24));
    }

    #[test]
    fn pulse_out_of_range_sends_nothing() {
        let (mut session, sim) = session_for(SimulatedModule::new(21));
        let mut relays = RelayStateManager::new(20);
        relays.get_all(&mut session).unwrap();
        let before = sim.written().len();

        for pulse in [256, -1] {
            for exclusive in [true, false] {
                let err = relays
                    .set_single(&mut session, relay(1), true, pulse, exclusive)
                    .unwrap_err();
                assert!(err.is_out_of_range(), "pulse {pulse}");
            }
        }
        assert_eq!(sim.written().len(), before);
    }

    #[test]
    fn failed_exclusive_set_leaves_cache_unchanged() {
        let (mut session, sim) = session_for(SimulatedModule::new(21));
        let mut relays = RelayStateManager::new(20);
        relays.get_all(&mut session).unwrap();

        sim.fail_writes(true);
        let err = relays
            .set_single(&mut session, relay(6), true, 0, true)
            .unwrap_err();
        assert!(matches!(err, RelayError::CommandFailed { command: "set_relay_on" }));
        assert!(!relays.cached()[&relay(6)]);
    }

    #[test]
    fn set_only_turns_the_rest_off() {
        let (mut session, sim) =
            session_for(SimulatedModule::new(19).with_relays([0xFF, 0, 0]));
        let mut relays = RelayStateManager::new(8);
        relays.get_all(&mut session).unwrap();

        relays
            .set_only(&mut session, RelayIndex::new(2, 8).unwrap(), true)
            .unwrap();
        assert_eq!(sim.relays(), [0x02, 0, 0]);
        assert_eq!(relays.cached().values().filter(|&&on| on).count(), 1);
    }

    #[test]
    fn rejects_index_from_larger_module() {
        let (mut session, sim) = session_for(SimulatedModule::new(18));
        let mut relays = RelayStateManager::new(2);
        let before = sim.written().len();

        let err = relays.get_single(&mut session, relay(3)).unwrap_err();
        assert!(err.is_out_of_range());
        assert_eq!(sim.written().len(), before);
    }

    #[test]
    fn drift_is_visible_after_refresh() {
        let (mut session, sim) = session_for(SimulatedModule::new(19));
        let mut relays = RelayStateManager::new(8);
        relays.get_all(&mut session).unwrap();
        let one = RelayIndex::new(1, 8).unwrap();

        sim.set_relays([0x01, 0, 0]);
        assert!(!relays.get_single(&mut session, one).unwrap());

        relays.get_all(&mut session).unwrap();
        assert!(relays.get_single(&mut session, one).unwrap());
    }
}
