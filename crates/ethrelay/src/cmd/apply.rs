use ethrelay_device::{ChannelMap, RelayClient};
use ethrelay_transport::Transport;

use crate::cmd::ApplyArgs;
use crate::exit::{relay_error, CliResult, SUCCESS};
use crate::output::{print_states, OutputFormat};

pub fn run(args: ApplyArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = args.conn.open()?;
    let states = apply_states(&mut client, &args.on)?;
    client.disconnect();

    print_states(&args.conn.host, &states, format);
    Ok(SUCCESS)
}

/// Switch `on` relays on and the rest off; returns the states written.
fn apply_states<T: Transport>(client: &mut RelayClient<T>, on: &[i64]) -> CliResult<ChannelMap> {
    let mut states = ChannelMap::new();
    for &relay in on {
        let index = client
            .relay(relay)
            .map_err(|err| relay_error("invalid relay", err))?;
        states.insert(index, true);
    }
    client
        .set_all(&states)
        .map_err(|err| relay_error("apply failed", err))?;
    Ok(client.cached().clone())
}

#[cfg(test)]
mod tests {
    use ethrelay_device::simulator::{pair, SimulatedModule};

    use super::*;
    use crate::exit::USAGE;
    use crate::output::state_bits;

    #[test]
    fn listed_relays_on_rest_off() {
        let (stream, sim) = pair(SimulatedModule::new(21).with_relays([0xFF, 0xFF, 0x0F]));
        let mut client = RelayClient::from_transport(stream, None).unwrap();

        let states = apply_states(&mut client, &[1, 9, 20]).unwrap();
        assert_eq!(sim.relays(), [0x01, 0x01, 0x08]);
        assert_eq!(states.len(), 20);
        assert_eq!(state_bits(&states), "10000000100000000001");
    }

    #[test]
    fn empty_list_turns_everything_off() {
        let (stream, sim) = pair(SimulatedModule::new(29).with_relays([0x0F, 0, 0]));
        let mut client = RelayClient::from_transport(stream, None).unwrap();

        apply_states(&mut client, &[]).unwrap();
        assert_eq!(sim.relays(), [0, 0, 0]);
    }

    #[test]
    fn invalid_relay_sends_nothing() {
        let (stream, sim) = pair(SimulatedModule::new(29).with_relays([0x0F, 0, 0]));
        let mut client = RelayClient::from_transport(stream, None).unwrap();
        let before = sim.written();

        assert_eq!(apply_states(&mut client, &[1, 5]).unwrap_err().code, USAGE);
        assert_eq!(sim.written(), before);
        assert_eq!(sim.relays(), [0x0F, 0, 0]);
    }
}
