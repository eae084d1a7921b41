use ethrelay_device::RelayClient;
use ethrelay_transport::Transport;

use crate::cmd::GetArgs;
use crate::exit::{relay_error, CliResult, SUCCESS};
use crate::output::{print_json, state_label, OutputFormat, RelayStateOutput};

pub fn run(args: GetArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = args.conn.open()?;
    let out = read_relay(&mut client, args.relay)?;
    client.disconnect();

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("relay {}: {}", out.relay, state_label(out.on))
        }
        OutputFormat::Raw => println!("{}", u8::from(out.on)),
    }
    Ok(SUCCESS)
}

fn read_relay<T: Transport>(
    client: &mut RelayClient<T>,
    relay: i64,
) -> CliResult<RelayStateOutput> {
    let index = client
        .relay(relay)
        .map_err(|err| relay_error("invalid relay", err))?;
    let on = client
        .get_single(index)
        .map_err(|err| relay_error("get failed", err))?;
    Ok(RelayStateOutput {
        relay: index.get(),
        on,
    })
}

#[cfg(test)]
mod tests {
    use ethrelay_device::simulator::{pair, SimulatedModule};

    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn reads_one_relay() {
        let (stream, _sim) = pair(SimulatedModule::new(19).with_relays([0b0000_0100, 0, 0]));
        let mut client = RelayClient::from_transport(stream, None).unwrap();

        assert!(read_relay(&mut client, 3).unwrap().on);
        assert!(!read_relay(&mut client, 4).unwrap().on);
    }

    #[test]
    fn out_of_range_is_usage() {
        let (stream, sim) = pair(SimulatedModule::new(19));
        let mut client = RelayClient::from_transport(stream, None).unwrap();
        let before = sim.written();

        assert_eq!(read_relay(&mut client, 9).unwrap_err().code, USAGE);
        assert_eq!(read_relay(&mut client, 0).unwrap_err().code, USAGE);
        assert_eq!(sim.written(), before);
    }
}
