use ethrelay_device::{Pulse, RelayClient, RelayError};
use ethrelay_transport::Transport;
use serde::Serialize;

use crate::cmd::SetArgs;
use crate::exit::{relay_error, CliResult, SUCCESS};
use crate::output::{print_json, state_label, OutputFormat};

#[derive(Debug, Serialize)]
struct SetOutput {
    relay: u8,
    state: &'static str,
    pulse: u8,
    /// Set only for a pulsed exclusive switch.
    pulse_ms: Option<u128>,
    exclusive: bool,
}

pub fn run(args: SetArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = args.conn.open()?;
    let out = switch_relay(&mut client, &args)?;
    client.disconnect();

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            match out.pulse_ms {
                Some(ms) => println!("relay {} {} for {ms}ms", out.relay, out.state),
                None => println!("relay {} {}", out.relay, out.state),
            }
        }
        OutputFormat::Raw => println!("ok"),
    }
    Ok(SUCCESS)
}

fn switch_relay<T: Transport>(
    client: &mut RelayClient<T>,
    args: &SetArgs,
) -> CliResult<SetOutput> {
    let index = client
        .relay(args.relay)
        .map_err(|err| relay_error("invalid relay", err))?;
    let pulse = Pulse::try_from(args.pulse)
        .map_err(|err| relay_error("invalid pulse", RelayError::from(err)))?;
    let on = args.state.is_on();
    if !pulse.is_permanent() && !args.exclusive {
        tracing::warn!("--pulse has no effect without --exclusive");
    }
    client
        .set_single(index, on, i64::from(pulse.get()), args.exclusive)
        .map_err(|err| relay_error("set failed", err))?;

    let pulse_ms = if args.exclusive {
        pulse.duration().map(|d| d.as_millis())
    } else {
        None
    };
    Ok(SetOutput {
        relay: index.get(),
        state: state_label(on),
        pulse: pulse.get(),
        pulse_ms,
        exclusive: args.exclusive,
    })
}
