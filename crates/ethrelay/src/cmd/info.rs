use ethrelay_device::{HandshakeOutcome, RelayClient};
use ethrelay_transport::Transport;
use serde::Serialize;

use crate::cmd::InfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct InfoOutput {
    peer: String,
    model: &'static str,
    model_id: u8,
    hardware_version: u8,
    firmware_version: u8,
    relay_count: usize,
    digital_io_count: usize,
    analog_input_count: usize,
    handshake: HandshakeOutcome,
    connected: bool,
}

impl InfoOutput {
    fn from_client<T: Transport>(client: &RelayClient<T>) -> Self {
        let info = client.module_info();
        Self {
            peer: client.peer().to_string(),
            model: info.profile.name,
            model_id: info.profile.model_id,
            hardware_version: info.hardware_version,
            firmware_version: info.firmware_version,
            relay_count: info.profile.relay_count,
            digital_io_count: info.profile.digital_io_count,
            analog_input_count: info.profile.analog_input_count,
            handshake: client.handshake(),
            connected: true,
        }
    }
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = args.conn.open()?;
    let out = InfoOutput::from_client(&client);
    client.disconnect();

    print_info(&out, format);
    Ok(SUCCESS)
}

fn handshake_label(outcome: HandshakeOutcome) -> String {
    match outcome {
        HandshakeOutcome::PasswordDisabled => "no password set".to_string(),
        HandshakeOutcome::PasswordAccepted => "password accepted".to_string(),
        HandshakeOutcome::Unlocked { relock_in_secs } => {
            format!("already unlocked (relocks in {relock_in_secs}s)")
        }
    }
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Module Info:");
            println!("  Peer:             {}", out.peer);
            println!("  Model:            {} (id {})", out.model, out.model_id);
            println!("  Hardware version: {}", out.hardware_version);
            println!("  Firmware version: {}", out.firmware_version);
            println!("  Relays:           {}", out.relay_count);
            println!("  Digital I/O:      {}", out.digital_io_count);
            println!("  Analog inputs:    {}", out.analog_input_count);
            println!("  Authentication:   {}", handshake_label(out.handshake));
        }
        OutputFormat::Raw => println!("{}", out.model),
    }
}

#[cfg(test)]
mod tests {
    use ethrelay_device::simulator::{pair, SimulatedModule};

    use super::*;

    #[test]
    fn info_output_reflects_module() {
        let (stream, _sim) = pair(SimulatedModule::new(20).with_versions(3, 7));
        let client = RelayClient::from_transport(stream, None).unwrap();

        let out = InfoOutput::from_client(&client);
        assert_eq!(out.model, "ETH484");
        assert_eq!(out.model_id, 20);
        assert_eq!(out.hardware_version, 3);
        assert_eq!(out.firmware_version, 7);
        assert_eq!(out.relay_count, 4);
        assert_eq!(out.digital_io_count, 8);
        assert_eq!(out.analog_input_count, 4);
        assert_eq!(out.handshake, HandshakeOutcome::PasswordDisabled);

        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["handshake"]["status"], "password_disabled");
        assert_eq!(value["connected"], true);
    }

    #[test]
    fn handshake_labels() {
        assert_eq!(
            handshake_label(HandshakeOutcome::Unlocked { relock_in_secs: 30 }),
            "already unlocked (relocks in 30s)"
        );
        assert_eq!(
            handshake_label(HandshakeOutcome::PasswordDisabled),
            "no password set"
        );
    }

    #[test]
    fn info_output_serializes_handshake_tag() {
        let value = serde_json::to_value(HandshakeOutcome::PasswordAccepted).unwrap();
        assert_eq!(value["status"], "password_accepted");
    }
}
