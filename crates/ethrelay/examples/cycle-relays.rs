//! Switch every relay on in turn, then all off again.
//!
//! Run against a module (or `ethrelay simulate 127.0.0.1:17494`):
//!   cargo run --example cycle-relays -- 127.0.0.1 [password]

use std::thread;
use std::time::Duration;

use ethrelay::device::ChannelMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let password = args.next();

    let mut client = ethrelay::connect(&host, password.as_deref())?;
    let profile = *client.profile();
    eprintln!("Connected to {} ({} relays)", profile.name, profile.relay_count);

    for n in 1..=profile.relay_count as i64 {
        let relay = client.relay(n)?;
        client.set_single(relay, true, 0, true)?;
        eprintln!("Relay {relay} on");
        thread::sleep(Duration::from_millis(250));
        client.set_single(relay, false, 0, true)?;
    }

    client.set_all(&ChannelMap::new())?;
    eprintln!("All relays off");

    client.disconnect();
    Ok(())
}
