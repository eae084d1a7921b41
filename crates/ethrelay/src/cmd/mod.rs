use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use ethrelay_device::{ClientConfig, RelayClient, DEFAULT_PORT};

use crate::exit::{relay_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod apply;
pub mod get;
pub mod info;
pub mod set;
pub mod simulate;
pub mod status;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show module model, versions and how the session authenticated.
    Info(InfoArgs),
    /// Print the state of every relay.
    Status(StatusArgs),
    /// Print the state of one relay.
    Get(GetArgs),
    /// Switch one relay on or off.
    Set(SetArgs),
    /// Set all relays at once: listed relays on, the rest off.
    Apply(ApplyArgs),
    /// Serve a simulated module over TCP.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Info(args) => info::run(args, format),
        Command::Status(args) => status::run(args, format),
        Command::Get(args) => get::run(args, format),
        Command::Set(args) => set::run(args, format),
        Command::Apply(args) => apply::run(args, format),
        Command::Simulate(args) => simulate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where and how to reach a module.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Module hostname or IP address.
    pub host: String,
    /// TCP port.
    #[arg(long, env = "ETHRELAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// TCP/IP password, if the module has one set.
    #[arg(long, env = "ETHRELAY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Connect/read/write timeout (e.g. 5s, 500ms). Default: none.
    #[arg(long)]
    pub timeout: Option<String>,
}

impl ConnectArgs {
    pub fn config(&self) -> CliResult<ClientConfig> {
        let mut config = ClientConfig::new(&self.host).with_port(self.port);
        if let Some(password) = &self.password {
            config = config.with_password(password);
        }
        if let Some(timeout) = &self.timeout {
            config = config.with_timeout(parse_duration(timeout)?);
        }
        Ok(config)
    }

    pub fn open(&self) -> CliResult<RelayClient> {
        let config = self.config()?;
        RelayClient::connect(&config).map_err(|err| relay_error("connect failed", err))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RelayState {
    On,
    Off,
}

impl RelayState {
    pub fn is_on(self) -> bool {
        self == RelayState::On
    }
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub conn: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub conn: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub conn: ConnectArgs,
    /// Relay number, starting at 1.
    pub relay: i64,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub conn: ConnectArgs,
    /// Relay number, starting at 1.
    pub relay: i64,
    /// Target state.
    pub state: RelayState,
    /// Pulse length in 100ms units (0-255, 0 = permanent). Needs --exclusive.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub pulse: i64,
    /// Use the single-relay command instead of rewriting every relay.
    #[arg(long)]
    pub exclusive: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub conn: ConnectArgs,
    /// Relays to switch on (comma-separated). All others are switched off.
    #[arg(long, value_delimiter = ',')]
    pub on: Vec<i64>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Address to listen on (e.g. 127.0.0.1:17494).
    pub addr: String,
    /// Model id to report (18, 19, 20, 21 or 29).
    #[arg(long, default_value_t = 21)]
    pub model: u8,
    /// Require this password before accepting commands.
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parse_duration_millis() {
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        assert_eq!(parse_duration("0s").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("bad").unwrap_err().code, USAGE);
        assert_eq!(parse_duration(" ").unwrap_err().code, USAGE);
    }

    #[test]
    fn config_from_args() {
        let args = ConnectArgs {
            host: "10.0.0.9".to_string(),
            port: 2000,
            password: Some("pw".to_string()),
            timeout: Some("250ms".to_string()),
        };
        let config = args.config().unwrap();
        assert_eq!(config.host, "10.0.0.9");
        assert_eq!(config.port, 2000);
        assert_eq!(config.password.as_deref(), Some("pw"));
        assert_eq!(config.read_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.connect_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn config_without_timeout_blocks() {
        let args = ConnectArgs {
            host: "10.0.0.9".to_string(),
            port: DEFAULT_PORT,
            password: None,
            timeout: None,
        };
        let config = args.config().unwrap();
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.password, None);
    }
}
