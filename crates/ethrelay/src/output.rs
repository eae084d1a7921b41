use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ethrelay_device::ChannelMap;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RelayStateOutput {
    pub relay: u8,
    pub on: bool,
}

#[derive(Serialize)]
struct StatesOutput<'a> {
    peer: &'a str,
    relays: Vec<RelayStateOutput>,
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn state_label(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

/// Relay states as `0`/`1` characters, relay 1 first.
pub fn state_bits(states: &ChannelMap) -> String {
    states.values().map(|&on| if on { '1' } else { '0' }).collect()
}

pub fn print_states(peer: &str, states: &ChannelMap, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = StatesOutput {
                peer,
                relays: states
                    .iter()
                    .map(|(index, &on)| RelayStateOutput {
                        relay: index.get(),
                        on,
                    })
                    .collect(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["RELAY", "STATE"]);
            for (index, &on) in states {
                table.add_row(vec![index.to_string(), state_label(on).to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Relays ({peer}):");
            for (index, &on) in states {
                println!("  {:>2}: {}", index.get(), state_label(on));
            }
        }
        OutputFormat::Raw => println!("{}", state_bits(states)),
    }
}
