mod bridge;
mod config;
mod error;
mod footswitch;
mod midi_out;
mod translator;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bridge::{Bridge, CancelToken};
use config::Config;
use footswitch::FootswitchDevice;
use midi_out::MidiOut;
use translator::Channel;

/// Bridge a Native Instruments USB footswitch and expression pedal to MIDI.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// MIDI channel (1-16)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=16))]
    channel: Option<u8>,

    /// MIDI output port, by index or by part of its name
    #[arg(short, long)]
    port: Option<String>,

    /// USB vendor id to look for, e.g. 0x17cc
    #[arg(long, value_parser = parse_vendor_id)]
    vendor_id: Option<u16>,

    /// Print the available MIDI outputs and exit
    #[arg(long)]
    list_ports: bool,

    /// Log every message sent
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    if cli.list_ports {
        for (index, name) in MidiOut::list_ports()?.iter().enumerate() {
            println!("{index}: {name}");
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    let translator = config.translator()?;

    let midi = MidiOut::connect(&config.midi.port).context("failed to open MIDI output")?;
    info!(
        port = midi.port_name(),
        channel = %config.midi.channel,
        "MIDI output ready"
    );

    let device = FootswitchDevice::open(config.usb.vendor_id, config.usb.read_timeout())
        .context("failed to open footswitch")?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("failed to install Ctrl-C handler")?;

    let mut bridge = Bridge::new(device, midi, translator);
    info!("bridging footswitch to MIDI, Ctrl-C to stop");
    let reason = bridge.run(&cancel);

    let stats = bridge.stats();
    info!(
        ?reason,
        reports = stats.reports,
        messages = stats.messages,
        read_errors = stats.read_errors,
        send_errors = stats.send_errors,
        "bridge stopped"
    );
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("footswitch_midi={level}").parse()?),
        )
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(channel) = cli.channel {
        config.midi.channel = Channel::new(channel)?;
    }
    if let Some(port) = &cli.port {
        config.midi.port = port.clone();
    }
    if let Some(vendor_id) = cli.vendor_id {
        config.usb.vendor_id = vendor_id;
    }

    config.validate()?;
    Ok(config)
}

fn parse_vendor_id(raw: &str) -> Result<u16, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|err| format!("invalid vendor id \"{raw}\": {err}"))
}
