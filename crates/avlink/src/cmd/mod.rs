use std::path::PathBuf;
use std::time::Duration;

use avlink_transport::PortConnector;
use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod check;
pub mod info;
pub mod monitor;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports that look like cockpit devices.
    Ports(PortsArgs),
    /// Connect to a device and print its identity.
    Info(InfoArgs),
    /// Send a single frame.
    Send(SendArgs),
    /// Drive a device against in-memory registries and print host calls.
    Monitor(MonitorArgs),
    /// Load a configuration file and print its binding topology.
    Check(CheckArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Check(args) => check::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PortsArgs {
    /// Device directory to scan.
    #[arg(long, value_name = "DIR", default_value = "/dev")]
    pub dev_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Device address (e.g. /dev/ttyACM0).
    pub address: String,
    /// How long to wait for the identity response (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Device address.
    pub address: String,
    /// Command id.
    #[arg(allow_negative_numbers = true)]
    pub id: i16,
    /// Frame arguments, sent as given.
    #[arg(allow_negative_numbers = true)]
    pub args: Vec<String>,
    /// Wait for one frame from the device and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Device address.
    pub address: String,
    /// Configuration file with the device's bindings.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Host value as PATH=NUMBER (repeatable).
    #[arg(long = "value", value_name = "PATH=NUM")]
    pub values: Vec<String>,
    /// Time between ticks (e.g. 20ms, 1s).
    #[arg(long, default_value = "20ms")]
    pub interval: String,
    /// Stop after N ticks.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Configuration file to load.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[cfg(unix)]
pub(crate) fn connector() -> CliResult<Box<dyn PortConnector>> {
    Ok(Box::new(avlink_transport::SerialConnector::new()))
}

#[cfg(not(unix))]
pub(crate) fn connector() -> CliResult<Box<dyn PortConnector>> {
    Err(CliError::new(
        crate::exit::FAILURE,
        "serial devices are only supported on unix",
    ))
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
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
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }
}
