use std::time::{Duration, Instant};

use avlink_binding::{Host, MemoryCommands, MemoryData};
use avlink_device::{Device, LinkState};
use serde::Serialize;

use crate::cmd::{connector, parse_duration, InfoArgs};
use crate::exit::{device_error, CliError, CliResult, SUCCESS, TIMEOUT, TRANSPORT_ERROR};
use crate::output::{print_json, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Serialize)]
struct InfoOutput<'a> {
    address: &'a str,
    name: &'a str,
    serial: &'a str,
    diag: &'a str,
    state: LinkState,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut connector = connector()?;
    let mut commands = MemoryCommands::new();
    let data = MemoryData::new();

    let mut device = Device::new(&args.address);
    device
        .try_connect(connector.as_mut())
        .map_err(|err| device_error("connect failed", err))?;

    let start = Instant::now();
    while device.link_state() != LinkState::Identified {
        let report = device.update(&mut Host::new(&mut commands, &data));
        if report.lost {
            return Err(CliError::new(
                TRANSPORT_ERROR,
                format!("{}: {}", args.address, device.diag()),
            ));
        }
        if device.link_state() == LinkState::Identified {
            break;
        }
        if start.elapsed() >= timeout {
            device.disconnect(&mut commands);
            return Err(CliError::new(
                TIMEOUT,
                format!("no identity from {} within {timeout:?}", args.address),
            ));
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    print_info(&device, format);
    device.disconnect(&mut commands);
    Ok(SUCCESS)
}

fn print_info(device: &Device, format: OutputFormat) {
    let out = InfoOutput {
        address: device.address(),
        name: device.name(),
        serial: device.serial(),
        diag: device.diag(),
        state: device.link_state(),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Device Info:");
            println!("  Address: {}", out.address);
            println!("  Name:    {}", out.name);
            println!("  Serial:  {}", out.serial);
            println!("  Status:  {}", out.diag);
        }
        OutputFormat::Raw => {
            println!("{}", out.name);
        }
    }
}
