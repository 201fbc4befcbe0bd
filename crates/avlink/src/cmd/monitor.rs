use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use avlink_binding::{DataValue, Host, Invocation, MemoryCommands, MemoryData};
use avlink_device::{config, Device, DeviceConfig, LinkState};
use serde::Serialize;

use crate::cmd::{connector, parse_duration, MonitorArgs};
use crate::exit::{config_error, device_error, CliError, CliResult, SUCCESS, TRANSPORT_ERROR, USAGE};
use crate::output::{new_table, now_unix_seconds, print_json, OutputFormat};

#[derive(Serialize)]
struct EventOutput<'a> {
    tick: u64,
    event: &'a str,
    detail: &'a str,
    timestamp: String,
}

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let mut data = MemoryData::new();
    for value in &args.values {
        let (path, value) = parse_value(value)?;
        data.set(path, value);
    }

    let mut device = load_device(&args)?;
    let mut commands = MemoryCommands::new();
    for input in device.inputs() {
        for binding in input.bindings() {
            if !binding.path().is_empty() {
                commands.register(binding.path());
            }
        }
    }

    let mut connector = connector()?;
    device
        .try_connect(connector.as_mut())
        .map_err(|err| device_error("connect failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut tick = 0u64;
    let mut state = device.link_state();
    let mut result = Ok(SUCCESS);
    while running.load(Ordering::SeqCst) && args.count.is_none_or(|count| tick < count) {
        tick += 1;
        let report = device.update(&mut Host::new(&mut commands, &data));
        print_invocations(tick, commands.take_invocations(), format);

        if device.link_state() != state {
            state = device.link_state();
            let detail = match state {
                LinkState::Identified => format!("{} ({})", device.name(), device.diag()),
                _ => device.diag().to_string(),
            };
            print_event(tick, state.as_str(), &detail, format);
        }
        if report.lost {
            result = Err(CliError::new(
                TRANSPORT_ERROR,
                format!("{}: {}", device.address(), device.diag()),
            ));
            break;
        }
        std::thread::sleep(interval);
    }

    device.disconnect(&mut commands);
    print_invocations(tick, commands.take_invocations(), format);
    result
}

fn load_device(args: &MonitorArgs) -> CliResult<Device> {
    let Some(path) = &args.config else {
        return Ok(Device::new(&args.address));
    };
    let entries = config::load(path).map_err(|err| config_error("failed to load configuration", err))?;
    match entries.iter().find(|entry| entry.port == args.address) {
        Some(entry) => entry
            .build(DeviceConfig::default())
            .map_err(|err| device_error("invalid device configuration", err)),
        None => {
            tracing::warn!(address = %args.address, "no configuration entry for this port");
            Ok(Device::new(&args.address))
        }
    }
}

fn parse_value(input: &str) -> CliResult<(&str, DataValue)> {
    let (path, number) = input
        .split_once('=')
        .ok_or_else(|| CliError::new(USAGE, format!("expected PATH=NUMBER, got {input:?}")))?;
    let number = number.trim();
    let value = match number.parse::<i32>() {
        Ok(int) => DataValue::Int(int),
        Err(_) => number
            .parse::<f32>()
            .map(DataValue::Float)
            .map_err(|_| CliError::new(USAGE, format!("invalid number in {input:?}")))?,
    };
    Ok((path.trim(), value))
}

fn print_invocations(tick: u64, invocations: Vec<Invocation>, format: OutputFormat) {
    for invocation in invocations {
        print_event(tick, invocation.kind.as_str(), &invocation.path, format);
    }
}

fn print_event(tick: u64, event: &str, detail: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&EventOutput {
            tick,
            event,
            detail,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["TICK", "EVENT", "DETAIL"]);
            table.add_row(vec![tick.to_string(), event.to_string(), detail.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("[{tick}] {event} {detail}"),
        OutputFormat::Raw => println!("{event} {detail}"),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
