use avlink_transport::{PortConnector, PortInfo};
use serde::Serialize;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct PortOutput<'a> {
    address: &'a str,
    name: &'a str,
}

pub fn run(args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = enumerate(&args)?;
    print_ports(&ports, format);
    Ok(SUCCESS)
}

#[cfg(unix)]
fn enumerate(args: &PortsArgs) -> CliResult<Vec<PortInfo>> {
    avlink_transport::SerialConnector::with_dev_dir(&args.dev_dir)
        .enumerate()
        .map_err(|err| transport_error("enumerate failed", err))
}

#[cfg(not(unix))]
fn enumerate(_args: &PortsArgs) -> CliResult<Vec<PortInfo>> {
    crate::cmd::connector()?
        .enumerate()
        .map_err(|err| transport_error("enumerate failed", err))
}

fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|p| PortOutput {
                    address: &p.address,
                    name: &p.display_name,
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["ADDRESS", "NAME"]);
            for port in ports {
                table.add_row(vec![port.address.clone(), port.display_name.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("No devices found.");
            }
            for port in ports {
                println!("{}  {}", port.address, port.display_name);
            }
        }
        OutputFormat::Raw => {
            for port in ports {
                println!("{}", port.address);
            }
        }
    }
}
