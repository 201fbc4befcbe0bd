use avlink_device::{config, DeviceEntry, DeviceSet};

use crate::cmd::CheckArgs;
use crate::exit::{config_error, CliResult, SUCCESS};
use crate::output::{new_table, print_json, OutputFormat};

/// One binding as listed by `check`.
struct Row {
    port: String,
    kind: &'static str,
    key: String,
    binding: String,
}

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let entries = config::load(&args.file)
        .map_err(|err| config_error("failed to load configuration", err))?;
    // Building catches limit violations and merges repeated names.
    let set = DeviceSet::from_config(&entries)
        .map_err(|err| config_error("invalid configuration", err))?;
    let topology = set.to_config();

    match format {
        OutputFormat::Json => print_json(&topology),
        OutputFormat::Table => {
            let mut table = new_table(vec!["PORT", "KIND", "NAME / PIN", "BINDING"]);
            for row in rows(&topology) {
                table.add_row(vec![row.port, row.kind.to_string(), row.key, row.binding]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in rows(&topology) {
                println!("{} {} {} -> {}", row.port, row.kind, row.key, row.binding);
            }
        }
    }
    Ok(SUCCESS)
}

fn rows(entries: &[DeviceEntry]) -> Vec<Row> {
    let mut rows = Vec::new();
    for entry in entries {
        let port = &entry.port;
        for e in &entry.in_encoders {
            rows.push(Row {
                port: port.clone(),
                kind: "encoder",
                key: e.name.clone(),
                binding: format!("up {} / down {}", e.command_up, e.command_down),
            });
        }
        for b in &entry.in_buttons {
            rows.push(Row {
                port: port.clone(),
                kind: "button",
                key: b.name.clone(),
                binding: b.command.clone(),
            });
        }
        for m in &entry.in_multiplexers {
            rows.push(Row {
                port: port.clone(),
                kind: "multiplexer",
                key: format!("{}[{}]", m.name, m.input),
                binding: m.command.clone(),
            });
        }
        for p in &entry.out_pwms {
            rows.push(Row {
                port: port.clone(),
                kind: "pwm",
                key: p.pin.to_string(),
                binding: format!("{} {} {}", p.dataref, p.op, p.val),
            });
        }
        for s in &entry.out_shift_regs {
            rows.push(Row {
                port: port.clone(),
                kind: "shift register",
                key: format!("{}[{}]", s.module, s.output),
                binding: format!("{} {} {}", s.dataref, s.op, s.val),
            });
        }
    }
    rows
}
