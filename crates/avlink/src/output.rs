use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use avlink_frame::CommandFrame;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
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

#[derive(Serialize)]
struct FrameOutput<'a> {
    id: i16,
    command: &'static str,
    args: &'a [String],
    timestamp: String,
}

pub fn print_frame(frame: &CommandFrame, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                id: frame.id,
                command: frame.name(),
                args: &frame.args,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["ID", "COMMAND", "ARGS"]);
            table.add_row(vec![
                frame.id.to_string(),
                frame.name().to_string(),
                frame.args.join(", "),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "id={} ({}) args=[{}]",
                frame.id,
                frame.name(),
                frame.args.join(", ")
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.to_string().as_bytes());
            println!();
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
