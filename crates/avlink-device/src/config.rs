//! Persisted binding topology.
//!
//! A configuration file holds one `[[device]]` table per device:
//!
//! ```toml
//! [[device]]
//! port = "/dev/ttyACM0"
//! id = "SN-1234"
//! in_buttons = [ { name = "ap", command = "sim/autopilot/toggle" } ]
//! out_pwms = [ { pin = 5, dataref = "sim/panel_brightness", op = "mul", val = 1.0 } ]
//! ```
//!
//! Multiplexer entries sharing a name become pins of one multiplexer and
//! shift-register entries sharing a module become pins of one register.

use std::path::{Path, PathBuf};

use avlink_binding::{Comparison, Modifier};
use avlink_frame::MAX_PINS;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::device::{Device, DeviceConfig};
use crate::error::{ConfigError, DeviceError};
use crate::input::Input;
use crate::output::{Output, ShiftPin};

/// File name looked up by [`locate`].
pub const CONFIG_FILE_NAME: &str = "avlink.toml";

/// One `[[device]]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Transport address.
    pub port: String,
    /// Serial number last seen on this port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub in_encoders: Vec<EncoderEntry>,
    #[serde(default)]
    pub in_buttons: Vec<ButtonEntry>,
    #[serde(default)]
    pub in_multiplexers: Vec<MuxEntry>,
    #[serde(default)]
    pub out_pwms: Vec<PwmEntry>,
    #[serde(default)]
    pub out_shift_regs: Vec<ShiftEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderEntry {
    pub name: String,
    pub command_up: String,
    pub command_down: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonEntry {
    pub name: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One multiplexer pin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MuxEntry {
    pub name: String,
    pub input: i64,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PwmEntry {
    pub pin: i16,
    pub dataref: String,
    #[serde(default)]
    pub op: Modifier,
    pub val: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One shift-register pin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftEntry {
    pub module: i16,
    pub output: i64,
    pub dataref: String,
    #[serde(default)]
    pub op: Comparison,
    pub val: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Deserialize)]
struct ConfigFile {
    device: Option<Vec<DeviceEntry>>,
}

#[derive(Serialize)]
struct ConfigFileRef<'a> {
    device: &'a [DeviceEntry],
}

/// Parse a configuration document.
pub fn from_toml_str(text: &str) -> Result<Vec<DeviceEntry>, ConfigError> {
    let file: ConfigFile = toml::from_str(text)?;
    file.device.ok_or(ConfigError::NoDevices)
}

/// Render entries as a configuration document.
pub fn to_toml_string(entries: &[DeviceEntry]) -> Result<String, ConfigError> {
    let body = toml::to_string(&ConfigFileRef { device: entries })?;
    Ok(format!("# avlink configuration\n{body}"))
}

/// Read and parse a configuration file.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<DeviceEntry>, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = from_toml_str(&text)?;
    debug!(path = %path.display(), devices = entries.len(), "configuration loaded");
    Ok(entries)
}

/// Write entries to a configuration file, replacing it.
pub fn save(path: impl AsRef<Path>, entries: &[DeviceEntry]) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let text = to_toml_string(entries)?;
    std::fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// First [`CONFIG_FILE_NAME`] found in `dirs`, searched in order.
pub fn locate<I, P>(dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    dirs.into_iter()
        .map(|dir| dir.as_ref().join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

impl DeviceEntry {
    /// Build a disconnected device from this entry.
    ///
    /// Pins beyond the protocol limit are skipped with a warning. Running
    /// out of input slots is an error.
    pub fn build(&self, config: DeviceConfig) -> Result<Device, DeviceError> {
        let mut device = Device::with_config(&self.port, config);
        if let Some(serial) = &self.id {
            device.set_serial(serial.clone());
        }

        for entry in &self.in_encoders {
            let fresh = device.find_encoder(&entry.name).is_none();
            let encoder = device.encoder_named(&entry.name)?;
            encoder.bind(&entry.command_up, &entry.command_down);
            apply_comment(&mut encoder.comment, entry.comment.as_deref(), fresh);
        }

        for entry in &self.in_buttons {
            let fresh = device.find_button(&entry.name).is_none();
            let button = device.button_named(&entry.name)?;
            button.bind(&entry.command);
            apply_comment(&mut button.comment, entry.comment.as_deref(), fresh);
        }

        for entry in &self.in_multiplexers {
            let Some(pin) = pin_index(entry.input) else {
                warn!(
                    port = %self.port,
                    name = %entry.name,
                    input = entry.input,
                    "skipping multiplexer input outside 0..16"
                );
                continue;
            };
            let fresh = device.find_multiplexer(&entry.name).is_none();
            let mux = device.multiplexer_named(&entry.name)?;
            mux.bind_pin(pin, entry.command.clone())?;
            apply_comment(&mut mux.comment, entry.comment.as_deref(), fresh);
        }

        for entry in &self.out_pwms {
            let fresh = device.find_pwm(entry.pin).is_none();
            let pwm = device.pwm_with_id(entry.pin);
            pwm.data.set_path(&entry.dataref);
            pwm.modifier = entry.op;
            pwm.operand = entry.val as f32;
            apply_comment(&mut pwm.comment, entry.comment.as_deref(), fresh);
        }

        for entry in &self.out_shift_regs {
            let Some(pin) = pin_index(entry.output) else {
                warn!(
                    port = %self.port,
                    module = entry.module,
                    output = entry.output,
                    "skipping shift register output outside 0..16"
                );
                continue;
            };
            let fresh = device.find_shift_register(entry.module).is_none();
            let sreg = device.shift_register_with_id(entry.module);
            sreg.set_pin(pin, ShiftPin::new(&entry.dataref, entry.op, entry.val as f32))?;
            apply_comment(&mut sreg.comment, entry.comment.as_deref(), fresh);
        }

        Ok(device)
    }

    /// Describe an existing device. Unbound pins are left out.
    pub fn from_device(device: &Device) -> Self {
        let mut entry = Self {
            port: device.address().to_string(),
            id: (!device.serial().is_empty()).then(|| device.serial().to_string()),
            ..Self::default()
        };

        for input in device.inputs() {
            let comment = Some(input.comment().to_string()).filter(|c| !c.is_empty());
            match input {
                Input::Encoder(encoder) => entry.in_encoders.push(EncoderEntry {
                    name: encoder.name().to_string(),
                    command_up: encoder.up().path().to_string(),
                    command_down: encoder.down().path().to_string(),
                    comment,
                }),
                Input::Button(button) => entry.in_buttons.push(ButtonEntry {
                    name: button.name().to_string(),
                    command: button.command().path().to_string(),
                    comment,
                }),
                Input::Multiplexer(mux) => {
                    for (pin, binding) in mux.pins().filter(|(_, b)| !b.path().is_empty()) {
                        entry.in_multiplexers.push(MuxEntry {
                            name: mux.name().to_string(),
                            input: pin as i64,
                            command: binding.path().to_string(),
                            comment: comment.clone(),
                        });
                    }
                }
            }
        }

        for output in device.outputs() {
            let comment = Some(output.comment().to_string()).filter(|c| !c.is_empty());
            match output {
                Output::Pwm(pwm) => entry.out_pwms.push(PwmEntry {
                    pin: pwm.id(),
                    dataref: pwm.data.path().to_string(),
                    op: pwm.modifier,
                    val: widen(pwm.operand),
                    comment,
                }),
                Output::ShiftRegister(sreg) => {
                    for (pin, config) in sreg.pins().filter(|(_, p)| !p.data.path().is_empty()) {
                        entry.out_shift_regs.push(ShiftEntry {
                            module: sreg.id(),
                            output: pin as i64,
                            dataref: config.data.path().to_string(),
                            op: config.comparison,
                            val: widen(config.threshold),
                            comment: comment.clone(),
                        });
                    }
                }
            }
        }

        entry
    }
}

/// Entities built from a file carry only the comments written there.
fn apply_comment(target: &mut String, comment: Option<&str>, fresh: bool) {
    match comment {
        Some(comment) => *target = comment.to_string(),
        None if fresh => target.clear(),
        None => {}
    }
}

fn pin_index(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|&pin| pin < MAX_PINS)
}

/// Widen through the shortest decimal form so `0.1f32` is written as `0.1`.
fn widen(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    const SAMPLE: &str = r#"
[[device]]
port = "/dev/ttyACM0"
id = "SN-1234"
in_encoders = [ { name = "hdg", command_up = "sim/hdg_up", command_down = "sim/hdg_down" } ]
in_buttons = [ { name = "ap", command = "sim/autopilot/toggle" } ]
in_multiplexers = [
  { name = "mux1", input = 3, command = "sim/lights/beacon" },
  { name = "mux1", input = 0, command = "sim/lights/strobe" },
  { name = "mux1", input = 16, command = "sim/lights/nav" },
]
out_pwms = [ { pin = 5, dataref = "sim/panel_brightness", op = "mul", val = 0.5 } ]
out_shift_regs = [
  { module = 1, output = 4, dataref = "sim/gear/deploy", op = ">=", val = 1.0 },
  { module = 1, output = 2, dataref = "sim/gear/unsafe", op = "&", val = 2.0 },
  { module = 1, output = 20, dataref = "sim/bogus", op = "==", val = 0.0 },
]
"#;

    fn temp_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after the epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "avlink-{label}-{}-{nanos}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn parses_sample() {
        let entries = from_toml_str(SAMPLE).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.port, "/dev/ttyACM0");
        assert_eq!(entry.id.as_deref(), Some("SN-1234"));
        assert_eq!(entry.in_multiplexers.len(), 3);
        assert_eq!(entry.out_pwms[0].op, Modifier::Mul);
        assert_eq!(entry.out_shift_regs[0].op, Comparison::GreaterOrEqual);
        assert_eq!(entry.out_shift_regs[1].op, Comparison::BitTest);
    }

    #[test]
    fn build_merges_and_skips_out_of_range_pins() {
        let entries = from_toml_str(SAMPLE).unwrap();
        let device = entries[0].build(DeviceConfig::default()).unwrap();

        assert_eq!(device.serial(), "SN-1234");
        assert_eq!(device.input_count(), 3);
        let encoder = device.find_encoder("hdg").unwrap();
        assert_eq!(encoder.down().path(), "sim/hdg_down");
        assert_eq!(encoder.comment, "");

        let mux = device.find_multiplexer("mux1").unwrap();
        assert_eq!(mux.pin_count(), 4);
        assert_eq!(mux.pin(3).unwrap().path(), "sim/lights/beacon");
        assert_eq!(mux.pin(0).unwrap().path(), "sim/lights/strobe");

        assert_eq!(device.output_count(), 2);
        let pwm = device.find_pwm(5).unwrap();
        assert_eq!(pwm.operand, 0.5);
        let sreg = device.find_shift_register(1).unwrap();
        assert_eq!(sreg.pin_count(), 5);
        assert_eq!(sreg.pin(2).unwrap().comparison, Comparison::BitTest);
    }

    #[test]
    fn missing_device_array_is_an_error() {
        assert!(matches!(
            from_toml_str("title = \"nothing\"\n"),
            Err(ConfigError::NoDevices)
        ));
    }

    #[test]
    fn unknown_operator_is_a_parse_error() {
        let text = r#"
[[device]]
port = "p"
out_pwms = [ { pin = 1, dataref = "d", op = "div", val = 1.0 } ]
"#;
        assert!(matches!(from_toml_str(text), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn save_writes_down_command_and_reloads() {
        let entries = from_toml_str(SAMPLE).unwrap();
        let device = entries[0].build(DeviceConfig::default()).unwrap();
        let entry = DeviceEntry::from_device(&device);

        assert_eq!(entry.in_encoders[0].command_down, "sim/hdg_down");
        assert_eq!(entry.out_pwms[0].val, 0.5);

        let dir = temp_dir("save");
        let path = dir.join(CONFIG_FILE_NAME);
        save(&path, std::slice::from_ref(&entry)).unwrap();
        let reloaded = load(&path).unwrap();
        assert_eq!(reloaded, vec![entry]);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn round_trip_keeps_comments_as_written() {
        let text = r#"
[[device]]
port = "mem:a"
in_encoders = [ { name = "hdg", command_up = "u", command_down = "d" } ]
in_buttons = [ { name = "ap", command = "sim/ap", comment = "Autopilot" } ]
in_multiplexers = [
  { name = "m", input = 0, command = "a" },
  { name = "m", input = 1, command = "b", comment = "Lights" },
]
out_pwms = [ { pin = 5, dataref = "sim/dim", op = "mul", val = 1.0 } ]
"#;
        let entries = from_toml_str(text).unwrap();
        let device = entries[0].build(DeviceConfig::default()).unwrap();
        let entry = DeviceEntry::from_device(&device);

        assert_eq!(entry.in_encoders[0].comment, None);
        assert_eq!(entry.in_buttons[0].comment.as_deref(), Some("Autopilot"));
        assert_eq!(entry.in_multiplexers[0].comment.as_deref(), Some("Lights"));
        assert_eq!(entry.out_pwms[0].comment, None);
        let text = to_toml_string(&[entry]).unwrap();
        assert!(!text.contains("Encoder #"));
        assert!(!text.contains("PWM #"));
    }

    #[test]
    fn widen_keeps_short_decimals() {
        assert_eq!(widen(0.1), 0.1);
        assert_eq!(widen(1.0), 1.0);
    }

    #[test]
    fn locate_prefers_earlier_dirs() {
        let specific = temp_dir("locate-specific");
        let global = temp_dir("locate-global");
        std::fs::write(global.join(CONFIG_FILE_NAME), "").unwrap();

        assert_eq!(
            locate([&specific, &global]),
            Some(global.join(CONFIG_FILE_NAME))
        );

        std::fs::write(specific.join(CONFIG_FILE_NAME), "").unwrap();
        assert_eq!(
            locate([&specific, &global]),
            Some(specific.join(CONFIG_FILE_NAME))
        );
        assert_eq!(locate(Vec::<PathBuf>::new()), None);

        std::fs::remove_dir_all(specific).ok();
        std::fs::remove_dir_all(global).ok();
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = temp_dir("missing");
        let err = load(dir.join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        std::fs::remove_dir_all(dir).ok();
    }
}
