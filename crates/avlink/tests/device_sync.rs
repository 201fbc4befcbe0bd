use avlink::binding::{DataValue, Host, InvocationKind, MemoryCommands, MemoryData};
use avlink::device::{config, DeviceSet, LinkState};
use avlink::transport::{MemoryConnector, MemoryPort};

const PANEL: &str = r#"
[[device]]
port = "mem:overhead"
in_encoders = [ { name = "hdg", command_up = "sim/hdg_up", command_down = "sim/hdg_down" } ]
in_buttons = [ { name = "ap", command = "sim/ap" } ]
in_multiplexers = [
  { name = "lights", input = 0, command = "sim/strobe" },
  { name = "lights", input = 1, command = "sim/beacon" },
]
out_pwms = [ { pin = 5, dataref = "sim/dim", op = "mul", val = 1.0 } ]
out_shift_regs = [
  { module = 1, output = 0, dataref = "sim/gear/0", op = ">=", val = 1.0 },
  { module = 1, output = 1, dataref = "sim/gear/1", op = ">=", val = 1.0 },
  { module = 1, output = 2, dataref = "sim/gear/2", op = ">=", val = 1.0 },
]
"#;

struct Sim {
    connector: MemoryConnector,
    port: MemoryPort,
    commands: MemoryCommands,
    data: MemoryData,
    set: DeviceSet,
}

impl Sim {
    fn new() -> Self {
        let mut connector = MemoryConnector::new();
        let port = connector.add_port("mem:overhead");
        let commands = MemoryCommands::with_commands([
            "sim/hdg_up",
            "sim/hdg_down",
            "sim/ap",
            "sim/strobe",
            "sim/beacon",
        ]);
        let mut data = MemoryData::new();
        data.set("sim/dim", DataValue::Float(0.0));
        for gear in 0..3 {
            data.set(format!("sim/gear/{gear}"), DataValue::Int(0));
        }
        let entries = config::from_toml_str(PANEL).expect("panel config should parse");
        let set = DeviceSet::from_config(&entries).expect("panel config should build");
        Self {
            connector,
            port,
            commands,
            data,
            set,
        }
    }

    fn connect(&mut self) {
        assert_eq!(self.set.connect_all(&mut self.connector), 1);
    }

    fn tick(&mut self) -> bool {
        let reports = self.set.update(&mut Host::new(&mut self.commands, &self.data));
        reports.iter().any(|r| r.lost)
    }

    fn state(&self) -> LinkState {
        self.set.get(0).expect("device should exist").link_state()
    }
}

#[test]
fn connect_identify_and_reset() {
    let mut sim = Sim::new();
    sim.connect();
    assert_eq!(
        sim.port.take_written_string(),
        "9;2,5,0;27,1,0|1|2|3|4|5|6|7|8|9|10|11|12|13|14|15,0;"
    );

    sim.port.push_inbound(b"10,MobiFlight Mega,Overhead,SN-77,2.5.0;");
    sim.tick();
    assert_eq!(sim.state(), LinkState::Identified);
    let device = sim.set.get(0).unwrap();
    assert_eq!(device.name(), "Overhead");
    assert_eq!(device.serial(), "SN-77");
}

#[test]
fn inputs_drive_host_commands() {
    let mut sim = Sim::new();
    sim.connect();

    sim.port.push_inbound(b"7,ap,1;7,ap,1;6,hdg,3;6,hdg,0;30,lights,1,1;");
    sim.tick();
    assert_eq!(sim.commands.count("sim/ap", InvocationKind::Begin), 1);
    assert_eq!(sim.commands.count("sim/hdg_up", InvocationKind::Once), 1);
    assert_eq!(sim.commands.count("sim/hdg_down", InvocationKind::Once), 1);
    assert_eq!(sim.commands.count("sim/beacon", InvocationKind::Begin), 1);

    sim.port.push_inbound(b"7,ap,0;30,lights,1,0;");
    sim.tick();
    assert_eq!(sim.commands.count("sim/ap", InvocationKind::End), 1);
    assert_eq!(sim.commands.count("sim/beacon", InvocationKind::End), 1);
}

#[test]
fn partial_frames_wait_for_terminator() {
    let mut sim = Sim::new();
    sim.connect();

    sim.port.push_inbound(b"7,ap");
    sim.tick();
    assert!(sim.commands.invocations().is_empty());

    sim.port.push_inbound(b",1;");
    sim.tick();
    assert_eq!(sim.commands.count("sim/ap", InvocationKind::Begin), 1);
}

#[test]
fn outputs_follow_host_values() {
    let mut sim = Sim::new();
    sim.connect();
    sim.port.take_written();

    sim.tick();
    assert_eq!(sim.port.take_written_string(), "");

    sim.data.set("sim/dim", DataValue::Float(0.5));
    for gear in 0..3 {
        sim.data.set(format!("sim/gear/{gear}"), DataValue::Int(1));
    }
    sim.tick();
    assert_eq!(sim.port.take_written_string(), "2,5,127;27,1,0|1|2,1;");

    sim.tick();
    assert_eq!(sim.port.take_written_string(), "");

    sim.data.set("sim/gear/1", DataValue::Int(0));
    sim.tick();
    assert_eq!(sim.port.take_written_string(), "27,1,1,0;");
}

#[test]
fn unplug_releases_held_commands_and_reconnects() {
    let mut sim = Sim::new();
    sim.connect();
    sim.port.push_inbound(b"7,ap,1;30,lights,0,1;30,lights,1,1;");
    sim.tick();

    sim.port.fail_reads();
    assert!(sim.tick());
    assert_eq!(sim.state(), LinkState::Disconnected);
    for path in ["sim/ap", "sim/strobe", "sim/beacon"] {
        assert_eq!(sim.commands.count(path, InvocationKind::End), 1, "{path}");
    }

    for _ in 0..3 {
        assert!(!sim.tick());
    }
    assert_eq!(sim.commands.invocations().len(), 6);

    let mut connector = MemoryConnector::new();
    let replugged = connector.add_port("mem:overhead");
    assert_eq!(sim.set.connect_all(&mut connector), 1);
    assert!(replugged.take_written_string().starts_with("9;"));
    assert_eq!(sim.state(), LinkState::Connected);
}

#[test]
fn topology_survives_a_save_cycle() {
    let sim = Sim::new();
    let saved = config::to_toml_string(&sim.set.to_config()).expect("topology should serialize");
    let reloaded = config::from_toml_str(&saved).expect("saved topology should parse");
    assert_eq!(reloaded, sim.set.to_config());
    assert_eq!(reloaded[0].in_encoders[0].command_down, "sim/hdg_down");
    assert_eq!(reloaded[0].in_multiplexers.len(), 2);
    assert_eq!(reloaded[0].out_shift_regs.len(), 3);
}
