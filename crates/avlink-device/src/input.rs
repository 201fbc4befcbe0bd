use std::fmt;

use avlink_binding::{CommandBinding, CommandRegistry};
use avlink_frame::MAX_PINS;
use tracing::debug;

use crate::error::{DeviceError, Result};

/// Input entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Encoder,
    Button,
    Multiplexer,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Encoder => "encoder",
            Self::Button => "button",
            Self::Multiplexer => "multiplexer",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Self::Encoder => "encoders",
            Self::Button => "buttons",
            Self::Multiplexer => "multiplexers",
        }
    }

    /// Label used for default comments ("Encoder #3").
    pub fn label(self) -> &'static str {
        match self {
            Self::Encoder => "Encoder",
            Self::Button => "Button",
            Self::Multiplexer => "Multiplexer",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rotary encoder: one command per direction.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    pub(crate) name: String,
    pub comment: String,
    up: CommandBinding,
    down: CommandBinding,
}

impl Encoder {
    pub(crate) fn with_comment(comment: String) -> Self {
        Self {
            comment,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn up(&self) -> &CommandBinding {
        &self.up
    }

    pub fn down(&self) -> &CommandBinding {
        &self.down
    }

    pub fn set_up(&mut self, path: impl Into<String>, commands: &mut dyn CommandRegistry) {
        self.up.set_path(path, commands);
    }

    pub fn set_down(&mut self, path: impl Into<String>, commands: &mut dyn CommandRegistry) {
        self.down.set_path(path, commands);
    }

    /// Replace both bindings. Only for encoders that hold nothing.
    pub(crate) fn bind(&mut self, up: &str, down: &str) {
        self.up = CommandBinding::new(up);
        self.down = CommandBinding::new(down);
    }

    /// Handle an encoder event code.
    ///
    /// `0` and `1` (fast and slow left turns) trigger `down` once, `2` and
    /// `3` trigger `up` once. Other codes are ignored. Returns whether the
    /// host was called.
    pub fn handle_event(&mut self, event: i16, commands: &mut dyn CommandRegistry) -> bool {
        match event {
            0 | 1 => self.down.once(commands),
            2 | 3 => self.up.once(commands),
            _ => {
                debug!(name = %self.name, event, "ignoring encoder event");
                false
            }
        }
    }
}

/// Momentary button: held while pressed.
#[derive(Debug, Clone, Default)]
pub struct Button {
    pub(crate) name: String,
    pub comment: String,
    command: CommandBinding,
}

impl Button {
    pub(crate) fn with_comment(comment: String) -> Self {
        Self {
            comment,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &CommandBinding {
        &self.command
    }

    /// Bind to a command path. A held command is ended first.
    pub fn set_command(&mut self, path: impl Into<String>, commands: &mut dyn CommandRegistry) {
        self.command.set_path(path, commands);
    }

    /// Replace the binding. Only for buttons that hold nothing.
    pub(crate) fn bind(&mut self, path: &str) {
        self.command = CommandBinding::new(path);
    }

    /// Handle a button state: `1` begins the command, `0` ends it, anything
    /// else is ignored.
    pub fn handle_event(&mut self, state: i16, commands: &mut dyn CommandRegistry) -> bool {
        match state {
            1 => self.command.begin(commands),
            0 => self.command.end(commands),
            _ => false,
        }
    }
}

/// Digital input multiplexer: one held command per pin.
#[derive(Debug, Clone, Default)]
pub struct Multiplexer {
    pub(crate) name: String,
    pub comment: String,
    pins: Vec<CommandBinding>,
}

impl Multiplexer {
    pub(crate) fn with_comment(comment: String) -> Self {
        Self {
            comment,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of configured pins (highest configured index + 1).
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn pin(&self, pin: usize) -> Option<&CommandBinding> {
        self.pins.get(pin)
    }

    pub fn pin_mut(&mut self, pin: usize) -> Option<&mut CommandBinding> {
        self.pins.get_mut(pin)
    }

    pub fn pins(&self) -> impl Iterator<Item = (usize, &CommandBinding)> {
        self.pins.iter().enumerate()
    }

    /// Bind `pin` to a command path, growing the pin list as needed.
    ///
    /// A held command on that pin is ended first.
    pub fn set_pin(
        &mut self,
        pin: usize,
        path: impl Into<String>,
        commands: &mut dyn CommandRegistry,
    ) -> Result<&mut CommandBinding> {
        if pin >= MAX_PINS {
            return Err(DeviceError::PinOutOfRange { pin, max: MAX_PINS });
        }
        if pin >= self.pins.len() {
            self.pins.resize_with(pin + 1, CommandBinding::default);
        }
        let binding = &mut self.pins[pin];
        binding.set_path(path, commands);
        Ok(binding)
    }

    /// Replace the binding on `pin` without ending the old one. Only for
    /// multiplexers that hold nothing, such as ones built from a file.
    pub(crate) fn bind_pin(&mut self, pin: usize, path: String) -> Result<()> {
        if pin >= MAX_PINS {
            return Err(DeviceError::PinOutOfRange { pin, max: MAX_PINS });
        }
        if pin >= self.pins.len() {
            self.pins.resize_with(pin + 1, CommandBinding::default);
        }
        self.pins[pin] = CommandBinding::new(path);
        Ok(())
    }

    /// Handle a (pin, state) event. Unknown pins and states are ignored.
    pub fn handle_event(
        &mut self,
        pin: i16,
        state: i16,
        commands: &mut dyn CommandRegistry,
    ) -> bool {
        let Some(binding) = usize::try_from(pin)
            .ok()
            .filter(|&pin| pin < MAX_PINS)
            .and_then(|pin| self.pins.get_mut(pin))
        else {
            debug!(name = %self.name, pin, "ignoring multiplexer pin");
            return false;
        };
        match state {
            1 => binding.begin(commands),
            0 => binding.end(commands),
            _ => false,
        }
    }
}

/// An input entity.
#[derive(Debug, Clone)]
pub enum Input {
    Encoder(Encoder),
    Button(Button),
    Multiplexer(Multiplexer),
}

impl Input {
    pub fn kind(&self) -> InputKind {
        match self {
            Self::Encoder(_) => InputKind::Encoder,
            Self::Button(_) => InputKind::Button,
            Self::Multiplexer(_) => InputKind::Multiplexer,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Encoder(e) => &e.name,
            Self::Button(b) => &b.name,
            Self::Multiplexer(m) => &m.name,
        }
    }

    pub fn comment(&self) -> &str {
        match self {
            Self::Encoder(e) => &e.comment,
            Self::Button(b) => &b.comment,
            Self::Multiplexer(m) => &m.comment,
        }
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        let comment = comment.into();
        match self {
            Self::Encoder(e) => e.comment = comment,
            Self::Button(b) => b.comment = comment,
            Self::Multiplexer(m) => m.comment = comment,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        match self {
            Self::Encoder(e) => e.name = name,
            Self::Button(b) => b.name = name,
            Self::Multiplexer(m) => m.name = name,
        }
    }

    /// All command bindings of this input.
    pub fn bindings(&self) -> Vec<&CommandBinding> {
        match self {
            Self::Encoder(e) => vec![&e.up, &e.down],
            Self::Button(b) => vec![&b.command],
            Self::Multiplexer(m) => m.pins.iter().collect(),
        }
    }

    fn bindings_mut(&mut self) -> Vec<&mut CommandBinding> {
        match self {
            Self::Encoder(e) => vec![&mut e.up, &mut e.down],
            Self::Button(b) => vec![&mut b.command],
            Self::Multiplexer(m) => m.pins.iter_mut().collect(),
        }
    }

    /// Resolve every binding whose path changed since the last lookup.
    pub fn resolve(&mut self, commands: &dyn CommandRegistry) {
        for binding in self.bindings_mut() {
            if binding.needs_resolution() {
                binding.resolve(commands);
            }
        }
    }

    /// End every held command. Returns how many were ended.
    pub fn release(&mut self, commands: &mut dyn CommandRegistry) -> usize {
        let mut released = 0;
        for binding in self.bindings_mut() {
            if binding.release(commands) {
                released += 1;
            }
        }
        released
    }

    pub fn as_encoder(&self) -> Option<&Encoder> {
        match self {
            Self::Encoder(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_button(&self) -> Option<&Button> {
        match self {
            Self::Button(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_multiplexer(&self) -> Option<&Multiplexer> {
        match self {
            Self::Multiplexer(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use avlink_binding::{InvocationKind, MemoryCommands};

    use super::*;

    #[test]
    fn encoder_coarsens_speeds() {
        let mut commands = MemoryCommands::with_commands(["up", "dn"]);
        let mut encoder = Encoder {
            name: "hdg".into(),
            up: CommandBinding::new("up"),
            down: CommandBinding::new("dn"),
            ..Encoder::default()
        };
        for event in [0, 1, 2, 3, 7, -1] {
            encoder.handle_event(event, &mut commands);
        }
        assert_eq!(commands.count("dn", InvocationKind::Once), 2);
        assert_eq!(commands.count("up", InvocationKind::Once), 2);
        assert_eq!(commands.invocations().len(), 4);
    }

    #[test]
    fn button_ignores_out_of_range_states() {
        let mut commands = MemoryCommands::with_commands(["ap"]);
        let mut button = Button {
            name: "ap".into(),
            command: CommandBinding::new("ap"),
            ..Button::default()
        };
        assert!(!button.handle_event(2, &mut commands));
        assert!(button.handle_event(1, &mut commands));
        assert!(!button.handle_event(1, &mut commands));
        assert!(button.handle_event(0, &mut commands));
        assert_eq!(commands.invocations().len(), 2);
    }

    #[test]
    fn rebinding_a_held_button_ends_the_old_command() {
        let mut commands = MemoryCommands::with_commands(["sim/ap", "sim/b"]);
        let mut button = Button::with_comment(String::new());
        button.set_command("sim/ap", &mut commands);
        assert!(button.handle_event(1, &mut commands));

        button.set_command("sim/b", &mut commands);
        assert_eq!(commands.count("sim/ap", InvocationKind::End), 1);
        assert!(!button.command().is_active());
        assert_eq!(button.command().path(), "sim/b");

        let mut input = Input::Button(button);
        assert_eq!(input.release(&mut commands), 0);
        assert_eq!(commands.count("sim/b", InvocationKind::End), 0);
    }

    #[test]
    fn rebinding_encoder_directions() {
        let mut commands = MemoryCommands::with_commands(["up", "dn"]);
        let mut encoder = Encoder::default();
        encoder.set_up("up", &mut commands);
        encoder.set_down("dn", &mut commands);
        assert_eq!(encoder.up().path(), "up");
        assert_eq!(encoder.down().path(), "dn");
        assert!(encoder.handle_event(3, &mut commands));
        assert_eq!(commands.count("up", InvocationKind::Once), 1);
    }

    #[test]
    fn multiplexer_pins() {
        let mut commands = MemoryCommands::with_commands(["beacon", "strobe"]);
        let mut mux = Multiplexer::default();
        mux.set_pin(3, "beacon", &mut commands).unwrap();
        assert_eq!(mux.pin_count(), 4);
        assert_eq!(mux.pin(0).unwrap().path(), "");
        assert!(matches!(
            mux.set_pin(16, "strobe", &mut commands),
            Err(DeviceError::PinOutOfRange { pin: 16, .. })
        ));

        assert!(mux.handle_event(3, 1, &mut commands));
        assert!(!mux.handle_event(0, 1, &mut commands));
        assert!(!mux.handle_event(15, 1, &mut commands));
        assert!(!mux.handle_event(-2, 1, &mut commands));
        assert_eq!(commands.count("beacon", InvocationKind::Begin), 1);
    }

    #[test]
    fn release_ends_held_commands_once() {
        let mut commands = MemoryCommands::with_commands(["a", "b"]);
        let mut mux = Multiplexer::default();
        mux.set_pin(0, "a", &mut commands).unwrap();
        mux.set_pin(1, "b", &mut commands).unwrap();
        mux.handle_event(0, 1, &mut commands);
        mux.handle_event(1, 1, &mut commands);

        let mut input = Input::Multiplexer(mux);
        assert_eq!(input.release(&mut commands), 2);
        assert_eq!(input.release(&mut commands), 0);
        assert_eq!(commands.count("a", InvocationKind::End), 1);
        assert_eq!(commands.count("b", InvocationKind::End), 1);
    }
}
