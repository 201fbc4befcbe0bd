use tracing::debug;

use crate::registry::{CommandRef, CommandRegistry, DataKind, DataRef, DataRegistry, DataValue};

/// A symbolic path with a lazily resolved, cached handle.
///
/// Lookups run only while the binding is marked for resolution. Both
/// outcomes are cached: a failed lookup is not retried until
/// [`PathBinding::set_path`] or [`PathBinding::invalidate`] re-arms it.
/// An empty path never resolves and never reaches the registry.
#[derive(Debug, Clone)]
pub struct PathBinding<H> {
    path: String,
    handle: Option<H>,
    needs_resolution: bool,
}

impl<H: Copy> Default for PathBinding<H> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<H: Copy> PathBinding<H> {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handle: None,
            needs_resolution: true,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Change the path. The cached handle is dropped immediately.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
        self.invalidate();
    }

    /// Drop the cached handle and look the path up again on next use.
    pub fn invalidate(&mut self) {
        self.handle = None;
        self.needs_resolution = true;
    }

    pub fn needs_resolution(&self) -> bool {
        self.needs_resolution
    }

    /// Whether the last lookup succeeded.
    pub fn is_resolved(&self) -> bool {
        !self.needs_resolution && self.handle.is_some()
    }

    /// Cached handle, if resolved.
    pub fn handle(&self) -> Option<H> {
        self.handle
    }

    /// Resolve with `lookup` if needed and return the cached handle.
    pub fn resolve(&mut self, lookup: impl FnOnce(&str) -> Option<H>) -> Option<H> {
        if self.needs_resolution {
            self.handle = if self.path.is_empty() {
                None
            } else {
                lookup(&self.path)
            };
            self.needs_resolution = false;
            debug!(
                path = %self.path,
                resolved = self.handle.is_some(),
                "resolved binding"
            );
        }
        self.handle
    }
}

/// Binding to a host command.
///
/// Tracks whether the command is currently held so that `begin` and `end`
/// reach the host at most once per transition.
#[derive(Debug, Clone, Default)]
pub struct CommandBinding {
    target: PathBinding<CommandRef>,
    active: bool,
}

impl CommandBinding {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            target: PathBinding::new(path),
            active: false,
        }
    }

    pub fn path(&self) -> &str {
        self.target.path()
    }

    /// Change the command path. A held command is ended first.
    pub fn set_path(&mut self, path: impl Into<String>, commands: &mut dyn CommandRegistry) {
        self.release(commands);
        self.target.set_path(path);
    }

    /// Look the path up again on next use. A held command is ended first.
    pub fn invalidate(&mut self, commands: &mut dyn CommandRegistry) {
        self.release(commands);
        self.target.invalidate();
    }

    pub fn needs_resolution(&self) -> bool {
        self.target.needs_resolution()
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_resolved()
    }

    /// Whether the command is currently held.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle(&self) -> Option<CommandRef> {
        self.target.handle()
    }

    /// Resolve the path if needed. Returns whether a handle is available.
    pub fn resolve(&mut self, commands: &dyn CommandRegistry) -> bool {
        self.target.resolve(|path| commands.find(path)).is_some()
    }

    /// Start holding the command. Returns whether the host was called.
    pub fn begin(&mut self, commands: &mut dyn CommandRegistry) -> bool {
        if self.active {
            return false;
        }
        let Some(command) = self.target.resolve(|path| commands.find(path)) else {
            return false;
        };
        commands.begin(command);
        self.active = true;
        true
    }

    /// Stop holding the command. Returns whether the host was called.
    pub fn end(&mut self, commands: &mut dyn CommandRegistry) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        match self.target.handle() {
            Some(command) => {
                commands.end(command);
                true
            }
            None => false,
        }
    }

    /// Trigger the command once. Returns whether the host was called.
    pub fn once(&mut self, commands: &mut dyn CommandRegistry) -> bool {
        let Some(command) = self.target.resolve(|path| commands.find(path)) else {
            return false;
        };
        commands.once(command);
        true
    }

    /// End the command if it is held.
    pub fn release(&mut self, commands: &mut dyn CommandRegistry) -> bool {
        self.end(commands)
    }
}

/// Binding to a host data reference.
#[derive(Debug, Clone, Default)]
pub struct DataBinding {
    target: PathBinding<(DataRef, DataKind)>,
}

impl DataBinding {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            target: PathBinding::new(path),
        }
    }

    pub fn path(&self) -> &str {
        self.target.path()
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.target.set_path(path);
    }

    pub fn invalidate(&mut self) {
        self.target.invalidate();
    }

    pub fn needs_resolution(&self) -> bool {
        self.target.needs_resolution()
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_resolved()
    }

    /// Numeric kind reported by the host; `None` while unresolved.
    pub fn kind(&self) -> Option<DataKind> {
        self.target.handle().map(|(_, kind)| kind)
    }

    /// Resolve the path if needed. Returns whether a handle is available.
    pub fn resolve(&mut self, data: &dyn DataRegistry) -> bool {
        self.target.resolve(|path| data.find(path)).is_some()
    }

    /// Resolve if needed and read the current value.
    pub fn read(&mut self, data: &dyn DataRegistry) -> Option<DataValue> {
        let (handle, kind) = self.target.resolve(|path| data.find(path))?;
        data.read(handle, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InvocationKind, MemoryCommands, MemoryData};

    #[test]
    fn begin_is_idempotent() {
        let mut commands = MemoryCommands::with_commands(["sim/gear/toggle"]);
        let mut binding = CommandBinding::new("sim/gear/toggle");

        assert!(binding.begin(&mut commands));
        assert!(!binding.begin(&mut commands));
        assert!(binding.is_active());
        assert_eq!(commands.count("sim/gear/toggle", InvocationKind::Begin), 1);

        assert!(binding.end(&mut commands));
        assert!(!binding.end(&mut commands));
        assert_eq!(commands.count("sim/gear/toggle", InvocationKind::End), 1);
    }

    #[test]
    fn failed_lookup_is_not_retried_until_path_changes() {
        let mut commands = MemoryCommands::new();
        let mut binding = CommandBinding::new("sim/missing");

        for _ in 0..5 {
            assert!(!binding.once(&mut commands));
            assert!(!binding.begin(&mut commands));
        }
        assert_eq!(commands.lookup_count(), 1);
        assert!(!binding.is_resolved());
        assert!(!binding.needs_resolution());
        assert!(commands.invocations().is_empty());

        commands.register("sim/present");
        binding.set_path("sim/present", &mut commands);
        assert!(binding.needs_resolution());
        assert!(binding.once(&mut commands));
        assert_eq!(commands.lookup_count(), 2);
    }

    #[test]
    fn changing_path_ends_held_command() {
        let mut commands = MemoryCommands::with_commands(["a", "b"]);
        let mut binding = CommandBinding::new("a");
        binding.begin(&mut commands);

        binding.set_path("b", &mut commands);
        assert!(!binding.is_active());
        assert!(binding.handle().is_none());
        assert_eq!(commands.count("a", InvocationKind::End), 1);
    }

    #[test]
    fn invalidating_ends_held_command() {
        let mut commands = MemoryCommands::with_commands(["sim/ap"]);
        let mut binding = CommandBinding::new("sim/ap");
        assert!(binding.begin(&mut commands));

        binding.invalidate(&mut commands);
        assert!(!binding.is_active());
        assert!(binding.needs_resolution());
        assert!(!binding.end(&mut commands));
        assert_eq!(commands.count("sim/ap", InvocationKind::End), 1);

        assert!(binding.begin(&mut commands));
        assert_eq!(commands.count("sim/ap", InvocationKind::Begin), 2);
        assert_eq!(commands.lookup_count(), 2);
    }

    #[test]
    fn empty_path_never_reaches_registry() {
        let mut commands = MemoryCommands::with_commands([""]);
        let mut binding = CommandBinding::default();
        assert!(!binding.once(&mut commands));
        assert_eq!(commands.lookup_count(), 0);
    }

    #[test]
    fn data_binding_reads_by_kind() {
        let mut data = MemoryData::new();
        data.set("sim/gear/ratio", DataValue::Float(0.5));
        let mut binding = DataBinding::new("sim/gear/ratio");

        assert_eq!(binding.kind(), None);
        assert_eq!(binding.read(&data), Some(DataValue::Float(0.5)));
        assert_eq!(binding.kind(), Some(DataKind::Float));

        data.set("sim/gear/ratio", DataValue::Float(1.0));
        assert_eq!(binding.read(&data), Some(DataValue::Float(1.0)));
        assert_eq!(data.lookup_count(), 1);
    }

    #[test]
    fn unresolved_data_reads_nothing() {
        let data = MemoryData::new();
        let mut binding = DataBinding::new("sim/nope");
        for _ in 0..3 {
            assert_eq!(binding.read(&data), None);
        }
        assert_eq!(binding.kind(), None);
        assert_eq!(data.lookup_count(), 1);

        binding.invalidate();
        assert!(binding.needs_resolution());
    }
}
