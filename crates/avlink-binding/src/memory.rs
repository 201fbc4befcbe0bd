use std::cell::Cell;

use tracing::debug;

use crate::registry::{
    CommandRef, CommandRegistry, DataKind, DataRef, DataRegistry, DataValue,
};

/// What was done to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    Begin,
    End,
    Once,
}

impl InvocationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::End => "end",
            Self::Once => "once",
        }
    }
}

/// One recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub path: String,
    pub kind: InvocationKind,
}

/// In-process command registry that records every invocation.
///
/// Used by tests and by the CLI monitor, which has no host simulator.
#[derive(Debug, Default)]
pub struct MemoryCommands {
    paths: Vec<String>,
    invocations: Vec<Invocation>,
    lookups: Cell<usize>,
}

impl MemoryCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that knows the given command paths.
    pub fn with_commands<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for path in paths {
            registry.register(path);
        }
        registry
    }

    /// Make `path` resolvable. Registering twice returns the same handle.
    pub fn register(&mut self, path: impl Into<String>) -> CommandRef {
        let path = path.into();
        if let Some(index) = self.paths.iter().position(|p| *p == path) {
            return CommandRef(index as u64);
        }
        self.paths.push(path);
        CommandRef((self.paths.len() - 1) as u64)
    }

    /// Every invocation so far, oldest first.
    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    /// Remove and return the recorded invocations.
    pub fn take_invocations(&mut self) -> Vec<Invocation> {
        std::mem::take(&mut self.invocations)
    }

    /// Number of recorded invocations of `kind` on `path`.
    pub fn count(&self, path: &str, kind: InvocationKind) -> usize {
        self.invocations
            .iter()
            .filter(|inv| inv.path == path && inv.kind == kind)
            .count()
    }

    /// Number of `find` calls served.
    pub fn lookup_count(&self) -> usize {
        self.lookups.get()
    }

    fn record(&mut self, command: CommandRef, kind: InvocationKind) {
        let Some(path) = usize::try_from(command.0)
            .ok()
            .and_then(|index| self.paths.get(index))
        else {
            return;
        };
        debug!(path = %path, kind = kind.as_str(), "command invoked");
        self.invocations.push(Invocation {
            path: path.clone(),
            kind,
        });
    }
}

impl CommandRegistry for MemoryCommands {
    fn find(&self, path: &str) -> Option<CommandRef> {
        self.lookups.set(self.lookups.get() + 1);
        self.paths
            .iter()
            .position(|p| p == path)
            .map(|index| CommandRef(index as u64))
    }

    fn begin(&mut self, command: CommandRef) {
        self.record(command, InvocationKind::Begin);
    }

    fn end(&mut self, command: CommandRef) {
        self.record(command, InvocationKind::End);
    }

    fn once(&mut self, command: CommandRef) {
        self.record(command, InvocationKind::Once);
    }
}

/// In-process data registry holding one typed value per path.
#[derive(Debug, Default)]
pub struct MemoryData {
    entries: Vec<(String, DataValue)>,
    lookups: Cell<usize>,
}

impl MemoryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update the value at `path`. The kind of the first value
    /// set is kept; later values are converted to it.
    pub fn set(&mut self, path: impl Into<String>, value: DataValue) -> DataRef {
        let path = path.into();
        if let Some(index) = self.entries.iter().position(|(p, _)| *p == path) {
            let slot = &mut self.entries[index].1;
            *slot = value.to_kind(slot.kind());
            return DataRef(index as u64);
        }
        self.entries.push((path, value));
        DataRef((self.entries.len() - 1) as u64)
    }

    /// Current value at `path`.
    pub fn get(&self, path: &str) -> Option<DataValue> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, value)| *value)
    }

    /// Number of `find` calls served.
    pub fn lookup_count(&self) -> usize {
        self.lookups.get()
    }
}

impl DataRegistry for MemoryData {
    fn find(&self, path: &str) -> Option<(DataRef, DataKind)> {
        self.lookups.set(self.lookups.get() + 1);
        self.entries
            .iter()
            .position(|(p, _)| p == path)
            .map(|index| (DataRef(index as u64), self.entries[index].1.kind()))
    }

    fn read(&self, data: DataRef, kind: DataKind) -> Option<DataValue> {
        let index = usize::try_from(data.0).ok()?;
        self.entries
            .get(index)
            .map(|(_, value)| value.to_kind(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_record_invocations() {
        let mut commands = MemoryCommands::with_commands(["sim/a", "sim/b"]);
        let b = commands.find("sim/b").unwrap();
        assert_eq!(commands.register("sim/b"), b);

        commands.begin(b);
        commands.once(b);
        commands.end(b);
        commands.once(CommandRef(99));

        let kinds: Vec<InvocationKind> = commands.invocations().iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![InvocationKind::Begin, InvocationKind::Once, InvocationKind::End]
        );
        assert_eq!(commands.take_invocations().len(), 3);
        assert!(commands.invocations().is_empty());
        assert_eq!(commands.find("sim/c"), None);
        assert_eq!(commands.lookup_count(), 2);
    }

    #[test]
    fn data_keeps_first_kind() {
        let mut data = MemoryData::new();
        let handle = data.set("sim/flaps", DataValue::Int(2));
        data.set("sim/flaps", DataValue::Double(3.7));
        assert_eq!(data.get("sim/flaps"), Some(DataValue::Int(3)));
        assert_eq!(data.find("sim/flaps"), Some((handle, DataKind::Int)));
        assert_eq!(
            data.read(handle, DataKind::Float),
            Some(DataValue::Float(3.0))
        );
        assert_eq!(data.read(DataRef(5), DataKind::Int), None);
    }
}
