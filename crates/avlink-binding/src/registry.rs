/// Opaque handle to a host command, issued by a [`CommandRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandRef(pub u64);

/// Opaque handle to a host data reference, issued by a [`DataRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataRef(pub u64);

/// Numeric representation of a host data reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Int,
    Float,
    Double,
}

/// A typed value read from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataValue {
    Int(i32),
    Float(f32),
    Double(f64),
}

impl DataValue {
    pub fn kind(self) -> DataKind {
        match self {
            Self::Int(_) => DataKind::Int,
            Self::Float(_) => DataKind::Float,
            Self::Double(_) => DataKind::Double,
        }
    }

    /// Value as single precision, the precision outputs are computed in.
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Int(v) => v as f32,
            Self::Float(v) => v,
            Self::Double(v) => v as f32,
        }
    }

    /// Integer value; floating-point values are truncated toward zero.
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Int(v) => i64::from(v),
            Self::Float(v) => v as i64,
            Self::Double(v) => v as i64,
        }
    }

    /// Convert to the representation of `kind`.
    pub fn to_kind(self, kind: DataKind) -> Self {
        match kind {
            DataKind::Int => Self::Int(self.as_i64() as i32),
            DataKind::Float => Self::Float(self.as_f32()),
            DataKind::Double => Self::Double(match self {
                Self::Int(v) => f64::from(v),
                Self::Float(v) => f64::from(v),
                Self::Double(v) => v,
            }),
        }
    }
}

/// Host command capability.
pub trait CommandRegistry {
    /// Look up a command by path.
    fn find(&self, path: &str) -> Option<CommandRef>;

    /// Start a held command.
    fn begin(&mut self, command: CommandRef);

    /// Stop a held command.
    fn end(&mut self, command: CommandRef);

    /// Trigger a command once.
    fn once(&mut self, command: CommandRef);
}

/// Host data capability.
pub trait DataRegistry {
    /// Look up a data reference by path, along with its numeric kind.
    fn find(&self, path: &str) -> Option<(DataRef, DataKind)>;

    /// Read the current value as `kind`. `None` when the handle is stale.
    fn read(&self, data: DataRef, kind: DataKind) -> Option<DataValue>;
}

/// The host capabilities a device needs during one update.
pub struct Host<'a> {
    pub commands: &'a mut dyn CommandRegistry,
    pub data: &'a dyn DataRegistry,
}

impl<'a> Host<'a> {
    pub fn new(commands: &'a mut dyn CommandRegistry, data: &'a dyn DataRegistry) -> Self {
        Self { commands, data }
    }
}

impl std::fmt::Debug for Host<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversions() {
        assert_eq!(DataValue::Double(2.75).as_i64(), 2);
        assert_eq!(DataValue::Float(-1.5).as_i64(), -1);
        assert_eq!(DataValue::Int(3).as_f32(), 3.0);
        assert_eq!(DataValue::Float(0.5).to_kind(DataKind::Double), DataValue::Double(0.5));
        assert_eq!(DataValue::Double(7.9).to_kind(DataKind::Int), DataValue::Int(7));
        assert_eq!(DataValue::Int(4).kind(), DataKind::Int);
    }
}
