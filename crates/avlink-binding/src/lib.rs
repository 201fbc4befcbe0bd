//! Bindings between peripheral concepts and host-side commands and data.
//!
//! A binding names a host object by path and resolves it to an opaque handle
//! the first time it is needed. The handle is cached; a failed lookup is
//! cached too and only retried after the path is edited.
//!
//! The host is reached through two capabilities:
//! - [`CommandRegistry`]: find a command, then begin/end/trigger it
//! - [`DataRegistry`]: find a data reference and read its typed value

pub mod error;
pub mod memory;
pub mod ops;
pub mod registry;
pub mod resolver;

pub use error::{BindingError, Result};
pub use memory::{Invocation, InvocationKind, MemoryCommands, MemoryData};
pub use ops::{Comparison, Modifier};
pub use registry::{
    CommandRef, CommandRegistry, DataKind, DataRef, DataRegistry, DataValue, Host,
};
pub use resolver::{CommandBinding, DataBinding, PathBinding};
