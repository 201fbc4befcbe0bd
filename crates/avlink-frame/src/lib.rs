//! Text command framing for MobiFlight-compatible peripherals.
//!
//! Every message on the wire is one ASCII frame:
//! ```text
//! <id>(,<arg>)*;
//! ```
//! - `id` is a signed 16-bit decimal command id
//! - `arg` is a decimal integer, `true`/`false`, or a raw string
//! - whitespace between tokens is skipped on decode
//!
//! Partial reads are handled by [`Session`]: bytes accumulate until a
//! terminator arrives, and nothing is discarded while a frame is incomplete.

pub mod codec;
pub mod commands;
pub mod error;
pub mod reader;
pub mod session;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{encode_frame, parse_frame, CommandFrame, ARG_SEPARATOR, FRAME_TERMINATOR};
pub use commands::{command_name, table_index, COMMAND_TABLE_SIZE, MAX_PINS, PIN_LIST_SEPARATOR, PWM_MAX_DUTY};
pub use error::{FrameError, Result};
pub use reader::{pump, READ_CHUNK_SIZE};
pub use session::Session;
pub use writer::flush;

#[cfg(feature = "async")]
pub use async_codec::CommandCodec;
