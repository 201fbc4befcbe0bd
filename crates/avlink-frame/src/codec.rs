use std::fmt::Write as _;

use bytes::{BufMut, BytesMut};

use crate::commands::command_name;
use crate::session::Session;

/// Separates the id and arguments of a frame.
pub const ARG_SEPARATOR: u8 = b',';

/// Ends a frame.
pub const FRAME_TERMINATOR: u8 = b';';

/// One decoded (or to-be-encoded) command.
///
/// Arguments are kept in their wire form. String arguments are not escaped:
/// a value containing `,` or `;` will split into several tokens on the
/// receiving side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub id: i16,
    pub args: Vec<String>,
}

impl CommandFrame {
    /// Frame with no arguments.
    pub fn new(id: i16) -> Self {
        Self {
            id,
            args: Vec::new(),
        }
    }

    /// Append an integer argument.
    pub fn with_int(mut self, value: i16) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Append a boolean argument.
    pub fn with_bool(mut self, value: bool) -> Self {
        self.args.push(if value { "true" } else { "false" }.to_string());
        self
    }

    /// Append a string argument.
    pub fn with_str(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Integer value of argument `index`; absent or empty reads as `None`.
    pub fn int_arg(&self, index: usize) -> Option<i16> {
        self.args
            .get(index)
            .filter(|arg| !arg.is_empty())
            .map(|arg| parse_int(arg.as_bytes()))
    }

    /// Boolean value of argument `index`.
    pub fn bool_arg(&self, index: usize) -> Option<bool> {
        self.args
            .get(index)
            .filter(|arg| !arg.is_empty())
            .map(|arg| parse_bool(arg.as_bytes()))
    }

    /// String argument `index`.
    pub fn str_arg(&self, index: usize) -> Option<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .filter(|arg| !arg.is_empty())
    }

    /// Human-readable command name.
    pub fn name(&self) -> &'static str {
        command_name(self.id)
    }

    /// Queue this frame on a session's egress.
    pub fn encode_into(&self, session: &mut Session) {
        session.send(self);
    }
}

impl std::fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)?;
        for arg in &self.args {
            write!(f, ",{arg}")?;
        }
        f.write_char(FRAME_TERMINATOR as char)
    }
}

/// Append the wire form of `frame` to `dst`.
pub fn encode_frame(frame: &CommandFrame, dst: &mut BytesMut) {
    let mut len = 1 + frame.args.len();
    len += frame.args.iter().map(String::len).sum::<usize>();
    dst.reserve(len + 6);
    put_int(dst, frame.id);
    for arg in &frame.args {
        dst.put_u8(ARG_SEPARATOR);
        dst.put_slice(arg.as_bytes());
    }
    dst.put_u8(FRAME_TERMINATOR);
}

/// Decode one complete frame body (without its terminator).
///
/// Returns `None` for an empty frame (no id token).
pub fn parse_frame(body: &[u8]) -> Option<CommandFrame> {
    let mut tokens = body.split(|&b| b == ARG_SEPARATOR).map(<[u8]>::trim_ascii);
    let id = tokens.next().filter(|token| !token.is_empty())?;
    Some(CommandFrame {
        id: parse_int(id),
        args: tokens
            .map(|token| String::from_utf8_lossy(token).into_owned())
            .collect(),
    })
}

/// Position of the first frame terminator in `buf`.
pub fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == FRAME_TERMINATOR)
}

/// Parse a decimal integer token.
///
/// Accepts an optional sign followed by digits and stops at the first
/// non-digit. A token with no leading digits reads as `0`. Values are
/// truncated to 16 bits.
pub fn parse_int(token: &[u8]) -> i16 {
    let token = token.trim_ascii();
    let (negative, digits) = match token.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, token),
    };
    let mut value: i64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
    }
    if negative {
        value = -value;
    }
    value as i16
}

/// Parse a boolean token: exactly `true` is true, anything else is false.
pub fn parse_bool(token: &[u8]) -> bool {
    token.trim_ascii() == b"true"
}

pub(crate) fn put_int(dst: &mut BytesMut, value: i16) {
    // Writing into BytesMut grows the buffer and cannot fail.
    let _ = write!(dst, "{value}");
}
