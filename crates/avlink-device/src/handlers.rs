use avlink_binding::Host;
use avlink_frame::commands::{BUTTON_CHANGE, DIG_IN_MUX_CHANGE, ENCODER_CHANGE, INFO};
use avlink_frame::COMMAND_TABLE_SIZE;
use tracing::debug;

use crate::device::Device;

/// Handler for one inbound command id.
///
/// Called with the session cursor positioned after the id; arguments are
/// read with the `next_*` methods of [`Device::session_mut`]. Whatever the
/// handler leaves unread is skipped afterwards.
pub type Handler = fn(&mut Device, &mut Host<'_>);

/// Dispatch table indexed by command id.
pub(crate) type HandlerTable = [Option<Handler>; COMMAND_TABLE_SIZE];

/// Table with the handlers every device needs.
pub(crate) fn builtin_table() -> HandlerTable {
    let mut table: HandlerTable = [None; COMMAND_TABLE_SIZE];
    table[INFO as usize] = Some(on_info);
    table[ENCODER_CHANGE as usize] = Some(on_encoder_change);
    table[BUTTON_CHANGE as usize] = Some(on_button_change);
    table[DIG_IN_MUX_CHANGE as usize] = Some(on_mux_change);
    table
}

/// `Info`: board type, name, serial, firmware version.
fn on_info(device: &mut Device, _host: &mut Host<'_>) {
    let session = device.session_mut();
    let board = session.next_str().unwrap_or_default();
    let name = session.next_str();
    let serial = session.next_str();
    let version = session.next_str().unwrap_or_default();
    device.identify(&board, name, serial, &version);
}

/// `EncoderChange`: name, event.
fn on_encoder_change(device: &mut Device, host: &mut Host<'_>) {
    let session = device.session_mut();
    let (Some(name), Some(event)) = (session.next_str(), session.next_int()) else {
        return;
    };
    match device.find_encoder_mut(&name) {
        Some(encoder) => {
            encoder.handle_event(event, &mut *host.commands);
        }
        None => debug!(name = %name, "event for unknown encoder"),
    }
}

/// `ButtonChange`: name, state.
fn on_button_change(device: &mut Device, host: &mut Host<'_>) {
    let session = device.session_mut();
    let (Some(name), Some(state)) = (session.next_str(), session.next_int()) else {
        return;
    };
    match device.find_button_mut(&name) {
        Some(button) => {
            button.handle_event(state, &mut *host.commands);
        }
        None => debug!(name = %name, "event for unknown button"),
    }
}

/// `DigInMuxChange`: name, pin, state.
fn on_mux_change(device: &mut Device, host: &mut Host<'_>) {
    let session = device.session_mut();
    let (Some(name), Some(pin), Some(state)) =
        (session.next_str(), session.next_int(), session.next_int())
    else {
        return;
    };
    match device.find_multiplexer_mut(&name) {
        Some(mux) => {
            mux.handle_event(pin, state, &mut *host.commands);
        }
        None => debug!(name = %name, "event for unknown multiplexer"),
    }
}
