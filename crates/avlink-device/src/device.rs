use std::fmt;

use avlink_binding::{CommandRegistry, Host};
use avlink_frame::commands::{command_name, table_index, GET_INFO};
use avlink_frame::Session;
use avlink_transport::{PortConnector, Transport};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DeviceError, Result};
use crate::handlers::{builtin_table, Handler, HandlerTable};
use crate::input::Input;
use crate::output::Output;

/// Display name until the device answers `GetInfo`.
pub const PENDING_NAME: &str = "Fetching device name...";

/// Tunables for one device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Upper bound on frames dispatched per [`Device::update`].
    pub max_frames_per_tick: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            max_frames_per_tick: 32,
        }
    }
}

/// Connection state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    /// No transport.
    Disconnected,
    /// Transport open, identity not received yet.
    Connected,
    /// Identity received.
    Identified,
}

impl LinkState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Identified => "identified",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one [`Device::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Bytes read from the transport.
    pub received: usize,
    /// Frames handed to a handler.
    pub dispatched: usize,
    /// Bytes written to the transport.
    pub sent: usize,
    /// The transport failed and was dropped during this update.
    pub lost: bool,
}

/// One peripheral: its transport, protocol session, bindings and handler
/// table.
pub struct Device {
    pub(crate) address: String,
    name: String,
    serial: String,
    diag: String,
    identified: bool,
    transport: Option<Box<dyn Transport>>,
    session: Session,
    pub(crate) inputs: Vec<Input>,
    pub(crate) outputs: Vec<Output>,
    handlers: HandlerTable,
    config: DeviceConfig,
}

impl Device {
    /// Create a disconnected device for `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_config(address, DeviceConfig::default())
    }

    pub fn with_config(address: impl Into<String>, config: DeviceConfig) -> Self {
        Self {
            address: address.into(),
            name: PENDING_NAME.to_string(),
            serial: String::new(),
            diag: String::new(),
            identified: false,
            transport: None,
            session: Session::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            handlers: builtin_table(),
            config,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Name reported by the device, or [`PENDING_NAME`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serial number reported by the device (or remembered from config).
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn set_serial(&mut self, serial: impl Into<String>) {
        self.serial = serial.into();
    }

    /// Free-text status for display.
    pub fn diag(&self) -> &str {
        &self.diag
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn link_state(&self) -> LinkState {
        match (&self.transport, self.identified) {
            (None, _) => LinkState::Disconnected,
            (Some(_), false) => LinkState::Connected,
            (Some(_), true) => LinkState::Identified,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Protocol session, for handlers reading arguments and for queuing
    /// frames directly.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    // ----- lifecycle -----

    /// Open the transport if not already open.
    ///
    /// On success a `GetInfo` request and reset frames for every output are
    /// sent. On failure the device stays disconnected and [`Device::diag`]
    /// describes the error.
    pub fn try_connect(&mut self, connector: &mut dyn PortConnector) -> Result<()> {
        if self.transport.is_some() {
            return Ok(());
        }
        let transport = match connector.open(&self.address) {
            Ok(transport) => transport,
            Err(err) => {
                debug!(address = %self.address, error = %err, "connect failed");
                self.diag = format!("could not open {}: {err}", self.address);
                return Err(err.into());
            }
        };

        info!(address = %self.address, "device connected");
        self.transport = Some(transport);
        self.session.reset();
        self.identified = false;
        self.name = PENDING_NAME.to_string();
        self.diag.clear();

        self.session.begin(GET_INFO);
        self.session.commit();
        self.reset_outputs();
        if let Err(err) = self.flush() {
            self.drop_transport(&err);
            return Err(err);
        }
        Ok(())
    }

    /// Switch outputs off, release held inputs and close the transport.
    ///
    /// Returns the number of held commands that were ended.
    pub fn disconnect(&mut self, commands: &mut dyn CommandRegistry) -> usize {
        if self.transport.is_some() {
            self.reset_outputs();
            if let Err(err) = self.flush() {
                warn!(address = %self.address, error = %err, "failed to reset outputs");
            }
            info!(address = %self.address, "device disconnected");
        }
        self.transport = None;
        self.session.reset();
        self.identified = false;
        self.release_inputs(commands)
    }

    /// Point the device at a new address. The old connection is torn down;
    /// call [`Device::try_connect`] to open the new one.
    pub fn set_address(&mut self, address: impl Into<String>, commands: &mut dyn CommandRegistry) {
        self.disconnect(commands);
        self.address = address.into();
        self.name = PENDING_NAME.to_string();
        self.serial.clear();
        self.diag.clear();
    }

    /// Install a handler for `id`, returning the one it replaces.
    pub fn register_handler(&mut self, id: i16, handler: Handler) -> Result<Option<Handler>> {
        let slot = table_index(id).ok_or(DeviceError::HandlerOutOfRange(id))?;
        Ok(self.handlers[slot].replace(handler))
    }

    /// Remove the handler for `id`, returning it.
    pub fn unregister_handler(&mut self, id: i16) -> Result<Option<Handler>> {
        let slot = table_index(id).ok_or(DeviceError::HandlerOutOfRange(id))?;
        Ok(self.handlers[slot].take())
    }

    /// Run one tick: resolve inputs, read and dispatch frames, update
    /// outputs and flush.
    ///
    /// Does nothing while disconnected. A read or write failure drops the
    /// transport and ends every held command; outputs are left alone.
    pub fn update(&mut self, host: &mut Host<'_>) -> UpdateReport {
        let mut report = UpdateReport::default();
        if self.transport.is_none() {
            return report;
        }

        for input in &mut self.inputs {
            input.resolve(&*host.commands);
        }

        let read = match self.transport.as_mut() {
            Some(transport) => avlink_frame::pump(transport.as_mut(), &mut self.session),
            None => return report,
        };
        match read {
            Ok(n) => report.received = n,
            Err(err) => {
                self.lose(&DeviceError::from(err), &mut *host.commands);
                report.lost = true;
                return report;
            }
        }

        report.dispatched = self.dispatch(host);

        for output in &mut self.outputs {
            output.update(host.data, &mut self.session);
        }

        match self.flush() {
            Ok(n) => report.sent = n,
            Err(err) => {
                self.lose(&err, &mut *host.commands);
                report.lost = true;
            }
        }
        report
    }

    /// Queue reset frames for every output. Does nothing while
    /// disconnected. Returns the number of outputs reset.
    pub fn reset_outputs(&mut self) -> usize {
        if self.transport.is_none() {
            return 0;
        }
        for output in &mut self.outputs {
            output.reset(&mut self.session);
        }
        self.outputs.len()
    }

    /// Write queued frames to the transport.
    pub fn flush(&mut self) -> Result<usize> {
        match self.transport.as_mut() {
            Some(transport) => Ok(avlink_frame::flush(transport.as_mut(), &mut self.session)?),
            None => Err(DeviceError::NotConnected(self.address.clone())),
        }
    }

    /// End every held input command. Returns how many were ended.
    pub fn release_inputs(&mut self, commands: &mut dyn CommandRegistry) -> usize {
        self.inputs
            .iter_mut()
            .map(|input| input.release(commands))
            .sum()
    }

    pub(crate) fn identify(
        &mut self,
        board: &str,
        name: Option<String>,
        serial: Option<String>,
        version: &str,
    ) {
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(serial) = serial {
            self.serial = serial;
        }
        self.diag = format!("board {board}, firmware {version}");
        self.identified = true;
        info!(
            address = %self.address,
            name = %self.name,
            serial = %self.serial,
            "device identified"
        );
    }

    fn dispatch(&mut self, host: &mut Host<'_>) -> usize {
        let mut dispatched = 0;
        for _ in 0..self.config.max_frames_per_tick {
            let Some(id) = self.session.next_command() else {
                break;
            };
            match table_index(id).and_then(|slot| self.handlers[slot]) {
                Some(handler) => {
                    debug!(address = %self.address, id, command = command_name(id), "dispatching");
                    handler(self, host);
                    dispatched += 1;
                }
                None => debug!(address = %self.address, id, "no handler, skipping frame"),
            }
            self.session.skip_frame();
        }
        dispatched
    }

    fn lose(&mut self, err: &DeviceError, commands: &mut dyn CommandRegistry) {
        self.drop_transport(err);
        let released = self.release_inputs(commands);
        debug!(address = %self.address, released, "released held inputs");
    }

    fn drop_transport(&mut self, err: &DeviceError) {
        warn!(address = %self.address, error = %err, "device lost");
        self.diag = "connection lost".to_string();
        self.transport = None;
        self.session.reset();
        self.identified = false;
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("address", &self.address)
            .field("name", &self.name)
            .field("serial", &self.serial)
            .field("state", &self.link_state())
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish_non_exhaustive()
    }
}
