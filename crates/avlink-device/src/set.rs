use avlink_binding::{CommandRegistry, Host};
use avlink_transport::PortConnector;
use tracing::{debug, info};

use crate::config::DeviceEntry;
use crate::device::{Device, DeviceConfig, UpdateReport};
use crate::error::{ConfigError, DeviceError, Result};

/// The devices driven by one host, updated in insertion order.
#[derive(Debug, Default)]
pub struct DeviceSet {
    devices: Vec<Device>,
}

impl DeviceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build devices from configuration entries.
    pub fn from_config(entries: &[DeviceEntry]) -> std::result::Result<Self, ConfigError> {
        let devices = entries
            .iter()
            .map(|entry| entry.build(DeviceConfig::default()))
            .collect::<Result<Vec<_>>>()?;
        info!(devices = devices.len(), "device set built from configuration");
        Ok(Self { devices })
    }

    /// Replace every device with ones built from `entries`.
    ///
    /// The current devices are disconnected first, so their outputs are
    /// switched off and held commands ended.
    pub fn reload(
        &mut self,
        entries: &[DeviceEntry],
        commands: &mut dyn CommandRegistry,
    ) -> std::result::Result<(), ConfigError> {
        let next = Self::from_config(entries)?;
        self.clear(commands);
        *self = next;
        Ok(())
    }

    /// Describe every device as a configuration entry.
    pub fn to_config(&self) -> Vec<DeviceEntry> {
        self.devices.iter().map(DeviceEntry::from_device).collect()
    }

    /// Add a disconnected device for `address`.
    pub fn add(&mut self, address: impl Into<String>) -> &mut Device {
        self.push(Device::new(address))
    }

    /// Add an already built device.
    pub fn push(&mut self, device: Device) -> &mut Device {
        self.devices.push(device);
        let index = self.devices.len() - 1;
        &mut self.devices[index]
    }

    /// Remove a device after disconnecting it.
    pub fn remove(&mut self, index: usize, commands: &mut dyn CommandRegistry) -> Result<Device> {
        let len = self.devices.len();
        if index >= len {
            return Err(DeviceError::IndexOutOfRange { index, len });
        }
        let mut device = self.devices.remove(index);
        device.disconnect(commands);
        Ok(device)
    }

    /// Disconnect and drop every device.
    pub fn clear(&mut self, commands: &mut dyn CommandRegistry) {
        for device in &mut self.devices {
            device.disconnect(commands);
        }
        self.devices.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Device> {
        self.devices.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.iter_mut()
    }

    /// Try to connect every disconnected device. Returns how many are
    /// connected afterwards.
    pub fn connect_all(&mut self, connector: &mut dyn PortConnector) -> usize {
        for device in self.devices.iter_mut().filter(|d| !d.is_connected()) {
            if let Err(err) = device.try_connect(connector) {
                debug!(address = %device.address(), error = %err, "device not connected");
            }
        }
        self.devices.iter().filter(|d| d.is_connected()).count()
    }

    /// Update every device once, in order.
    pub fn update(&mut self, host: &mut Host<'_>) -> Vec<UpdateReport> {
        self.devices
            .iter_mut()
            .map(|device| device.update(host))
            .collect()
    }
}
