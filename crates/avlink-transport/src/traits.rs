use crate::error::Result;

/// An open, exclusively owned byte channel to one peripheral.
///
/// Implementations must never block: a read with nothing pending returns
/// `Ok(0)`, and any `Err` is treated by callers as loss of the device.
pub trait Transport: Send {
    /// Read whatever bytes are currently available into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write bytes, returning how many the device accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// The address this transport was opened with.
    fn address(&self) -> &str;
}

/// A discoverable device address with a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Address passed to [`PortConnector::open`].
    pub address: String,
    /// Display name for pickers and listings.
    pub display_name: String,
}

/// Opens transports by address and lists the addresses available.
pub trait PortConnector {
    /// Open the device at `address`.
    fn open(&mut self, address: &str) -> Result<Box<dyn Transport>>;

    /// List the devices that can currently be opened.
    fn enumerate(&self) -> Result<Vec<PortInfo>>;
}

impl std::fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("address", &self.address())
            .finish()
    }
}
