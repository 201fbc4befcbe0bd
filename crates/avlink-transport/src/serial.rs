use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{PortConnector, PortInfo, Transport};

/// Device-name prefixes of USB serial adapters and CDC-ACM boards.
const PORT_PREFIXES: &[&str] = &["ttyACM", "ttyUSB", "cu.usbmodem", "cu.usbserial"];

/// A serial character device opened in non-blocking mode.
///
/// Line settings (baud rate, parity) are left as the OS configured them;
/// CDC-ACM boards ignore them.
pub struct SerialPort {
    file: File,
    address: String,
}

impl SerialPort {
    /// Open the character device at `address` for non-blocking I/O.
    pub fn open(address: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY)
            .open(address)
            .map_err(|source| TransportError::Open {
                address: address.to_string(),
                source,
            })?;
        info!(address, "opened serial device");
        Ok(Self {
            file,
            address: address.to_string(),
        })
    }
}

impl Transport for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.file.read(buf) {
            // A tty returns end-of-file only after hang-up.
            Ok(0) => Err(TransportError::Disconnected),
            Ok(n) => Ok(n),
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(0)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self.file.write(buf) {
            Ok(n) => Ok(n),
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(0)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn address(&self) -> &str {
        &self.address
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("address", &self.address)
            .finish()
    }
}

/// Opens serial devices and lists the USB serial ports under `/dev`.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    dev_dir: PathBuf,
}

impl Default for SerialConnector {
    fn default() -> Self {
        Self {
            dev_dir: PathBuf::from("/dev"),
        }
    }
}

impl SerialConnector {
    /// Connector scanning `/dev`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector scanning an alternative device directory.
    pub fn with_dev_dir(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }
}

impl PortConnector for SerialConnector {
    fn open(&mut self, address: &str) -> Result<Box<dyn Transport>> {
        Ok(Box::new(SerialPort::open(address)?))
    }

    fn enumerate(&self) -> Result<Vec<PortInfo>> {
        let labels = by_id_labels(&self.dev_dir.join("serial").join("by-id"));
        let entries = std::fs::read_dir(&self.dev_dir).map_err(TransportError::Enumerate)?;

        let mut ports = Vec::new();
        for entry in entries {
            let entry = entry.map_err(TransportError::Enumerate)?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if !PORT_PREFIXES
                .iter()
                .any(|prefix| file_name.starts_with(prefix))
            {
                continue;
            }
            let path = entry.path();
            let display_name = labels
                .get(file_name.as_ref())
                .cloned()
                .unwrap_or_else(|| file_name.to_string());
            ports.push(PortInfo {
                address: path.to_string_lossy().into_owned(),
                display_name,
            });
        }
        ports.sort_by(|a, b| a.address.cmp(&b.address));
        debug!(count = ports.len(), "enumerated serial ports");
        Ok(ports)
    }
}

/// Map device names (`ttyACM0`) to their `/dev/serial/by-id` link names.
fn by_id_labels(dir: &Path) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return labels;
    };
    for entry in entries.flatten() {
        let Ok(target) = std::fs::read_link(entry.path()) else {
            continue;
        };
        if let Some(device) = target.file_name() {
            labels.insert(
                device.to_string_lossy().into_owned(),
                entry.file_name().to_string_lossy().into_owned(),
            );
        }
    }
    labels
}
