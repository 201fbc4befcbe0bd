use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{PortConnector, PortInfo, Transport};

#[derive(Debug, Default)]
struct PortState {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
    write_limit: Option<usize>,
    open_count: usize,
}

/// Test-side handle to an in-memory peripheral.
///
/// Clones share the same port. Bytes pushed with [`MemoryPort::push_inbound`]
/// are what the host side reads; everything the host writes can be collected
/// with [`MemoryPort::take_written`].
#[derive(Debug, Clone)]
pub struct MemoryPort {
    address: String,
    state: Arc<Mutex<PortState>>,
}

impl MemoryPort {
    /// Create a detached port with the given address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: Arc::new(Mutex::new(PortState::default())),
        }
    }

    /// Address of this port.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Queue bytes for the host to read.
    pub fn push_inbound(&self, bytes: &[u8]) {
        self.lock().inbound.extend(bytes.iter().copied());
    }

    /// Drain everything the host has written so far.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().written)
    }

    /// Drain everything written so far as (lossy) UTF-8 text.
    pub fn take_written_string(&self) -> String {
        String::from_utf8_lossy(&self.take_written()).into_owned()
    }

    /// Make every subsequent read fail, as if the device was unplugged.
    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self) {
        self.lock().fail_writes = true;
    }

    /// Limit how many bytes a single write call accepts.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.lock().write_limit = limit;
    }

    /// Whether a host-side transport for this port is currently open.
    pub fn is_open(&self) -> bool {
        self.lock().open_count > 0
    }

    fn open_transport(&self) -> MemoryTransport {
        self.lock().open_count += 1;
        MemoryTransport { port: self.clone() }
    }

    fn lock(&self) -> MutexGuard<'_, PortState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct MemoryTransport {
    port: MemoryPort,
}

impl Transport for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.port.lock();
        if state.fail_reads {
            return Err(TransportError::Disconnected);
        }
        let n = buf.len().min(state.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let mut state = self.port.lock();
        if state.fail_writes {
            return Err(TransportError::Disconnected);
        }
        let n = state.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        state.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn address(&self) -> &str {
        self.port.address()
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        let mut state = self.port.lock();
        state.open_count = state.open_count.saturating_sub(1);
    }
}

/// Connector over a fixed set of in-memory ports.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    ports: BTreeMap<String, MemoryPort>,
}

impl MemoryConnector {
    /// Create a connector with no ports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a port and return its test-side handle.
    pub fn add_port(&mut self, address: &str) -> MemoryPort {
        self.ports
            .entry(address.to_string())
            .or_insert_with(|| MemoryPort::new(address))
            .clone()
    }

    /// Unregister a port; later opens of its address fail.
    pub fn remove_port(&mut self, address: &str) -> Option<MemoryPort> {
        self.ports.remove(address)
    }
}

impl PortConnector for MemoryConnector {
    fn open(&mut self, address: &str) -> Result<Box<dyn Transport>> {
        let port = self.ports.get(address).ok_or_else(|| TransportError::Open {
            address: address.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such memory port"),
        })?;
        debug!(address, "opened memory port");
        Ok(Box::new(port.open_transport()))
    }

    fn enumerate(&self) -> Result<Vec<PortInfo>> {
        Ok(self
            .ports
            .keys()
            .map(|address| PortInfo {
                address: address.clone(),
                display_name: format!("memory:{address}"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_what_was_pushed() {
        let mut connector = MemoryConnector::new();
        let port = connector.add_port("loop0");
        let mut transport = connector.open("loop0").unwrap();

        port.push_inbound(b"10,x;");
        let mut buf = [0u8; 3];
        assert_eq!(transport.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"10,");
        let mut rest = [0u8; 16];
        assert_eq!(transport.read(&mut rest).unwrap(), 2);
        assert_eq!(transport.read(&mut rest).unwrap(), 0);
    }

    #[test]
    fn write_limit_accepts_partial_writes() {
        let mut connector = MemoryConnector::new();
        let port = connector.add_port("loop0");
        let mut transport = connector.open("loop0").unwrap();

        port.set_write_limit(Some(2));
        assert_eq!(transport.write(b"9;").unwrap(), 2);
        assert_eq!(transport.write(b"abc").unwrap(), 2);
        assert_eq!(port.take_written(), b"9;ab");
        assert!(port.take_written().is_empty());
    }

    #[test]
    fn failed_reads_report_disconnect() {
        let mut connector = MemoryConnector::new();
        let port = connector.add_port("loop0");
        let mut transport = connector.open("loop0").unwrap();

        port.fail_reads();
        let mut buf = [0u8; 4];
        assert!(matches!(
            transport.read(&mut buf),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn failed_writes_report_disconnect() {
        let mut connector = MemoryConnector::new();
        let port = connector.add_port("loop0");
        let mut transport = connector.open("loop0").unwrap();

        port.fail_writes();
        assert!(transport.write(b"9;").is_err());
        assert!(port.take_written().is_empty());
    }

    #[test]
    fn open_unknown_address_fails() {
        let mut connector = MemoryConnector::new();
        let err = connector.open("missing").unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }

    #[test]
    fn tracks_open_state_and_enumerates() {
        let mut connector = MemoryConnector::new();
        let port = connector.add_port("b");
        connector.add_port("a");

        let transport = connector.open("b").unwrap();
        assert!(port.is_open());
        assert_eq!(transport.address(), "b");
        drop(transport);
        assert!(!port.is_open());

        let listed: Vec<String> = connector
            .enumerate()
            .unwrap()
            .into_iter()
            .map(|info| info.address)
            .collect();
        assert_eq!(listed, vec!["a".to_string(), "b".to_string()]);
    }
}
