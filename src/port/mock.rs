//! In-memory serial device for tests.
//!
//! A [`MockDevice`] is the far end of the wire plus the driver state; tests
//! keep it to script input and inspect output. [`MockDevice::open_transport`]
//! hands out the single exclusive [`MockTransport`] a port is opened over.
//! Dropping that transport releases the device again.
//!
//! # Example
//! ```
//! use serial_line::port::{MockDevice, PortConfig, SerialPort};
//!
//! let device = MockDevice::new("MOCK0");
//! let mut port = SerialPort::open_with(PortConfig::new("MOCK0"), device.open_transport()?)?;
//!
//! device.enqueue_read(b"READY\r\n");
//! assert_eq!(port.read_line()?, b"READY");
//!
//! port.write_str("$START\r\n")?;
//! assert_eq!(device.written(), b"$START\r\n");
//!
//! port.close();
//! assert!(!device.is_open());
//! # Ok::<(), serial_line::PortError>(())
//! ```

use super::error::PortError;
use super::transport::{LineSetting, Transport};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct DeviceState {
    /// Chunks delivered one per read call.
    read_queue: VecDeque<Vec<u8>>,
    /// Every accepted write, in order.
    write_log: Vec<Vec<u8>>,
    applied: Vec<LineSetting>,
    rejected: Vec<LineSetting>,
    /// Echo accepted writes back into the read queue.
    loopback: bool,
    /// Bytes the driver still accepts; `None` is unlimited.
    write_budget: Option<usize>,
    read_fault: Option<io::ErrorKind>,
    write_fault: Option<io::ErrorKind>,
    timeout: Duration,
    cleared: bool,
    present: bool,
    open: bool,
    acquisitions: usize,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            read_queue: VecDeque::new(),
            write_log: Vec::new(),
            applied: Vec::new(),
            rejected: Vec::new(),
            loopback: false,
            write_budget: None,
            read_fault: None,
            write_fault: None,
            timeout: Duration::from_millis(50),
            cleared: false,
            present: true,
            open: false,
            acquisitions: 0,
        }
    }
}

/// Test-side view of a simulated serial device. Clones share the device.
#[derive(Clone)]
pub struct MockDevice {
    name: String,
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(DeviceState::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquire the device exclusively.
    ///
    /// Fails with `PortUnavailable` while another transport holds it or after
    /// [`unplug`](Self::unplug).
    pub fn open_transport(&self) -> Result<MockTransport, PortError> {
        let mut state = self.state.lock();
        if !state.present {
            return Err(PortError::unavailable(&self.name, "no such device"));
        }
        if state.open {
            return Err(PortError::unavailable(&self.name, "device or resource busy"));
        }
        state.open = true;
        state.acquisitions += 1;
        Ok(MockTransport {
            name: self.name.clone(),
            state: Arc::clone(&self.state),
        })
    }

    /// Queue one chunk; each read call delivers at most one chunk.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.push_back(data.to_vec());
    }

    pub fn set_loopback(&self, enabled: bool) {
        self.state.lock().loopback = enabled;
    }

    /// Limit how many more bytes the driver accepts before it stalls.
    pub fn set_write_budget(&self, budget: Option<usize>) {
        self.state.lock().write_budget = budget;
    }

    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        self.state.lock().read_fault = Some(kind);
    }

    pub fn fail_next_write(&self, kind: io::ErrorKind) {
        self.state.lock().write_fault = Some(kind);
    }

    /// Make the driver refuse exactly this setting.
    pub fn reject_setting(&self, setting: LineSetting) {
        self.state.lock().rejected.push(setting);
    }

    /// Remove the device; later acquisitions fail.
    pub fn unplug(&self) {
        self.state.lock().present = false;
    }

    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All accepted bytes, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    pub fn applied_settings(&self) -> Vec<LineSetting> {
        self.state.lock().applied.clone()
    }

    pub fn was_cleared(&self) -> bool {
        self.state.lock().cleared
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn acquisitions(&self) -> usize {
        self.state.lock().acquisitions
    }

    /// Queued bytes not yet read by the host.
    pub fn pending_read_bytes(&self) -> usize {
        self.state.lock().read_queue.iter().map(Vec::len).sum()
    }
}

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDevice")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .field("pending_read_bytes", &self.pending_read_bytes())
            .finish()
    }
}

/// Host-side handle on a [`MockDevice`].
pub struct MockTransport {
    name: String,
    state: Arc<Mutex<DeviceState>>,
}

impl MockTransport {
    /// Pop up to `buffer.len()` bytes of the next chunk.
    fn take_chunk(state: &mut DeviceState, buffer: &mut [u8]) -> Option<usize> {
        let mut chunk = state.read_queue.pop_front()?;
        let n = chunk.len().min(buffer.len());
        buffer[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            state.read_queue.push_front(chunk.split_off(n));
        }
        Some(n)
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&mut self, setting: LineSetting) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.rejected.contains(&setting) {
            return Err(PortError::rejected(
                &self.name,
                format!("{setting} refused by driver"),
            ));
        }
        state.applied.push(setting);
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let timeout = {
            let mut state = self.state.lock();
            if let Some(kind) = state.read_fault.take() {
                return Err(PortError::Io(io::Error::new(kind, "simulated read fault")));
            }
            if let Some(n) = Self::take_chunk(&mut state, buffer) {
                return Ok(n);
            }
            state.timeout
        };

        // Wait out the timeout like a driver would, then look once more.
        std::thread::sleep(timeout);
        let mut state = self.state.lock();
        Self::take_chunk(&mut state, buffer).ok_or_else(|| PortError::timed_out("read"))
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let timeout = {
            let mut state = self.state.lock();
            if let Some(kind) = state.write_fault.take() {
                return Err(PortError::Io(io::Error::new(kind, "simulated write fault")));
            }
            let accepted = state
                .write_budget
                .map_or(data.len(), |budget| budget.min(data.len()));
            if accepted > 0 || data.is_empty() {
                if let Some(budget) = state.write_budget.as_mut() {
                    *budget -= accepted;
                }
                let chunk = data[..accepted].to_vec();
                if state.loopback && !chunk.is_empty() {
                    state.read_queue.push_back(chunk.clone());
                }
                state.write_log.push(chunk);
                return Ok(accepted);
            }
            state.timeout
        };

        std::thread::sleep(timeout);
        Err(PortError::timed_out("write"))
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.read_queue.clear();
        state.cleared = true;
        Ok(())
    }

    fn bytes_to_read(&self) -> Option<usize> {
        Some(self.state.lock().read_queue.iter().map(Vec::len).sum())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.state.lock().open = false;
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("name", &self.name)
            .finish()
    }
}
