//! Timeout-bounded serial port with line-oriented reads.
//!
//! [`SerialPort`] owns one acquired device. Writes and reads block for at most
//! their configured timeout; a timeout of zero blocks until the operation can
//! make progress or the port is closed. Blocking calls wait in slices of
//! [`POLL_SLICE`] and check the close flag between slices, so
//! [`PortCloser::close`] from another thread ends them promptly.

use super::config::{PartialLinePolicy, PortConfig};
use super::error::{PortError, PortResult};
use super::line::{Line, LineBuffer};
use super::system::SystemTransport;
use super::transport::Transport;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Longest single wait on the device between close-flag checks.
pub const POLL_SLICE: Duration = Duration::from_millis(50);

/// Size of one device read.
const READ_CHUNK: usize = 4096;

/// The acquired device, shared between a port and its closers.
///
/// Locked only for the length of one device call.
type TransportSlot = Arc<Mutex<Option<Box<dyn Transport>>>>;

/// Drop the device held in `slot`, if any.
fn release_slot(port: &str, slot: &Mutex<Option<Box<dyn Transport>>>) {
    let Some(transport) = slot.lock().take() else {
        return;
    };
    drop(transport);
    info!(port, "serial port closed");
}

/// Absolute end of a blocking operation; `None` waits forever.
#[derive(Debug, Clone, Copy)]
struct Deadline(Option<Instant>);

impl Deadline {
    fn after(timeout: Option<Duration>) -> Self {
        Self(timeout.map(|t| Instant::now() + t))
    }

    /// How long the next device call may wait, or `None` once expired.
    fn next_slice(&self) -> Option<Duration> {
        match self.0 {
            None => Some(POLL_SLICE),
            Some(end) => {
                let remaining = end.saturating_duration_since(Instant::now());
                (!remaining.is_zero()).then(|| remaining.min(POLL_SLICE))
            }
        }
    }
}

/// Cross-thread close for a [`SerialPort`].
///
/// Closing releases the device right away, waiting at most for a device
/// call already in progress (one [`POLL_SLICE`]). Calls blocked on the port
/// return [`PortError::PortClosed`].
#[derive(Clone)]
pub struct PortCloser {
    port: Arc<str>,
    closed: Arc<AtomicBool>,
    slot: TransportSlot,
}

impl PortCloser {
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(port = %self.port, "close requested");
        }
        release_slot(&self.port, &self.slot);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for PortCloser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortCloser")
            .field("port", &self.port)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// An open serial connection.
///
/// # Example
/// ```no_run
/// use serial_line::port::{PortConfig, SerialPort};
///
/// let config = PortConfig::builder("/dev/ttyUSB1")
///     .baud_rate(4800)
///     .timeout_millis(1000)
///     .build()?;
/// let mut port = SerialPort::open(config)?;
///
/// port.write_str("$RECALL\r\n")?;
/// loop {
///     let line = port.read_line()?;
///     if line.is_empty() {
///         break;
///     }
///     println!("{}", String::from_utf8_lossy(&line));
/// }
/// port.close();
/// # Ok::<(), serial_line::PortError>(())
/// ```
pub struct SerialPort {
    config: PortConfig,
    name: Arc<str>,
    slot: TransportSlot,
    buffer: LineBuffer,
    closed: Arc<AtomicBool>,
    /// Last timeout handed to the transport, to skip redundant updates.
    device_timeout: Option<Duration>,
}

impl SerialPort {
    /// Validate `config`, acquire the OS device and apply the line settings.
    ///
    /// Nothing touches the OS when validation fails. If any line setting is
    /// refused the device is released before the error is returned.
    pub fn open(config: PortConfig) -> PortResult<Self> {
        config.validate()?;
        let transport = SystemTransport::acquire(&config.port)?;
        Self::configure(config, Box::new(transport))
    }

    /// Like [`open`](Self::open), over an already acquired transport.
    pub fn open_with<T: Transport + 'static>(config: PortConfig, transport: T) -> PortResult<Self> {
        config.validate()?;
        Self::configure(config, Box::new(transport))
    }

    fn configure(config: PortConfig, mut transport: Box<dyn Transport>) -> PortResult<Self> {
        for setting in config.line_settings() {
            debug!(port = %config.port, %setting, "applying line setting");
            transport.apply(setting)?;
        }
        transport.clear_buffers()?;

        info!(
            port = %config.port,
            baud_rate = config.baud_rate,
            parity = %config.parity,
            byte_size = config.data_bits.bits(),
            stop_bits = config.stop_bits.count(),
            read_timeout_ms = config.read_timeout_millis,
            write_timeout_ms = config.write_timeout_millis,
            "serial port opened"
        );

        Ok(Self {
            name: Arc::from(config.port.as_str()),
            config,
            slot: Arc::new(Mutex::new(Some(transport))),
            buffer: LineBuffer::new(),
            closed: Arc::new(AtomicBool::new(false)),
            device_timeout: None,
        })
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && self.slot.lock().is_some()
    }

    /// A handle that can close this port from another thread.
    pub fn closer(&self) -> PortCloser {
        PortCloser {
            port: Arc::clone(&self.name),
            closed: Arc::clone(&self.closed),
            slot: Arc::clone(&self.slot),
        }
    }

    /// Bytes readable without waiting: buffered here plus held by the driver.
    pub fn available(&self) -> usize {
        let driver = self
            .slot
            .lock()
            .as_ref()
            .and_then(|t| t.bytes_to_read())
            .unwrap_or(0);
        self.buffer.len() + driver
    }

    /// Write `data`, waiting at most the write timeout.
    ///
    /// Returns how many bytes the driver accepted. A timeout after some bytes
    /// were accepted is not an error; a timeout before the first byte is
    /// [`PortError::Timeout`].
    pub fn write(&mut self, data: &[u8]) -> PortResult<usize> {
        self.ensure_open()?;
        if data.is_empty() {
            return Ok(0);
        }

        let deadline = Deadline::after(self.config.write_timeout());
        let mut written = 0;
        while written < data.len() {
            self.ensure_open()?;
            let Some(slice) = deadline.next_slice() else {
                break;
            };
            match self.with_transport(slice, |t| t.write_bytes(&data[written..])) {
                Ok(n) => {
                    trace!(port = %self.name, bytes = n, "wrote chunk");
                    written += n;
                }
                Err(e) if e.is_transport_timeout() => continue,
                Err(e) => return Err(self.fault(e)),
            }
        }

        if written == 0 {
            let waited = self.config.write_timeout().unwrap_or_default();
            warn!(port = %self.name, len = data.len(), "write timed out before any byte was accepted");
            return Err(PortError::Timeout(waited));
        }
        if written < data.len() {
            warn!(
                port = %self.name,
                written,
                len = data.len(),
                "write timed out, partial write"
            );
        }
        Ok(written)
    }

    /// Write the UTF-8 bytes of `text`.
    pub fn write_str(&mut self, text: &str) -> PortResult<usize> {
        self.write(text.as_bytes())
    }

    /// Decode a hex string (`"2452"`, whitespace ignored) and write the bytes.
    pub fn write_hex(&mut self, data_hex: &str) -> PortResult<usize> {
        let compact: String = data_hex.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(PortError::InvalidInput("empty hex payload".into()));
        }
        let bytes = hex::decode(&compact)
            .map_err(|e| PortError::InvalidInput(format!("invalid hex payload: {e}")))?;
        self.write(&bytes)
    }

    /// Read one line, terminator stripped.
    ///
    /// An empty result means either a real empty line or that nothing arrived
    /// before the read timeout; use [`read_line_framed`](Self::read_line_framed)
    /// to tell the two apart.
    pub fn read_line(&mut self) -> PortResult<Vec<u8>> {
        self.read_line_framed().map(Line::into_bytes)
    }

    /// [`read_line`](Self::read_line), decoded as UTF-8 with replacement.
    pub fn read_line_str(&mut self) -> PortResult<String> {
        self.read_line_framed().map(|line| line.to_string_lossy())
    }

    /// Read one line and report whether it was terminated or timed out.
    ///
    /// A line that reaches [`MAX_LINE_LEN`](super::line::MAX_LINE_LEN) bytes
    /// without a terminator comes back cut at that length, unterminated,
    /// whatever the partial line policy.
    pub fn read_line_framed(&mut self) -> PortResult<Line> {
        self.ensure_open()?;
        let deadline = Deadline::after(self.config.read_timeout());
        loop {
            if let Some(bytes) = self.buffer.next_line() {
                debug!(port = %self.name, len = bytes.len(), "line received");
                return Ok(Line::terminated(bytes));
            }
            if let Some(bytes) = self.buffer.split_overlong() {
                warn!(port = %self.name, len = bytes.len(), "no line terminator within limit, returning cut line");
                return Ok(Line::overlong(bytes));
            }
            if !self.fill(&deadline)? {
                break;
            }
        }

        let partial = match self.config.partial_line {
            PartialLinePolicy::Return => self.buffer.take_partial(),
            PartialLinePolicy::Retain => Vec::new(),
        };
        if partial.is_empty() {
            trace!(port = %self.name, buffered = self.buffer.len(), "read_line timed out");
        } else {
            debug!(port = %self.name, len = partial.len(), "read_line timed out mid-line");
        }
        Ok(Line::timed_out(partial))
    }

    /// Read up to `len` bytes, waiting at most the read timeout for them.
    ///
    /// Buffered bytes are served first; fewer than `len` bytes (possibly none)
    /// come back on timeout.
    pub fn read(&mut self, len: usize) -> PortResult<Vec<u8>> {
        self.ensure_open()?;
        let deadline = Deadline::after(self.config.read_timeout());
        while self.buffer.len() < len {
            if !self.fill(&deadline)? {
                break;
            }
        }
        Ok(self.buffer.take(len))
    }

    /// Release the device. Closing a closed port does nothing.
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.release();
    }

    fn release(&mut self) {
        release_slot(&self.name, &self.slot);
        self.buffer.clear();
    }

    fn ensure_open(&mut self) -> PortResult<()> {
        if self.closed.load(Ordering::Acquire) {
            self.release();
            return Err(PortError::PortClosed);
        }
        Ok(())
    }

    /// Pull one chunk from the device into the line buffer.
    ///
    /// Returns `false` once the deadline passes without data.
    fn fill(&mut self, deadline: &Deadline) -> PortResult<bool> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            self.ensure_open()?;
            let Some(slice) = deadline.next_slice() else {
                return Ok(false);
            };
            match self.with_transport(slice, |t| t.read_bytes(&mut chunk)) {
                Ok(0) => continue,
                Ok(n) => {
                    trace!(port = %self.name, bytes = n, "read chunk");
                    self.buffer.push(&chunk[..n]);
                    return Ok(true);
                }
                Err(e) if e.is_transport_timeout() => continue,
                Err(e) => return Err(self.fault(e)),
            }
        }
    }

    /// Run one device call bounded by `slice`, holding the slot lock for it.
    fn with_transport<R>(
        &mut self,
        slice: Duration,
        call: impl FnOnce(&mut dyn Transport) -> PortResult<R>,
    ) -> PortResult<R> {
        let mut slot = self.slot.lock();
        let transport = slot.as_mut().ok_or(PortError::PortClosed)?;
        if self.device_timeout != Some(slice) {
            transport.set_timeout(slice)?;
            self.device_timeout = Some(slice);
        }
        call(transport.as_mut())
    }

    /// A transport fault leaves the handle in an unknown state: close.
    fn fault(&mut self, err: PortError) -> PortError {
        if !matches!(err, PortError::PortClosed) {
            warn!(port = %self.name, error = %err, "transport fault, closing port");
        }
        self.closed.store(true, Ordering::Release);
        self.release();
        err
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
