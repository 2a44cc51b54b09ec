//! Async front end over [`SerialPort`] for Tokio applications.
//!
//! Each call runs the blocking operation on Tokio's blocking pool, so the
//! timeouts and line framing are exactly those of the sync port.
//!
//! Note: This module is gated behind the `async` feature flag.

use super::config::PortConfig;
use super::error::{PortError, PortResult};
use super::line::Line;
use super::serial::{PortCloser, SerialPort};
use super::transport::Transport;
use parking_lot::Mutex;
use std::sync::Arc;

/// A [`SerialPort`] shared with the blocking pool.
///
/// # Example
/// ```no_run
/// use serial_line::port::{AsyncSerialPort, PortConfig};
///
/// # async fn example() -> Result<(), serial_line::PortError> {
/// let port = AsyncSerialPort::open(PortConfig::new("/dev/ttyUSB0")).await?;
/// port.write(b"$STATUS\r\n".to_vec()).await?;
/// let reply = port.read_line().await?;
/// port.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AsyncSerialPort {
    inner: Arc<Mutex<SerialPort>>,
    closer: PortCloser,
    name: Arc<str>,
}

impl AsyncSerialPort {
    pub fn new(port: SerialPort) -> Self {
        let closer = port.closer();
        let name = Arc::from(port.name());
        Self {
            inner: Arc::new(Mutex::new(port)),
            closer,
            name,
        }
    }

    /// Open a port on the blocking pool.
    pub async fn open(config: PortConfig) -> PortResult<Self> {
        let port = tokio::task::spawn_blocking(move || SerialPort::open(config))
            .await
            .map_err(join_error)??;
        Ok(Self::new(port))
    }

    /// Open over an already acquired transport.
    pub fn open_with<T: Transport + 'static>(config: PortConfig, transport: T) -> PortResult<Self> {
        SerialPort::open_with(config, transport).map(Self::new)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Does not wait for an in-flight call; a busy port counts as open.
    pub fn is_open(&self) -> bool {
        !self.closer.is_closed() && self.inner.try_lock().map_or(true, |port| port.is_open())
    }

    pub fn closer(&self) -> PortCloser {
        self.closer.clone()
    }

    pub async fn write(&self, data: Vec<u8>) -> PortResult<usize> {
        self.run(move |port| port.write(&data)).await
    }

    pub async fn write_hex(&self, data_hex: String) -> PortResult<usize> {
        self.run(move |port| port.write_hex(&data_hex)).await
    }

    pub async fn read_line(&self) -> PortResult<Vec<u8>> {
        self.run(SerialPort::read_line).await
    }

    pub async fn read_line_framed(&self) -> PortResult<Line> {
        self.run(SerialPort::read_line_framed).await
    }

    pub async fn read(&self, len: usize) -> PortResult<Vec<u8>> {
        self.run(move |port| port.read(len)).await
    }

    /// Signal close first so an in-flight call lets go of the port, then
    /// release the device.
    pub async fn close(&self) {
        self.closer.close();
        let inner = Arc::clone(&self.inner);
        if let Err(e) = tokio::task::spawn_blocking(move || inner.lock().close()).await {
            tracing::warn!(port = %self.name, error = %e, "close task failed");
        }
    }

    async fn run<R, F>(&self, op: F) -> PortResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut SerialPort) -> PortResult<R> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&mut *inner.lock()))
            .await
            .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> PortError {
    PortError::Io(std::io::Error::other(e))
}

impl std::fmt::Debug for AsyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSerialPort")
            .field("name", &self.name)
            .field("closed", &self.closer.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MockDevice, PortErrorKind};

    fn open_mock() -> (MockDevice, AsyncSerialPort) {
        let device = MockDevice::new("MOCK0");
        let config = PortConfig::builder("MOCK0").timeout_millis(100).build().unwrap();
        let port = AsyncSerialPort::open_with(config, device.open_transport().unwrap()).unwrap();
        (device, port)
    }

    #[tokio::test]
    async fn test_missing_device_is_unavailable() {
        let err = AsyncSerialPort::open(PortConfig::new("/dev/nonexistent_async_port_12345"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), PortErrorKind::PortUnavailable);
    }

    #[tokio::test]
    async fn test_write_then_read_line() {
        let (device, port) = open_mock();
        device.set_loopback(true);

        assert_eq!(port.write(b"PING\r\n".to_vec()).await.unwrap(), 6);
        assert_eq!(port.read_line().await.unwrap(), b"PING");
        assert!(port.read_line_framed().await.unwrap().is_idle());
    }

    #[tokio::test]
    async fn test_close_interrupts_pending_read() {
        let device = MockDevice::new("MOCK0");
        let config = PortConfig::builder("MOCK0").timeout_millis(0).build().unwrap();
        let port = AsyncSerialPort::open_with(config, device.open_transport().unwrap()).unwrap();

        let reader = port.clone();
        let pending = tokio::spawn(async move { reader.read_line().await });
        tokio::time::sleep(std::time::Duration::from_millis(120)).await;
        port.close().await;

        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), PortErrorKind::PortClosed);
        assert!(!device.is_open());
        assert!(!port.is_open());
    }
}
