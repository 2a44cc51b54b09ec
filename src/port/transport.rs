//! The device seam under [`SerialPort`](super::SerialPort).
//!
//! A `Transport` is one acquired device handle. The engine drives it with
//! short per-call timeouts so blocking calls stay cancellable; everything
//! about deadlines, buffering and line framing lives above this trait.

use super::config::{DataBits, Parity, StopBits};
use super::error::PortError;
use std::fmt;
use std::time::Duration;

/// One line setting applied to a freshly acquired device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSetting {
    BaudRate(u32),
    DataBits(DataBits),
    Parity(Parity),
    StopBits(StopBits),
}

impl fmt::Display for LineSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSetting::BaudRate(baud) => write!(f, "baud rate {baud}"),
            LineSetting::DataBits(bits) => write!(f, "byte size {}", bits.bits()),
            LineSetting::Parity(parity) => write!(f, "parity {parity}"),
            LineSetting::StopBits(bits) => write!(f, "stop bits {}", bits.count()),
        }
    }
}

/// Byte-level access to an acquired serial device.
///
/// Implementations release the device when dropped.
pub trait Transport: Send + fmt::Debug {
    /// The device path this handle was acquired for.
    fn name(&self) -> &str;

    /// Apply one line setting.
    ///
    /// A refusal is reported as `PortError::ConfigurationRejected`.
    fn apply(&mut self, setting: LineSetting) -> Result<(), PortError>;

    /// Bound the next `read_bytes`/`write_bytes` calls.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Read whatever is available into `buffer`, waiting at most the current
    /// timeout for the first byte.
    ///
    /// No data before the timeout is `PortError::Io` of kind `TimedOut`.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Hand as much of `data` to the driver as it accepts within the current
    /// timeout. Returns the number of bytes accepted.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Discard unread input and unsent output held by the driver.
    fn clear_buffers(&mut self) -> Result<(), PortError>;

    /// Bytes waiting in the driver's receive buffer, if the platform says.
    fn bytes_to_read(&self) -> Option<usize> {
        None
    }
}
