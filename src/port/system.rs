//! OS serial devices through the `serialport` crate.

use super::error::PortError;
use super::transport::{LineSetting, Transport};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

/// Baud rate the device is acquired at before the requested settings are
/// applied one by one.
const ACQUIRE_BAUD_RATE: u32 = 9600;

/// A serial device owned through `serialport::SerialPort`.
pub struct SystemTransport {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SystemTransport {
    /// Acquire the device at `port_name` with flow control off.
    ///
    /// Line settings are applied separately so that a driver refusing them is
    /// reported as `ConfigurationRejected` rather than `PortUnavailable`.
    ///
    /// # Example
    /// ```no_run
    /// use serial_line::port::SystemTransport;
    ///
    /// let transport = SystemTransport::acquire("/dev/ttyUSB0")?;
    /// # Ok::<(), serial_line::PortError>(())
    /// ```
    pub fn acquire(port_name: &str) -> Result<Self, PortError> {
        let port = serialport::new(port_name, ACQUIRE_BAUD_RATE)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(50))
            .open()
            .map_err(|e| PortError::unavailable(port_name, e.to_string()))?;

        debug!(port = port_name, "acquired serial device");
        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl Transport for SystemTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&mut self, setting: LineSetting) -> Result<(), PortError> {
        let result = match setting {
            LineSetting::BaudRate(baud) => self.port.set_baud_rate(baud),
            LineSetting::DataBits(bits) => self.port.set_data_bits(bits.into()),
            LineSetting::Parity(parity) => match parity.to_serialport() {
                Some(parity) => self.port.set_parity(parity),
                None => {
                    return Err(PortError::rejected(
                        &self.name,
                        format!("{setting} is not supported by this platform backend"),
                    ))
                }
            },
            LineSetting::StopBits(bits) => self.port.set_stop_bits(bits.into()),
        };
        result.map_err(|e| PortError::rejected(&self.name, format!("{setting}: {e}")))
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port.set_timeout(timeout).map_err(PortError::from)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(PortError::Io)
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(PortError::from)
    }

    fn bytes_to_read(&self) -> Option<usize> {
        self.port.bytes_to_read().ok().map(|n| n as usize)
    }
}

impl std::fmt::Debug for SystemTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemTransport")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}
