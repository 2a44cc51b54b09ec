//! Port-specific error types.
//!
//! Every fallible port operation returns [`PortError`]. Configuration problems
//! are reported before the device is touched; transport faults are reported by
//! the operation that hit them.

use std::time::Duration;
use thiserror::Error;

/// Result type for port operations.
pub type PortResult<T> = Result<T, PortError>;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// An option value is out of range or unrecognized.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The device does not exist or is held by another owner.
    #[error("Serial port unavailable: {port}: {reason}")]
    PortUnavailable { port: String, reason: String },

    /// The OS or driver refused the requested line settings.
    #[error("Configuration rejected by {port}: {reason}")]
    ConfigurationRejected { port: String, reason: String },

    /// The operation was attempted on a closed port.
    #[error("Port is closed")]
    PortClosed,

    /// A transport-level fault during an otherwise valid operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write could not hand a single byte to the driver before its deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The caller supplied a malformed payload.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Discriminant of a [`PortError`], convenient for matching and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortErrorKind {
    InvalidConfiguration,
    PortUnavailable,
    ConfigurationRejected,
    PortClosed,
    Io,
    Timeout,
    InvalidInput,
}

impl PortError {
    /// Create an InvalidConfiguration error from a message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Create a PortUnavailable error for a device path.
    pub fn unavailable(port: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PortUnavailable {
            port: port.into(),
            reason: reason.into(),
        }
    }

    /// Create a ConfigurationRejected error for a device path.
    pub fn rejected(port: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigurationRejected {
            port: port.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O timeout, the shape transports use for "no progress".
    pub fn timed_out(what: &str) -> Self {
        Self::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, what.to_string()))
    }

    pub fn kind(&self) -> PortErrorKind {
        match self {
            Self::InvalidConfiguration(_) => PortErrorKind::InvalidConfiguration,
            Self::PortUnavailable { .. } => PortErrorKind::PortUnavailable,
            Self::ConfigurationRejected { .. } => PortErrorKind::ConfigurationRejected,
            Self::PortClosed => PortErrorKind::PortClosed,
            Self::Io(_) => PortErrorKind::Io,
            Self::Timeout(_) => PortErrorKind::Timeout,
            Self::InvalidInput(_) => PortErrorKind::InvalidInput,
        }
    }

    /// True for a transport read/write that ran out its per-call timeout.
    ///
    /// Some drivers report `WouldBlock` instead of `TimedOut`; both mean the
    /// call made no progress and may be retried.
    pub fn is_transport_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        )
    }
}

impl From<serialport::Error> for PortError {
    fn from(err: serialport::Error) -> Self {
        Self::Io(err.into())
    }
}
