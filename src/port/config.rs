//! Line configuration for a serial port.
//!
//! [`PortConfig`] is what a port is opened with. It deserializes from the
//! camelCase option objects used by scripting front ends:
//!
//! ```
//! use serial_line::port::{Parity, PortConfig};
//!
//! let config = PortConfig::from_json(r#"{
//!     "port": "/dev/ttyUSB1",
//!     "baudRate": 4800,
//!     "parity": "NONE",
//!     "byteSize": 8,
//!     "stopBitsCount": 1,
//!     "timeoutMillis": 1000
//! }"#)?;
//! assert_eq!(config.baud_rate, 4800);
//! assert_eq!(config.parity, Parity::None);
//! assert_eq!(config.read_timeout_millis, 1000);
//! # Ok::<(), serial_line::PortError>(())
//! ```

use super::error::{PortError, PortResult};
use super::transport::LineSetting;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Parity checking modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
    Mark,
    Space,
}

impl Parity {
    /// The equivalent `serialport` setting, if the backend can express it.
    ///
    /// `serialport` has no mark or space parity.
    pub fn to_serialport(self) -> Option<serialport::Parity> {
        match self {
            Parity::None => Some(serialport::Parity::None),
            Parity::Even => Some(serialport::Parity::Even),
            Parity::Odd => Some(serialport::Parity::Odd),
            Parity::Mark | Parity::Space => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Parity::None => "NONE",
            Parity::Even => "EVEN",
            Parity::Odd => "ODD",
            Parity::Mark => "MARK",
            Parity::Space => "SPACE",
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parity {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Parity::None),
            "EVEN" => Ok(Parity::Even),
            "ODD" => Ok(Parity::Odd),
            "MARK" => Ok(Parity::Mark),
            "SPACE" => Ok(Parity::Space),
            _ => Err(PortError::invalid(format!("Invalid parity type: [{s}]"))),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl DataBits {
    pub fn bits(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

impl TryFrom<u8> for DataBits {
    type Error = PortError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            _ => Err(PortError::invalid(format!(
                "byteSize must be one of 5, 6, 7, 8, got {bits}"
            ))),
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl StopBits {
    pub fn count(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

impl TryFrom<u8> for StopBits {
    type Error = PortError;

    fn try_from(count: u8) -> Result<Self, Self::Error> {
        match count {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            _ => Err(PortError::invalid(format!(
                "stopBitsCount must be 1 or 2, got {count}"
            ))),
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// What `read_line` does with bytes that arrived without a terminator before
/// the read timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialLinePolicy {
    /// Hand the partial bytes to the caller and empty the buffer.
    #[default]
    Return,
    /// Keep them buffered for the next call and report an empty line.
    Retain,
}

impl FromStr for PartialLinePolicy {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "return" => Ok(PartialLinePolicy::Return),
            "retain" => Ok(PartialLinePolicy::Retain),
            _ => Err(PortError::invalid(format!("Invalid partial line policy: [{s}]"))),
        }
    }
}

/// Configuration a port is opened with. Immutable once the port is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPortConfig", into = "RawPortConfig")]
pub struct PortConfig {
    /// OS device path or COM name.
    pub port: String,
    pub baud_rate: u32,
    pub parity: Parity,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    /// Read blocking bound; 0 blocks until data arrives or the port closes.
    pub read_timeout_millis: u64,
    /// Write blocking bound; 0 blocks until the driver accepts everything.
    pub write_timeout_millis: u64,
    pub partial_line: PartialLinePolicy,
}

impl PortConfig {
    /// A config for `port` with 9600 8N1 and 500 ms timeouts.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            read_timeout_millis: DEFAULT_TIMEOUT_MS,
            write_timeout_millis: DEFAULT_TIMEOUT_MS,
            partial_line: PartialLinePolicy::Return,
        }
    }

    /// Start building a config from unchecked values.
    pub fn builder(port: impl Into<String>) -> PortConfigBuilder {
        PortConfigBuilder {
            raw: RawPortConfig::new(port.into()),
        }
    }

    /// Parse a JSON option object. Any problem is an `InvalidConfiguration`.
    pub fn from_json(json: &str) -> PortResult<Self> {
        serde_json::from_str(json).map_err(|e| PortError::invalid(e.to_string()))
    }

    /// Check the fields the type system does not already constrain.
    pub fn validate(&self) -> PortResult<()> {
        if self.port.trim().is_empty() {
            return Err(PortError::invalid("port must be a non-empty device path"));
        }
        if self.baud_rate == 0 {
            return Err(PortError::invalid("baudRate must be positive"));
        }
        Ok(())
    }

    /// `None` means no bound.
    pub fn read_timeout(&self) -> Option<Duration> {
        millis_to_timeout(self.read_timeout_millis)
    }

    /// `None` means no bound.
    pub fn write_timeout(&self) -> Option<Duration> {
        millis_to_timeout(self.write_timeout_millis)
    }

    /// Settings applied to a freshly acquired device, in order.
    pub fn line_settings(&self) -> [LineSetting; 4] {
        [
            LineSetting::BaudRate(self.baud_rate),
            LineSetting::DataBits(self.data_bits),
            LineSetting::Parity(self.parity),
            LineSetting::StopBits(self.stop_bits),
        ]
    }
}

impl fmt::Display for PortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}{}{}",
            self.port,
            self.baud_rate,
            self.data_bits.bits(),
            self.parity.as_str().chars().next().unwrap_or('N'),
            self.stop_bits.count()
        )
    }
}

fn millis_to_timeout(millis: u64) -> Option<Duration> {
    (millis > 0).then(|| Duration::from_millis(millis))
}

/// Builder over unchecked values; `build` validates everything at once.
#[derive(Debug, Clone)]
pub struct PortConfigBuilder {
    raw: RawPortConfig,
}

impl PortConfigBuilder {
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.raw.baud_rate = baud_rate;
        self
    }

    pub fn parity(mut self, parity: Parity) -> Self {
        self.raw.parity = parity;
        self
    }

    pub fn byte_size(mut self, byte_size: u8) -> Self {
        self.raw.byte_size = byte_size;
        self
    }

    pub fn stop_bits(mut self, count: u8) -> Self {
        self.raw.stop_bits_count = count;
        self
    }

    /// Sets both the read and the write timeout.
    pub fn timeout_millis(mut self, millis: u64) -> Self {
        self.raw.read_timeout_millis = Some(millis);
        self.raw.write_timeout_millis = Some(millis);
        self
    }

    pub fn read_timeout_millis(mut self, millis: u64) -> Self {
        self.raw.read_timeout_millis = Some(millis);
        self
    }

    pub fn write_timeout_millis(mut self, millis: u64) -> Self {
        self.raw.write_timeout_millis = Some(millis);
        self
    }

    pub fn partial_line(mut self, policy: PartialLinePolicy) -> Self {
        self.raw.partial_line = policy;
        self
    }

    pub fn build(self) -> PortResult<PortConfig> {
        PortConfig::try_from(self.raw)
    }
}

/// Wire shape of [`PortConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawPortConfig {
    port: String,
    #[serde(default = "default_baud")]
    baud_rate: u32,
    #[serde(default)]
    parity: Parity,
    #[serde(default = "default_byte_size")]
    byte_size: u8,
    #[serde(default = "default_stop_bits", alias = "stopBits")]
    stop_bits_count: u8,
    /// Legacy single timeout; used for whichever direction is not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_millis: Option<u64>,
    #[serde(default)]
    read_timeout_millis: Option<u64>,
    #[serde(default)]
    write_timeout_millis: Option<u64>,
    #[serde(default)]
    partial_line: PartialLinePolicy,
}

fn default_baud() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_byte_size() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

impl RawPortConfig {
    fn new(port: String) -> Self {
        Self {
            port,
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
            byte_size: default_byte_size(),
            stop_bits_count: default_stop_bits(),
            timeout_millis: None,
            read_timeout_millis: None,
            write_timeout_millis: None,
            partial_line: PartialLinePolicy::Return,
        }
    }
}

impl TryFrom<RawPortConfig> for PortConfig {
    type Error = PortError;

    fn try_from(raw: RawPortConfig) -> Result<Self, Self::Error> {
        let fallback = raw.timeout_millis.unwrap_or(DEFAULT_TIMEOUT_MS);
        let config = PortConfig {
            port: raw.port,
            baud_rate: raw.baud_rate,
            parity: raw.parity,
            data_bits: DataBits::try_from(raw.byte_size)?,
            stop_bits: StopBits::try_from(raw.stop_bits_count)?,
            read_timeout_millis: raw.read_timeout_millis.unwrap_or(fallback),
            write_timeout_millis: raw.write_timeout_millis.unwrap_or(fallback),
            partial_line: raw.partial_line,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<PortConfig> for RawPortConfig {
    fn from(config: PortConfig) -> Self {
        Self {
            port: config.port,
            baud_rate: config.baud_rate,
            parity: config.parity,
            byte_size: config.data_bits.bits(),
            stop_bits_count: config.stop_bits.count(),
            timeout_millis: None,
            read_timeout_millis: Some(config.read_timeout_millis),
            write_timeout_millis: Some(config.write_timeout_millis),
            partial_line: config.partial_line,
        }
    }
}
