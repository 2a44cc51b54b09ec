//! Shared test utilities for serial line tests.
//!
//! Mock device setup, timing assertions and environment-driven hardware
//! configuration.

#![allow(dead_code)]

use serial_line::port::{MockDevice, PartialLinePolicy, PortConfig, SerialPort};
use std::env;
use std::time::{Duration, Instant};

/// Read/write timeout used by mock-backed tests.
pub const TEST_TIMEOUT_MS: u64 = 150;

/// Slack allowed around a timeout for scheduling jitter.
pub const TIMING_SLACK: Duration = Duration::from_millis(150);

/// A quick-timeout config for a mock port.
pub fn mock_config(name: &str) -> PortConfig {
    PortConfig::builder(name)
        .timeout_millis(TEST_TIMEOUT_MS)
        .build()
        .expect("valid mock config")
}

/// Open a port over a fresh mock device.
///
/// # Example
/// ```ignore
/// let (device, mut port) = open_mock_port("MOCK0");
/// device.enqueue_read(b"OK\r\n");
/// assert_eq!(port.read_line().unwrap(), b"OK");
/// ```
pub fn open_mock_port(name: &str) -> (MockDevice, SerialPort) {
    open_mock_port_with(mock_config(name))
}

pub fn open_mock_port_with(config: PortConfig) -> (MockDevice, SerialPort) {
    let device = MockDevice::new(config.port.clone());
    let transport = device.open_transport().expect("mock device is free");
    let port = SerialPort::open_with(config, transport).expect("mock port opens");
    (device, port)
}

/// A mock port that echoes every write back to the reader.
pub fn open_loopback_port(name: &str) -> (MockDevice, SerialPort) {
    let (device, port) = open_mock_port(name);
    device.set_loopback(true);
    (device, port)
}

pub fn retaining_config(name: &str) -> PortConfig {
    PortConfig::builder(name)
        .timeout_millis(TEST_TIMEOUT_MS)
        .partial_line(PartialLinePolicy::Retain)
        .build()
        .expect("valid mock config")
}

/// Run `f` and return its result with the elapsed time.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

/// Assert that `elapsed` is `expected` give or take [`TIMING_SLACK`].
pub fn assert_close_to(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed + TIMING_SLACK >= expected && elapsed <= expected + TIMING_SLACK,
        "elapsed {elapsed:?}, expected about {expected:?}"
    );
}

/// Hardware port settings from `TEST_PORT`, `TEST_BAUD` and `TEST_LOOPBACK`.
pub struct TestPortConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub loopback_enabled: bool,
}

impl TestPortConfig {
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("TEST_PORT").ok()?;
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9600);
        let loopback_enabled = env::var("TEST_LOOPBACK").ok().as_deref() == Some("1");

        Some(TestPortConfig {
            port_name,
            baud_rate,
            loopback_enabled,
        })
    }

    pub fn to_port_config(&self) -> PortConfig {
        PortConfig::builder(&self.port_name)
            .baud_rate(self.baud_rate)
            .timeout_millis(1000)
            .build()
            .expect("valid hardware test config")
    }
}
