//! Tests requiring actual serial hardware.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0          # or COM3 on Windows
//! export TEST_BAUD=9600                  # optional, default: 9600
//! export TEST_LOOPBACK=1                 # if the port has TX wired to RX
//!
//! cargo test --test integration_hardware -- --ignored
//! ```

use crate::common::TestPortConfig;
use serial_line::port::{PortConfig, PortErrorKind, SerialPort};
use std::time::{Duration, Instant};

/// Skip test if hardware is not available.
fn skip_without_hardware() -> Option<TestPortConfig> {
    let config = TestPortConfig::from_env();
    if config.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    config
}

#[test]
#[ignore] // Run with --ignored flag
fn test_real_port_open_close_reopen() {
    let Some(test) = skip_without_hardware() else {
        return;
    };
    println!("Testing port: {} at {} baud", test.port_name, test.baud_rate);

    let mut port = SerialPort::open(test.to_port_config()).expect("port opens");
    assert!(port.is_open());
    port.close();
    port.close();

    let mut port = SerialPort::open(test.to_port_config()).expect("port reopens after close");
    port.close();
}

#[test]
#[ignore]
fn test_real_port_is_exclusive() {
    let Some(test) = skip_without_hardware() else {
        return;
    };

    let _port = SerialPort::open(test.to_port_config()).expect("port opens");
    match SerialPort::open(test.to_port_config()) {
        Err(e) => assert_eq!(e.kind(), PortErrorKind::PortUnavailable),
        // Some platforms allow a second open of the same tty.
        Ok(_) => println!("Platform allowed a second open of {}", test.port_name),
    }
}

#[test]
#[ignore]
fn test_real_port_empty_read_times_out() {
    let Some(test) = skip_without_hardware() else {
        return;
    };

    let config = PortConfig::builder(&test.port_name)
        .baud_rate(test.baud_rate)
        .timeout_millis(300)
        .build()
        .unwrap();
    let mut port = SerialPort::open(config).expect("port opens");

    let start = Instant::now();
    let line = port.read_line_framed().unwrap();
    let elapsed = start.elapsed();

    if line.is_idle() {
        assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(800), "{elapsed:?}");
    } else {
        println!("Device sent data unprompted: [{}]", line.to_hex());
    }
}

#[test]
#[ignore]
fn test_real_port_loopback_line() {
    let Some(test) = skip_without_hardware() else {
        return;
    };
    if !test.loopback_enabled {
        println!("Skipping loopback test: TEST_LOOPBACK not set to 1");
        return;
    }

    let mut port = SerialPort::open(test.to_port_config()).expect("port opens");
    assert_eq!(port.write(b"$RECALL\r\n").unwrap(), 9);
    assert_eq!(port.read_line().unwrap(), b"$RECALL");

    assert_eq!(port.write_hex("41420D0A").unwrap(), 4);
    assert_eq!(port.read_line_str().unwrap(), "AB");
}
