//! Write acceptance, throttling and write timeouts.

mod common;

use common::{assert_close_to, open_mock_port, open_mock_port_with, timed, TEST_TIMEOUT_MS};
use pretty_assertions::assert_eq;
use serial_line::port::{PortConfig, PortError, PortErrorKind};
use std::thread;
use std::time::Duration;

#[test]
fn test_full_write_returns_length() {
    let (device, mut port) = open_mock_port("MOCK0");
    assert_eq!(port.write(b"$RECALL\r\n").unwrap(), 9);
    assert_eq!(port.write_str("ä\r\n").unwrap(), 4);
    assert_eq!(device.written(), "$RECALL\r\nä\r\n".as_bytes());
}

#[test]
fn test_empty_write_is_a_no_op() {
    let (device, mut port) = open_mock_port("MOCK0");
    assert_eq!(port.write(b"").unwrap(), 0);
    assert!(device.write_log().is_empty());
}

#[test]
fn test_throttled_write_returns_partial_count() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.set_write_budget(Some(4));

    let (written, elapsed) = timed(|| port.write(b"0123456789").unwrap());
    assert_eq!(written, 4);
    assert_eq!(device.written(), b"0123");
    assert_close_to(elapsed, Duration::from_millis(TEST_TIMEOUT_MS));
    assert!(port.is_open());
}

#[test]
fn test_stalled_write_times_out() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.set_write_budget(Some(0));

    let (result, elapsed) = timed(|| port.write(b"$RECALL\r\n"));
    match result {
        Err(PortError::Timeout(after)) => {
            assert_eq!(after, Duration::from_millis(TEST_TIMEOUT_MS))
        }
        other => panic!("expected a write timeout, got {other:?}"),
    }
    assert_close_to(elapsed, Duration::from_millis(TEST_TIMEOUT_MS));
    assert!(port.is_open());
}

#[test]
fn test_write_resumes_when_driver_drains() {
    let config = PortConfig::builder("MOCK0")
        .write_timeout_millis(1000)
        .build()
        .unwrap();
    let (device, mut port) = open_mock_port_with(config);
    device.set_write_budget(Some(2));

    let drain = {
        let device = device.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(120));
            device.set_write_budget(None);
        })
    };

    assert_eq!(port.write(b"ABCDEF").unwrap(), 6);
    drain.join().unwrap();
    assert_eq!(device.written(), b"ABCDEF");
}

#[test]
fn test_write_hex_payload() {
    let (device, mut port) = open_mock_port("MOCK0");
    assert_eq!(port.write_hex("2452454341 4C4C0D0A").unwrap(), 9);
    assert_eq!(device.written(), b"$RECALL\r\n");

    let err = port.write_hex("123").unwrap_err();
    assert_eq!(err.kind(), PortErrorKind::InvalidInput);
    assert_eq!(device.written(), b"$RECALL\r\n");
}
