//! Line framing and read timeouts through `SerialPort`.

mod common;

use common::{
    assert_close_to, open_loopback_port, open_mock_port, open_mock_port_with, retaining_config,
    timed, TEST_TIMEOUT_MS,
};
use pretty_assertions::assert_eq;
use serial_line::port::{Line, PortConfig, MAX_LINE_LEN};
use std::time::Duration;

#[test]
fn test_loopback_recall_round_trip() {
    let (_device, mut port) = open_loopback_port("MOCK0");
    assert_eq!(port.write(b"$RECALL\r\n").unwrap(), 9);
    assert_eq!(port.read_line().unwrap(), b"$RECALL");
}

#[test]
fn test_two_lines_in_one_chunk() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.enqueue_read(b"A\r\nB\r\n");

    assert_eq!(port.read_line().unwrap(), b"A");
    assert_eq!(port.read_line().unwrap(), b"B");
    assert!(port.read_line_framed().unwrap().is_idle());
}

#[test]
fn test_line_split_across_chunks() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.enqueue_read(b"$ST");
    device.enqueue_read(b"ATUS,OK\r");
    device.enqueue_read(b"\n");

    assert_eq!(port.read_line_str().unwrap(), "$STATUS,OK");
}

#[test]
fn test_bare_lf_and_empty_lines() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.enqueue_read(b"one\n\r\ntwo\r\n");

    assert_eq!(port.read_line().unwrap(), b"one");
    let empty = port.read_line_framed().unwrap();
    assert_eq!(empty, Line::terminated(Vec::new()));
    assert!(!empty.is_idle());
    assert_eq!(port.read_line().unwrap(), b"two");
}

#[test]
fn test_empty_read_waits_for_timeout() {
    let (_device, mut port) = open_mock_port("MOCK0");
    let (line, elapsed) = timed(|| port.read_line().unwrap());

    assert!(line.is_empty());
    assert_close_to(elapsed, Duration::from_millis(TEST_TIMEOUT_MS));
    assert!(port.is_open());
}

#[test]
fn test_partial_line_returned_by_default() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.enqueue_read(b"$PART");

    let line = port.read_line_framed().unwrap();
    assert_eq!(line, Line::timed_out(b"$PART".to_vec()));

    device.enqueue_read(b"IAL\r\n");
    assert_eq!(port.read_line().unwrap(), b"IAL");
}

#[test]
fn test_partial_line_retained_when_configured() {
    let (device, mut port) = open_mock_port_with(retaining_config("MOCK0"));
    device.enqueue_read(b"$PART");

    let line = port.read_line_framed().unwrap();
    assert!(line.is_idle());
    assert_eq!(port.available(), 5);

    device.enqueue_read(b"IAL\r\n");
    assert_eq!(port.read_line().unwrap(), b"$PARTIAL");
}

#[test]
fn test_trailing_cr_dropped_from_timed_out_partial() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.enqueue_read(b"half\r");

    let line = port.read_line_framed().unwrap();
    assert_eq!(line, Line::timed_out(b"half".to_vec()));
    assert_eq!(port.available(), 0);
}

#[test]
fn test_retained_cr_completes_terminator() {
    let (device, mut port) = open_mock_port_with(retaining_config("MOCK0"));
    device.enqueue_read(b"half\r");
    assert!(port.read_line_framed().unwrap().is_idle());

    device.enqueue_read(b"\n");
    assert_eq!(port.read_line_framed().unwrap(), Line::terminated(b"half".to_vec()));
}

#[test]
fn test_unterminated_stream_is_cut_at_line_limit() {
    let (device, mut port) = open_mock_port_with(retaining_config("MOCK0"));
    let stream = vec![b'x'; MAX_LINE_LEN + 10];
    device.enqueue_read(&stream);

    let line = port.read_line_framed().unwrap();
    assert!(!line.terminated);
    assert_eq!(line.bytes.len(), MAX_LINE_LEN);
    assert_eq!(port.available(), 10);

    device.enqueue_read(b"\r\n");
    assert_eq!(port.read_line().unwrap(), vec![b'x'; 10]);
}

#[test]
fn test_read_returns_what_arrived() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.enqueue_read(b"\x01\x02\x03");

    assert_eq!(port.read(8).unwrap(), b"\x01\x02\x03");

    device.enqueue_read(b"abcdef");
    assert_eq!(port.read(4).unwrap(), b"abcd");
    assert_eq!(port.read(0).unwrap(), b"");
    assert_eq!(port.read(4).unwrap(), b"ef");
}

#[test]
fn test_lines_and_raw_reads_share_buffer() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.enqueue_read(b"HDR\r\n\x7f\x00tail\r\n");

    assert_eq!(port.read_line().unwrap(), b"HDR");
    assert_eq!(port.read(2).unwrap(), b"\x7f\x00");
    assert_eq!(port.read_line().unwrap(), b"tail");
}

#[test]
fn test_separate_read_timeout() {
    let config = PortConfig::builder("MOCK0")
        .read_timeout_millis(60)
        .write_timeout_millis(5000)
        .build()
        .unwrap();
    let (_device, mut port) = open_mock_port_with(config);

    let (line, elapsed) = timed(|| port.read_line_framed().unwrap());
    assert!(line.is_idle());
    assert_close_to(elapsed, Duration::from_millis(60));
}

#[test]
fn test_line_hex_rendering() {
    let (device, mut port) = open_mock_port("MOCK0");
    device.enqueue_read(b"$OK\r\n");
    assert_eq!(port.read_line_framed().unwrap().to_hex(), "244F4B");
}
