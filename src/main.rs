//! `serial-line`: send commands to a serial device and print the lines it
//! answers with.
//!
//! ```bash
//! serial-line -p /dev/ttyUSB1 --baud 4800 --send '$RECALL'
//! serial-line -p gps --send-hex 24520d0a --lines 3
//! serial-line --list
//! ```

use clap::Parser;
use serial_line::config::{Config, ConfigLoader};
use serial_line::port::{self, Parity, SerialPort};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Write to a serial port and read back CRLF-terminated lines.",
    long_about = "Opens a serial port, writes each --send / --send-hex payload in order, then prints the lines the device returns as `index: [HEX]` until a read times out with nothing received (or --lines is reached)."
)]
struct Args {
    /// Device path, COM name, or an alias from the config file.
    #[arg(short, long, required_unless_present = "list")]
    port: Option<String>,

    /// Baud rate (default from config, 9600 otherwise).
    #[arg(short, long)]
    baud: Option<u32>,

    /// NONE, EVEN, ODD, MARK or SPACE.
    #[arg(long)]
    parity: Option<Parity>,

    /// Data bits per character, 5 to 8.
    #[arg(long, default_value_t = 8)]
    byte_size: u8,

    /// Stop bits, 1 or 2.
    #[arg(long, default_value_t = 1)]
    stop_bits: u8,

    /// Read timeout in milliseconds; 0 waits forever.
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Write timeout in milliseconds; 0 waits forever.
    #[arg(long)]
    write_timeout_ms: Option<u64>,

    /// Text to write; repeatable. CRLF is appended unless --raw is set.
    #[arg(short, long = "send", value_name = "TEXT")]
    send: Vec<String>,

    /// Hex-encoded bytes to write after the --send payloads.
    #[arg(long, value_name = "HEX")]
    send_hex: Option<String>,

    /// Do not append CRLF to --send payloads.
    #[arg(long)]
    raw: bool,

    /// Stop after this many lines.
    #[arg(short, long)]
    lines: Option<usize>,

    /// Config file to use instead of the standard locations.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// List the serial ports the OS reports and exit.
    #[arg(long)]
    list: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(ConfigLoader::load_from(path)?.into_config()),
        None => Ok(match ConfigLoader::load() {
            Ok(loader) => loader.into_config(),
            Err(e) => {
                eprintln!("Warning: Failed to load config, using defaults: {}", e);
                ConfigLoader::with_defaults().into_config()
            }
        }),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    if let Err(e) = serial_line::logging::init(&config.logging) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    if args.list {
        for name in port::available_ports()? {
            println!("{name}");
        }
        return Ok(());
    }

    let port_name = args.port.as_deref().ok_or("--port is required")?;
    let mut builder = config
        .serial
        .port_builder(port_name)
        .byte_size(args.byte_size)
        .stop_bits(args.stop_bits);
    if let Some(baud) = args.baud {
        builder = builder.baud_rate(baud);
    }
    if let Some(parity) = args.parity {
        builder = builder.parity(parity);
    }
    if let Some(ms) = args.read_timeout_ms {
        builder = builder.read_timeout_millis(ms);
    }
    if let Some(ms) = args.write_timeout_ms {
        builder = builder.write_timeout_millis(ms);
    }
    let port_config = builder.build()?;
    info!(config = %port_config, "opening");

    let mut port = SerialPort::open(port_config)?;

    for text in &args.send {
        let payload = if args.raw {
            text.clone()
        } else {
            format!("{text}\r\n")
        };
        let written = port.write_str(&payload)?;
        println!("written: {written}");
    }
    if let Some(data_hex) = &args.send_hex {
        let written = port.write_hex(data_hex)?;
        println!("written: {written}");
    }

    let mut index = 0;
    while args.lines.map_or(true, |max| index < max) {
        let line = port.read_line_framed()?;
        if line.is_idle() {
            break;
        }
        println!("{index}: [{}]", line.to_hex());
        index += 1;
    }

    port.close();
    Ok(())
}
