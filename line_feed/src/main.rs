//! Raw token tap for a serial recognizer. Opens a port and prints every
//! line the device sends, numbered, with no window and no phrase state.
//! Useful for checking wiring and baud before running the full reader.

use line_feed::{available_ports, spawn_reader, BaudRate, LineEvent, SerialSource, IDLE_BACKOFF};
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            Serial Line Monitor (raw tap)             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let ports = available_ports();
    if ports.is_empty() {
        println!("  No serial ports detected; type a device path below.");
    } else {
        println!("  Detected ports:");
        for (i, p) in ports.iter().enumerate() {
            println!("    {}. {}", i + 1, p);
        }
    }
    println!();

    let port = {
        let raw = read_line("  Port (number or path): ");
        let raw = raw.trim();
        match raw.parse::<usize>() {
            Ok(n) if n >= 1 && n <= ports.len() => ports[n - 1].clone(),
            _ => raw.to_string(),
        }
    };

    let baud = loop {
        let raw = read_line("  Baud (default 9600): ");
        let raw = raw.trim();
        if raw.is_empty() {
            break BaudRate::B9600;
        }
        match raw.parse::<u32>().ok().and_then(BaudRate::from_u32) {
            Some(b) => break b,
            None => println!("  ⚠  Supported rates: 9600 19200 38400 57600 115200."),
        }
    };

    let source = match SerialSource::open(&port, baud) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("  Could not open {}: {}", port, e);
            std::process::exit(1);
        }
    };

    println!();
    println!("  Listening on {} at {} baud. Ctrl+C to quit.", port, baud);
    println!();

    let handle = spawn_reader(source, IDLE_BACKOFF, false);
    let mut count = 0usize;
    loop {
        match handle.next_timeout(Duration::from_secs(1)) {
            Some(LineEvent::Token(t)) => {
                count += 1;
                println!("  {:>5}  {:?}", count, t);
            }
            Some(LineEvent::Failed(e)) => {
                eprintln!("  Read failed: {}", e);
                break;
            }
            None => {}
        }
    }
    handle.stop();
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
