//! Interactive entry point: pick a port and baud, then hand off to the
//! windowed main loop.
//!
//! Flags: `--sim` runs the scripted demo feed with no hardware,
//! `--quick` skips the prompts and uses the platform default port at
//! 9600 baud.

use asl_reader::app::{run, AppConfig, SourceMode, DEFAULT_PORT};
use line_feed::{available_ports, BaudRate};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║           Mr. Mitten - Adapted ASL to Text Reader            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();
    let sim = args.iter().any(|a| a == "--sim");
    let quick = args.iter().any(|a| a == "--quick");

    let cfg = if sim {
        println!("  Mode: scripted demo feed, no hardware needed.");
        AppConfig {
            mode: SourceMode::Sim,
            ..AppConfig::default()
        }
    } else if quick {
        println!("  Quick start: {} at 9600 baud.", DEFAULT_PORT);
        AppConfig::default()
    } else {
        configure_interactively()
    };

    println!();
    println!("  Opening window… press C in the window to connect.");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure_interactively() -> AppConfig {
    let ports = available_ports();
    if ports.is_empty() {
        println!("  No serial ports detected. The recognizer may be unplugged;");
        println!("  you can still type a device path below.");
    } else {
        println!("  Detected ports:");
        for (i, p) in ports.iter().enumerate() {
            println!("    {}. {}", i + 1, p);
        }
    }
    println!();

    let port = {
        let raw = read_line(&format!("  Port (number or path, default {}): ", DEFAULT_PORT));
        let raw = raw.trim();
        if raw.is_empty() {
            DEFAULT_PORT.to_string()
        } else {
            match raw.parse::<usize>() {
                Ok(n) if n >= 1 && n <= ports.len() => ports[n - 1].clone(),
                _ => raw.to_string(),
            }
        }
    };

    let baud = loop {
        println!("  Baud:  1. 9600   2. 19200   3. 38400   4. 57600   5. 115200");
        let choice = read_line("  Choice (1-5, default 1): ");
        match choice.trim() {
            "" | "1" => break BaudRate::B9600,
            "2" => break BaudRate::B19200,
            "3" => break BaudRate::B38400,
            "4" => break BaudRate::B57600,
            "5" => break BaudRate::B115200,
            _ => println!("  ⚠  Please enter 1-5."),
        }
    };

    AppConfig {
        port,
        baud,
        mode: SourceMode::Serial,
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
