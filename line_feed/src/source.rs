//! Line sources: the serial device and its scripted stand-in.

use std::collections::VecDeque;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Why a source could not be opened or stopped producing lines.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("serial I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// Baud rates
// ════════════════════════════════════════════════════════════════════════════

/// The rates the recognizer firmware can be flashed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    /// Every supported rate, slowest first (menu order).
    pub fn all() -> [BaudRate; 5] {
        [
            BaudRate::B9600,
            BaudRate::B19200,
            BaudRate::B38400,
            BaudRate::B57600,
            BaudRate::B115200,
        ]
    }

    pub fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B9600 => 9_600,
            BaudRate::B19200 => 19_200,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
        }
    }

    /// Parse a rate the user typed; `None` for anything off the menu.
    pub fn from_u32(n: u32) -> Option<BaudRate> {
        BaudRate::all().into_iter().find(|b| b.bits_per_second() == n)
    }
}

impl std::fmt::Display for BaudRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits_per_second())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LineSource
// ════════════════════════════════════════════════════════════════════════════

/// Anything that produces stripped, newline-terminated text lines.
///
/// `ready` must not block. `read_line` may block up to the source's own
/// read timeout and returns `Ok(None)` when no complete line arrived in
/// time; the caller polls again later.
pub trait LineSource: Send + 'static {
    /// Is there input waiting that a `read_line` call could consume?
    fn ready(&mut self) -> Result<bool, ReadError>;

    /// One line, stripped of terminators and edge whitespace.
    fn read_line(&mut self) -> Result<Option<String>, ReadError>;
}

// ════════════════════════════════════════════════════════════════════════════
// SerialSource
// ════════════════════════════════════════════════════════════════════════════

/// Read timeout on the underlying port. Long enough to span the gap
/// between recognized letters, short enough that a stop request never
/// waits more than a beat.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Newline-delimited lines from a serial port.
///
/// Bytes arrive in small chunks and are split on `\n`; a partial tail
/// stays buffered until the rest of the line shows up. A line that is
/// not valid UTF-8 degrades to the empty token, which the engine drops.
pub struct SerialSource {
    port: Box<dyn serialport::SerialPort>,
    raw: Vec<u8>,
    pending: VecDeque<String>,
}

impl SerialSource {
    /// Open `port` at `baud` with the standard read timeout.
    pub fn open(port: &str, baud: BaudRate) -> Result<SerialSource, ReadError> {
        let port = serialport::new(port, baud.bits_per_second())
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(SerialSource {
            port,
            raw: Vec::new(),
            pending: VecDeque::new(),
        })
    }

    fn pull(&mut self) -> Result<(), ReadError> {
        let mut chunk = [0u8; 64];
        match self.port.read(&mut chunk) {
            Ok(0) => {}
            Ok(n) => {
                self.raw.extend_from_slice(&chunk[..n]);
                for line in split_lines(&mut self.raw) {
                    self.pending.push_back(line);
                }
            }
            // A timeout just means no complete line yet.
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

impl LineSource for SerialSource {
    fn ready(&mut self) -> Result<bool, ReadError> {
        Ok(!self.pending.is_empty() || self.port.bytes_to_read()? > 0)
    }

    fn read_line(&mut self) -> Result<Option<String>, ReadError> {
        if self.pending.is_empty() {
            self.pull()?;
        }
        Ok(self.pending.pop_front())
    }
}

/// Split complete `\n`-terminated lines out of `raw`, leaving a partial
/// tail in place. Undecodable lines become the empty token so the
/// engine's reject rule handles them.
fn split_lines(raw: &mut Vec<u8>) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(pos) = raw.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = raw.drain(..=pos).collect();
        let line = &line[..line.len() - 1];
        match std::str::from_utf8(line) {
            Ok(s) => out.push(s.trim().to_string()),
            Err(_) => {
                debug!("undecodable line of {} bytes dropped", line.len());
                out.push(String::new());
            }
        }
    }
    out
}

/// Serial ports visible on this machine; empty when enumeration fails
/// or nothing is plugged in.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            debug!("port enumeration failed: {}", e);
            Vec::new()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptSource
// ════════════════════════════════════════════════════════════════════════════

/// Replays a fixed list of lines without any hardware.
///
/// With an interval it paces itself like a device recognizing a letter
/// every so often; with looping it starts over when the script runs out
/// (demo mode). The shared delivered counter lets tests observe how many
/// lines actually left the buffer, which is how the pause contract
/// ("nothing read, nothing lost") gets verified.
pub struct ScriptSource {
    queue: VecDeque<String>,
    looping: bool,
    interval: Duration,
    last_emit: Option<Instant>,
    delivered: Arc<AtomicUsize>,
}

impl ScriptSource {
    /// Finite, unpaced script; runs dry and then stays quiet.
    pub fn new<I, S>(lines: I) -> ScriptSource
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptSource {
            queue: lines.into_iter().map(Into::into).collect(),
            looping: false,
            interval: Duration::ZERO,
            last_emit: None,
            delivered: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Endless paced script, one line per `interval`.
    pub fn looping<I, S>(lines: I, interval: Duration) -> ScriptSource
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut source = ScriptSource::new(lines);
        source.looping = true;
        source.interval = interval;
        source
    }

    /// Shared count of lines handed out so far.
    pub fn delivered_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.delivered)
    }

    /// Lines still waiting in the buffer.
    pub fn buffered(&self) -> usize {
        self.queue.len()
    }

    fn due(&self) -> bool {
        match self.last_emit {
            None => true,
            Some(t) => t.elapsed() >= self.interval,
        }
    }
}

impl LineSource for ScriptSource {
    fn ready(&mut self) -> Result<bool, ReadError> {
        Ok(!self.queue.is_empty() && self.due())
    }

    fn read_line(&mut self) -> Result<Option<String>, ReadError> {
        if !self.due() {
            return Ok(None);
        }
        match self.queue.pop_front() {
            Some(line) => {
                if self.looping {
                    self.queue.push_back(line.clone());
                }
                self.last_emit = Some(Instant::now());
                self.delivered.fetch_add(1, Ordering::Relaxed);
                Ok(Some(line.trim().to_string()))
            }
            None => Ok(None),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
