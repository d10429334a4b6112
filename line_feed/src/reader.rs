//! The background reader thread and its control handle.
//!
//! One thread per session. It owns the source outright, polls it, and
//! posts events to an mpsc channel; the consumer drains that channel
//! from its own loop and stays the only writer of application state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::source::{LineSource, ReadError};

/// Sleep between polls while the source is idle or paused.
pub const IDLE_BACKOFF: Duration = Duration::from_millis(100);

// ════════════════════════════════════════════════════════════════════════════
// Events
// ════════════════════════════════════════════════════════════════════════════

/// What the reader thread posts to its consumer.
#[derive(Debug)]
pub enum LineEvent {
    /// One stripped token line from the device.
    Token(String),
    /// The reader hit an I/O failure and exited; nothing follows this.
    /// Consumers should drop the session and show the cause.
    Failed(ReadError),
}

// ════════════════════════════════════════════════════════════════════════════
// ReaderHandle
// ════════════════════════════════════════════════════════════════════════════

/// Handle to a running reader thread.
///
/// Dropping the handle stops the thread, which closes the source.
pub struct ReaderHandle {
    events: Receiver<LineEvent>,
    paused: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    /// Every event waiting right now, without blocking.
    pub fn drain(&self) -> Vec<LineEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.events.try_recv() {
            out.push(ev);
        }
        out
    }

    /// Next pending event, without blocking.
    pub fn try_next(&self) -> Option<LineEvent> {
        self.events.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<LineEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Pause or resume reading. Paused means not reading at all; device
    /// output accumulates in the OS buffer meanwhile.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Ask the reader to stop and wait for it to exit. The source is
    /// dropped inside the thread, so a serial port is already closed
    /// when this returns.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("reader thread panicked during shutdown");
            }
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// spawn_reader
// ════════════════════════════════════════════════════════════════════════════

/// Run `source` on its own thread, posting [`LineEvent`]s until stopped.
///
/// `backoff` is the idle sleep between polls; [`IDLE_BACKOFF`] is the
/// production value and tests shorten it. `start_paused` makes the
/// session begin without reading, so a consumer can attach before the
/// first token moves.
pub fn spawn_reader<S: LineSource>(
    source: S,
    backoff: Duration,
    start_paused: bool,
) -> ReaderHandle {
    let (tx, rx) = mpsc::channel();
    let paused = Arc::new(AtomicBool::new(start_paused));
    let stop = Arc::new(AtomicBool::new(false));

    let thread = {
        let paused = Arc::clone(&paused);
        let stop = Arc::clone(&stop);
        thread::spawn(move || reader_loop(source, tx, paused, stop, backoff))
    };

    ReaderHandle {
        events: rx,
        paused,
        stop,
        thread: Some(thread),
    }
}

fn reader_loop<S: LineSource>(
    mut source: S,
    tx: Sender<LineEvent>,
    paused: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    backoff: Duration,
) {
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        // Paused means no reads at all; pending bytes wait in the OS
        // buffer until the user resumes.
        if paused.load(Ordering::Relaxed) {
            thread::sleep(backoff);
            continue;
        }
        match source.ready() {
            Ok(true) => {}
            Ok(false) => {
                thread::sleep(backoff);
                continue;
            }
            Err(e) => {
                warn!("reader exiting: {}", e);
                let _ = tx.send(LineEvent::Failed(e));
                return;
            }
        }
        match source.read_line() {
            Ok(Some(line)) => {
                if tx.send(LineEvent::Token(line)).is_err() {
                    // Receiver gone means the session is over.
                    return;
                }
            }
            // Timed out mid-line; poll again.
            Ok(None) => {}
            Err(e) => {
                warn!("reader exiting: {}", e);
                let _ = tx.send(LineEvent::Failed(e));
                return;
            }
        }
    }
    debug!("reader stopped by request");
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
