//! Application state and the main loop.
//!
//! All state lives in [`AppState`] and is mutated from exactly one
//! place, the loop in [`run`]: keyboard input becomes [`UiCommand`]s,
//! the reader thread's channel is drained into the engine, and a
//! snapshot goes to the visualizer. The reader itself never touches any
//! of this; it only posts events.

use std::time::Duration;

use line_feed::{
    spawn_reader, BaudRate, LineEvent, LineSource, ReaderHandle, ScriptSource, SerialSource,
    IDLE_BACKOFF,
};
use phrase_engine::{PhraseEngine, SizePolicy, Snapshot};
use thiserror::Error;
use tracing::{info, warn};

use crate::clipboard;
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// Conventional device path per platform; the interactive setup offers
/// it as the default and enumeration usually does better.
#[cfg(target_os = "macos")]
pub const DEFAULT_PORT: &str = "/dev/cu.usbmodem";
#[cfg(all(unix, not(target_os = "macos")))]
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM3";

/// Where tokens come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceMode {
    /// A recognizer on a serial port.
    Serial,
    /// The built-in scripted feed; no hardware needed.
    Sim,
}

/// Settings for one run. Nothing here is persisted; the values live
/// exactly as long as the window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: String,
    pub baud: BaudRate,
    pub mode: SourceMode,
}

impl Default for AppConfig {
    fn default() -> AppConfig {
        AppConfig {
            port: DEFAULT_PORT.to_string(),
            baud: BaudRate::B9600,
            mode: SourceMode::Serial,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Commands and errors
// ════════════════════════════════════════════════════════════════════════════

/// One user command, as translated from the keyboard by the visualizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    ToggleConnect,
    TogglePause,
    Clear,
    AddSpace,
    Backspace,
    Copy,
    Quit,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not create window: {0}")]
    Window(String),
}

/// Connection lifecycle as shown in the header. A failed connect stays
/// `Disconnected`; a dead read loop returns here too.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

// ════════════════════════════════════════════════════════════════════════════
// Demo feed
// ════════════════════════════════════════════════════════════════════════════

/// Tokens replayed forever in sim mode: letters, word breaks, one
/// dropped no-match, one display-only diagnostic.
const DEMO_SCRIPT: [&str; 14] = [
    "H", "E", "L", "L", "O", "_", "No match found", "W", "O", "R", "L", "D", "_", "CAL OK",
];

const DEMO_INTERVAL: Duration = Duration::from_millis(600);

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

/// Everything the window shows, owned by the main loop.
pub struct AppState {
    cfg: AppConfig,
    engine: PhraseEngine,
    sizes: SizePolicy,
    link: Option<ReaderHandle>,
    state: ConnectionState,
    paused: bool,
    /// One-line feedback under the phrase panel.
    pub status: String,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> AppState {
        AppState {
            cfg,
            engine: PhraseEngine::new(),
            sizes: SizePolicy::default(),
            link: None,
            state: ConnectionState::Disconnected,
            paused: false,
            status: "Press C to connect".to_string(),
        }
    }

    // ── session lifecycle ────────────────────────────────────────────────

    fn connect(&mut self) {
        match self.cfg.mode {
            SourceMode::Serial => match SerialSource::open(&self.cfg.port, self.cfg.baud) {
                Ok(source) => {
                    self.attach(source);
                    self.status =
                        format!("Connected {} at {} baud", self.cfg.port, self.cfg.baud);
                }
                Err(e) => {
                    // No retry loop; the user presses C again once the
                    // device is plugged in.
                    warn!("connect failed on {}: {}", self.cfg.port, e);
                    self.status = format!("Could not open {}: {}", self.cfg.port, e);
                }
            },
            SourceMode::Sim => {
                self.attach(ScriptSource::looping(DEMO_SCRIPT, DEMO_INTERVAL));
                self.status = "Connected to demo feed".to_string();
            }
        }
    }

    /// Start a session over an already-built source. The engine is
    /// recreated, so every session starts with a blank phrase.
    pub fn attach<S: LineSource>(&mut self, source: S) {
        self.attach_with(source, IDLE_BACKOFF);
    }

    fn attach_with<S: LineSource>(&mut self, source: S, backoff: Duration) {
        self.engine = PhraseEngine::new();
        self.link = Some(spawn_reader(source, backoff, false));
        self.state = ConnectionState::Connected;
        self.paused = false;
        info!("session started");
    }

    fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            // Joins the reader; the port is closed before this returns.
            link.stop();
        }
        self.engine = PhraseEngine::new();
        self.state = ConnectionState::Disconnected;
        self.paused = false;
        self.status = "Disconnected".to_string();
        info!("session ended");
    }

    /// Stop the reader before the window goes away.
    pub fn shutdown(&mut self) {
        if self.state == ConnectionState::Connected {
            self.disconnect();
        }
    }

    // ── command handling ─────────────────────────────────────────────────

    /// Apply one user command. `Quit` is the run loop's business, not
    /// handled here.
    pub fn handle_command(&mut self, cmd: UiCommand) {
        match cmd {
            UiCommand::ToggleConnect => match self.state {
                ConnectionState::Disconnected => self.connect(),
                ConnectionState::Connected => self.disconnect(),
            },
            UiCommand::TogglePause => match &self.link {
                Some(link) => {
                    self.paused = !self.paused;
                    link.set_paused(self.paused);
                    self.status = if self.paused {
                        "Paused; device output keeps buffering".to_string()
                    } else {
                        "Resumed".to_string()
                    };
                }
                None => self.status = "Not connected".to_string(),
            },
            UiCommand::Clear => self.edit(|e| e.clear(), "Phrase cleared"),
            UiCommand::AddSpace => self.edit(|e| e.add_space(), "Space added"),
            UiCommand::Backspace => self.edit(|e| e.backspace(), "Backspace"),
            UiCommand::Copy => self.copy_phrase(),
            UiCommand::Quit => {}
        }
    }

    fn edit(&mut self, op: impl FnOnce(&mut PhraseEngine), done: &str) {
        if self.state == ConnectionState::Disconnected {
            self.status = "Not connected".to_string();
            return;
        }
        op(&mut self.engine);
        self.status = done.to_string();
    }

    fn copy_phrase(&mut self) {
        let snap = self.engine.snapshot();
        if snap.phrase.is_empty() {
            self.status = "Nothing to copy".to_string();
            return;
        }
        match clipboard::set(&snap.phrase) {
            Ok(()) => {
                self.status = format!("Copied {} characters", snap.phrase.chars().count());
            }
            Err(e) => {
                warn!("clipboard copy failed: {}", e);
                self.status = format!("Copy failed: {}", e);
            }
        }
    }

    // ── reader events ────────────────────────────────────────────────────

    /// Drain pending reader events into the engine.
    pub fn tick(&mut self) {
        let events = match &self.link {
            Some(link) => link.drain(),
            None => return,
        };
        for event in events {
            self.apply(event);
        }
    }

    /// Apply one reader event. Split from [`AppState::tick`] so tests
    /// can drive the state machine without threads.
    pub fn apply(&mut self, event: LineEvent) {
        match event {
            LineEvent::Token(token) => {
                if let Some(ev) = self.engine.ingest(&token) {
                    self.status = match ev.phrase {
                        Some(_) => format!("Letter {:?}", ev.token),
                        None => format!("Showing {:?}", ev.token),
                    };
                }
            }
            LineEvent::Failed(e) => {
                // The reader already exited; reflect that instead of
                // pretending the link is still up.
                warn!("session dropped: {}", e);
                if let Some(link) = self.link.take() {
                    link.stop();
                }
                self.engine = PhraseEngine::new();
                self.state = ConnectionState::Disconnected;
                self.paused = false;
                self.status = format!("Read failed, disconnected: {}", e);
            }
        }
    }

    // ── render inputs ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    pub fn sizes(&self) -> &SizePolicy {
        &self.sizes
    }

    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Short link description for the header, empty when disconnected.
    pub fn link_desc(&self) -> String {
        match (self.state, self.cfg.mode) {
            (ConnectionState::Connected, SourceMode::Serial) => {
                format!("{} {}", self.cfg.port, self.cfg.baud)
            }
            (ConnectionState::Connected, SourceMode::Sim) => "demo feed".to_string(),
            (ConnectionState::Disconnected, _) => String::new(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Main loop
// ════════════════════════════════════════════════════════════════════════════

/// Open the window and run until the user quits or closes it.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let mut vis = Visualizer::new().map_err(AppError::Window)?;
    let mut app = AppState::new(cfg);

    'main: while vis.is_open() {
        for cmd in vis.poll_input() {
            if cmd == UiCommand::Quit {
                break 'main;
            }
            app.handle_command(cmd);
        }

        app.tick();

        let snap = app.snapshot();
        vis.render(
            &snap,
            app.sizes(),
            app.connected(),
            app.paused(),
            &app.link_desc(),
            &app.status,
        );
    }

    app.shutdown();
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    const TICK: Duration = Duration::from_millis(2);

    fn sim_app() -> AppState {
        AppState::new(AppConfig {
            mode: SourceMode::Sim,
            ..AppConfig::default()
        })
    }

    /// App with a live session over an idle script, so edits are
    /// allowed without hardware.
    fn connected_app() -> AppState {
        let mut app = sim_app();
        app.attach_with(ScriptSource::new(Vec::<String>::new()), TICK);
        app
    }

    fn failure() -> LineEvent {
        LineEvent::Failed(
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device unplugged").into(),
        )
    }

    // ── commands ─────────────────────────────────────────────────────────

    #[test]
    fn edits_require_a_session() {
        let mut app = sim_app();
        app.handle_command(UiCommand::Clear);
        assert_eq!(app.status, "Not connected");
        app.handle_command(UiCommand::Backspace);
        assert_eq!(app.status, "Not connected");
        assert_eq!(app.snapshot().phrase, "");
    }

    #[test]
    fn pause_without_a_session_is_refused() {
        let mut app = sim_app();
        app.handle_command(UiCommand::TogglePause);
        assert!(!app.paused());
        assert_eq!(app.status, "Not connected");
    }

    #[test]
    fn pause_toggles_the_reader_flag() {
        let mut app = connected_app();
        app.handle_command(UiCommand::TogglePause);
        assert!(app.paused());
        app.handle_command(UiCommand::TogglePause);
        assert!(!app.paused());
        app.shutdown();
    }

    #[test]
    fn space_backspace_and_clear_edit_the_phrase() {
        let mut app = connected_app();
        app.apply(LineEvent::Token("A".into()));
        app.apply(LineEvent::Token("B".into()));
        app.handle_command(UiCommand::AddSpace);
        assert_eq!(app.snapshot().phrase, "AB ");
        app.handle_command(UiCommand::Backspace);
        app.handle_command(UiCommand::Backspace);
        assert_eq!(app.snapshot().phrase, "A");
        app.handle_command(UiCommand::Clear);
        assert_eq!(app.snapshot().phrase, "");
        assert_eq!(app.snapshot().token, "B");
        app.shutdown();
    }

    // ── reader events ────────────────────────────────────────────────────

    #[test]
    fn token_events_drive_the_engine() {
        let mut app = connected_app();
        app.apply(LineEvent::Token("H".into()));
        app.apply(LineEvent::Token("I".into()));
        assert_eq!(app.snapshot().phrase, "HI");
        assert_eq!(app.snapshot().token, "I");
        app.shutdown();
    }

    #[test]
    fn rejected_tokens_change_nothing() {
        let mut app = connected_app();
        app.apply(LineEvent::Token("H".into()));
        app.apply(LineEvent::Token("No match found".into()));
        app.apply(LineEvent::Token("".into()));
        assert_eq!(app.snapshot().token, "H");
        assert_eq!(app.snapshot().phrase, "H");
        app.shutdown();
    }

    #[test]
    fn display_only_token_shows_without_accumulating() {
        let mut app = connected_app();
        app.apply(LineEvent::Token("H".into()));
        app.apply(LineEvent::Token("CAL OK".into()));
        assert_eq!(app.snapshot().token, "CAL OK");
        assert_eq!(app.snapshot().phrase, "H");
        app.shutdown();
    }

    #[test]
    fn read_failure_surfaces_as_disconnected() {
        let mut app = connected_app();
        app.apply(LineEvent::Token("H".into()));
        app.apply(failure());
        assert!(!app.connected());
        assert!(app.status.starts_with("Read failed"));
        assert_eq!(app.snapshot().phrase, "");
    }

    // ── clipboard ────────────────────────────────────────────────────────

    #[test]
    fn copy_places_the_phrase_on_the_clipboard() {
        let mut app = connected_app();
        app.apply(LineEvent::Token("H".into()));
        app.apply(LineEvent::Token("I".into()));
        app.handle_command(UiCommand::Copy);
        assert_eq!(clipboard::last().as_deref(), Some("HI"));
        assert_eq!(app.status, "Copied 2 characters");
        app.shutdown();
    }

    #[test]
    fn copy_with_nothing_accumulated_says_so() {
        let mut app = connected_app();
        app.handle_command(UiCommand::Copy);
        assert_eq!(app.status, "Nothing to copy");
        assert_eq!(clipboard::last(), None);
        app.shutdown();
    }

    // ── sessions ─────────────────────────────────────────────────────────

    #[test]
    fn disconnect_discards_the_phrase() {
        let mut app = connected_app();
        app.apply(LineEvent::Token("H".into()));
        app.handle_command(UiCommand::ToggleConnect);
        assert!(!app.connected());
        assert_eq!(app.snapshot().phrase, "");
        assert_eq!(app.link_desc(), "");
    }

    #[test]
    fn sim_mode_connects_without_hardware() {
        let mut app = sim_app();
        app.handle_command(UiCommand::ToggleConnect);
        assert!(app.connected());
        assert_eq!(app.link_desc(), "demo feed");
        app.handle_command(UiCommand::ToggleConnect);
        assert!(!app.connected());
    }

    #[test]
    fn scripted_session_accumulates_hi_there() {
        let mut app = sim_app();
        app.attach_with(ScriptSource::new(["H", "I", "_", "T", "H", "E", "R", "E"]), TICK);
        let start = Instant::now();
        while app.snapshot().phrase != "HI THERE" && start.elapsed() < Duration::from_secs(2) {
            app.tick();
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(app.snapshot().phrase, "HI THERE");
        assert_eq!(app.snapshot().token, "E");
        app.shutdown();
        assert!(!app.connected());
    }
}
