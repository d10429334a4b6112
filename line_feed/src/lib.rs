//! # line_feed
//!
//! Everything between the recognizer device and the presentation loop.
//!
//! * [`LineSource`] abstracts "something that produces newline-terminated
//!   text": a real serial port ([`SerialSource`]) or a scripted
//!   in-process feed ([`ScriptSource`]) for demos and tests.
//! * [`spawn_reader`] runs a source on its own thread and hands back a
//!   [`ReaderHandle`]: a channel of [`LineEvent`]s plus pause and stop
//!   control. The reader never touches application state; consumers
//!   drain the channel from their own loop, so the engine keeps exactly
//!   one writer.
//!
//! ## Pause and shutdown contract
//!
//! While paused the reader does not read at all, so pending bytes stay
//! in the OS buffer and nothing is dropped. Stop is a cooperative flag
//! observed once per poll; the source is owned by the reader thread and
//! dropped when its loop exits, which is what closes a serial port. A
//! stop therefore joins the thread and tears the session down without
//! racing an in-flight read.

pub mod reader;
pub mod source;

pub use reader::{spawn_reader, LineEvent, ReaderHandle, IDLE_BACKOFF};
pub use source::{
    available_ports, BaudRate, LineSource, ReadError, ScriptSource, SerialSource, READ_TIMEOUT,
};
