//! # asl_reader
//!
//! Desktop display for a serial sign-language recognizer. The device
//! sends one recognized token per line; the window shows the latest
//! token in large type, accumulates letters into a phrase, and lets the
//! user edit and copy that phrase.
//!
//! ## Keys
//!
//! | Key         | Command                                   |
//! |-------------|-------------------------------------------|
//! | `C`         | connect / disconnect                      |
//! | `P`         | pause / resume (device keeps buffering)   |
//! | `Space`     | append a space                            |
//! | `Backspace` | delete the last character (repeats)       |
//! | `X`         | clear the phrase                          |
//! | `Y`         | copy the phrase to the system clipboard   |
//! | `Q`         | quit                                      |
//!
//! ## Architecture
//!
//! `line_feed` runs the serial port on a reader thread and posts line
//! events to a channel; the main loop in [`app`] drains that channel,
//! feeds the `phrase_engine`, and renders through [`visualizer`]. State
//! has exactly one writer and the reader thread holds no locks.

pub mod app;
pub mod clipboard;
pub mod visualizer;
