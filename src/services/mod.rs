//! Station services and the event channel contract
//!
//! Every I/O source (UART reader, operator keystrokes, server lookup) runs on
//! a background helper and delivers results onto one mpsc channel consumed by
//! the station event loop; nothing is shared by direct mutation. Events from
//! cancellable sources carry the generation they were issued under so the
//! event loop can discard anything produced before the most recent reset.

pub mod logging;
pub mod scanner;
pub mod serial;
pub mod server;

use crate::models::{ServerRecord, StationError};

/// One keystroke from the UI keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
}

/// Events produced by the UART reader
#[derive(Debug, Clone)]
pub enum SerialEvent {
    /// Port opened successfully
    Connected,
    /// One complete newline-terminated line, trimmed
    Line(String),
    /// Port could not be opened, or closed unexpectedly
    Error(String),
}

/// Everything the station event loop consumes
#[derive(Debug)]
pub enum Event {
    /// Operator pressed the start control
    Start,
    /// Operator pressed the reset control
    Reset,
    /// Keystroke routed to the scanner while scanning
    Key(Key),
    Serial {
        generation: u64,
        event: SerialEvent,
    },
    /// The single terminal event of a server lookup
    Server {
        generation: u64,
        result: Result<ServerRecord, StationError>,
    },
    /// The cable-check wait expired
    CableTimeout { generation: u64 },
}

pub type EventSender = tokio::sync::mpsc::UnboundedSender<Event>;
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<Event>;
