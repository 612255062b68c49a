//! UI event contract and the terminal frontend
//!
//! The workflow never talks to widgets: it emits typed `UiEvent`s on a
//! channel, and a frontend renders them. The terminal frontend below is the
//! shipped renderer; a touchscreen frontend would consume the identical
//! contract. Operator input travels the other way as control presses and
//! scanner keystrokes on the station event channel.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::models::{TestCaseId, TestOutcome};
use crate::services::{Event, EventSender, Key};

/// Display slot for a captured data matrix code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSlot {
    Top,
    Bottom,
}

/// Everything the workflow tells the presentation layer
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Active status line
    Status { text: String, error: bool },
    /// Which operator controls are currently enabled
    Controls {
        start_enabled: bool,
        reset_enabled: bool,
    },
    /// A captured code to display
    CodeCaptured { slot: CodeSlot, code: String },
    /// Clear both displayed codes
    CodesCleared,
    /// A checklist entry changed
    TestCase {
        id: TestCaseId,
        outcome: TestOutcome,
    },
    /// One line for the on-screen log surface
    LogLine(String),
}

pub type UiSender = tokio::sync::mpsc::UnboundedSender<UiEvent>;
pub type UiReceiver = tokio::sync::mpsc::UnboundedReceiver<UiEvent>;

/// Reads operator input from stdin and feeds it to the station.
///
/// `start` and `reset` are the control words; anything else is treated as
/// scanner output, replayed as its keystrokes followed by the terminator,
/// which is exactly what a keyboard-wedge scanner produces.
pub async fn read_operator_input(events: EventSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        let event = match trimmed.to_ascii_lowercase().as_str() {
            "start" => Event::Start,
            "reset" => Event::Reset,
            "" => continue,
            _ => {
                for c in trimmed.chars() {
                    if events.send(Event::Key(Key::Char(c))).is_err() {
                        return;
                    }
                }
                Event::Key(Key::Enter)
            }
        };
        if events.send(event).is_err() {
            return;
        }
    }
}

/// Renders one UI event onto the terminal
pub fn render(event: &UiEvent) {
    match event {
        UiEvent::Status { text, error } => {
            if *error {
                println!("** {} **", text);
            } else {
                println!("== {} ==", text);
            }
        }
        UiEvent::Controls {
            start_enabled,
            reset_enabled,
        } => {
            let mut available = Vec::new();
            if *start_enabled {
                available.push("start");
            }
            if *reset_enabled {
                available.push("reset");
            }
            println!("   controls: {}", available.join(", "));
        }
        UiEvent::CodeCaptured { slot, code } => {
            let label = match slot {
                CodeSlot::Top => "top",
                CodeSlot::Bottom => "bottom",
            };
            println!("   {} code: {}", label, code);
        }
        UiEvent::CodesCleared => {
            println!("   codes cleared");
        }
        UiEvent::TestCase { id, outcome } => {
            let mark = match outcome {
                TestOutcome::Idle => "[ -- ]",
                TestOutcome::Success => "[ OK ]",
                TestOutcome::Failure => "[FAIL]",
            };
            println!("   {} {}", mark, id.description());
        }
        UiEvent::LogLine(line) => {
            println!("{}", line);
        }
    }
}
