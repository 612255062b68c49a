//! Barcode scanner input
//!
//! The scanner is a keyboard wedge: it types the decoded code into whatever
//! has keyboard focus and finishes with a return key. This service
//! accumulates those keystrokes and emits the buffered text as a completed
//! scan on the terminator, after validating it against the expected data
//! matrix format. No hardware-specific protocol is involved.

use crate::constants::{SCAN_MAX_LEN, SCAN_MIN_LEN};
use crate::models::StationError;
use crate::services::Key;

#[derive(Debug, Default)]
pub struct ScannerService {
    buffer: String,
}

impl ScannerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one keystroke. Returns `Some` only when a terminator completes
    /// a capture: the validated code, or the validation error. An empty
    /// buffer at terminator emits nothing.
    pub fn push_key(&mut self, key: Key) -> Option<Result<String, StationError>> {
        match key {
            Key::Char(c) => {
                self.buffer.push(c);
                None
            }
            Key::Enter => {
                if self.buffer.is_empty() {
                    return None;
                }
                let code = std::mem::take(&mut self.buffer);
                Some(validate_scan(&code).map(|_| code))
            }
        }
    }

    /// Drops any partial capture
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

fn validate_scan(code: &str) -> Result<(), StationError> {
    if code.len() < SCAN_MIN_LEN || code.len() > SCAN_MAX_LEN {
        return Err(StationError::ScanFormat(format!(
            "{:?}: length {} outside {}..={}",
            code,
            code.len(),
            SCAN_MIN_LEN,
            SCAN_MAX_LEN
        )));
    }
    if !code.chars().all(|c| c.is_ascii_graphic()) {
        return Err(StationError::ScanFormat(format!(
            "{:?}: contains non-printable or non-ASCII characters",
            code
        )));
    }
    Ok(())
}
