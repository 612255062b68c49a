//! Session logging for the test station
//!
//! Backend for the `log` facade: each record is written as a timestamped
//! `[LEVEL] message` line to a per-session file and mirrored onto the UI
//! event channel for the on-screen log surface. A new file is started for
//! every test session so one board's log is one file.

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::constants;
use crate::ui::{UiEvent, UiSender};

/// Cloneable handle to the station logger; one clone is installed as the
/// global `log` backend, another stays with the station loop for session
/// rotation.
#[derive(Clone)]
pub struct StationLogger {
    shared: Arc<Shared>,
}

struct Shared {
    log_dir: PathBuf,
    file: Mutex<File>,
    ui: UiSender,
}

impl StationLogger {
    /// Creates the log directory and the first session file, then installs
    /// this logger as the global `log` backend.
    pub fn init(log_dir: &Path, ui: UiSender) -> Result<Self> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
        let (file, _) = open_session_file(log_dir)?;

        let logger = Self {
            shared: Arc::new(Shared {
                log_dir: log_dir.to_path_buf(),
                file: Mutex::new(file),
                ui,
            }),
        };

        log::set_boxed_logger(Box::new(logger.clone()))
            .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;
        log::set_max_level(LevelFilter::Debug);

        Ok(logger)
    }

    /// Starts a new session file; called when the operator resets the
    /// station so each board gets its own log.
    pub fn begin_session(&self) -> Result<PathBuf> {
        let (file, path) = open_session_file(&self.shared.log_dir)?;
        let mut guard = self.shared.file.lock().unwrap_or_else(|e| e.into_inner());
        *guard = file;
        Ok(path)
    }
}

fn session_path(dir: &Path) -> PathBuf {
    dir.join(format!(
        "{}{}.log",
        constants::LOG_FILE_PREFIX,
        Local::now().format("%Y-%m-%d-%H-%M-%S")
    ))
}

fn open_session_file(dir: &Path) -> Result<(File, PathBuf)> {
    let path = session_path(dir);
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    Ok((file, path))
}

/// Records from this crate pass at any level; third-party records (HTTP
/// internals and the like) go to the file only, at info and above.
fn own_record(metadata: &Metadata) -> bool {
    metadata.target().starts_with(env!("CARGO_PKG_NAME"))
}

impl log::Log for StationLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        own_record(metadata) || metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!("[{}] {}", record.level(), record.args());
        {
            let mut guard = self.shared.file.lock().unwrap_or_else(|e| e.into_inner());
            let _ = writeln!(guard, "{} {}", Local::now().format("%Y-%m-%d %H:%M:%S"), line);
        }

        if own_record(record.metadata()) && record.level() <= Level::Info {
            let _ = self.shared.ui.send(UiEvent::LogLine(line));
        }
    }

    fn flush(&self) {
        let mut guard = self.shared.file.lock().unwrap_or_else(|e| e.into_inner());
        let _ = guard.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_path_uses_prefix_and_log_extension() {
        let path = session_path(Path::new("/tmp"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(constants::LOG_FILE_PREFIX));
        assert!(name.ends_with(".log"));
    }

    #[test]
    fn test_own_records_pass_at_any_level() {
        let metadata = Metadata::builder()
            .target(concat!(env!("CARGO_PKG_NAME"), "::workflow"))
            .level(Level::Debug)
            .build();
        assert!(own_record(&metadata));
    }

    #[test]
    fn test_foreign_debug_records_are_filtered() {
        let metadata = Metadata::builder()
            .target("hyper::client")
            .level(Level::Debug)
            .build();
        assert!(!own_record(&metadata));
        assert!(metadata.level() > Level::Info);
    }
}
