//! UART reader service
//!
//! Owns the serial-port connection to the board under test. A dedicated
//! reader thread opens the configured port and streams newline-terminated
//! lines back as events; an open failure is reported as an error event
//! rather than a panic so the workflow can return to idle for a manual
//! retry. Read timeouts are quiet periods, not errors.

use std::io::{BufRead, BufReader, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::constants::SERIAL_READ_TIMEOUT;
use crate::models::StationConfig;
use crate::services::{Event, EventSender, SerialEvent};

pub struct SerialService {
    running: Arc<AtomicBool>,
    reader: Option<thread::JoinHandle<()>>,
}

impl SerialService {
    /// Starts the reader thread for the configured port. Events are stamped
    /// with `generation` so lines from a superseded session are discarded
    /// by the event loop.
    pub fn spawn(config: &StationConfig, generation: u64, events: EventSender) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let dev = config.uart_dev.clone();
        let baud = config.baud_rate;

        let reader = thread::spawn(move || read_loop(dev, baud, generation, events, flag));

        Self {
            running,
            reader: Some(reader),
        }
    }

    /// Graceful, idempotent shutdown; joins the reader thread, which
    /// releases the port handle on exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl Drop for SerialService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop(dev: String, baud: u32, generation: u64, events: EventSender, running: Arc<AtomicBool>) {
    let send = |event: SerialEvent| {
        let _ = events.send(Event::Serial { generation, event });
    };

    let port = match serialport::new(&dev, baud)
        .timeout(SERIAL_READ_TIMEOUT)
        .open()
    {
        Ok(port) => port,
        Err(e) => {
            send(SerialEvent::Error(format!("{}: {}", dev, e)));
            return;
        }
    };
    send(SerialEvent::Connected);

    let mut reader = BufReader::new(port);
    let mut buf = String::new();

    while running.load(Ordering::SeqCst) {
        match reader.read_line(&mut buf) {
            Ok(0) => {
                if running.load(Ordering::SeqCst) {
                    send(SerialEvent::Error(format!("{}: closed unexpectedly", dev)));
                }
                break;
            }
            Ok(_) => {
                if buf.ends_with('\n') {
                    let line = buf.trim().to_string();
                    buf.clear();
                    if !line.is_empty() {
                        send(SerialEvent::Line(line));
                    }
                }
            }
            // partial line stays in buf across timeouts
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    send(SerialEvent::Error(format!("{}: {}", dev, e)));
                }
                break;
            }
        }
    }
    // port handle dropped here
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StationConfig;

    #[tokio::test]
    async fn test_unopenable_port_reports_error_event() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let config = StationConfig {
            uart_dev: "/nonexistent/ttyNOPE".to_string(),
            ..StationConfig::default()
        };

        let mut service = SerialService::spawn(&config, 7, tx);
        let event = rx.recv().await.expect("one error event");
        match event {
            Event::Serial {
                generation,
                event: SerialEvent::Error(_),
            } => assert_eq!(generation, 7),
            other => panic!("expected serial error event, got {:?}", other),
        }
        service.stop();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let config = StationConfig {
            uart_dev: "/nonexistent/ttyNOPE".to_string(),
            ..StationConfig::default()
        };

        let mut service = SerialService::spawn(&config, 0, tx);
        service.stop();
        service.stop();
    }
}
