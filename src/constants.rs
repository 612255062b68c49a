//! Global constants for berrytest
//!
//! Centralized location for application-wide defaults and the operator-facing
//! status strings pushed by the workflow.

use std::time::Duration;

/// Default factory server endpoint used when no argument is given.
/// A loopback one-liner works for bench testing:
///   ncat -lk 8000 -c 'sleep 1; echo "HTTP/1.1 200 OK\r\n\r\nS3R14LNUM83R\n02:00:00:00:00:01\n02:00:00:00:00:02"'
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Default API key for the factory server (test value)
pub const DEFAULT_API_KEY: &str = "testkey";

/// Default UART device path. For bench testing without hardware:
///   socat -d -d pty,raw,echo=0,link=/tmp/ttyMBT01 pty,raw,echo=0,link=/tmp/ttyMBT02
pub const DEFAULT_UART_DEV: &str = "/tmp/ttyMBT01";

/// Default UART baud rate for the board-under-test console
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial read timeout; a timeout is a quiet period, not an error
pub const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Single-attempt HTTP request timeout against the factory server
pub const SERVER_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait for the expected MACs to appear on the UART before the
/// cable-check step is failed
pub const DEFAULT_CABLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default directory for per-session log files
pub const DEFAULT_LOG_DIR: &str = "/tmp";

/// Per-session log file prefix, completed with a timestamp
pub const LOG_FILE_PREFIX: &str = "berrytest-";

/// Accepted length range for a scanned data matrix code
pub const SCAN_MIN_LEN: usize = 3;
pub const SCAN_MAX_LEN: usize = 64;

// Operator-facing status strings. Wording is presentation detail; the
// workflow only selects which one is active.
pub const STATUS_READY: &str = "Plug in UART cable and press START";
pub const STATUS_CONNECTING: &str = "Connecting to UART";
pub const STATUS_CONNECT_FAILED: &str = "Connection to UART failed";
pub const STATUS_SCAN_TOP: &str = "Scan the TOP data matrix code";
pub const STATUS_SCAN_BOTTOM: &str = "Scan the BOTTOM data matrix code";
pub const STATUS_FETCHING: &str = "Fetching serial and MACs";
pub const STATUS_FETCH_FAILED: &str = "Server lookup failed";
pub const STATUS_CONNECT_CABLES: &str = "Connect the remaining cables";
pub const STATUS_SUCCESS: &str = "All tests successful";
pub const STATUS_FAILURE: &str = "Test FAILED";
