//! Data models module
//!
//! Defines core data structures:
//! - TestState: the single active workflow state
//! - TestCase: one checklist entry with a tri-state outcome
//! - MacAddr / ServerRecord: expected identity data fetched from the server
//! - ScanResult: the captured pair of data matrix codes
//! - StationConfig: explicit configuration passed at construction
//! - StationError: the locally-recovered error taxonomy

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants;

/// Workflow state. Exactly one is active at a time; transitions are driven
/// by workflow events, never by UI interaction directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestState {
    Idle,
    Connecting,
    Scanning,
    Fetching,
    ConnectingCables,
    Success,
    Failure,
}

/// Tri-state result of a single checklist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Idle,
    Success,
    Failure,
}

/// Identifies one entry of the visible checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCaseId {
    ConnectToUart,
    ScanCodes,
    FetchRecord,
    VerifyMacs,
}

impl TestCaseId {
    /// All checklist entries in display order
    pub const ALL: [TestCaseId; 4] = [
        TestCaseId::ConnectToUart,
        TestCaseId::ScanCodes,
        TestCaseId::FetchRecord,
        TestCaseId::VerifyMacs,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            TestCaseId::ConnectToUart => "Connect to UART",
            TestCaseId::ScanCodes => "Scan two data matrix codes",
            TestCaseId::FetchRecord => "Fetch serial number and MAC addresses from server",
            TestCaseId::VerifyMacs => "Receive expected MAC addresses via UART",
        }
    }
}

/// One checklist entry. Mutated only by the workflow as it evaluates
/// each check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCase {
    pub id: TestCaseId,
    pub outcome: TestOutcome,
}

/// A fresh checklist with every entry idle
pub fn checklist() -> Vec<TestCase> {
    TestCaseId::ALL
        .iter()
        .map(|&id| TestCase {
            id,
            outcome: TestOutcome::Idle,
        })
        .collect()
}

/// A network hardware address in `XX:XX:XX:XX:XX:XX` hex-colon form.
///
/// Parsed into bytes so that comparison is case-insensitive by construction;
/// ordering allows collecting into a `BTreeSet` for order-insensitive
/// set comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddr([u8; 6]);

impl FromStr for MacAddr {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut count = 0;
        for part in s.trim().split(':') {
            if count == 6 || part.len() != 2 {
                return Err(StationError::Server(format!("invalid MAC address: {s:?}")));
            }
            octets[count] = u8::from_str_radix(part, 16)
                .map_err(|_| StationError::Server(format!("invalid MAC address: {s:?}")))?;
            count += 1;
        }
        if count != 6 {
            return Err(StationError::Server(format!("invalid MAC address: {s:?}")));
        }
        Ok(MacAddr(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

/// The captured pair of data matrix codes, top and bottom.
/// Immutable once both codes are accepted for a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub top: String,
    pub bottom: String,
}

/// Expected identity data returned by the factory server for a scan pair.
/// Read-only after fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRecord {
    /// Expected serial number of the board
    pub serial: String,
    /// Expected MAC addresses, in response order
    pub macs: Vec<MacAddr>,
}

impl ServerRecord {
    /// The expected MACs as a set, for order-insensitive comparison
    pub fn mac_set(&self) -> BTreeSet<MacAddr> {
        self.macs.iter().copied().collect()
    }
}

/// Station configuration, passed explicitly at construction
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Base URL of the factory server
    pub server_url: String,
    /// API key sent with each server request
    pub api_key: String,
    /// UART device path for the board-under-test console
    pub uart_dev: String,
    /// UART baud rate
    pub baud_rate: u32,
    /// How long to wait for the expected MACs during the cable check
    pub cable_timeout: Duration,
    /// Directory for per-session log files
    pub log_dir: PathBuf,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            server_url: constants::DEFAULT_SERVER_URL.to_string(),
            api_key: constants::DEFAULT_API_KEY.to_string(),
            uart_dev: constants::DEFAULT_UART_DEV.to_string(),
            baud_rate: constants::DEFAULT_BAUD_RATE,
            cable_timeout: constants::DEFAULT_CABLE_TIMEOUT,
            log_dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
        }
    }
}

/// Optional station settings read from a TOML file; any field left out
/// falls back to the built-in default, and explicit CLI arguments win
/// over the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationFile {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub uart_dev: Option<String>,
    pub baud_rate: Option<u32>,
    pub cable_timeout_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

/// Errors recovered locally by the workflow. Each maps to a transition back
/// to idle or to the failure state plus a log entry; none propagate to the
/// process level.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StationError {
    /// Serial port unavailable or closed unexpectedly
    #[error("UART connection error: {0}")]
    Connection(String),
    /// Captured code fails validation
    #[error("scanned code rejected: {0}")]
    ScanFormat(String),
    /// Network failure, timeout, or unparsable response
    #[error("server error: {0}")]
    Server(String),
    /// Observed MACs don't match the expected set
    #[error("MAC verification failed: {0}")]
    Mismatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse_and_display_roundtrip() {
        let mac: MacAddr = "02:00:00:00:00:01".parse().unwrap();
        assert_eq!(mac.to_string(), "02:00:00:00:00:01");
    }

    #[test]
    fn test_mac_parse_is_case_insensitive() {
        let upper: MacAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let lower: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_mac_parse_rejects_malformed_input() {
        assert!("".parse::<MacAddr>().is_err());
        assert!("02:00:00:00:00".parse::<MacAddr>().is_err());
        assert!("02:00:00:00:00:01:02".parse::<MacAddr>().is_err());
        assert!("02:00:00:00:00:zz".parse::<MacAddr>().is_err());
        assert!("020000000001".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_set_comparison_ignores_order() {
        let a = ServerRecord {
            serial: "S1".to_string(),
            macs: vec![
                "02:00:00:00:00:01".parse().unwrap(),
                "02:00:00:00:00:02".parse().unwrap(),
            ],
        };
        let observed: BTreeSet<MacAddr> = [
            "02:00:00:00:00:02".parse().unwrap(),
            "02:00:00:00:00:01".parse().unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(a.mac_set(), observed);
    }

    #[test]
    fn test_checklist_starts_idle() {
        let cases = checklist();
        assert_eq!(cases.len(), TestCaseId::ALL.len());
        assert!(cases.iter().all(|c| c.outcome == TestOutcome::Idle));
    }

    #[test]
    fn test_default_config_uses_bench_values() {
        let config = StationConfig::default();
        assert_eq!(config.server_url, constants::DEFAULT_SERVER_URL);
        assert_eq!(config.uart_dev, constants::DEFAULT_UART_DEV);
        assert_eq!(config.baud_rate, constants::DEFAULT_BAUD_RATE);
    }
}
