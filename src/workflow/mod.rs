//! Workflow state machine
//!
//! The core of the station: sequences
//! `reset → connect_to_uart → scan_qr_codes → fetch_serial_and_macs →
//! connect_cables → done`, consuming events from the UART reader, the
//! scanner, and the server client, and driving the UI through typed events.
//!
//! Every transition updates the relevant checklist entry, logs a status
//! message, and adjusts the operator controls. All mutation happens in
//! `handle_event` on the event-loop task; background helpers only ever
//! deliver events. Cancellation works by generation: `reset` bumps the
//! session generation and anything stamped with an older one is discarded
//! on arrival, so no stale callback can touch fresh state.

use log::{debug, error, info, warn};
use serde_json::json;
use std::collections::BTreeSet;
use tokio::task::JoinHandle;

use crate::constants;
use crate::models::{
    self, MacAddr, ScanResult, ServerRecord, StationConfig, StationError, TestCase, TestCaseId,
    TestOutcome, TestState,
};
use crate::services::scanner::ScannerService;
use crate::services::serial::SerialService;
use crate::services::server::ServerClient;
use crate::services::{Event, EventSender, Key, SerialEvent};
use crate::ui::{CodeSlot, UiEvent, UiSender};

pub struct Workflow {
    config: StationConfig,
    state: TestState,
    /// Bumped on every cancellation; events from older sessions are stale
    generation: u64,
    scanner: ScannerService,
    scanned: Vec<String>,
    record: Option<ServerRecord>,
    observed: BTreeSet<MacAddr>,
    cases: Vec<TestCase>,
    serial: Option<SerialService>,
    fetch: Option<JoinHandle<()>>,
    server: ServerClient,
    events: EventSender,
    ui: UiSender,
}

impl Workflow {
    pub fn new(
        config: StationConfig,
        server: ServerClient,
        events: EventSender,
        ui: UiSender,
    ) -> Self {
        Self {
            config,
            state: TestState::Idle,
            generation: 0,
            scanner: ScannerService::new(),
            scanned: Vec::new(),
            record: None,
            observed: BTreeSet::new(),
            cases: models::checklist(),
            serial: None,
            fetch: None,
            server,
            events,
            ui,
        }
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Central dispatch. Service events carry the generation they were
    /// issued under; anything older than the current session is dropped.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Start => self.start(),
            Event::Reset => self.reset(),
            Event::Key(key) => self.handle_key(key),
            Event::Serial { generation, event } if generation == self.generation => {
                self.handle_serial(event)
            }
            Event::Server { generation, result } if generation == self.generation => {
                self.handle_server(result)
            }
            Event::CableTimeout { generation } if generation == self.generation => {
                self.handle_cable_timeout()
            }
            stale => debug!("discarding stale event {:?}", stale),
        }
    }

    /// Entry point into a test run; only valid from idle
    pub fn start(&mut self) {
        if self.state != TestState::Idle {
            warn!("start ignored in state {:?}", self.state);
            return;
        }
        // the previous run may have ended in a reported failure; begin clean
        self.scanned.clear();
        self.record = None;
        self.observed.clear();
        self.cases = models::checklist();
        for case in self.cases.clone() {
            self.ui_case(case.id, case.outcome);
        }
        self.ui_send(UiEvent::CodesCleared);
        self.connect_to_uart();
    }

    /// Returns to idle from any state, cancelling all in-flight work and
    /// clearing the checklist for the next board.
    pub fn reset(&mut self) {
        info!("--- resetting ---");
        self.cancel_inflight();
        self.scanned.clear();
        self.record = None;
        self.observed.clear();
        self.cases = models::checklist();
        for case in self.cases.clone() {
            self.ui_case(case.id, case.outcome);
        }
        self.set_state(TestState::Idle);
        self.ui_send(UiEvent::CodesCleared);
        self.ui_status(constants::STATUS_READY, false);
        self.ui_controls(true, false);
    }

    /// Stops background work without touching the visible report; used on
    /// process shutdown.
    pub fn shutdown(&mut self) {
        self.cancel_inflight();
    }

    fn connect_to_uart(&mut self) {
        self.set_state(TestState::Connecting);
        self.ui_status(constants::STATUS_CONNECTING, false);
        self.ui_controls(false, true);
        self.serial = Some(SerialService::spawn(
            &self.config,
            self.generation,
            self.events.clone(),
        ));
    }

    fn scan_qr_codes(&mut self) {
        self.set_state(TestState::Scanning);
        self.ui_status(constants::STATUS_SCAN_TOP, false);
    }

    fn fetch_serial_and_macs(&mut self) {
        let scans = ScanResult {
            top: self.scanned[0].clone(),
            bottom: self.scanned[1].clone(),
        };
        self.set_state(TestState::Fetching);
        self.ui_status(constants::STATUS_FETCHING, false);
        self.fetch = Some(
            self.server
                .fetch(&scans, self.generation, self.events.clone()),
        );
    }

    fn connect_cables(&mut self) {
        self.set_state(TestState::ConnectingCables);
        self.ui_status(constants::STATUS_CONNECT_CABLES, false);

        // bound the wait for the expected MACs
        let events = self.events.clone();
        let generation = self.generation;
        let timeout = self.config.cable_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(Event::CableTimeout { generation });
        });
    }

    fn done(&mut self) {
        self.set_case(TestCaseId::VerifyMacs, TestOutcome::Success);
        self.cancel_inflight();
        self.set_state(TestState::Success);
        self.ui_status(constants::STATUS_SUCCESS, false);
        self.ui_controls(false, true);
        info!("all checks passed");
    }

    /// Scanner input is meaningful only while scanning; in any other state
    /// keystrokes are dropped before they reach the buffer.
    fn handle_key(&mut self, key: Key) {
        if self.state != TestState::Scanning {
            return;
        }
        match self.scanner.push_key(key) {
            Some(Ok(code)) => self.accept_scan(code),
            Some(Err(err)) => {
                error!("{}", err);
                self.ui_status(&err.to_string(), true);
            }
            None => {}
        }
    }

    fn accept_scan(&mut self, code: String) {
        self.scanned.push(code.clone());
        match self.scanned.len() {
            1 => {
                info!("first code scanned: {}", code);
                self.ui_send(UiEvent::CodeCaptured {
                    slot: CodeSlot::Top,
                    code,
                });
                self.ui_status(constants::STATUS_SCAN_BOTTOM, false);
            }
            2 => {
                info!("second code scanned: {}", code);
                self.ui_send(UiEvent::CodeCaptured {
                    slot: CodeSlot::Bottom,
                    code,
                });
                self.set_case(TestCaseId::ScanCodes, TestOutcome::Success);
                self.fetch_serial_and_macs();
            }
            // unreachable while key routing leaves Scanning after two codes
            n => error!("scan accepted with {} codes already captured", n - 1),
        }
    }

    fn handle_serial(&mut self, event: SerialEvent) {
        match event {
            SerialEvent::Connected => {
                if self.state == TestState::Connecting {
                    info!("connected to UART");
                    self.set_case(TestCaseId::ConnectToUart, TestOutcome::Success);
                    self.scan_qr_codes();
                }
            }
            SerialEvent::Line(line) => self.handle_serial_line(line),
            SerialEvent::Error(message) => self.handle_serial_error(message),
        }
    }

    fn handle_serial_line(&mut self, line: String) {
        // raw UART traffic is mirrored to the log in every state
        info!("S> {}", line);
        if self.state != TestState::ConnectingCables {
            return;
        }
        let expected = match &self.record {
            Some(record) => record.mac_set(),
            None => return,
        };
        // lines that are not MAC addresses take no part in the comparison
        let mac: MacAddr = match line.trim().parse() {
            Ok(mac) => mac,
            Err(_) => return,
        };

        if !expected.contains(&mac) {
            let err = StationError::Mismatch(format!("unexpected MAC {} on UART", mac));
            error!("{}", err);
            self.fail_cable_check();
            return;
        }
        self.observed.insert(mac);
        if self.observed == expected {
            self.done();
        }
    }

    fn handle_serial_error(&mut self, message: String) {
        let err = StationError::Connection(message);
        error!("{}", err);
        match self.state {
            TestState::Connecting => {
                self.set_case(TestCaseId::ConnectToUart, TestOutcome::Failure);
                self.back_to_idle(constants::STATUS_CONNECT_FAILED);
            }
            TestState::Scanning => {
                self.set_case(TestCaseId::ScanCodes, TestOutcome::Failure);
                self.fail_run(constants::STATUS_CONNECT_FAILED);
            }
            TestState::Fetching => {
                self.set_case(TestCaseId::FetchRecord, TestOutcome::Failure);
                self.fail_run(constants::STATUS_CONNECT_FAILED);
            }
            TestState::ConnectingCables => {
                self.set_case(TestCaseId::VerifyMacs, TestOutcome::Failure);
                self.fail_run(constants::STATUS_CONNECT_FAILED);
            }
            // already idle or terminal
            _ => {}
        }
    }

    fn handle_server(&mut self, result: Result<ServerRecord, StationError>) {
        if self.state != TestState::Fetching {
            return;
        }
        self.fetch = None;
        match result {
            Ok(record) => {
                info!(
                    "server returned serial {} with {} MAC(s)",
                    record.serial,
                    record.macs.len()
                );
                self.set_case(TestCaseId::FetchRecord, TestOutcome::Success);
                self.record = Some(record);
                self.connect_cables();
            }
            Err(err) => {
                error!("{}", err);
                self.set_case(TestCaseId::FetchRecord, TestOutcome::Failure);
                // single attempt per step; the operator starts over
                self.back_to_idle(constants::STATUS_FETCH_FAILED);
            }
        }
    }

    fn handle_cable_timeout(&mut self) {
        if self.state != TestState::ConnectingCables {
            return;
        }
        let err = StationError::Mismatch(format!(
            "timed out after {:?} waiting for expected MACs on UART",
            self.config.cable_timeout
        ));
        error!("{}", err);
        self.fail_cable_check();
    }

    fn fail_cable_check(&mut self) {
        self.set_case(TestCaseId::VerifyMacs, TestOutcome::Failure);
        self.fail_run(constants::STATUS_FAILURE);
    }

    /// Recoverable failure: back to idle with the report left visible, so
    /// start can be pressed again without a reset.
    fn back_to_idle(&mut self, status: &str) {
        self.cancel_inflight();
        self.set_state(TestState::Idle);
        self.ui_status(status, true);
        self.ui_controls(true, false);
    }

    /// Terminal failure: the board is rejected until the operator resets
    fn fail_run(&mut self, status: &str) {
        self.cancel_inflight();
        self.set_state(TestState::Failure);
        self.ui_status(status, true);
        self.ui_controls(false, true);
    }

    /// Stops the serial reader, aborts any outstanding fetch, drops any
    /// partial scan, and invalidates everything already in flight.
    fn cancel_inflight(&mut self) {
        self.generation += 1;
        if let Some(mut serial) = self.serial.take() {
            serial.stop();
        }
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
        self.scanner.clear();
    }

    fn set_state(&mut self, next: TestState) {
        debug!(
            "state change | {}",
            json!({ "from": self.state, "to": next })
        );
        self.state = next;
    }

    fn set_case(&mut self, id: TestCaseId, outcome: TestOutcome) {
        if let Some(case) = self.cases.iter_mut().find(|case| case.id == id) {
            case.outcome = outcome;
        }
        self.ui_case(id, outcome);
    }

    fn ui_case(&self, id: TestCaseId, outcome: TestOutcome) {
        self.ui_send(UiEvent::TestCase { id, outcome });
    }

    fn ui_status(&self, text: &str, error: bool) {
        self.ui_send(UiEvent::Status {
            text: text.to_string(),
            error,
        });
    }

    fn ui_controls(&self, start_enabled: bool, reset_enabled: bool) {
        self.ui_send(UiEvent::Controls {
            start_enabled,
            reset_enabled,
        });
    }

    fn ui_send(&self, event: UiEvent) {
        let _ = self.ui.send(event);
    }
}
