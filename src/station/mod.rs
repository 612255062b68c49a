//! Station runtime
//!
//! Builds the services, installs the logger, and runs the event loop that
//! owns the workflow. This is the single UI-bound control flow: every
//! service event and every UI update passes through it in delivery order;
//! background helpers never touch station state directly.

use anyhow::Result;
use log::{error, info};
use tokio::sync::mpsc;

use crate::models::StationConfig;
use crate::services::logging::StationLogger;
use crate::services::server::ServerClient;
use crate::services::Event;
use crate::ui;
use crate::workflow::Workflow;

pub async fn run(config: StationConfig) -> Result<()> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();

    let logger = StationLogger::init(&config.log_dir, ui_tx.clone())?;
    info!(
        "station starting: uart {} @ {}, server {}",
        config.uart_dev, config.baud_rate, config.server_url
    );

    let server = ServerClient::new(&config)?;
    let mut workflow = Workflow::new(config, server, events_tx.clone(), ui_tx);

    tokio::spawn(ui::read_operator_input(events_tx));

    // initial surface: ready status, controls, empty checklist
    workflow.reset();

    loop {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                // each board gets its own log file
                if matches!(event, Event::Reset) {
                    match logger.begin_session() {
                        Ok(path) => info!("log session {}", path.display()),
                        Err(e) => error!("failed to rotate log file: {:#}", e),
                    }
                }
                workflow.handle_event(event);
            }
            Some(ui_event) = ui_rx.recv() => ui::render(&ui_event),
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                workflow.shutdown();
                break;
            }
            else => break,
        }
    }

    Ok(())
}
