//! Factory server client
//!
//! Performs the single expected-identity lookup for a captured scan pair:
//! one GET against `<endpoint>/getserial` carrying both codes and the
//! station API key. The request runs on the runtime off the event-loop task
//! and delivers exactly one terminal event back to its owner: the parsed
//! record, or an error. A non-2xx status, a network failure, a timeout, and
//! an unparsable body are all server errors; the workflow makes no retry.

use reqwest::{Client, RequestBuilder};
use tokio::task::JoinHandle;

use crate::constants::SERVER_REQUEST_TIMEOUT;
use crate::models::{MacAddr, ScanResult, ServerRecord, StationConfig, StationError};
use crate::services::{Event, EventSender};

pub struct ServerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ServerClient {
    pub fn new(config: &StationConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(SERVER_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fires the lookup for a scan pair. The returned handle can be aborted
    /// on reset; the generation stamp makes a late response inert either way.
    pub fn fetch(&self, scans: &ScanResult, generation: u64, events: EventSender) -> JoinHandle<()> {
        let request = self
            .client
            .get(format!("{}/getserial", self.base_url))
            .query(&[("qr1", scans.top.as_str()), ("qr2", scans.bottom.as_str())])
            .header("x-api-key", self.api_key.as_str());

        tokio::spawn(async move {
            let result = execute(request).await;
            let _ = events.send(Event::Server { generation, result });
        })
    }
}

async fn execute(request: RequestBuilder) -> Result<ServerRecord, StationError> {
    let response = request
        .send()
        .await
        .map_err(|e| StationError::Server(e.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| StationError::Server(e.to_string()))?;

    if !status.is_success() {
        let detail: String = body.trim().chars().take(200).collect();
        return Err(StationError::Server(format!("HTTP {}: {}", status, detail)));
    }

    parse_record(&body)
}

/// Parses the plaintext response body: the first line is the serial number,
/// each following non-blank line one MAC address. Blank lines are separators
/// and are skipped.
pub fn parse_record(body: &str) -> Result<ServerRecord, StationError> {
    let mut lines = body.lines().map(str::trim).filter(|line| !line.is_empty());

    let serial = lines
        .next()
        .ok_or_else(|| StationError::Server("empty response body".to_string()))?
        .to_string();
    let macs = lines
        .map(|line| line.parse::<MacAddr>())
        .collect::<Result<Vec<_>, _>>()?;
    if macs.is_empty() {
        return Err(StationError::Server(format!(
            "no MAC addresses in response for serial {}",
            serial
        )));
    }

    Ok(ServerRecord { serial, macs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_with_blank_separator() {
        let record =
            parse_record("S3R14LNUM83R\n\n02:00:00:00:00:01\n02:00:00:00:00:02\n").unwrap();
        assert_eq!(record.serial, "S3R14LNUM83R");
        assert_eq!(
            record.macs,
            vec![
                "02:00:00:00:00:01".parse().unwrap(),
                "02:00:00:00:00:02".parse().unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_record_skips_interleaved_blank_lines() {
        let record = parse_record("SER-9\n\n02:00:00:00:00:01\n\n\n02:00:00:00:00:02\n\n").unwrap();
        assert_eq!(record.macs.len(), 2);
    }

    #[test]
    fn test_parse_record_rejects_empty_body() {
        assert!(matches!(
            parse_record(""),
            Err(StationError::Server(_))
        ));
        assert!(matches!(
            parse_record("\n\n\n"),
            Err(StationError::Server(_))
        ));
    }

    #[test]
    fn test_parse_record_rejects_missing_macs() {
        assert!(matches!(
            parse_record("SERIALONLY\n"),
            Err(StationError::Server(_))
        ));
    }

    #[test]
    fn test_parse_record_rejects_malformed_mac_line() {
        let result = parse_record("SER-1\n02:00:00:00:00:01\nnot-a-mac\n");
        assert!(matches!(result, Err(StationError::Server(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = StationConfig {
            server_url: "http://localhost:8000/".to_string(),
            ..StationConfig::default()
        };
        let client = ServerClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
