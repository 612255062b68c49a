//! CLI argument parsing and validation module
//!
//! Handles the command-line interface using clap:
//! - Positional server URL, API key, and UART device (bench-test defaults)
//! - Station tuning options (baud rate, cable-check timeout, log directory)
//! - Optional TOML config file merged underneath explicit arguments
//! - Help and version commands

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{StationConfig, StationFile};

fn command() -> Command {
    Command::new("berrytest")
        .version(env!("BERRYTEST_VERSION"))
        .long_version(concat!(env!("BERRYTEST_VERSION"), " (", env!("GIT_HASH"), ")"))
        .about("Manual test station for circuit board bring-up")
        .long_about(
            "Guides an operator through a board test: UART identity check, data matrix \
             scanning, and verification of server-provided serial and MAC addresses.",
        )
        .arg(
            Arg::new("server_url")
                .value_name("SERVER_URL")
                .help("Factory server base URL")
                .index(1),
        )
        .arg(
            Arg::new("api_key")
                .value_name("API_KEY")
                .help("API key sent with server requests")
                .index(2),
        )
        .arg(
            Arg::new("uart_dev")
                .value_name("UART_DEV")
                .help("UART device path for the board console")
                .index(3),
        )
        .arg(
            Arg::new("baud")
                .long("baud")
                .value_name("RATE")
                .help("UART baud rate"),
        )
        .arg(
            Arg::new("cable-timeout")
                .long("cable-timeout")
                .value_name("SECS")
                .help("Seconds to wait for the expected MACs during the cable check"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .help("Directory for per-session log files"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("TOML file with station settings (explicit arguments win)"),
        )
}

/// Parse command line arguments and return the station configuration
pub fn parse_args() -> Result<StationConfig> {
    parse_from(std::env::args_os())
}

/// Testable entry point taking an explicit argument list
pub fn parse_from<I, T>(args: I) -> Result<StationConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match command().try_get_matches_from(args) {
        Ok(matches) => matches,
        // help/version and usage errors print and exit here
        Err(e) => e.exit(),
    };

    let file = match matches.get_one::<String>("config") {
        Some(path) => load_station_file(Path::new(path))?,
        None => StationFile::default(),
    };

    build_config(&matches, file)
}

fn load_station_file(path: &Path) -> Result<StationFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Defaults, overridden by the config file, overridden by explicit arguments
fn build_config(matches: &ArgMatches, file: StationFile) -> Result<StationConfig> {
    let mut config = StationConfig::default();

    if let Some(v) = file.server_url {
        config.server_url = v;
    }
    if let Some(v) = file.api_key {
        config.api_key = v;
    }
    if let Some(v) = file.uart_dev {
        config.uart_dev = v;
    }
    if let Some(v) = file.baud_rate {
        config.baud_rate = v;
    }
    if let Some(v) = file.cable_timeout_secs {
        config.cable_timeout = Duration::from_secs(v);
    }
    if let Some(v) = file.log_dir {
        config.log_dir = v;
    }

    if let Some(v) = matches.get_one::<String>("server_url") {
        config.server_url = v.clone();
    }
    if let Some(v) = matches.get_one::<String>("api_key") {
        config.api_key = v.clone();
    }
    if let Some(v) = matches.get_one::<String>("uart_dev") {
        config.uart_dev = v.clone();
    }
    if let Some(v) = matches.get_one::<String>("baud") {
        config.baud_rate = v
            .parse()
            .map_err(|_| anyhow!("invalid baud rate: {}", v))?;
    }
    if let Some(v) = matches.get_one::<String>("cable-timeout") {
        let secs: u64 = v
            .parse()
            .map_err(|_| anyhow!("invalid cable timeout: {}", v))?;
        config.cable_timeout = Duration::from_secs(secs);
    }
    if let Some(v) = matches.get_one::<String>("log-dir") {
        config.log_dir = PathBuf::from(v);
    }

    if !config.server_url.starts_with("http://") && !config.server_url.starts_with("https://") {
        return Err(anyhow!(
            "server URL must start with http:// or https://: {}",
            config.server_url
        ));
    }

    Ok(config)
}
