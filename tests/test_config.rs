//! Station configuration precedence: defaults < config file < CLI arguments

use std::io::Write;
use std::time::Duration;

use berrytest::cli;
use berrytest::constants;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_config_file_overrides_defaults() {
    let file = write_config(
        r#"
server_url = "http://station.example.com"
api_key = "filekey"
uart_dev = "/dev/ttyAMA0"
baud_rate = 57600
cable_timeout_secs = 30
"#,
    );

    let config = cli::parse_from([
        "berrytest",
        "--config",
        file.path().to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(config.server_url, "http://station.example.com");
    assert_eq!(config.api_key, "filekey");
    assert_eq!(config.uart_dev, "/dev/ttyAMA0");
    assert_eq!(config.baud_rate, 57600);
    assert_eq!(config.cable_timeout, Duration::from_secs(30));
}

#[test]
fn test_explicit_arguments_win_over_config_file() {
    let file = write_config(
        r#"
server_url = "http://station.example.com"
uart_dev = "/dev/ttyAMA0"
"#,
    );

    let config = cli::parse_from([
        "berrytest",
        "http://cli.example.com",
        "--config",
        file.path().to_str().unwrap(),
    ])
    .unwrap();

    // positional beats the file; unset values still come from the file
    assert_eq!(config.server_url, "http://cli.example.com");
    assert_eq!(config.uart_dev, "/dev/ttyAMA0");
}

#[test]
fn test_partial_config_file_keeps_defaults_for_the_rest() {
    let file = write_config("baud_rate = 9600\n");

    let config = cli::parse_from([
        "berrytest",
        "--config",
        file.path().to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(config.baud_rate, 9600);
    assert_eq!(config.server_url, constants::DEFAULT_SERVER_URL);
    assert_eq!(config.uart_dev, constants::DEFAULT_UART_DEV);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let result = cli::parse_from(["berrytest", "--config", "/nonexistent/station.toml"]);
    assert!(result.is_err());
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let file = write_config("baud_rate = \"not a number\"\n");
    let result = cli::parse_from([
        "berrytest",
        "--config",
        file.path().to_str().unwrap(),
    ]);
    assert!(result.is_err());
}
