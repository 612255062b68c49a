use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_includes_positional_arguments() {
    let mut cmd = Command::cargo_bin("berrytest").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("SERVER_URL"))
        .stdout(predicate::str::contains("API_KEY"))
        .stdout(predicate::str::contains("UART_DEV"))
        .stdout(predicate::str::contains("--version"))
        .stdout(predicate::str::contains("--help"));
}

#[test]
fn test_help_includes_station_options() {
    let mut cmd = Command::cargo_bin("berrytest").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--baud"))
        .stdout(predicate::str::contains("--cable-timeout"))
        .stdout(predicate::str::contains("--log-dir"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_invalid_baud_exits_nonzero() {
    let mut cmd = Command::cargo_bin("berrytest").unwrap();
    cmd.args(["--baud", "fast"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid baud rate"));
}

#[test]
fn test_unknown_flag_exits_nonzero() {
    let mut cmd = Command::cargo_bin("berrytest").unwrap();
    cmd.arg("--frobnicate");

    cmd.assert().failure();
}
