#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use std::io::Write;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

fn escaped(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().replace('\\', "\\\\")
}

fn case_log() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    write!(
        file,
        "resource_id,date,client,kind,location_id,location_name,cases,hours,complete_logging\n\
R-1,2025-03-03,verisma,logging,,,100,8,true\n\
R-1,2025-03-04,mro,logging,,,44,8,\n\
R-2,2025-03-03,mro,processing,LOC-9,Lakeside,4,2,\n"
    )
    .expect("write case log");
    file
}

#[test]
fn cli_requires_period_before_activity() {
    run_cli("activity load missing.csv\nquit\n")
        .success()
        .stdout(str_contains("Select a period first"));
}

#[test]
fn cli_rejects_invalid_period() {
    run_cli("period 2025 13\nquit\n")
        .success()
        .stdout(str_contains("invalid pay period 2025-13"));
}

#[test]
fn cli_computes_and_reports_rejections() {
    let log = case_log();
    let script = format!("period 2025 3\nactivity load {}\ncompute\nquit\n", escaped(&log));
    run_cli(&script)
        .success()
        .stdout(str_contains("Loaded activity for 2 resource(s) in 2025-03."))
        .stdout(str_contains("Rejected R-2 [missing_rate]"))
        .stdout(str_contains("Computed 1 payout(s) for 2025-03."))
        .stdout(str_contains("grand_total"));
}

#[test]
fn cli_uses_loaded_rates_and_locks_approved_payouts() {
    let log = case_log();
    let mut config = NamedTempFile::with_suffix(".toml").expect("create config file");
    write!(
        config,
        "[[processing_rates]]\nclient = \"mro\"\nlocation_id = \"LOC-9\"\nrate = \"1.50\"\n"
    )
    .expect("write config");

    let script = format!(
        "config load {}\nperiod 2025 3\nactivity load {}\ncompute\nstatus R-2 approved\ncompute\nquit\n",
        escaped(&config),
        escaped(&log)
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Computed 2 payout(s) for 2025-03."))
        .stdout(str_contains("Payout R-2@2025-03 is now approved."))
        .stdout(str_contains("Skipped R-2"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let log = case_log();
    let snapshot = NamedTempFile::new().expect("create temp file");
    let daywise = NamedTempFile::new().expect("create temp file");
    let script = format!(
        "period 2025 3\nactivity load {}\ncompute\nsave json {}\nexport daywise R-1 {}\nload json {}\ndaywise R-1\nquit\n",
        escaped(&log),
        escaped(&snapshot),
        escaped(&daywise),
        escaped(&snapshot)
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Loaded 1 payout(s) from"), "{output}");
    assert!(output.contains("2025-03-03 Monday"), "{output}");
    assert!(output.contains("Verisma: 100 logging case(s), 0 processing case(s)"), "{output}");
    assert!(output.contains("MRO: 44 logging case(s)"), "{output}");

    let grid = std::fs::read_to_string(daywise.path()).expect("read day-wise csv");
    assert_eq!(grid.lines().count(), 32);
}
