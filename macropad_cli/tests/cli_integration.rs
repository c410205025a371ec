use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Short startup blink so simulated sessions stay small
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
profile = "workspace"

[slider]
output_steps = 100
deadband = 2
settle_ms = 500
reset_delay_ms = 800

[leds]
startup_cycles = 1
startup_period_ms = 10

[scan]
rate_hz = 1000
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_trace(dir: &tempfile::TempDir, samples: &[i32]) -> PathBuf {
    let path = dir.path().join("trace.csv");
    let mut f = fs::File::create(&path).unwrap();
    writeln!(f, "raw").unwrap();
    for s in samples {
        writeln!(f, "{s}").unwrap();
    }
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--help"], 0, "warm-up", "stdout")]
#[case(&["run", "--trace", "TRACE"], 0, "session complete (exhausted)", "stdout")]
#[case(&["run", "--trace", "TRACE", "--scans", "5"], 0, "session complete (max_scans): 5 scans", "stdout")]
#[case(&["run"], 2, "required", "stderr")]
#[case(&["self-check"], 0, "ok: profile workspace", "stdout")]
#[case(&["keymap", "--profile", "tetris"], 0, "layer 4: LCtrl | Space | LAlt | LShift", "stdout")]
#[case(&["keymap"], 0, "Ctrl+Left", "stdout")]
#[case(&["keymap"], 0, "layer 5: ___ | MO(6) | Ctrl+Shift+Left | Ctrl+Shift+Right", "stdout")]
#[case(&["keymap", "--profile", "qwerty"], 2, "invalid value", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let trace = write_trace(&dir, &[2048; 20]);

    let mut cmd = Command::cargo_bin("macropad_cli").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);

    for a in args {
        if *a == "TRACE" {
            cmd.arg(&trace);
        } else {
            cmd.arg(a);
        }
    }

    let assert = cmd.assert().code(exit_code);

    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn run_reports_final_level() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let trace = write_trace(&dir, &[2048; 20]);

    let mut cmd = Command::cargo_bin("macropad_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("run").arg("--trace").arg(&trace);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("50 up, 100 down"))
        .stdout(predicate::str::contains("final level: 50"));
}

#[rstest]
fn cli_reports_bad_calibration_header() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    // Write a bad-header CSV
    let bad_csv = dir.path().join("sweep.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "raw,value").unwrap();
    writeln!(f, "100,0").unwrap();
    writeln!(f, "200,1").unwrap();

    let mut cmd = Command::cargo_bin("macropad_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&bad_csv)
        .arg("self-check");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn invalid_config_is_explained() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, "[slider]\noutput_steps = 10\ndeadband = 10\n").unwrap();

    let mut cmd = Command::cargo_bin("macropad_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("self-check");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("slider.deadband must be < slider.output_steps"));
}

#[rstest]
fn calibrate_writes_loadable_section() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let sweep = dir.path().join("sweep.csv");
    let mut f = fs::File::create(&sweep).unwrap();
    writeln!(f, "raw").unwrap();
    for v in (0..200).map(|i| 30 + i * 20) {
        writeln!(f, "{v}").unwrap();
    }
    let out = dir.path().join("calibration.toml");

    let mut cmd = Command::cargo_bin("macropad_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("calibrate")
        .arg("--samples")
        .arg(&sweep)
        .arg("--trim")
        .arg("0")
        .arg("--write")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("slider range: 30..=4010 (200 samples)"));

    let written = fs::read_to_string(&out).unwrap();
    let parsed = calibration_bounds(&written);
    assert_eq!(parsed, (30, 4010));
}

// Reads raw_min/raw_max back out of the written section
fn calibration_bounds(text: &str) -> (i32, i32) {
    assert!(text.contains("[calibration]"), "{text}");
    let field = |name: &str| -> i32 {
        text.lines()
            .find_map(|l| l.strip_prefix(name))
            .and_then(|rest| rest.trim().strip_prefix('='))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or_else(|| panic!("{name} missing in {text}"))
    };
    (field("raw_min"), field("raw_max"))
}
