use assert_cmd::Command;
use predicates::prelude::*;
use std::f64::consts::PI;
use std::path::Path;

fn pulse() -> Command {
    let mut cmd = Command::cargo_bin("pulse").unwrap();
    cmd.env_remove("PULSE_CONFIG").env_remove("PULSE_SAMPLE_RATE");
    cmd
}

fn synthetic_pulse(n: usize, fs: f64, hz: f64) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let t = t as f64 / fs;
            40.0 + 0.8 * t + 0.5 * (2.0 * PI * hz * t).sin()
        })
        .collect()
}

fn write_samples(dir: &Path, name: &str, samples: &[f64]) -> String {
    let path = dir.join(name);
    let text: Vec<String> = samples.iter().map(|v| v.to_string()).collect();
    std::fs::write(&path, text.join("\n")).unwrap();
    path.to_str().unwrap().to_string()
}

fn stdout_json(output: &assert_cmd::assert::Assert) -> serde_json::Value {
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    pulse()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    pulse()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pulse"));
}

// =============================================================================
// FREQS SUBCOMMAND
// =============================================================================

#[test]
fn test_freqs() {
    let output = pulse()
        .args(["freqs", "--n", "4", "--spacing", "1.0", "--compact"])
        .assert()
        .success();
    assert_eq!(stdout_json(&output), serde_json::json!([0.0, 0.25, -0.5, -0.25]));
}

#[test]
fn test_freqs_invalid_count() {
    pulse()
        .args(["freqs", "--n", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error:"));
}

// =============================================================================
// SPECTRUM SUBCOMMAND
// =============================================================================

#[test]
fn test_spectrum_with_frequencies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("y.csv");
    std::fs::write(&path, "1,0\n2,1\n3,0\n4,-1\n").unwrap();

    let output = pulse()
        .args(["spectrum", "--file", path.to_str().unwrap(), "--sr", "4"])
        .assert()
        .success();
    let parsed = stdout_json(&output);

    let power = parsed["power"].as_array().unwrap();
    assert_eq!(power.len(), 4);
    assert!((power[0][0].as_f64().unwrap() - 100.0).abs() < 1e-9);
    assert!((power[1][1].as_f64().unwrap() - 4.0).abs() < 1e-9);
    assert_eq!(parsed["frequencies"], serde_json::json!([0.0, 1.0, -2.0, -1.0]));
}

#[test]
fn test_spectrum_ragged_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.csv");
    std::fs::write(&path, "1,0\n2\n").unwrap();

    pulse()
        .args(["spectrum", "--file", path.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("columns"));
}

// =============================================================================
// DETREND / FILTER SUBCOMMANDS
// =============================================================================

#[test]
fn test_detrend_then_filter_files() {
    let dir = tempfile::tempdir().unwrap();
    let window = write_samples(dir.path(), "window.txt", &synthetic_pulse(150, 30.0, 1.2));
    let detrended = dir.path().join("detrended.json");

    pulse()
        .args(["detrend", "--file", &window, "--output", detrended.to_str().unwrap()])
        .assert()
        .success();

    let rows: Vec<Vec<f64>> =
        serde_json::from_str(&std::fs::read_to_string(&detrended).unwrap()).unwrap();
    assert_eq!(rows.len(), 150);
    let column: Vec<f64> = rows.iter().map(|r| r[0]).collect();
    let column_file = write_samples(dir.path(), "column.txt", &column);

    let output = pulse()
        .args(["filter", "--file", &column_file, "--sr", "30", "--compact"])
        .assert()
        .success();
    let filtered = stdout_json(&output);
    assert_eq!(filtered.as_array().unwrap().len(), 150);
}

#[test]
fn test_detrend_wrong_length() {
    let dir = tempfile::tempdir().unwrap();
    let window = write_samples(dir.path(), "short.txt", &synthetic_pulse(100, 30.0, 1.2));

    pulse()
        .args(["detrend", "--file", &window])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Shape mismatch"));
}

#[test]
fn test_filter_band_above_nyquist() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_samples(dir.path(), "data.txt", &synthetic_pulse(60, 30.0, 1.2));

    pulse()
        .args(["filter", "--file", &data, "--sr", "30", "--highcut", "20"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_file() {
    pulse()
        .args(["detrend", "--file", "/nonexistent/window.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("File not found"));
}

// =============================================================================
// ESTIMATE SUBCOMMAND
// =============================================================================

#[test]
fn test_estimate_stream() {
    let dir = tempfile::tempdir().unwrap();
    let stream = write_samples(dir.path(), "stream.txt", &synthetic_pulse(160, 30.0, 1.2));

    let output = pulse()
        .args(["estimate", "--file", &stream])
        .assert()
        .success();
    let parsed = stdout_json(&output);

    let estimates = parsed["estimates"].as_array().unwrap();
    let ends: Vec<u64> = estimates
        .iter()
        .map(|e| e["end_sample"].as_u64().unwrap())
        .collect();
    assert_eq!(ends, vec![150, 155, 160]);
    for e in estimates {
        assert!((e["bpm"].as_f64().unwrap() - 72.0).abs() < 1e-6);
    }
    assert_eq!(parsed["failed_windows"], 0);
}

#[test]
fn test_estimate_config_file_and_env_override() {
    let dir = tempfile::tempdir().unwrap();
    let stream = write_samples(dir.path(), "stream.txt", &synthetic_pulse(150, 25.0, 1.0));
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"sample_rate": 30.0, "step": 10}"#).unwrap();

    let output = pulse()
        .env("PULSE_SAMPLE_RATE", "25")
        .args(["estimate", "--file", &stream, "--config", config.to_str().unwrap()])
        .assert()
        .success();
    let parsed = stdout_json(&output);

    assert_eq!(parsed["sample_rate"], 25.0);
    assert_eq!(parsed["step"], 10);
    let bpm = parsed["estimates"][0]["bpm"].as_f64().unwrap();
    assert!((bpm - 60.0).abs() < 1e-6, "bpm {}", bpm);
}

#[test]
fn test_estimate_too_few_samples() {
    let dir = tempfile::tempdir().unwrap();
    let stream = write_samples(dir.path(), "short.txt", &synthetic_pulse(40, 30.0, 1.2));

    pulse()
        .args(["estimate", "--file", &stream])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("need at least 150"));
}

#[test]
fn test_estimate_constant_stream() {
    let dir = tempfile::tempdir().unwrap();
    let stream = write_samples(dir.path(), "flat.txt", &[7.0; 150]);

    pulse()
        .args(["estimate", "--file", &stream])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no window produced an estimate"));
}

#[test]
fn test_estimate_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let stream = write_samples(dir.path(), "stream.txt", &synthetic_pulse(150, 30.0, 1.2));
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"step": 0}"#).unwrap();

    pulse()
        .args(["estimate", "--file", &stream, "--config", config.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_estimate_writes_csv_log() {
    let dir = tempfile::tempdir().unwrap();
    let stream = write_samples(dir.path(), "stream.txt", &synthetic_pulse(160, 30.0, 1.2));
    let log = dir.path().join("pulse.csv");

    pulse()
        .args(["estimate", "--file", &stream, "--csv", log.to_str().unwrap()])
        .assert()
        .success();

    let mut reader = csv::Reader::from_path(&log).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["end_sample", "time_s", "bpm"]);

    let rows: Vec<(usize, f64, f64)> = reader
        .deserialize::<(usize, f64, f64)>()
        .map(|r| r.unwrap())
        .collect();
    let ends: Vec<usize> = rows.iter().map(|r| r.0).collect();
    assert_eq!(ends, vec![150, 155, 160]);
    assert!((rows[0].1 - 5.0).abs() < 1e-9);
    assert!((rows[2].1 - 160.0 / 30.0).abs() < 1e-9);
    for (_, _, bpm) in &rows {
        assert!((bpm - 72.0).abs() < 1e-6);
    }
}

#[test]
fn test_estimate_csv_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let stream = write_samples(dir.path(), "stream.txt", &synthetic_pulse(150, 30.0, 1.2));

    pulse()
        .args(["estimate", "--file", &stream, "--csv", "/nonexistent/dir/pulse.csv"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("CSV"));
}

#[test]
fn test_detrend_constant_kind() {
    let dir = tempfile::tempdir().unwrap();
    let window = write_samples(dir.path(), "window.txt", &synthetic_pulse(150, 30.0, 1.2));

    let linear = pulse()
        .args(["detrend", "--file", &window, "--compact"])
        .assert()
        .success();
    let constant = pulse()
        .args(["detrend", "--file", &window, "--kind", "constant", "--compact"])
        .assert()
        .success();

    let column = |v: &serde_json::Value| -> Vec<f64> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r[0].as_f64().unwrap())
            .collect()
    };
    let linear = column(&stdout_json(&linear));
    let constant = column(&stdout_json(&constant));
    assert_eq!(constant.len(), 150);

    // Mean-only removal leaves the drift, so the ends sit far apart
    let spread = |c: &[f64]| (c[149] - c[0]).abs();
    assert!(spread(&constant) > spread(&linear));
    assert!((constant.iter().sum::<f64>() / 150.0).abs() < 1e-9);
}

#[test]
fn test_detrend_inexact_constant_file() {
    let dir = tempfile::tempdir().unwrap();
    let window = write_samples(dir.path(), "flat.txt", &[0.1; 150]);

    pulse()
        .args(["detrend", "--file", &window])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Zero variance"));
}

#[test]
fn test_filter_order_too_high() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_samples(dir.path(), "data.txt", &synthetic_pulse(60, 30.0, 1.2));

    pulse()
        .args(["filter", "--file", &data, "--order", "2147483647"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Filter order"));
}
