use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "tourbus-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_tourbus-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("save-roundtrip"));
}

#[test]
fn cli_runs_all_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_tourbus-tester");
    let output_path = temp_path("run");
    let save_dir = temp_path("saves");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "all",
            "--iterations",
            "2",
            "--seeds",
            "1,@tour",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .arg("--save-dir")
        .arg(&save_dir)
        .output()
        .expect("run cli");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tourbus Session Tester"));

    let report = std::fs::read_to_string(&output_path).expect("read report");
    let parsed: serde_json::Value = serde_json::from_str(&report).expect("json report");
    let results = parsed.as_array().expect("array of results");
    assert_eq!(results.len(), 12);
    assert!(results.iter().all(|r| r["passed"] == true));
    let _ = std::fs::remove_dir_all(save_dir);
}

#[test]
fn cli_rejects_bad_seed_tokens() {
    let exe = env!("CARGO_BIN_EXE_tourbus-tester");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unrecognized seed token"));
}
