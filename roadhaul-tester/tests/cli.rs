use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "roadhaul-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report_per_seed() {
    let exe = env!("CARGO_BIN_EXE_roadhaul-tester");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args([
            "--strategies",
            "greedy",
            "--seeds",
            "1,2",
            "--max-ticks",
            "2000",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let runs = report["runs"].as_array().expect("runs array");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["strategy"], "Greedy");
    assert_eq!(report["summaries"][0]["runs"], 2);
}

#[test]
fn cli_persists_saves_to_disk() {
    let exe = env!("CARGO_BIN_EXE_roadhaul-tester");
    let save_dir = temp_path("saves");
    let output = Command::new(exe)
        .args([
            "--strategies",
            "balanced",
            "--seeds",
            "9",
            "--max-ticks",
            "4000",
            "--report",
            "json",
            "--save-dir",
        ])
        .arg(&save_dir)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let slot = save_dir.join("balanced-9").join("roadhaul.save.slot1.json");
    let blob = std::fs::read_to_string(slot).expect("autosave written");
    let value: serde_json::Value = serde_json::from_str(&blob).expect("save json");
    let city_id = value["core"]["currentCityId"].as_u64().expect("numeric city id");
    assert!(city_id < 6);
    assert!(value["cityName"].as_str().is_some_and(|name| !name.is_empty()));
    assert!(value["core"]["gameState"].is_string());
}

#[test]
fn cli_markdown_report() {
    let exe = env!("CARGO_BIN_EXE_roadhaul-tester");
    let output_path = temp_path("md");
    let status = Command::new(exe)
        .args([
            "--strategies",
            "cautious",
            "--max-ticks",
            "500",
            "--report",
            "markdown",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("# Roadhaul Autopilot Results"));
    assert!(content.contains("Cautious seed 1337"));
}

#[test]
fn cli_rejects_bad_seed() {
    let exe = env!("CARGO_BIN_EXE_roadhaul-tester");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid seed"));
}
