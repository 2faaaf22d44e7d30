use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "netexp-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const PAIR_SCENARIO: &str = r#"
{
    "name": "cli-pair",
    "nodes": 2,
    "topology": { "kind": "point_to_point", "data_rate": "8Mbps", "delay_ms": 10 },
    "transport": { "congestion_control": "westwood", "queue_size": "20p" },
    "applications": [
        { "kind": "bulk_send", "source": 0, "sink": 1, "port": 12344,
          "max_bytes": 200000, "start_s": 0.0 },
        { "kind": "on_off", "source": 0, "sink": 1, "port": 12345,
          "data_rate": "1Mbps", "payload_bytes": 1000, "start_s": 0.5, "stop_s": 1.5 }
    ]
}
"#;

#[test]
fn scenario_sim_prints_report_and_writes_outputs() {
    let dir = unique_temp_dir("scenario-sim");
    let scenario = write_file(&dir, "scenario.json", PAIR_SCENARIO);
    let report_json = dir.join("report.json");
    let xml = dir.join("flows.xml");
    let trace = dir.join("trace.tr");

    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--until-s",
            "2",
            "--unit",
            "kbps",
            "--json-report",
            report_json.to_str().unwrap(),
            "--flowmon-xml",
            xml.to_str().unwrap(),
            "--trace",
            trace.to_str().unwrap(),
        ])
        .output()
        .expect("run scenario_sim");
    assert!(
        output.status.success(),
        "scenario_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Flow 1 ("), "stdout={stdout}");
    assert!(stdout.contains("Total channel throughput = "));
    assert!(stdout.contains(" Kbps"));
    assert!(stdout.contains("FTP throughput = "));
    assert!(stdout.contains("CBR throughput = "));

    let raw = fs::read_to_string(&report_json).expect("read report.json");
    let v: Value = serde_json::from_str(&raw).expect("parse report.json");
    assert_eq!(v.get("unit").and_then(|u| u.as_str()), Some("kbps"));
    let flows = v
        .get("flows")
        .and_then(|f| f.as_array())
        .expect("flows array");
    assert!(flows.len() >= 3, "data, ack and cbr flows expected");
    assert_eq!(flows[0].get("flow_id").and_then(|id| id.as_u64()), Some(1));
    assert!(
        v.get("total_throughput")
            .and_then(|t| t.as_f64())
            .is_some_and(|t| t > 0.0)
    );

    let xml = fs::read_to_string(&xml).expect("read flows.xml");
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<FlowStats>"));
    assert!(xml.contains("<Ipv4FlowClassifier>"));

    let trace = fs::read_to_string(&trace).expect("read trace");
    assert!(trace.lines().any(|l| l.starts_with("r ")));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scenario_sim_rejects_an_invalid_scenario() {
    let dir = unique_temp_dir("scenario-sim-invalid");
    let scenario = write_file(
        &dir,
        "scenario.json",
        r#"
{
    "nodes": 3,
    "topology": { "kind": "point_to_point", "data_rate": "8Mbps" },
    "applications": []
}
        "#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .args(["--scenario", scenario.to_str().unwrap(), "--until-s", "1"])
        .output()
        .expect("run scenario_sim");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid scenario"), "stderr={stderr}");
    assert!(output.stdout.is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scenario_sim_reports_a_missing_file() {
    let dir = unique_temp_dir("scenario-sim-missing");
    let missing = dir.join("nope.json");
    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .args(["--scenario", missing.to_str().unwrap()])
        .output()
        .expect("run scenario_sim");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.json"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scenario_sim_applies_queue_size_override() {
    let dir = unique_temp_dir("scenario-sim-queue");
    let scenario = write_file(&dir, "scenario.json", PAIR_SCENARIO);

    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--queue-size",
            "lots",
        ])
        .output()
        .expect("run scenario_sim");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("lots"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn hidden_stations_prints_both_runs_as_json() {
    let output = Command::new(env!("CARGO_BIN_EXE_hidden_stations"))
        .args(["--json"])
        .output()
        .expect("run hidden_stations");
    assert!(
        output.status.success(),
        "hidden_stations failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let v: Value = serde_json::from_slice(&output.stdout).expect("parse stdout");
    let runs = v.as_array().expect("array of reports");
    assert_eq!(runs.len(), 2);
    let total = |r: &Value| r.get("total_throughput").and_then(|t| t.as_f64()).unwrap();
    assert!(total(&runs[1]) <= total(&runs[0]) + 1e-9);
}

#[test]
fn hidden_stations_text_output_states_the_channel_model() {
    let output = Command::new(env!("CARGO_BIN_EXE_hidden_stations"))
        .output()
        .expect("run hidden_stations");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no collisions"), "stdout={stdout}");
    assert!(stdout.contains("RTS/CTS disabled"));
    assert!(stdout.contains("RTS/CTS enabled"));

    let help = Command::new(env!("CARGO_BIN_EXE_hidden_stations"))
        .arg("--help")
        .output()
        .expect("run hidden_stations --help");
    assert!(String::from_utf8_lossy(&help.stdout).contains("never models collisions"));
}
