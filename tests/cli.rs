use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

const ROWS: usize = 600;
const IMPACT_ROW: usize = 300;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fall_bench"))
}

fn write_fall(path: &Path) {
    write_fall_rows(path, ROWS, IMPACT_ROW);
}

fn write_fall_rows(path: &Path, rows: usize, impact: usize) {
    let mut body = String::new();
    for i in 0..rows {
        let x = if (impact..impact + 3).contains(&i) { 2000 } else { 10 };
        let z = if i > impact { 100 } else { 256 };
        body.push_str(&format!("{x:>5},{:>5},{z:>5},   0,   0,   0,   0,   0,   0;\n", i % 7));
    }
    fs::write(path, body).unwrap();
}

fn write_adl(path: &Path) {
    let mut body = String::new();
    for i in 0..ROWS {
        let x = (120.0 * (i as f64 / 20.0).sin()).round() as i64;
        body.push_str(&format!("{x},{},256,0,0,0,0,0,0;\n", -x));
    }
    fs::write(path, body).unwrap();
}

/// Three subjects with one fall and one ADL each, plus a config file
fn dataset() -> (TempDir, std::path::PathBuf) {
    let root = TempDir::new().unwrap();
    let data = root.path().join("SisFall");
    for subject in ["SA01", "SA02", "SA03"] {
        let dir = data.join(subject);
        fs::create_dir_all(&dir).unwrap();
        write_fall(&dir.join(format!("F01_{subject}_R01.txt")));
        write_adl(&dir.join(format!("D05_{subject}_R01.txt")));
    }

    let config = serde_json::json!({
        "acquisition": { "sensor_axes": [0, 1, 2], "ignored_subjects": [] },
        "preprocessing": { "duration_ms": 2000, "pre_time_ms": 150, "post_time_ms": 50 },
    });
    let config_path = root.path().join("config.json");
    fs::write(&config_path, config.to_string()).unwrap();
    (root, config_path)
}

#[test]
fn default_config_prints_json() {
    let output = cli().arg("default-config").output().expect("default-config");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(json["evaluation"]["k_fold"], 5);
    assert_eq!(json["preprocessing"]["classification"], "binary");
}

#[test]
fn run_writes_results() {
    let (root, config) = dataset();
    let out_dir = root.path().join("out");

    let output = cli()
        .args(["run", "--config"])
        .arg(&config)
        .args(["--output"])
        .arg(&out_dir)
        .args(["--frequencies", "20", "--models", "knn,dt", "--k-fold", "2", "--sequential"])
        .arg(root.path().join("SisFall"))
        .output()
        .expect("run command");

    assert!(
        output.status.success(),
        "run exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let results: Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("results.json")).unwrap()).unwrap();
    let records = results["records"].as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["abbreviation"], "knn");
    assert_eq!(records[0]["name"], "k-Nearest Neighbour");
    assert_eq!(records[2]["abbreviation"], "dt");
    assert_eq!(results["summaries"].as_array().unwrap().len(), 2);

    let scores = fs::read_to_string(out_dir.join("scores.csv")).unwrap();
    assert!(scores.starts_with("frequency_hz,abbreviation,name,fold,accuracy"));
    assert_eq!(scores.lines().count(), 5);

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Best mean accuracy: 20 Hz"), "{stdout}");
}

#[test]
fn inspect_reports_phase_boundaries() {
    let (root, config) = dataset();
    let file = root.path().join("SisFall/SA01/F01_SA01_R01.txt");

    let output = cli()
        .args(["inspect", "--config"])
        .arg(&config)
        .arg(&file)
        .output()
        .expect("inspect command");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    // 600 rows trimmed to 400: 100 removed from the head
    assert_eq!(report["samples"], 400);
    assert_eq!(report["peak"], 200);
    assert_eq!(report["is_fall"], true);
    // 400 × 150 / 10000 = 6 before, 400 × 50 / 10000 = 2 after
    assert_eq!(report["event"], serde_json::json!([194, 202]));
    assert_eq!(report["pre_event"], serde_json::json!([0, 194]));
    assert_eq!(report["post_event"], serde_json::json!([202, 400]));
    assert_eq!(report["magnitude"].as_array().unwrap().len(), 400);
}

#[test]
fn inspect_defaults_match_plot_window() {
    let root = TempDir::new().unwrap();
    let file = root.path().join("F05_SA04_R02.txt");
    // 2400 rows trimmed to the default 10 s (2000 rows): impact lands on 1000
    write_fall_rows(&file, 2400, 1200);

    let output = cli().arg("inspect").arg(&file).output().expect("inspect command");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["channels"], serde_json::json!(["acc_x", "acc_y", "acc_z"]));
    assert_eq!(report["samples"], 2000);
    assert_eq!(report["peak"], 1000);
    assert_eq!(report["event"], serde_json::json!([700, 1100]));
    assert_eq!(report["pre_event"], serde_json::json!([0, 700]));
    assert_eq!(report["post_event"], serde_json::json!([1100, 2000]));
}

#[test]
fn invalid_config_exits_with_code_two() {
    let (root, _) = dataset();
    let output = cli()
        .args(["run", "--k-fold", "1"])
        .arg(root.path().join("SisFall"))
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("k_fold"));
}

#[test]
fn missing_dataset_fails() {
    let root = TempDir::new().unwrap();
    let output = cli()
        .args(["run", "--models", "knn"])
        .arg(root.path().join("nowhere"))
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(1));
}
