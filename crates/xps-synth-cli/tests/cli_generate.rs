use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use xps_synth_core::modules::export::{ExportFormat, ExportView, load_records};

const LABELS: [(&str, f64); 3] = [("Cu_metal", 932.6), ("Cu2O", 932.4), ("CuO", 933.7)];

fn write_references(dir: &Path) {
    for (label, center) in LABELS {
        let mut content = String::new();
        for line in 0..8 {
            content.push_str(&format!("# {label} header {line}\n"));
        }
        for index in 0..200 {
            let energy = 925.0 + 0.1 * index as f64;
            let intensity = 20.0 + 300.0 * (-(energy - center).powi(2) / 1.5).exp();
            content.push_str(&format!("{energy:.1} {intensity:.5}\n"));
        }
        fs::write(dir.join(format!("{label}.txt")), content).expect("reference should be written");
    }
}

fn labels_arg() -> String {
    LABELS
        .iter()
        .map(|(label, _)| *label)
        .collect::<Vec<_>>()
        .join(",")
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xps-synth"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("xps-synth should start")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn generate_exports_the_requested_dataset() {
    let temp = TempDir::new().expect("tempdir should be created");
    let references = temp.path().join("refs");
    let output_dir = temp.path().join("out");
    fs::create_dir_all(&references).expect("reference dir");
    write_references(&references);

    let output = run_cli(&[
        "generate",
        "--references",
        references.to_str().expect("utf-8 path"),
        "--labels",
        &labels_arg(),
        "--count",
        "10",
        "--mode",
        "single",
        "--seed",
        "12",
        "--threads",
        "2",
        "--output",
        output_dir.to_str().expect("utf-8 path"),
        "--name",
        "copper",
        "--format",
        "csv",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = stdout_json(&output);
    assert_eq!(report["requested"], 10);
    assert_eq!(report["succeeded"], 10);
    assert_eq!(report["complete"], true);
    assert_eq!(report["written"].as_array().map(Vec::len), Some(1));

    let records = load_records(&output_dir.join("copper.csv"), ExportFormat::Csv, ExportView::Full)
        .expect("exported dataset should reload");
    assert_eq!(records.len(), 10);
}

#[test]
fn sample_prints_the_augmentation_matrix() {
    let output = run_cli(&[
        "sample",
        "--labels",
        &labels_arg(),
        "--count",
        "5",
        "--seed",
        "3",
        "--no-noise",
    ]);
    assert!(output.status.success());

    let matrix = stdout_json(&output);
    let rows = matrix["rows"].as_array().expect("rows array");
    assert_eq!(rows.len(), 5);
    for row in rows {
        assert_eq!(row["weights"].as_array().map(Vec::len), Some(3));
        assert_eq!(row["snr"], 0.0);
    }
    assert_eq!(matrix["toggles"]["noise"], false);
}

#[test]
fn missing_reference_exits_with_its_category_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output = run_cli(&[
        "generate",
        "--references",
        temp.path().to_str().expect("utf-8 path"),
        "--labels",
        "Zn_metal",
        "--count",
        "3",
    ]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.REFERENCE_NOT_FOUND]"), "{stderr}");
    assert!(stderr.contains("FATAL EXIT CODE: 3"), "{stderr}");
}

#[test]
fn unsupported_format_is_a_configuration_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_references(temp.path());
    let output = run_cli(&[
        "generate",
        "--references",
        temp.path().to_str().expect("utf-8 path"),
        "--labels",
        &labels_arg(),
        "--output",
        temp.path().to_str().expect("utf-8 path"),
        "--format",
        "xlsx",
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("CONFIG.EXPORT_FORMAT"));
}

#[test]
fn upload_respects_the_overwrite_policy() {
    let temp = TempDir::new().expect("tempdir should be created");
    let references = temp.path().join("refs");
    let store = temp.path().join("store");
    fs::create_dir_all(&references).expect("reference dir");
    write_references(&references);

    let upload = |policy: &str| {
        run_cli(&[
            "upload",
            "--references",
            references.to_str().expect("utf-8 path"),
            "--labels",
            &labels_arg(),
            "--count",
            "4",
            "--collection",
            "copper",
            "--store",
            store.to_str().expect("utf-8 path"),
            "--policy",
            policy,
        ])
    };

    let first = upload("fail");
    assert!(first.status.success(), "stderr: {}", String::from_utf8_lossy(&first.stderr));
    assert_eq!(stdout_json(&first)["collection"], "copper");

    let second = upload("fail");
    assert_eq!(second.status.code(), Some(7));
    assert!(String::from_utf8_lossy(&second.stderr).contains("STORE.COLLECTION_EXISTS"));

    let renamed = upload("rename");
    assert!(renamed.status.success());
    assert_eq!(stdout_json(&renamed)["collection"], "copper_1");
    assert!(store.join("copper_1.jsonl").is_file());

    let remove = |collection: &str| {
        run_cli(&[
            "drop",
            "--collection",
            collection,
            "--store",
            store.to_str().expect("utf-8 path"),
        ])
    };

    let dropped = remove("copper");
    assert!(dropped.status.success(), "stderr: {}", String::from_utf8_lossy(&dropped.stderr));
    assert_eq!(stdout_json(&dropped)["dropped"], true);
    assert!(!store.join("copper.jsonl").exists());
    assert!(store.join("copper_1.jsonl").is_file());

    let absent = remove("copper");
    assert!(absent.status.success());
    assert_eq!(stdout_json(&absent)["dropped"], false);

    let refilled = upload("fail");
    assert!(refilled.status.success());
    assert_eq!(stdout_json(&refilled)["collection"], "copper");
}
