//! Integration tests for configuration loading and `vops config`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn vops(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vops").unwrap();
    cmd.current_dir(temp_dir.path())
        .env("HOME", temp_dir.path())
        .env("NO_COLOR", "1")
        .env_remove("VISIONOPS_DATASET_ROOT")
        .env_remove("VISIONOPS_MODEL_NAME")
        .env_remove("VISIONOPS_REGISTRY_ROOT")
        .env_remove("MLFLOW_S3_ENDPOINT_URL")
        .env_remove("AWS_ACCESS_KEY_ID")
        .env_remove("AWS_SECRET_ACCESS_KEY");
    cmd
}

#[test]
fn test_config_show_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let output = vops(&temp_dir).args(["config", "show", "--json"]).output().unwrap();
    assert!(output.status.success());

    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["dataset"]["train_ratio"], 0.6);
    assert_eq!(config["dataset"]["valid_ratio"], 0.2);
    assert_eq!(config["dataset"]["seed"], 42);
    assert_eq!(config["training"]["model_name"], "yolo11n");
    assert_eq!(config["training"]["key_metric"], "metrics/mAP50-95B");
    assert!(config["object_store"].is_null());
}

#[test]
fn test_local_file_overrides_global() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join(".visionops")).unwrap();
    fs::write(
        temp_dir.path().join(".visionops/config.toml"),
        "[training]\nmodel_name = \"global\"\nepochs = 5\n",
    )
    .unwrap();
    fs::write(temp_dir.path().join("visionops.toml"), "[training]\nmodel_name = \"local\"\n").unwrap();

    let output = vops(&temp_dir).args(["config", "show", "--json"]).output().unwrap();
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["training"]["model_name"], "local");
    assert_eq!(config["training"]["epochs"], 5);
}

#[test]
fn test_environment_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("visionops.toml"), "[training]\nmodel_name = \"local\"\n").unwrap();

    let output = vops(&temp_dir)
        .args(["config", "show", "--json"])
        .env("VISIONOPS_MODEL_NAME", "from-env")
        .output()
        .unwrap();
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["training"]["model_name"], "from-env");
}

#[test]
fn test_explicit_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    fs::write(&path, "[dataset]\nseed = 7\nclasses = [\"cat\"]\n").unwrap();

    vops(&temp_dir)
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seed         7"))
        .stdout(predicate::str::contains("cat"));
}

#[test]
fn test_invalid_ratio_in_file_fails_on_load() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("visionops.toml"), "[dataset]\ntrain_ratio = 1.5\n").unwrap();

    vops(&temp_dir)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dataset.train_ratio"));
}

#[test]
fn test_partial_object_store_credentials_fail() {
    let temp_dir = TempDir::new().unwrap();

    vops(&temp_dir)
        .args(["config", "show"])
        .env("MLFLOW_S3_ENDPOINT_URL", "http://minio:9000")
        .assert()
        .failure()
        .stderr(predicate::str::contains("object_store.access_key_id"));
}

#[test]
fn test_secret_is_never_printed() {
    let temp_dir = TempDir::new().unwrap();

    for json in [true, false] {
        let mut cmd = vops(&temp_dir);
        cmd.args(["config", "show"])
            .env("MLFLOW_S3_ENDPOINT_URL", "http://minio:9000")
            .env("AWS_ACCESS_KEY_ID", "minio")
            .env("AWS_SECRET_ACCESS_KEY", "super-secret-value");
        if json {
            cmd.arg("--json");
        }
        cmd.assert().success().stdout(predicate::str::contains("super-secret-value").not());
    }
}

#[test]
fn test_unknown_log_level_falls_back_to_info() {
    let temp_dir = TempDir::new().unwrap();

    vops(&temp_dir).args(["--log-level", "chatty", "config", "show"]).assert().success();
}
