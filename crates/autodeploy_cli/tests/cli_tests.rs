use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

const ENV_VARS: [&str; 8] = [
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "AUTODEPLOY_MODEL",
    "AUTODEPLOY_ENDPOINT_URL",
    "AUTODEPLOY_WORKDIR",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_REGION",
];

fn autodeploy(dir: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_autodeploy"));
    cmd.current_dir(dir).args(args).env("RUST_LOG", "error");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.output().unwrap()
}

fn write_spec(dir: &Path, json: &str) -> String {
    let path = dir.join("spec.json");
    fs::write(&path, json).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_render_json_from_spec_file() {
    let dir = tempdir().unwrap();
    let spec = write_spec(
        dir.path(),
        r#"{"deployment_type": "static_site", "framework": "static", "environment": "prod"}"#,
    );

    let output = autodeploy(
        dir.path(),
        &["render", "Host my landing page", "--spec-file", &spec, "--json"],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["spec"]["deployment_type"], "static_site");
    assert_eq!(value["spec"]["environment"], "production");
    assert_eq!(value["spec"]["raw_instruction"], "Host my landing page");
    assert!(value["artifacts"]["files"]["provider"]
        .as_str()
        .unwrap()
        .contains("hashicorp/aws"));
    assert!(value["defaulted"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "scaling_requirements"));
}

#[test]
fn test_render_writes_files() {
    let dir = tempdir().unwrap();
    let spec = write_spec(dir.path(), r#"{"deployment_type": "serverless"}"#);
    let out = dir.path().join("rendered");

    let output = autodeploy(
        dir.path(),
        &[
            "render",
            "Create a serverless API",
            "--spec-file",
            &spec,
            "--out",
            &out.to_string_lossy(),
        ],
    );

    assert!(output.status.success());
    for name in [
        "provider.tf",
        "compute.tf",
        "network.tf",
        "security.tf",
        "variables.tf",
        "outputs.tf",
    ] {
        assert!(out.join(name).exists(), "missing {}", name);
    }
}

#[test]
fn test_missing_api_key_is_a_config_error() {
    let dir = tempdir().unwrap();

    let output = autodeploy(dir.path(), &["render", "Deploy a website"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_API_KEY"));
}

#[test]
fn test_unparseable_spec_file_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let spec = write_spec(dir.path(), "this is not json");

    let output = autodeploy(dir.path(), &["render", "Deploy", "--spec-file", &spec]);

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_plan_without_terraform_fails_orchestration() {
    let dir = tempdir().unwrap();
    let spec = write_spec(dir.path(), r#"{"deployment_type": "container"}"#);
    fs::write(
        dir.path().join("autodeploy.toml"),
        "working_root = \"deploys\"\n\n[provisioning]\nbinary = \"autodeploy-no-such-terraform\"\n",
    )
    .unwrap();

    let output = autodeploy(
        dir.path(),
        &["plan", "Run my container", "--spec-file", &spec, "--json"],
    );

    assert_eq!(output.status.code(), Some(6));
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["result"]["status"], "failed");
    assert_eq!(value["result"]["error"]["stage"], "plan");
    assert!(dir.path().join("deploys").is_dir());
}

#[test]
fn test_destroy_unknown_directory() {
    let dir = tempdir().unwrap();

    let output = autodeploy(dir.path(), &["destroy", "never-deployed"]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_config_file() {
    let dir = tempdir().unwrap();

    let output = autodeploy(
        dir.path(),
        &["--config", "missing.toml", "destroy", "somewhere"],
    );

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_configured_region() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("autodeploy.toml"), "default_region = \"Mars\"\n").unwrap();

    let output = autodeploy(dir.path(), &["destroy", "somewhere"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Mars"));
}
